//! Rows drawn between the log and the input: slash-command hints and the
//! autocomplete popup. Both are sized by the layout before the log gets its
//! height, so the builders here must produce exactly the reserved row count.

use crate::line::Line;
use crate::style::StyleKey;
use core_compose::{Autocomplete, Sigil, SlashCommand};

const HINT_INDENT: &str = "   ";
const SELECTED_MARK: &str = "   ▸ ";
const UNSELECTED_INDENT: &str = "     ";

pub fn hint_lines(hints: &[&SlashCommand], width: usize) -> Vec<Line> {
    hints
        .iter()
        .map(|h| {
            let mut l = Line::styled(HINT_INDENT, StyleKey::Plain);
            l.push(h.usage, StyleKey::Accent)
                .push("  ", StyleKey::Plain)
                .push(h.description, StyleKey::Dim);
            l.fit(width)
        })
        .collect()
}

/// Visible candidate rows, selected row marked and highlighted.
pub fn popup_lines(ac: &Autocomplete, width: usize) -> Vec<Line> {
    let (start, rows) = ac.visible();
    let selected_key = match ac.sigil() {
        Sigil::Mention => StyleKey::Accent,
        Sigil::Project => StyleKey::Gold,
    };
    rows.iter()
        .enumerate()
        .map(|(i, candidate)| {
            let label = match ac.sigil() {
                Sigil::Mention => candidate.clone(),
                Sigil::Project => format!("#{candidate}"),
            };
            let line = if start + i == ac.cursor() {
                Line::styled(format!("{SELECTED_MARK}{label}"), selected_key)
            } else {
                Line::styled(format!("{UNSELECTED_INDENT}{label}"), StyleKey::Dim)
            };
            line.fit(width)
        })
        .collect()
}
