//! Bottom chrome and log placeholders: the input rows, the transient status
//! line, and the banners shown in place of an empty log.
//!
//! Input row contract:
//! * Focused: the buffer is wrapped at [`input_body_width`]; the first row
//!   carries the `> ` prompt, continuation rows a two-space indent, and the
//!   block cursor (or a blank cell while blinking off) ends the last row.
//! * Unfocused: one row, first buffer line only, `…` when more lines exist.
//! * Empty buffer: prompt, cursor when focused, then a dim placeholder.
//!
//! Row counts here must agree with `ChatLayout`, which budgets them first.

use crate::line::Line;
use crate::style::StyleKey;
use core_model::input_body_width;
use core_state::Banner;
use core_text::wrap;

pub const PROMPT: &str = "> ";
const CONTINUATION: &str = "  ";
const CURSOR: &str = "█";
pub const PLACEHOLDER: &str = "say something...";
pub const SIGNED_OUT_PLACEHOLDER: &str = "sign in to chat";

pub fn banner_text(banner: Banner) -> &'static str {
    match banner {
        Banner::Connecting => "connecting...",
        Banner::CouldNotConnect => "could not connect · check your connection and try again",
        Banner::Empty => "no messages yet · say something!",
    }
}

/// Banner occupying the whole log region, text on the bottom row.
pub fn banner_lines(banner: Banner, log_height: usize, width: usize) -> Vec<Line> {
    let mut out = vec![Line::blank(); log_height.saturating_sub(1)];
    let mut l = Line::styled(" ", StyleKey::Plain);
    l.push(banner_text(banner), StyleKey::Dim);
    out.push(l.fit(width));
    out
}

pub struct InputView<'a> {
    pub text: &'a str,
    pub focused: bool,
    pub cursor_visible: bool,
    pub signed_in: bool,
}

pub fn input_lines(input: &InputView<'_>, width: usize) -> Vec<Line> {
    let cursor = if input.cursor_visible { CURSOR } else { " " };
    if input.text.is_empty() {
        let mut l = Line::styled(PROMPT, StyleKey::InputPrompt);
        if input.focused {
            l.push(cursor, StyleKey::InputPrompt);
        }
        let placeholder = if input.signed_in { PLACEHOLDER } else { SIGNED_OUT_PLACEHOLDER };
        l.push(placeholder, StyleKey::Dim);
        return vec![l.fit(width)];
    }

    if !input.focused {
        let mut lines = input.text.split('\n');
        let mut l = Line::styled(PROMPT, StyleKey::InputPrompt);
        l.push(lines.next().unwrap_or_default(), StyleKey::SelfText);
        if lines.next().is_some() {
            l.push("…", StyleKey::Dim);
        }
        return vec![l.fit(width)];
    }

    let mut out: Vec<Line> = wrap(input.text, input_body_width(width))
        .into_iter()
        .enumerate()
        .map(|(i, visual)| {
            let (lead, key) = if i == 0 {
                (PROMPT, StyleKey::InputPrompt)
            } else {
                (CONTINUATION, StyleKey::Plain)
            };
            let mut l = Line::styled(lead, key);
            l.push(visual.text, StyleKey::SelfText);
            l
        })
        .collect();
    if out.is_empty() {
        out.push(Line::styled(PROMPT, StyleKey::InputPrompt));
    }
    if let Some(last) = out.last_mut() {
        last.push(cursor, StyleKey::InputPrompt);
    }
    out.into_iter().map(|l| l.fit(width)).collect()
}

pub fn status_line(text: &str, width: usize) -> Line {
    let mut l = Line::styled(" ", StyleKey::Plain);
    l.push(text, StyleKey::Dim);
    l.fit(width)
}
