//! Vertical layout of the chat surface.
//!
//! From top to bottom: log viewport, slash hints, autocomplete popup, input
//! rows, status line. Everything below the log is chrome and is reserved
//! first; the log gets what remains, never less than [`MIN_LOG_HEIGHT`]. The
//! banners reserve the same chrome as a populated log, so the input row stays
//! put when the sync state changes.
//!
//! Invariants:
//! * `log_height >= MIN_LOG_HEIGHT`.
//! * `total() == height` whenever `height >= chrome + MIN_LOG_HEIGHT`.
//! * Input rows are always present (at least one).

use crate::ChatModel;
use core_text::wrap;

pub const MIN_LOG_HEIGHT: usize = 2;
/// Width of the `> ` input prefix.
pub const INPUT_PREFIX_WIDTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatLayout {
    pub width: usize,
    pub log_height: usize,
    pub hint_rows: usize,
    pub popup_rows: usize,
    pub input_rows: usize,
    pub status_rows: usize,
}

impl ChatLayout {
    pub fn compute(model: &ChatModel, width: u16, height: u16) -> Self {
        let width = width as usize;
        let focused = model.view().focused;
        let composer = model.composer();

        let hint_rows = if focused { composer.hints().len() } else { 0 };
        let popup_rows = composer
            .mode()
            .autocomplete()
            .map_or(0, |ac| ac.popup_height());
        let input_rows = if focused {
            input_line_count(composer.text(), input_body_width(width))
        } else {
            1
        };
        let status_rows = usize::from(model.state().status_text().is_some());

        let chrome = hint_rows + popup_rows + input_rows + status_rows;
        let log_height = (height as usize).saturating_sub(chrome).max(MIN_LOG_HEIGHT);
        Self {
            width,
            log_height,
            hint_rows,
            popup_rows,
            input_rows,
            status_rows,
        }
    }

    pub fn chrome(&self) -> usize {
        self.hint_rows + self.popup_rows + self.input_rows + self.status_rows
    }

    pub fn total(&self) -> usize {
        self.log_height + self.chrome()
    }
}

pub fn input_body_width(width: usize) -> usize {
    width.saturating_sub(INPUT_PREFIX_WIDTH + 1).max(1)
}

/// Visual rows the focused input occupies at `body_width`.
pub fn input_line_count(text: &str, body_width: usize) -> usize {
    wrap(text, body_width).len().max(1)
}
