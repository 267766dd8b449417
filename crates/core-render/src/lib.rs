//! Frame assembly + partial repaint engine for the chat surface.
//!
//! A frame is built top to bottom from the model:
//! 1. Log region (`log_height` rows): either a banner, or the bottom-anchored
//!    scroll window over every entry's laid-out lines.
//! 2. Slash hints (focused only) and the autocomplete popup.
//! 3. Input rows, then the transient status line when one is live.
//!
//! Row counts come from [`ChatLayout`], computed before any content is laid
//! out, so the input row keeps its position whatever the popup, banner or
//! sync state. If the terminal is shorter than the chrome plus the minimum
//! log height, the bottom `height` rows are kept: the input always survives.
//!
//! Every line is clipped to the frame width; the terminal never wraps.
//!
//! Exposed Components:
//! - `entry`: per-kind entry layouts and the time label.
//! - `viewport`: scroll window clamping.
//! - `overlay`: hint and popup rows.
//! - `status`: banners, input rows, status line.
//! - `render_engine` / `writer`: row diffing and terminal emission.

pub mod entry;
pub mod line;
pub mod overlay;
pub mod partial_metrics;
pub mod render_engine;
pub mod status;
pub mod style;
pub mod viewport;
pub mod writer;

pub use line::{Line, Span};
pub use render_engine::RenderEngine;
pub use style::{Rgb, Style, StyleKey};

use chrono::{DateTime, FixedOffset};
use core_model::{ChatLayout, ChatModel};
use entry::{EntryContext, entry_lines};
use overlay::{hint_lines, popup_lines};
use status::{InputView, banner_lines, input_lines, status_line};
use viewport::Viewport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub lines: Vec<Line>,
    /// Scroll offset after clamping to the available history.
    pub scroll: usize,
    pub log_height: usize,
}

/// Build the frame for a `width` x `height` terminal. `now` fixes the local
/// timezone and day used for time labels.
pub fn render(model: &ChatModel, width: u16, height: u16, now: DateTime<FixedOffset>) -> Frame {
    let layout = ChatLayout::compute(model, width, height);
    let w = layout.width;
    let state = model.state();
    let view = model.view();
    let composer = model.composer();

    let (mut lines, scroll) = match state.banner() {
        Some(banner) => (banner_lines(banner, layout.log_height, w), 0),
        None => {
            let ctx = EntryContext {
                width: w,
                my_login: state.my_login(),
                now,
            };
            let log: Vec<Line> = state
                .window
                .entries()
                .iter()
                .flat_map(|e| entry_lines(e, &ctx))
                .collect();
            let vp = Viewport::anchored(log.len(), layout.log_height, view.scroll);
            (vp.slice(log), vp.scroll)
        }
    };

    if view.focused {
        lines.extend(hint_lines(&composer.hints(), w));
    }
    if let Some(ac) = composer.mode().autocomplete() {
        lines.extend(popup_lines(ac, w));
    }
    lines.extend(input_lines(
        &InputView {
            text: composer.text(),
            focused: view.focused,
            cursor_visible: view.cursor_visible(),
            signed_in: state.my_login().is_some(),
        },
        w,
    ));
    if let Some(text) = state.status_text() {
        lines.push(status_line(text, w));
    }

    let h = height as usize;
    if lines.len() > h {
        lines.drain(..lines.len() - h);
    }
    Frame {
        lines,
        scroll,
        log_height: layout.log_height,
    }
}
