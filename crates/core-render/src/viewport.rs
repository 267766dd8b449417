//! Bottom-anchored scroll window over the rendered log.
//!
//! `scroll` counts lines up from the newest content. The window is clamped
//! to the available history, so scrolling past the top pins the oldest line
//! to the top row and the returned offset is the clamped one. Short content
//! is bottom-aligned with blank padding above.

use crate::line::Line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub first_line: usize,
    pub height: usize,
    /// Effective scroll offset after clamping.
    pub scroll: usize,
    end: usize,
}

impl Viewport {
    pub fn anchored(total: usize, height: usize, scroll: usize) -> Self {
        let scroll = scroll.min(total.saturating_sub(height));
        let end = total - scroll;
        Self {
            first_line: end.saturating_sub(height),
            height,
            scroll,
            end,
        }
    }

    pub fn visible(&self) -> usize {
        self.end - self.first_line
    }

    /// Cut the window out of `lines`, padded at the top to `height` rows.
    pub fn slice(&self, lines: Vec<Line>) -> Vec<Line> {
        let mut out = vec![Line::blank(); self.height.saturating_sub(self.visible())];
        out.extend(
            lines
                .into_iter()
                .skip(self.first_line)
                .take(self.visible()),
        );
        out
    }
}
