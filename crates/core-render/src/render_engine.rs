//! RenderEngine: owns the previously painted frame and turns each new
//! [`Frame`] into the minimal writer command list.
//!
//! Paths:
//! * Full: first frame, or terminal size changed. Clears the screen and
//!   paints every row.
//! * Rows: repaints only rows whose styled content differs from the cached
//!   frame; rows past the end of a shorter frame are cleared.
//!
//! The cache always holds exactly what is on screen after a flush, so a
//! skipped row is guaranteed to already show the right content.

use crate::Frame;
use crate::line::Line;
use crate::partial_metrics::{RenderPathMetrics, RenderPathMetricsSnapshot};
use crate::writer::Writer;
use anyhow::Result;
use std::time::Instant;
use tracing::trace;

#[derive(Debug, Default)]
pub struct RenderEngine {
    prev: Vec<Line>,
    size: Option<(u16, u16)>,
    metrics: RenderPathMetrics,
    last_repaint_rows: Vec<usize>,
}

impl RenderEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the cached frame so the next paint is full.
    pub fn invalidate_for_resize(&mut self) {
        self.prev.clear();
        self.size = None;
        RenderPathMetrics::add(&self.metrics.resize_invalidations, 1);
    }

    /// Diff `frame` against the cached one and build the commands to paint it.
    pub fn paint(&mut self, frame: &Frame, width: u16, height: u16) -> Writer {
        let started = Instant::now();
        let full = self.size != Some((width, height)) || self.prev.is_empty();
        let mut writer = Writer::new();
        self.last_repaint_rows.clear();

        if full {
            writer.clear_all();
        }
        for (y, line) in frame.lines.iter().enumerate() {
            if full || self.prev.get(y) != Some(line) {
                writer.paint_row(y as u16, line);
                self.last_repaint_rows.push(y);
            }
        }
        if !full {
            for y in frame.lines.len()..self.prev.len() {
                writer.move_to(0, y as u16);
                writer.clear_line();
            }
        }

        let repainted = self.last_repaint_rows.len();
        let m = &self.metrics;
        RenderPathMetrics::add(if full { &m.full_frames } else { &m.partial_frames }, 1);
        RenderPathMetrics::add(&m.rows_repainted, repainted);
        RenderPathMetrics::add(&m.rows_skipped, frame.lines.len() - repainted);
        m.last_render_ns.store(
            started.elapsed().as_nanos() as u64,
            std::sync::atomic::Ordering::Relaxed,
        );
        trace!(target: "render.engine", full, repainted, rows = frame.lines.len(), "frame_painted");

        self.prev = frame.lines.clone();
        self.size = Some((width, height));
        writer
    }

    pub fn render(&mut self, frame: &Frame, width: u16, height: u16) -> Result<()> {
        self.paint(frame, width, height).flush()
    }

    pub fn metrics_snapshot(&self) -> RenderPathMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn last_repaint_rows(&self) -> &[usize] {
        &self.last_repaint_rows
    }
}
