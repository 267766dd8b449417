//! Render path counters.
//!
//! Records what the engine actually did per frame (full repaint vs row diff)
//! so tests and debug logging can assert repaint scope without inspecting
//! terminal output.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RenderPathMetrics {
    /// Full repaints (first frame, resize).
    pub full_frames: AtomicU64,
    /// Frames that repainted only changed rows.
    pub partial_frames: AtomicU64,
    pub rows_repainted: AtomicU64,
    /// Rows left untouched because they matched the previous frame.
    pub rows_skipped: AtomicU64,
    pub resize_invalidations: AtomicU64,
    pub last_render_ns: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderPathMetricsSnapshot {
    pub full_frames: u64,
    pub partial_frames: u64,
    pub rows_repainted: u64,
    pub rows_skipped: u64,
    pub resize_invalidations: u64,
    pub last_render_ns: u64,
}

impl RenderPathMetrics {
    pub fn snapshot(&self) -> RenderPathMetricsSnapshot {
        RenderPathMetricsSnapshot {
            full_frames: self.full_frames.load(Ordering::Relaxed),
            partial_frames: self.partial_frames.load(Ordering::Relaxed),
            rows_repainted: self.rows_repainted.load(Ordering::Relaxed),
            rows_skipped: self.rows_skipped.load(Ordering::Relaxed),
            resize_invalidations: self.resize_invalidations.load(Ordering::Relaxed),
            last_render_ns: self.last_render_ns.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }
}
