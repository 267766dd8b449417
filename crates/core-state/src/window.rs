//! Bounded, deduplicated, chronologically ordered entry collection.
//!
//! Invariants held after every mutating call:
//! - entries are sorted non-decreasing by `created_at` (stable, so equal
//!   timestamps keep arrival order);
//! - `len() <= cap()`, eviction drops the oldest entries first;
//! - the seen-ID set equals the ID set of the held entries exactly.

use crate::entry::ChatEntry;
use core_client::{ReactionMap, RoomMessage};
use std::collections::HashSet;
use tracing::debug;

pub const RETENTION_CAP: usize = 200;

/// Outcome of one merge, used for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    pub inserted: usize,
    pub duplicates: usize,
    pub evicted: usize,
}

#[derive(Debug, Clone)]
pub struct RetentionWindow {
    entries: Vec<ChatEntry>,
    seen: HashSet<String>,
    cap: usize,
}

impl Default for RetentionWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl RetentionWindow {
    pub fn new() -> Self {
        Self::with_cap(RETENTION_CAP)
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            entries: Vec::new(),
            seen: HashSet::new(),
            cap: cap.max(1),
        }
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn has_seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }

    /// Insert every not-yet-seen message, re-sort, then enforce the cap.
    pub fn merge(&mut self, batch: &[RoomMessage], my_login: Option<&str>) -> MergeReport {
        let mut report = MergeReport::default();
        for msg in batch {
            if !self.seen.insert(msg.id.clone()) {
                report.duplicates += 1;
                continue;
            }
            self.entries.push(ChatEntry::from_message(msg, my_login));
            report.inserted += 1;
        }
        if report.inserted > 0 {
            self.entries.sort_by_key(|e| e.created_at);
        }
        report.evicted = self.evict();
        debug!(
            target: "sync.messages",
            inserted = report.inserted,
            duplicates = report.duplicates,
            evicted = report.evicted,
            held = self.entries.len(),
            "merge"
        );
        report
    }

    /// Append synthesized entries. They carry no ID and bypass dedup.
    pub fn push_system(&mut self, notices: Vec<ChatEntry>) -> usize {
        if notices.is_empty() {
            return 0;
        }
        self.entries.extend(notices);
        self.entries.sort_by_key(|e| e.created_at);
        self.evict()
    }

    fn evict(&mut self) -> usize {
        let excess = self.entries.len().saturating_sub(self.cap);
        if excess == 0 {
            return 0;
        }
        self.entries.drain(..excess);
        self.seen = self.entries.iter().filter_map(|e| e.id.clone()).collect();
        excess
    }

    /// Replace reaction summaries by message ID. Entries absent from `map`
    /// keep what they had. Returns how many entries were updated.
    pub fn apply_reactions(&mut self, map: &ReactionMap) -> usize {
        let mut updated = 0;
        for entry in &mut self.entries {
            let Some(id) = entry.id.as_deref() else {
                continue;
            };
            if let Some(counts) = map.get(id) {
                entry.reactions = counts.clone();
                updated += 1;
            }
        }
        updated
    }

    /// Advance entrance animations; true while any entry is still animating.
    pub fn advance_animations(&mut self) -> bool {
        let mut active = false;
        for entry in &mut self.entries {
            active |= entry.advance_animation();
        }
        active
    }

    /// Recompute `is_mine` once the local identity becomes known.
    pub fn retag_mine(&mut self, my_login: &str) {
        for entry in &mut self.entries {
            entry.is_mine = !entry.is_system && !my_login.is_empty() && entry.sender_login == my_login;
        }
    }

    /// IDs of all held (non-synthesized) entries, oldest first.
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().filter_map(|e| e.id.clone()).collect()
    }

    /// Distinct non-system senders.
    pub fn senders(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| !e.is_system && !e.sender_login.is_empty())
            .map(|e| e.sender_login.as_str())
    }
}
