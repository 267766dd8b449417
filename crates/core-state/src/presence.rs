//! Presence snapshots and join/leave synthesis.

use crate::entry::ChatEntry;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceChange {
    Joined(String),
    Left(String),
}

impl PresenceChange {
    pub fn login(&self) -> &str {
        match self {
            Self::Joined(l) | Self::Left(l) => l,
        }
    }

    pub fn text(&self) -> String {
        match self {
            Self::Joined(l) => format!("{l} joined"),
            Self::Left(l) => format!("{l} left"),
        }
    }

    pub fn into_entry(self, at: DateTime<Utc>) -> ChatEntry {
        ChatEntry::system(self.text(), at)
    }
}

/// Joined logins (in `current` order) followed by departed logins (in
/// `previous` order). `me` is never reported.
pub fn diff(previous: &[String], current: &[String], me: Option<&str>) -> Vec<PresenceChange> {
    let prev: HashSet<&str> = previous.iter().map(String::as_str).collect();
    let cur: HashSet<&str> = current.iter().map(String::as_str).collect();
    let not_me = |l: &&String| me != Some(l.as_str());

    let joined = current
        .iter()
        .filter(not_me)
        .filter(|l| !prev.contains(l.as_str()))
        .map(|l| PresenceChange::Joined(l.clone()));
    let left = previous
        .iter()
        .filter(not_me)
        .filter(|l| !cur.contains(l.as_str()))
        .map(|l| PresenceChange::Left(l.clone()));
    joined.chain(left).collect()
}

/// Holds the latest snapshot. The first observation is stored without a diff.
#[derive(Debug, Default, Clone)]
pub struct PresenceTracker {
    logins: Option<Vec<String>>,
    count: usize,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot wholesale and return the changes since the last one.
    pub fn observe(&mut self, logins: Vec<String>, count: usize, me: Option<&str>) -> Vec<PresenceChange> {
        let changes = match &self.logins {
            Some(prev) => diff(prev, &logins, me),
            None => Vec::new(),
        };
        debug!(target: "sync.presence", present = logins.len(), changes = changes.len(), "presence snapshot");
        self.logins = Some(logins);
        self.count = count;
        changes
    }

    pub fn logins(&self) -> &[String] {
        self.logins.as_deref().unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn has_snapshot(&self) -> bool {
        self.logins.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn v(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn alice_leaves_carol_joins() {
        let changes = diff(&v(&["alice", "bob"]), &v(&["bob", "carol"]), None);
        assert_eq!(
            changes,
            vec![
                PresenceChange::Joined("carol".into()),
                PresenceChange::Left("alice".into())
            ]
        );
        assert!(changes.iter().all(|c| c.login() != "bob"));
    }

    #[test]
    fn self_is_excluded() {
        let changes = diff(&v(&["me"]), &v(&["carol"]), Some("me"));
        assert_eq!(changes, vec![PresenceChange::Joined("carol".into())]);
    }

    #[test]
    fn first_snapshot_is_not_diffed() {
        let mut t = PresenceTracker::new();
        assert!(t.observe(v(&["alice", "bob"]), 2, None).is_empty());
        assert!(t.has_snapshot());
        let changes = t.observe(v(&["bob"]), 1, None);
        assert_eq!(changes, vec![PresenceChange::Left("alice".into())]);
        assert_eq!(t.logins(), &["bob".to_string()][..]);
        assert_eq!(t.count(), 1);
    }

    #[test]
    fn empty_first_snapshot_still_counts() {
        let mut t = PresenceTracker::new();
        assert!(t.observe(Vec::new(), 0, None).is_empty());
        assert_eq!(
            t.observe(v(&["dana"]), 1, None),
            vec![PresenceChange::Joined("dana".into())]
        );
    }

    #[test]
    fn change_text() {
        assert_eq!(PresenceChange::Joined("x".into()).text(), "x joined");
        assert_eq!(PresenceChange::Left("x".into()).text(), "x left");
    }
}
