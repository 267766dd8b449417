//! Chat state: retention window, presence snapshot, identity, autocomplete
//! candidate pools and the transient status line.
//!
//! Everything here is pure and synchronous. Sync results are applied by the
//! single event-loop task through [`ChatState::apply_poll`] and friends, so a
//! poll's messages and presence land in one step and the renderer never sees a
//! partial merge. Presentation lives in `core-render`; view concerns (focus,
//! scroll, composer) live in `core-model`.

pub mod entry;
pub mod presence;
pub mod window;

pub use entry::{ANIM_FRAMES, ChatEntry, EntryKind};
pub use presence::{PresenceChange, PresenceTracker, diff};
pub use window::{MergeReport, RETENTION_CAP, RetentionWindow};

use chrono::{DateTime, Utc};
use core_client::{ClientResult, Presence, Project, ReactionMap, RoomMessage};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Ephemeral status line with an expiry.
#[derive(Debug, Clone)]
pub struct EphemeralMessage {
    pub text: String,
    pub expires_at: Instant,
}

/// Placeholder shown in place of the log while it has nothing to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner {
    Connecting,
    CouldNotConnect,
    Empty,
}

/// What one poll changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    pub merge: MergeReport,
    pub presence_changes: usize,
    pub messages_failed: bool,
}

#[derive(Debug, Default)]
pub struct ChatState {
    pub window: RetentionWindow,
    pub presence: PresenceTracker,
    identity: Option<String>,
    all_logins: Vec<String>,
    projects: Vec<Project>,
    connected: bool,
    last_error: Option<String>,
    status: Option<EphemeralMessage>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn my_login(&self) -> Option<&str> {
        self.identity.as_deref().filter(|l| !l.is_empty())
    }

    /// Record the local identity and retag held entries.
    pub fn set_identity(&mut self, login: impl Into<String>) {
        let login = login.into();
        self.window.retag_mine(&login);
        info!(target: "sync.messages", "identity resolved");
        self.identity = Some(login);
    }

    /// Apply one poll. Fetch failures keep prior state; the message error is
    /// remembered only until the next successful fetch.
    pub fn apply_poll(
        &mut self,
        messages: ClientResult<Vec<RoomMessage>>,
        presence: ClientResult<Presence>,
        now: DateTime<Utc>,
    ) -> PollOutcome {
        let mut outcome = PollOutcome::default();
        match messages {
            Ok(batch) => {
                self.last_error = None;
                self.connected = true;
                let me = self.identity.clone();
                outcome.merge = self.window.merge(&batch, me.as_deref());
            }
            Err(e) => {
                debug!(target: "sync.messages", error = %e, "fetch failed");
                self.last_error = Some(e.summary());
                outcome.messages_failed = true;
            }
        }
        match presence {
            Ok(p) => {
                let me = self.identity.clone();
                let changes = self.presence.observe(p.logins, p.count, me.as_deref());
                outcome.presence_changes = changes.len();
                let notices = changes.into_iter().map(|c| c.into_entry(now)).collect();
                self.window.push_system(notices);
            }
            Err(e) => debug!(target: "sync.presence", error = %e, "fetch failed"),
        }
        outcome
    }

    pub fn apply_reactions(&mut self, reactions: ClientResult<ReactionMap>) -> usize {
        match reactions {
            Ok(map) => self.window.apply_reactions(&map),
            Err(e) => {
                debug!(target: "sync.reactions", error = %e, "fetch failed");
                0
            }
        }
    }

    /// IDs whose reactions should be refreshed; empty means skip the request.
    pub fn reaction_ids(&self) -> Vec<String> {
        self.window.ids()
    }

    pub fn set_all_logins(&mut self, logins: Vec<String>) {
        self.all_logins = logins;
    }

    pub fn set_projects(&mut self, projects: Vec<Project>) {
        self.projects = projects;
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Fetched logins, present logins and message senders, minus the local
    /// identity; sorted and deduplicated.
    pub fn known_logins(&self) -> Vec<String> {
        let me = self.my_login();
        let set: BTreeSet<&str> = self
            .all_logins
            .iter()
            .map(String::as_str)
            .chain(self.presence.logins().iter().map(String::as_str))
            .chain(self.window.senders())
            .filter(|l| !l.is_empty() && Some(*l) != me)
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Banner shown while the log is empty, or `None` when entries exist.
    pub fn banner(&self) -> Option<Banner> {
        if self.last_error.is_some() && self.window.is_empty() {
            return Some(Banner::CouldNotConnect);
        }
        if self.my_login().is_none() && !self.connected {
            return Some(Banner::Connecting);
        }
        if self.window.is_empty() {
            return Some(Banner::Empty);
        }
        None
    }

    pub fn set_status(&mut self, msg: impl Into<String>, ttl: Duration) {
        self.status = Some(EphemeralMessage {
            text: msg.into(),
            expires_at: Instant::now() + ttl,
        });
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status.as_ref().map(|m| m.text.as_str())
    }

    /// Drop an expired status; returns true if one was cleared.
    pub fn tick_status(&mut self, now: Instant) -> bool {
        if let Some(m) = &self.status
            && now >= m.expires_at
        {
            self.status = None;
            return true;
        }
        false
    }
}
