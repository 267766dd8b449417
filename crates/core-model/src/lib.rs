//! Chat surface model: the façade the application shell drives.
//!
//! `ChatModel` owns the [`ChatState`] (log, presence, pools), the [`Composer`]
//! and the view state (focus, scroll, cursor blink). It exposes exactly what
//! the shell needs: a key handler, a paste handler, a sync-result handler, a
//! frame tick, and [`ChatModel::is_composing`] so global shortcuts can be
//! suppressed while the user types.
//!
//! Handlers never perform I/O. They mutate state synchronously and return
//! [`Effect`]s for the runtime to execute; results come back later as
//! `SyncEvent`s. This keeps every mutation on the loop task.
//!
//! Invariants (after every public call):
//! * `view.scroll <= state.window.len() * SCROLL_LINES_PER_ENTRY`; the
//!   renderer clamps further against the real line count and the shell feeds
//!   that back through [`ChatModel::snap_scroll`].
//! * At most one poll timer is armed: only timer-originated polls re-arm.

mod layout;
pub use layout::{ChatLayout, INPUT_PREFIX_WIDTH, MIN_LOG_HEIGHT, input_body_width, input_line_count};

use chrono::Utc;
use core_compose::{ComposeContext, ComposeOutcome, Composer, creates_project};
use core_events::{InputEvent, KeyCode, KeyEvent, KeyModifiers, PollOrigin, SyncEvent};
use core_state::ChatState;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Upper bound used for `k` scrolling before the renderer has measured lines.
pub const SCROLL_LINES_PER_ENTRY: usize = 3;
/// Frame ticks per cursor blink phase.
pub const BLINK_TICKS: u8 = 6;
pub const AUTH_REQUIRED_TEXT: &str = "sign in to chat (set [server].token)";

/// Work the runtime performs on the model's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch messages + presence concurrently.
    Poll(PollOrigin),
    /// Schedule the next timer poll.
    ArmPoll,
    FetchReactions(Vec<String>),
    SendMessage(String),
    RefreshProjects,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatView {
    pub focused: bool,
    /// Lines scrolled up from the newest content (0 = pinned to bottom).
    pub scroll: usize,
    /// Last rendered log height, used as the page size.
    pub page: usize,
    blink_ticks: u8,
}

impl Default for ChatView {
    fn default() -> Self {
        Self {
            focused: true,
            scroll: 0,
            page: 10,
            blink_ticks: 0,
        }
    }
}

impl ChatView {
    pub fn cursor_visible(&self) -> bool {
        (self.blink_ticks / BLINK_TICKS) % 2 == 0
    }

    fn reset_blink(&mut self) {
        self.blink_ticks = 0;
    }
}

/// Candidate pools as seen by the composer.
struct Pools<'a>(&'a ChatState);

impl ComposeContext for Pools<'_> {
    fn known_logins(&self) -> Vec<String> {
        self.0.known_logins()
    }

    fn project_names(&self) -> Vec<String> {
        self.0.projects().iter().map(|p| p.name.clone()).collect()
    }

    fn has_identity(&self) -> bool {
        self.0.my_login().is_some()
    }
}

#[derive(Debug)]
pub struct ChatModel {
    state: ChatState,
    composer: Composer,
    view: ChatView,
    status_ttl: Duration,
}

impl ChatModel {
    pub fn new(status_ttl: Duration) -> Self {
        Self {
            state: ChatState::new(),
            composer: Composer::new(),
            view: ChatView::default(),
            status_ttl,
        }
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ChatState {
        &mut self.state
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn view(&self) -> &ChatView {
        &self.view
    }

    /// True while the input row has focus.
    pub fn is_composing(&self) -> bool {
        self.view.focused
    }

    /// Effects to run once at startup: an immediate poll.
    pub fn startup(&self) -> Vec<Effect> {
        vec![Effect::Poll(PollOrigin::Timer)]
    }

    pub fn handle_input(&mut self, input: &InputEvent) -> Vec<Effect> {
        match input {
            InputEvent::Key(key) => self.handle_key(key),
            InputEvent::Paste(text) => {
                self.handle_paste(text);
                Vec::new()
            }
            InputEvent::CtrlC => vec![Effect::Quit],
            InputEvent::Resize(..) | InputEvent::FocusGained | InputEvent::FocusLost => Vec::new(),
        }
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> Vec<Effect> {
        self.view.reset_blink();
        if key.code == KeyCode::Char('c') && key.mods.contains(KeyModifiers::CTRL) {
            return vec![Effect::Quit];
        }
        if self.view.focused {
            self.compose_key(key)
        } else {
            self.navigate(key)
        }
    }

    /// Bracketed paste goes to the composer only while it has focus.
    pub fn handle_paste(&mut self, text: &str) -> bool {
        if !self.view.focused {
            return false;
        }
        self.view.reset_blink();
        self.composer.paste(text) == ComposeOutcome::Edited
    }

    fn compose_key(&mut self, key: &KeyEvent) -> Vec<Effect> {
        let outcome = self.composer.handle_key(key, &Pools(&self.state));
        match outcome {
            ComposeOutcome::Unchanged | ComposeOutcome::Edited => Vec::new(),
            ComposeOutcome::Submitted(body) => {
                self.state.clear_status();
                self.view.scroll = 0;
                let refresh = creates_project(&body);
                let mut effects = vec![Effect::SendMessage(body)];
                if refresh {
                    effects.push(Effect::RefreshProjects);
                }
                effects
            }
            ComposeOutcome::AuthRequired => {
                self.state.set_status(AUTH_REQUIRED_TEXT, self.status_ttl);
                Vec::new()
            }
            ComposeOutcome::Unfocus => {
                self.view.focused = false;
                self.state.clear_status();
                Vec::new()
            }
        }
    }

    fn navigate(&mut self, key: &KeyEvent) -> Vec<Effect> {
        let max_scroll = self.state.window.len() * SCROLL_LINES_PER_ENTRY;
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.view.scroll = self.view.scroll.saturating_sub(1),
            KeyCode::Char('k') | KeyCode::Up => {
                self.view.scroll = (self.view.scroll + 1).min(max_scroll);
            }
            KeyCode::PageUp => {
                self.view.scroll = (self.view.scroll + self.view.page.max(1)).min(max_scroll);
            }
            KeyCode::PageDown => {
                self.view.scroll = self.view.scroll.saturating_sub(self.view.page.max(1));
            }
            KeyCode::Char('G') | KeyCode::End => self.view.scroll = 0,
            KeyCode::Enter | KeyCode::Char('i') => self.focus(),
            KeyCode::Char('/') => {
                self.focus();
                if self.composer.is_empty() {
                    self.composer.set_text("/");
                }
            }
            KeyCode::Char('q') => return vec![Effect::Quit],
            _ => {}
        }
        Vec::new()
    }

    fn focus(&mut self) {
        self.view.focused = true;
        self.view.reset_blink();
        self.state.clear_status();
    }

    /// Adopt the scroll offset the renderer actually used, so eviction or a
    /// shrinking log snaps the view to available history.
    pub fn snap_scroll(&mut self, effective: usize, log_height: usize) {
        if effective < self.view.scroll {
            debug!(target: "runtime.events", from = self.view.scroll, to = effective, "scroll snapped");
        }
        self.view.scroll = effective;
        self.view.page = log_height;
    }

    pub fn on_sync(&mut self, event: SyncEvent) -> Vec<Effect> {
        match event {
            SyncEvent::PollDue => vec![Effect::Poll(PollOrigin::Timer)],
            SyncEvent::Polled {
                origin,
                messages,
                presence,
            } => {
                let outcome = self.state.apply_poll(messages, presence, Utc::now());
                let mut effects = Vec::with_capacity(2);
                if !outcome.messages_failed {
                    let ids = self.state.reaction_ids();
                    if !ids.is_empty() {
                        effects.push(Effect::FetchReactions(ids));
                    }
                }
                if origin == PollOrigin::Timer {
                    effects.push(Effect::ArmPoll);
                }
                effects
            }
            SyncEvent::Reactions(result) => {
                self.state.apply_reactions(result);
                Vec::new()
            }
            SyncEvent::Sent(Ok(_)) => {
                self.state.clear_status();
                vec![Effect::Poll(PollOrigin::Refresh)]
            }
            SyncEvent::Sent(Err(e)) => {
                info!(target: "compose.submit", error = %e, "send failed");
                self.state.set_status(format!("error: {}", e.summary()), self.status_ttl);
                Vec::new()
            }
            SyncEvent::Identity(Ok(Some(me))) => {
                self.state.set_identity(me.github_login);
                Vec::new()
            }
            SyncEvent::Identity(Ok(None)) => {
                info!(target: "sync.messages", "no identity; read-only");
                Vec::new()
            }
            SyncEvent::Identity(Err(e)) => {
                info!(target: "sync.messages", error = %e, "identity fetch failed");
                Vec::new()
            }
            SyncEvent::Logins(Ok(logins)) => {
                self.state.set_all_logins(logins);
                Vec::new()
            }
            SyncEvent::Projects(Ok(projects)) => {
                self.state.set_projects(projects);
                Vec::new()
            }
            SyncEvent::Logins(Err(e)) | SyncEvent::Projects(Err(e)) => {
                debug!(target: "sync.messages", error = %e, "pool fetch failed");
                Vec::new()
            }
        }
    }

    /// Advance one animation frame. Returns true when a redraw is needed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let animating = self.state.window.advance_animations();
        let expired = self.state.tick_status(now);
        let mut blink = false;
        if self.view.focused {
            let before = self.view.cursor_visible();
            self.view.blink_ticks = self.view.blink_ticks.wrapping_add(1) % (BLINK_TICKS * 2);
            blink = before != self.view.cursor_visible();
        }
        animating || expired || blink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_client::{ClientError, Identity, Presence, Project, RoomMessage};
    use core_compose::ComposeMode;

    fn key(c: char) -> KeyEvent {
        KeyEvent::plain(KeyCode::Char(c))
    }

    fn msg(id: &str, login: &str) -> RoomMessage {
        RoomMessage {
            id: id.into(),
            room_id: String::new(),
            sender_id: String::new(),
            sender_login: login.into(),
            sender_guild: String::new(),
            body: "hi".into(),
            kind: String::new(),
            metadata: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn polled(origin: PollOrigin, messages: Vec<RoomMessage>) -> SyncEvent {
        SyncEvent::Polled {
            origin,
            messages: Ok(messages),
            presence: Ok(Presence::default()),
        }
    }

    fn signed_in() -> ChatModel {
        let mut m = ChatModel::new(Duration::from_secs(4));
        m.on_sync(SyncEvent::Identity(Ok(Some(Identity {
            github_login: "me".into(),
            guild_id: String::new(),
        }))));
        m
    }

    fn type_str(m: &mut ChatModel, s: &str) -> Vec<Effect> {
        let mut out = Vec::new();
        for c in s.chars() {
            out.extend(m.handle_key(&key(c)));
        }
        out
    }

    #[test]
    fn starts_focused_and_composing() {
        let m = ChatModel::new(Duration::from_secs(4));
        assert!(m.is_composing());
        assert_eq!(m.startup(), vec![Effect::Poll(PollOrigin::Timer)]);
    }

    #[test]
    fn timer_poll_rearms_and_requests_reactions() {
        let mut m = signed_in();
        let effects = m.on_sync(polled(PollOrigin::Timer, vec![msg("a", "bob")]));
        assert_eq!(
            effects,
            vec![Effect::FetchReactions(vec!["a".into()]), Effect::ArmPoll]
        );
    }

    #[test]
    fn refresh_poll_does_not_rearm() {
        let mut m = signed_in();
        let effects = m.on_sync(polled(PollOrigin::Refresh, vec![]));
        assert!(effects.is_empty());
    }

    #[test]
    fn failed_poll_still_rearms() {
        let mut m = signed_in();
        let effects = m.on_sync(SyncEvent::Polled {
            origin: PollOrigin::Timer,
            messages: Err(ClientError::Transport("offline".into())),
            presence: Err(ClientError::Transport("offline".into())),
        });
        assert_eq!(effects, vec![Effect::ArmPoll]);
    }

    #[test]
    fn submit_sends_and_build_refreshes_projects() {
        let mut m = signed_in();
        type_str(&mut m, "/build Loom");
        let effects = m.handle_key(&KeyEvent::plain(KeyCode::Enter));
        assert_eq!(
            effects,
            vec![Effect::SendMessage("/build Loom".into()), Effect::RefreshProjects]
        );
        assert!(m.composer().is_empty());
    }

    #[test]
    fn submit_without_identity_sets_status_and_keeps_text() {
        let mut m = ChatModel::new(Duration::from_secs(4));
        type_str(&mut m, "hello");
        assert!(m.handle_key(&KeyEvent::plain(KeyCode::Enter)).is_empty());
        assert_eq!(m.state().status_text(), Some(AUTH_REQUIRED_TEXT));
        assert_eq!(m.composer().text(), "hello");
    }

    #[test]
    fn send_result_handling() {
        let mut m = signed_in();
        let effects = m.on_sync(SyncEvent::Sent(Err(ClientError::Http {
            status: 429,
            message: "slow down".into(),
        })));
        assert!(effects.is_empty());
        assert_eq!(m.state().status_text(), Some("error: HTTP 429: slow down"));

        let effects = m.on_sync(SyncEvent::Sent(Ok(msg("x", "me"))));
        assert_eq!(effects, vec![Effect::Poll(PollOrigin::Refresh)]);
        assert_eq!(m.state().status_text(), None);
    }

    #[test]
    fn esc_unfocuses_then_navigation_keys_scroll() {
        let mut m = signed_in();
        m.on_sync(polled(PollOrigin::Timer, vec![msg("a", "bob"), msg("b", "bob")]));
        m.handle_key(&KeyEvent::plain(KeyCode::Esc));
        assert!(!m.is_composing());

        for _ in 0..10 {
            m.handle_key(&key('k'));
        }
        assert_eq!(m.view().scroll, 6);
        m.handle_key(&key('j'));
        assert_eq!(m.view().scroll, 5);
        m.handle_key(&key('G'));
        assert_eq!(m.view().scroll, 0);
        m.handle_key(&key('j'));
        assert_eq!(m.view().scroll, 0);
    }

    #[test]
    fn navigation_keys_do_not_type() {
        let mut m = signed_in();
        m.handle_key(&KeyEvent::plain(KeyCode::Esc));
        type_str(&mut m, "jk");
        assert!(m.composer().is_empty());
        assert!(!m.handle_paste("pasted"));
        assert!(m.composer().is_empty());
    }

    #[test]
    fn slash_focuses_and_seeds() {
        let mut m = signed_in();
        m.handle_key(&KeyEvent::plain(KeyCode::Esc));
        m.handle_key(&key('/'));
        assert!(m.is_composing());
        assert_eq!(m.composer().text(), "/");
    }

    #[test]
    fn q_quits_only_when_unfocused() {
        let mut m = signed_in();
        assert!(type_str(&mut m, "q").is_empty());
        assert_eq!(m.composer().text(), "q");
        m.handle_key(&KeyEvent::plain(KeyCode::Esc));
        assert_eq!(m.handle_key(&key('q')), vec![Effect::Quit]);
        assert_eq!(
            m.handle_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CTRL)),
            vec![Effect::Quit]
        );
        assert_eq!(m.handle_input(&InputEvent::CtrlC), vec![Effect::Quit]);
    }

    #[test]
    fn mention_pool_comes_from_state() {
        let mut m = signed_in();
        m.on_sync(SyncEvent::Logins(Ok(vec!["alice".into(), "me".into()])));
        type_str(&mut m, "@");
        let ComposeMode::Mention(ac) = m.composer().mode() else {
            panic!("expected mention mode");
        };
        assert_eq!(ac.matches(), &["alice".to_string()][..]);
    }

    #[test]
    fn project_pool_comes_from_state() {
        let mut m = signed_in();
        m.on_sync(SyncEvent::Projects(Ok(vec![Project {
            id: "p".into(),
            name: "Loom Engine".into(),
            insight: String::new(),
        }])));
        type_str(&mut m, "#");
        assert!(matches!(m.composer().mode(), ComposeMode::Project(_)));
    }

    #[test]
    fn snap_scroll_adopts_rendered_offset() {
        let mut m = signed_in();
        m.on_sync(polled(PollOrigin::Timer, vec![msg("a", "bob")]));
        m.handle_key(&KeyEvent::plain(KeyCode::Esc));
        m.handle_key(&key('k'));
        m.handle_key(&key('k'));
        m.snap_scroll(0, 20);
        assert_eq!(m.view().scroll, 0);
        assert_eq!(m.view().page, 20);
    }

    #[test]
    fn tick_blinks_cursor_and_expires_status() {
        let mut m = ChatModel::new(Duration::from_millis(0));
        assert!(m.view().cursor_visible());
        let mut redraws = 0;
        for _ in 0..BLINK_TICKS {
            if m.tick(Instant::now()) {
                redraws += 1;
            }
        }
        assert!(!m.view().cursor_visible());
        assert_eq!(redraws, 1);

        m.state_mut().set_status("x", Duration::from_millis(0));
        assert!(m.tick(Instant::now() + Duration::from_millis(5)));
        assert_eq!(m.state().status_text(), None);
    }
}
