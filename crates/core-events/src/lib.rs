//! Core event types and channel helpers for the chat client.
//!
//! Everything that mutates chat state arrives on one bounded mpsc channel as an
//! [`Event`]: terminal input from the input service, sync results from
//! background fetch tasks, and timer ticks. The runtime drains the channel on a
//! single task so no two state mutations ever race.

use core_client::{
    ClientResult, Identity, Presence, Project, ReactionMap, RoomMessage,
};
use std::fmt;
use std::sync::atomic::AtomicU64;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

// -------------------------------------------------------------------------------------------------
// Channel Policy
// -------------------------------------------------------------------------------------------------
// Bounded channel sized by `EVENT_CHANNEL_CAP`. Producers await on a full channel rather than
// dropping events; the consumer never blocks on network I/O so the queue drains quickly. A closed
// channel is the shutdown signal for every producer.
// -------------------------------------------------------------------------------------------------
pub const EVENT_CHANNEL_CAP: usize = 1024;

// -------------------------------------------------------------------------------------------------
// Telemetry
// -------------------------------------------------------------------------------------------------
pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
pub static KEYPRESS_TOTAL: AtomicU64 = AtomicU64::new(0);
pub static PASTE_EVENTS: AtomicU64 = AtomicU64::new(0);
pub static PASTE_BYTES: AtomicU64 = AtomicU64::new(0);
pub static POLL_TIMER_ARMS: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STARTS: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOP_SIGNAL: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOP_CHANNEL: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOP_STREAM: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOP_ERROR: AtomicU64 = AtomicU64::new(0);

/// Top-level event enum consumed by the central event loop.
#[derive(Debug, Clone)]
pub enum Event {
    Input(InputEvent),
    Sync(SyncEvent),
    RenderRequested,
    /// Animation/blink frame tick.
    Tick,
    Shutdown,
}

/// Normalized terminal input.
#[derive(Debug, Clone)]
pub enum InputEvent {
    Key(KeyEvent),
    /// Bracketed paste payload, already NFC normalized. Never logged verbatim.
    Paste(String),
    /// Terminal resize (columns, rows).
    Resize(u16, u16),
    /// Ctrl-C surfaced distinctly so it quits regardless of focus.
    CtrlC,
    FocusGained,
    FocusLost,
}

/// Why a poll was started; only timer-driven polls re-arm the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOrigin {
    Timer,
    Refresh,
}

/// Results delivered by background fetch tasks.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// The poll timer fired; the loop starts a fetch.
    PollDue,
    /// Messages and presence fetched concurrently for one poll, merged in one step.
    Polled {
        origin: PollOrigin,
        messages: ClientResult<Vec<RoomMessage>>,
        presence: ClientResult<Presence>,
    },
    Reactions(ClientResult<ReactionMap>),
    Sent(ClientResult<RoomMessage>),
    Identity(ClientResult<Option<Identity>>),
    Logins(ClientResult<Vec<String>>),
    Projects(ClientResult<Vec<Project>>),
}

// -------------------------------------------------------------------------------------------------
// Async Event Sources
// -------------------------------------------------------------------------------------------------

/// Trait implemented by any long-lived async event producer. Implementors hold their
/// configuration and spawn one background task that pushes `Event`s into the shared channel.
pub trait AsyncEventSource: Send + 'static {
    /// Stable identifier used in logs.
    fn name(&self) -> &'static str;
    /// Consume self and spawn the background task. Implementors stop when `tx.send(..).await`
    /// returns Err (channel closed).
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

/// Registry of event sources spawned together at startup.
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl Default for EventSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    /// Spawn all registered sources, returning their JoinHandles. Each source gets its own
    /// `Sender` clone; the caller drops its last clone during shutdown so sources observe the
    /// closed channel and exit.
    pub fn spawn_all(&mut self, tx: &Sender<Event>) -> Vec<JoinHandle<()>> {
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning event source");
            out.push(src.spawn(tx.clone()));
        }
        out
    }
}

/// Fixed-interval frame tick driving entrance animations and the cursor blink.
pub struct TickEventSource {
    interval: Duration,
}

impl TickEventSource {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl AsyncEventSource for TickEventSource {
    fn name(&self) -> &'static str {
        "tick"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let dur = self.interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(dur);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(Event::Tick).await.is_err() {
                    break;
                }
            }
        })
    }
}

/// One-shot poll timer re-armed by the loop after each poll result is merged.
///
/// At most one timer is pending: arming again replaces (aborts) the previous one, so
/// successive polls stay strictly sequential no matter how results interleave.
pub struct PollTimer {
    interval: Duration,
    pending: Option<JoinHandle<()>>,
}

impl PollTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Schedule a single `SyncEvent::PollDue` after the interval.
    pub fn arm(&mut self, tx: &Sender<Event>) {
        self.cancel();
        let tx = tx.clone();
        let dur = self.interval;
        POLL_TIMER_ARMS.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(dur).await;
            if tx.send(Event::Sync(SyncEvent::PollDue)).await.is_err() {
                CHANNEL_SEND_FAILURES.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            }
        }));
    }

    pub fn is_armed(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

// -------------------------------------------------------------------------------------------------
// Keys
// -------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

impl KeyEvent {
    pub const fn new(code: KeyCode, mods: KeyModifiers) -> Self {
        Self { code, mods }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::empty())
    }

    /// The printable rune carried by this key, if it inserts text. Shift is allowed
    /// (terminals report upper-case letters with it); Ctrl/Alt chords are not text.
    pub fn printable(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c)
                if !c.is_control() && !self.mods.intersects(KeyModifiers::CTRL | KeyModifiers::ALT) =>
            {
                Some(c)
            }
            _ => None,
        }
    }
}

/// Normalized logical key identities consumed by higher layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Tab,
    BackTab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Delete,
    F(u8),
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u8 {
        const CTRL = 0b0000_0001;
        const ALT  = 0b0000_0010;
        const SHIFT= 0b0000_0100;
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{:?}", self.code, self.mods)
    }
}
