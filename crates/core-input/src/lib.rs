//! Async input service: `crossterm::EventStream` to [`core_events::Event`].
//!
//! Key presses and repeats become [`InputEvent::Key`]; key releases are
//! dropped. Ctrl-C is surfaced as its own event so it quits regardless of
//! focus. Bracketed pastes arrive as one NFC-normalized [`InputEvent::Paste`];
//! their content is never logged, only lengths.

mod async_service;
pub use async_service::AsyncInputShutdown;

use async_service::spawn_stream_task;

use core_events::{Event, InputEvent, KeyCode, KeyEvent, KeyModifiers};
use crossterm::event::{
    Event as CEvent, EventStream, KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyModifiers as CMods,
};
use std::io;
use tokio::task::JoinHandle;

#[inline]
pub(crate) fn log_paste(raw_len: usize, normalized_len: usize) {
    tracing::trace!(target: "input.paste", raw_len, normalized_len, "paste_received");
}

/// Spawn the async input service backed by `crossterm::EventStream`.
///
/// Returns the `JoinHandle` for the background task alongside a shutdown handle
/// that can be used to request immediate termination.
pub fn spawn_async_input(
    sender: tokio::sync::mpsc::Sender<Event>,
) -> (JoinHandle<()>, AsyncInputShutdown) {
    spawn_stream_task(sender, EventStream::new())
}

/// Same pipeline over an arbitrary terminal event stream.
pub fn spawn_input_from_stream<S>(
    sender: tokio::sync::mpsc::Sender<Event>,
    stream: S,
) -> (JoinHandle<()>, AsyncInputShutdown)
where
    S: tokio_stream::Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
{
    spawn_stream_task(sender, stream)
}

pub(crate) fn map_mods(m: CMods) -> KeyModifiers {
    let mut out = KeyModifiers::empty();
    if m.contains(CMods::CONTROL) {
        out |= KeyModifiers::CTRL;
    }
    if m.contains(CMods::ALT) {
        out |= KeyModifiers::ALT;
    }
    if m.contains(CMods::SHIFT) {
        out |= KeyModifiers::SHIFT;
    }
    out
}

/// Map a crossterm key to the client's key model; unsupported keys yield `None`.
pub fn map_key(key: &CKeyEvent) -> Option<KeyEvent> {
    let code = match key.code {
        CKeyCode::Char(c) => KeyCode::Char(c),
        CKeyCode::Enter => KeyCode::Enter,
        CKeyCode::Esc => KeyCode::Esc,
        CKeyCode::Backspace => KeyCode::Backspace,
        CKeyCode::Tab => KeyCode::Tab,
        CKeyCode::BackTab => KeyCode::BackTab,
        CKeyCode::Up => KeyCode::Up,
        CKeyCode::Down => KeyCode::Down,
        CKeyCode::Left => KeyCode::Left,
        CKeyCode::Right => KeyCode::Right,
        CKeyCode::Home => KeyCode::Home,
        CKeyCode::End => KeyCode::End,
        CKeyCode::PageUp => KeyCode::PageUp,
        CKeyCode::PageDown => KeyCode::PageDown,
        CKeyCode::Delete => KeyCode::Delete,
        CKeyCode::F(n) => KeyCode::F(n),
        _ => return None,
    };
    Some(KeyEvent::new(code, map_mods(key.modifiers)))
}

/// Whether this input ends the session regardless of focus.
pub fn is_interrupt(input: &InputEvent) -> bool {
    matches!(input, InputEvent::CtrlC)
}
