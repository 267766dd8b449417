use crate::{log_paste, map_key};
use core_events::{
    ASYNC_INPUT_STARTS, ASYNC_INPUT_STOP_CHANNEL, ASYNC_INPUT_STOP_ERROR, ASYNC_INPUT_STOP_SIGNAL,
    ASYNC_INPUT_STOP_STREAM, CHANNEL_SEND_FAILURES, Event, InputEvent, KEYPRESS_TOTAL, PASTE_BYTES,
    PASTE_EVENTS,
};
use core_text::segment::normalize_paste;
use crossterm::event::{
    Event as CEvent, KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyEventKind as CKind,
    KeyModifiers as CMods,
};
use std::io;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::{Notify, mpsc::Sender};
use tokio::task;
use tokio_stream::StreamExt;
use tracing::{info, trace, warn};

#[derive(Clone, Debug)]
pub struct AsyncInputShutdown {
    notify: Arc<Notify>,
}

impl AsyncInputShutdown {
    pub fn signal(&self) {
        self.notify.notify_one();
    }
}

#[derive(Clone, Debug)]
struct ShutdownListener {
    notify: Arc<Notify>,
}

impl ShutdownListener {
    fn new_pair() -> (AsyncInputShutdown, Self) {
        let notify = Arc::new(Notify::new());
        (
            AsyncInputShutdown {
                notify: notify.clone(),
            },
            ShutdownListener { notify },
        )
    }

    async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// Spawn a Tokio task pumping `stream` into the event channel.
pub(crate) fn spawn_stream_task<S>(
    sender: Sender<Event>,
    stream: S,
) -> (task::JoinHandle<()>, AsyncInputShutdown)
where
    S: tokio_stream::Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
{
    let (shutdown, listener) = ShutdownListener::new_pair();
    let handle = task::spawn(async move {
        let span = tracing::debug_span!(target: "input.thread", "input_async_task");
        let _enter = span.enter();
        AsyncEventStreamTask::new(sender, stream, listener).run().await;
    });
    (handle, shutdown)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExitReason {
    ShutdownSignal,
    ChannelClosed,
    StreamEnded,
    StreamError,
}

impl ExitReason {
    fn as_str(&self) -> &'static str {
        match self {
            ExitReason::ShutdownSignal => "shutdown_signal",
            ExitReason::ChannelClosed => "channel_closed",
            ExitReason::StreamEnded => "stream_ended",
            ExitReason::StreamError => "stream_error",
        }
    }
}

struct AsyncEventStreamTask<S>
where
    S: tokio_stream::Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
{
    sender: Sender<Event>,
    stream: S,
    shutdown: ShutdownListener,
    stream_error: Option<io::ErrorKind>,
}

impl<S> AsyncEventStreamTask<S>
where
    S: tokio_stream::Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
{
    fn new(sender: Sender<Event>, stream: S, shutdown: ShutdownListener) -> Self {
        Self {
            sender,
            stream,
            shutdown,
            stream_error: None,
        }
    }

    async fn run(mut self) {
        info!(target: "input.thread", "async_input_task_started");
        ASYNC_INPUT_STARTS.fetch_add(1, Ordering::Relaxed);
        let reason = loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.wait() => break ExitReason::ShutdownSignal,
                result = self.stream.next() => result,
            };
            let Some(result) = next else {
                break ExitReason::StreamEnded;
            };
            let event = match result {
                Ok(ev) => self.translate(ev),
                Err(err) => {
                    self.stream_error = Some(err.kind());
                    break ExitReason::StreamError;
                }
            };
            if let Some(event) = event
                && !self.send_event(event).await
            {
                break ExitReason::ChannelClosed;
            }
        };

        let counter = match reason {
            ExitReason::ShutdownSignal => &ASYNC_INPUT_STOP_SIGNAL,
            ExitReason::ChannelClosed => &ASYNC_INPUT_STOP_CHANNEL,
            ExitReason::StreamEnded => &ASYNC_INPUT_STOP_STREAM,
            ExitReason::StreamError => &ASYNC_INPUT_STOP_ERROR,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if reason == ExitReason::StreamError {
            warn!(target: "input.thread", error_kind = ?self.stream_error, "async_input_task_stream_error");
        }
        info!(target: "input.thread", reason = reason.as_str(), "async_input_task_stopped");
    }

    fn translate(&self, ev: CEvent) -> Option<Event> {
        let input = match ev {
            CEvent::Key(key) => self.translate_key(key)?,
            CEvent::Paste(data) => {
                let text = normalize_paste(&data);
                log_paste(data.len(), text.len());
                PASTE_EVENTS.fetch_add(1, Ordering::Relaxed);
                PASTE_BYTES.fetch_add(text.len() as u64, Ordering::Relaxed);
                InputEvent::Paste(text)
            }
            CEvent::Resize(w, h) => {
                trace!(target: "input.event", w, h, "resize");
                InputEvent::Resize(w, h)
            }
            CEvent::FocusGained => InputEvent::FocusGained,
            CEvent::FocusLost => InputEvent::FocusLost,
            CEvent::Mouse(_) => return None,
        };
        Some(Event::Input(input))
    }

    fn translate_key(&self, key: CKeyEvent) -> Option<InputEvent> {
        if !matches!(key.kind, CKind::Press | CKind::Repeat) {
            return None;
        }
        if key.code == CKeyCode::Char('c') && key.modifiers.contains(CMods::CONTROL) {
            return Some(InputEvent::CtrlC);
        }
        let mapped = map_key(&key)?;
        trace!(target: "input.event", kind = "keypress", mods = ?mapped.mods);
        KEYPRESS_TOTAL.fetch_add(1, Ordering::Relaxed);
        Some(InputEvent::Key(mapped))
    }

    async fn send_event(&mut self, event: Event) -> bool {
        if self.sender.send(event).await.is_err() {
            CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }
}
