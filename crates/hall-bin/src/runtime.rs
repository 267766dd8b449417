//! Single-task event loop.
//!
//! Every state mutation happens here, one event at a time: terminal input,
//! sync results from fetch tasks, and animation ticks. Each handled event may
//! yield effects, which the executor turns into background work. A frame is
//! painted after any event that changed what is on screen, and the scroll
//! offset the renderer settled on is fed back into the model.

use crate::effects::EffectExecutor;
use anyhow::Result;
use chrono::Local;
use core_events::{Event, InputEvent};
use core_model::{ChatModel, Effect};
use core_render::RenderEngine;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, trace, warn};

const SOURCE_STOP_TIMEOUT: Duration = Duration::from_millis(200);
const INPUT_STOP_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    CtrlC,
    Quit,
    ShutdownEvent,
    ChannelClosed,
}

impl ShutdownReason {
    fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::CtrlC => "ctrl_c",
            ShutdownReason::Quit => "quit",
            ShutdownReason::ShutdownEvent => "shutdown_event",
            ShutdownReason::ChannelClosed => "channel_closed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoopControl {
    Continue { redraw: bool },
    Break { reason: ShutdownReason },
}

fn log_shutdown_stage(reason: ShutdownReason, stage: &'static str) {
    info!(
        target: "runtime.shutdown",
        reason = reason.as_str(),
        stage = stage,
        "shutdown_stage"
    );
}

pub struct ChatRuntime {
    model: ChatModel,
    effects: EffectExecutor,
    engine: RenderEngine,
    rx: mpsc::Receiver<Event>,
    size: (u16, u16),
    source_handles: Vec<JoinHandle<()>>,
    input_task: Option<JoinHandle<()>>,
    input_shutdown: Option<core_input::AsyncInputShutdown>,
}

impl ChatRuntime {
    pub fn new(
        model: ChatModel,
        effects: EffectExecutor,
        rx: mpsc::Receiver<Event>,
        size: (u16, u16),
    ) -> Self {
        Self {
            model,
            effects,
            engine: RenderEngine::new(),
            rx,
            size,
            source_handles: Vec::new(),
            input_task: None,
            input_shutdown: None,
        }
    }

    pub fn attach_tasks(
        &mut self,
        input_task: JoinHandle<()>,
        input_shutdown: core_input::AsyncInputShutdown,
        source_handles: Vec<JoinHandle<()>>,
    ) {
        self.input_task = Some(input_task);
        self.input_shutdown = Some(input_shutdown);
        self.source_handles = source_handles;
    }

    pub fn model(&self) -> &ChatModel {
        &self.model
    }

    /// Kick off the first poll and the one-shot bootstrap fetches.
    pub fn start(&mut self) {
        self.effects.bootstrap();
        let effects = self.model.startup();
        self.apply_effects(effects);
    }

    pub async fn run(&mut self) -> Result<()> {
        self.start();
        self.paint();

        info!(target: "runtime", room = self.effects.room(), "event_loop_started");

        let mut shutdown_reason = ShutdownReason::ChannelClosed;
        while let Some(event) = self.rx.recv().await {
            match self.handle_event(event) {
                LoopControl::Break { reason } => {
                    shutdown_reason = reason;
                    break;
                }
                LoopControl::Continue { redraw: true } => self.paint(),
                LoopControl::Continue { redraw: false } => {}
            }
        }

        self.rx.close();
        self.finalize_shutdown(shutdown_reason).await;
        Ok(())
    }

    /// Apply one event to the model and run the effects it yields.
    pub fn handle_event(&mut self, event: Event) -> LoopControl {
        let (effects, redraw) = match event {
            Event::Input(input) => {
                if core_input::is_interrupt(&input) {
                    info!(target: "runtime", "ctrl_c");
                    return LoopControl::Break {
                        reason: ShutdownReason::CtrlC,
                    };
                }
                if let InputEvent::Resize(w, h) = input {
                    trace!(target: "runtime.events", w, h, "resize");
                    self.size = (w, h);
                    self.engine.invalidate_for_resize();
                }
                (self.model.handle_input(&input), true)
            }
            Event::Sync(sync) => (self.model.on_sync(sync), true),
            Event::Tick => (Vec::new(), self.model.tick(Instant::now())),
            Event::RenderRequested => (Vec::new(), true),
            Event::Shutdown => {
                return LoopControl::Break {
                    reason: ShutdownReason::ShutdownEvent,
                };
            }
        };
        if self.apply_effects(effects) {
            return LoopControl::Break {
                reason: ShutdownReason::Quit,
            };
        }
        LoopControl::Continue { redraw }
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) -> bool {
        let mut quit = false;
        for effect in effects {
            quit |= self.effects.execute(effect);
        }
        quit
    }

    fn paint(&mut self) {
        let (w, h) = self.size;
        let frame = core_render::render(&self.model, w, h, Local::now().fixed_offset());
        self.model.snap_scroll(frame.scroll, frame.log_height);
        if let Err(e) = self.engine.render(&frame, w, h) {
            error!(target: "render.engine", ?e, "render_error");
        }
    }

    async fn finalize_shutdown(&mut self, reason: ShutdownReason) {
        log_shutdown_stage(reason, "begin");
        self.effects.shutdown();

        if let Some(shutdown) = self.input_shutdown.take() {
            trace!(target: "runtime.shutdown", reason = reason.as_str(), "input_task_shutdown_signal");
            shutdown.signal();
        }
        if let Some(handle) = self.input_task.take() {
            match tokio::time::timeout(INPUT_STOP_TIMEOUT, handle).await {
                Ok(Ok(())) => trace!(target: "runtime.shutdown", "input_task_joined"),
                Ok(Err(err)) => error!(target: "runtime.shutdown", ?err, "input_task_join_failed"),
                Err(_) => warn!(target: "runtime.shutdown", "input_task_timeout"),
            }
        }

        for handle in self.source_handles.drain(..) {
            handle.abort();
            match tokio::time::timeout(SOURCE_STOP_TIMEOUT, handle).await {
                Ok(Err(err)) if !err.is_cancelled() => {
                    error!(target: "runtime.shutdown", ?err, "event_source_task_error");
                }
                Ok(_) => trace!(target: "runtime.shutdown", "event_source_task_stopped"),
                Err(_) => warn!(target: "runtime.shutdown", "event_source_task_timeout"),
            }
        }

        log_shutdown_stage(reason, "complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::tests::{MockBackend, message};
    use core_client::{ClientError, Presence};
    use core_events::{KeyCode, KeyEvent, PollOrigin, SyncEvent};
    use std::sync::Arc;

    fn runtime(backend: Arc<MockBackend>) -> ChatRuntime {
        let (tx, rx) = mpsc::channel(32);
        let effects = EffectExecutor::new(backend, "the-hall", 50, Duration::from_secs(60), tx);
        ChatRuntime::new(ChatModel::new(Duration::from_secs(4)), effects, rx, (80, 24))
    }

    async fn next_sync(rt: &mut ChatRuntime) -> SyncEvent {
        match tokio::time::timeout(Duration::from_secs(1), rt.rx.recv()).await {
            Ok(Some(Event::Sync(ev))) => ev,
            other => panic!("expected sync event, got {other:?}"),
        }
    }

    fn key(c: char) -> Event {
        Event::Input(InputEvent::Key(KeyEvent::plain(KeyCode::Char(c))))
    }

    #[tokio::test]
    async fn timer_poll_merges_then_fetches_reactions() {
        let mut rt = runtime(Arc::new(MockBackend::default()));
        let polled = Event::Sync(SyncEvent::Polled {
            origin: PollOrigin::Timer,
            messages: Ok(vec![message("m1", "bob", "hello")]),
            presence: Ok(Presence::default()),
        });
        assert_eq!(rt.handle_event(polled), LoopControl::Continue { redraw: true });
        assert_eq!(rt.model().state().window.len(), 1);
        assert!(rt.model().state().is_connected());
        assert!(rt.effects.poll_armed());

        match next_sync(&mut rt).await {
            SyncEvent::Reactions(Ok(map)) => assert!(map.contains_key("m1")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_poll_keeps_polling_without_reactions() {
        let mut rt = runtime(Arc::new(MockBackend::default()));
        rt.handle_event(Event::Sync(SyncEvent::Polled {
            origin: PollOrigin::Timer,
            messages: Err(ClientError::Transport("down".into())),
            presence: Ok(Presence::default()),
        }));
        assert!(rt.effects.poll_armed());
        assert!(rt.model().state().last_error().is_some());
        let got = tokio::time::timeout(Duration::from_millis(50), rt.rx.recv()).await;
        assert!(got.is_err(), "no reaction fetch after a failed poll");
    }

    #[tokio::test]
    async fn submit_sends_then_refreshes() {
        let backend = Arc::new(MockBackend::default());
        let mut rt = runtime(backend.clone());
        rt.handle_event(Event::Sync(SyncEvent::Identity(Ok(Some(core_client::Identity {
            github_login: "me".into(),
            guild_id: String::new(),
        })))));
        for c in "hi".chars() {
            rt.handle_event(key(c));
        }
        rt.handle_event(Event::Input(InputEvent::Key(KeyEvent::plain(KeyCode::Enter))));

        let sent = next_sync(&mut rt).await;
        assert!(matches!(sent, SyncEvent::Sent(Ok(_))));
        rt.handle_event(Event::Sync(sent));
        match next_sync(&mut rt).await {
            SyncEvent::Polled { origin, .. } => assert_eq!(origin, PollOrigin::Refresh),
            other => panic!("unexpected {other:?}"),
        }
        assert!(!rt.effects.poll_armed(), "refresh polls do not arm the timer");
        assert_eq!(backend.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ctrl_c_and_quit_break_the_loop() {
        let mut rt = runtime(Arc::new(MockBackend::default()));
        assert_eq!(
            rt.handle_event(Event::Input(InputEvent::CtrlC)),
            LoopControl::Break {
                reason: ShutdownReason::CtrlC
            }
        );
        rt.handle_event(Event::Input(InputEvent::Key(KeyEvent::plain(KeyCode::Esc))));
        assert_eq!(
            rt.handle_event(key('q')),
            LoopControl::Break {
                reason: ShutdownReason::Quit
            }
        );
    }

    #[tokio::test]
    async fn idle_tick_skips_redraw_until_blink_flips() {
        let mut rt = runtime(Arc::new(MockBackend::default()));
        let first = rt.handle_event(Event::Tick);
        assert_eq!(first, LoopControl::Continue { redraw: false });
        let mut flipped = false;
        for _ in 0..12 {
            if rt.handle_event(Event::Tick) == (LoopControl::Continue { redraw: true }) {
                flipped = true;
            }
        }
        assert!(flipped, "cursor blink should request a redraw");
    }

    #[tokio::test]
    async fn resize_updates_size() {
        let mut rt = runtime(Arc::new(MockBackend::default()));
        rt.handle_event(Event::Input(InputEvent::Resize(120, 40)));
        assert_eq!(rt.size, (120, 40));
    }
}
