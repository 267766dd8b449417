//! Effect execution: turns model [`Effect`]s into background fetch tasks whose
//! results come back on the event channel as [`SyncEvent`]s.
//!
//! Tasks never touch chat state; the loop applies their results in arrival
//! order on its own task. Only the poll timer is owned here: arming replaces
//! any pending timer, so at most one timer-driven poll chain exists.

use core_client::ChatBackend;
use core_events::{CHANNEL_SEND_FAILURES, Event, PollOrigin, PollTimer, SyncEvent};
use core_model::Effect;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tracing::trace;

pub struct EffectExecutor {
    backend: Arc<dyn ChatBackend>,
    room: String,
    page_size: usize,
    tx: Sender<Event>,
    poll_timer: PollTimer,
}

fn effect_name(effect: &Effect) -> &'static str {
    match effect {
        Effect::Poll(PollOrigin::Timer) => "poll_timer",
        Effect::Poll(PollOrigin::Refresh) => "poll_refresh",
        Effect::ArmPoll => "arm_poll",
        Effect::FetchReactions(_) => "fetch_reactions",
        Effect::SendMessage(_) => "send_message",
        Effect::RefreshProjects => "refresh_projects",
        Effect::Quit => "quit",
    }
}

async fn deliver(tx: &Sender<Event>, event: SyncEvent) {
    if tx.send(Event::Sync(event)).await.is_err() {
        CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
    }
}

impl EffectExecutor {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        room: impl Into<String>,
        page_size: usize,
        poll_interval: Duration,
        tx: Sender<Event>,
    ) -> Self {
        Self {
            backend,
            room: room.into(),
            page_size,
            tx,
            poll_timer: PollTimer::new(poll_interval),
        }
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    /// Run one effect. Returns true when the effect asks the loop to quit.
    pub fn execute(&mut self, effect: Effect) -> bool {
        trace!(target: "runtime.effects", effect = effect_name(&effect), "execute");
        match effect {
            Effect::Poll(origin) => self.spawn_poll(origin),
            Effect::ArmPoll => self.poll_timer.arm(&self.tx),
            Effect::FetchReactions(ids) => self.spawn_reactions(ids),
            Effect::SendMessage(body) => self.spawn_send(body),
            Effect::RefreshProjects => self.spawn_projects(),
            Effect::Quit => return true,
        }
        false
    }

    /// One-shot startup fetches: identity and both autocomplete pools.
    pub fn bootstrap(&self) {
        let backend = self.backend.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            deliver(&tx, SyncEvent::Identity(backend.fetch_identity().await)).await;
        });
        let backend = self.backend.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            deliver(&tx, SyncEvent::Logins(backend.list_known_logins().await)).await;
        });
        self.spawn_projects();
    }

    /// Messages and presence are fetched concurrently and delivered together.
    fn spawn_poll(&self, origin: PollOrigin) {
        let backend = self.backend.clone();
        let tx = self.tx.clone();
        let room = self.room.clone();
        let limit = self.page_size;
        tokio::spawn(async move {
            let (messages, presence) = tokio::join!(
                backend.fetch_messages(&room, None, limit),
                backend.fetch_presence(&room)
            );
            deliver(
                &tx,
                SyncEvent::Polled {
                    origin,
                    messages,
                    presence,
                },
            )
            .await;
        });
    }

    fn spawn_reactions(&self, ids: Vec<String>) {
        let backend = self.backend.clone();
        let tx = self.tx.clone();
        let room = self.room.clone();
        tokio::spawn(async move {
            let result = backend.fetch_reaction_counts(&room, &ids).await;
            deliver(&tx, SyncEvent::Reactions(result)).await;
        });
    }

    fn spawn_send(&self, body: String) {
        let backend = self.backend.clone();
        let tx = self.tx.clone();
        let room = self.room.clone();
        tokio::spawn(async move {
            let result = backend.send_message(&room, &body).await;
            deliver(&tx, SyncEvent::Sent(result)).await;
        });
    }

    fn spawn_projects(&self) {
        let backend = self.backend.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            deliver(&tx, SyncEvent::Projects(backend.list_projects().await)).await;
        });
    }

    pub fn poll_armed(&self) -> bool {
        self.poll_timer.is_armed()
    }

    pub fn shutdown(&mut self) {
        self.poll_timer.cancel();
    }
}
