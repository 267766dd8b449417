//! Chat backend collaborator: wire types, error taxonomy, and the
//! `ChatBackend` seam the runtime talks through.
//!
//! The runtime never touches HTTP directly. It holds an `Arc<dyn ChatBackend>`
//! and spawns the calls onto tokio tasks; results come back through the event
//! channel as plain values (`ClientError` is `Clone` for that reason).

mod error;
mod http;
mod types;

pub use error::ClientError;
pub use http::{HttpBackend, HttpBackendConfig};
pub use types::{Identity, MagicianCard, Presence, Project, ReactionCount, RoomMessage};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub type ClientResult<T> = Result<T, ClientError>;

/// Reaction summaries keyed by message id.
pub type ReactionMap = HashMap<String, Vec<ReactionCount>>;

/// Request/response operations consumed by the chat surface.
#[async_trait]
pub trait ChatBackend: Send + Sync + 'static {
    /// Most recent page of messages, optionally strictly older than `before`.
    async fn fetch_messages(
        &self,
        room: &str,
        before: Option<DateTime<Utc>>,
        limit: usize,
    ) -> ClientResult<Vec<RoomMessage>>;

    async fn fetch_presence(&self, room: &str) -> ClientResult<Presence>;

    async fn send_message(&self, room: &str, body: &str) -> ClientResult<RoomMessage>;

    /// Empty `ids` short-circuits to an empty map without a request.
    async fn fetch_reaction_counts(&self, room: &str, ids: &[String]) -> ClientResult<ReactionMap>;

    async fn list_known_logins(&self) -> ClientResult<Vec<String>>;

    async fn list_projects(&self) -> ClientResult<Vec<Project>>;

    /// Local identity; `Ok(None)` when no credentials are configured.
    async fn fetch_identity(&self) -> ClientResult<Option<Identity>>;
}
