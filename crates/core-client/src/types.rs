use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message as delivered by `/api/rooms/{slug}/messages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomMessage {
    pub id: String,
    #[serde(default)]
    pub room_id: String,
    #[serde(default)]
    pub sender_id: String,
    pub sender_login: String,
    #[serde(default)]
    pub sender_guild: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub kind: String,
    /// Raw metadata payload; interpretation is best-effort downstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    #[serde(default)]
    pub room_slug: String,
    #[serde(default)]
    pub count: usize,
    #[serde(rename = "magicians", default)]
    pub logins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCount {
    pub emoji: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub insight: String,
}

/// Directory card; only the login is consumed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicianCard {
    pub github_login: String,
    #[serde(default)]
    pub guild_id: String,
    #[serde(default)]
    pub online: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub github_login: String,
    #[serde(default)]
    pub guild_id: String,
}
