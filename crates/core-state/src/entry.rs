//! Displayable log entries and their normalization from wire messages.

use chrono::{DateTime, Utc};
use core_client::{ReactionCount, RoomMessage};
use core_text::segment::strip_controls;
use std::collections::BTreeMap;

/// Frames an entrance animation runs before the entry turns static.
pub const ANIM_FRAMES: u8 = 20;

/// Closed set of entry layouts. Unknown kind strings are kept verbatim and
/// laid out like plain messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Plain,
    BuildStart,
    BuildUpdate,
    Ship,
    Seek,
    Verdict,
    Cast,
    Other(String),
}

impl EntryKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "" | "message" | "plain" => Self::Plain,
            "build-start" => Self::BuildStart,
            "build-update" => Self::BuildUpdate,
            "ship" => Self::Ship,
            "seek" => Self::Seek,
            "forge-verdict" => Self::Verdict,
            "cast" => Self::Cast,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain => "message",
            Self::BuildStart => "build-start",
            Self::BuildUpdate => "build-update",
            Self::Ship => "ship",
            Self::Seek => "seek",
            Self::Verdict => "forge-verdict",
            Self::Cast => "cast",
            Self::Other(s) => s,
        }
    }

    /// Rich kinds get their own layout and an entrance animation.
    pub fn is_rich(&self) -> bool {
        !matches!(self, Self::Plain | Self::Other(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    /// `None` for synthesized entries; those never take part in dedup.
    pub id: Option<String>,
    pub sender_login: String,
    pub sender_group: String,
    pub body: String,
    pub kind: EntryKind,
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub is_system: bool,
    pub is_mine: bool,
    pub reactions: Vec<ReactionCount>,
    /// 0 = static, 1..=ANIM_FRAMES = animating.
    pub anim_frame: u8,
}

impl ChatEntry {
    /// Normalize a fetched message. Malformed metadata degrades to an empty map.
    /// Control runes are stripped from every server-supplied string.
    pub fn from_message(msg: &RoomMessage, my_login: Option<&str>) -> Self {
        let kind = EntryKind::parse(&msg.kind);
        let anim_frame = if kind.is_rich() { 1 } else { 0 };
        Self {
            id: Some(msg.id.clone()),
            sender_login: strip_controls(&msg.sender_login),
            sender_group: strip_controls(&msg.sender_guild),
            body: strip_controls(&msg.body),
            kind,
            metadata: flatten_metadata(msg.metadata.as_ref()),
            created_at: msg.created_at,
            is_system: false,
            is_mine: my_login.is_some_and(|me| !me.is_empty() && me == msg.sender_login),
            reactions: Vec::new(),
            anim_frame,
        }
    }

    /// Synthesized notice (presence join/leave).
    pub fn system(text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            sender_login: String::new(),
            sender_group: String::new(),
            body: text.into(),
            kind: EntryKind::Plain,
            metadata: BTreeMap::new(),
            created_at: at,
            is_system: true,
            is_mine: false,
            reactions: Vec::new(),
            anim_frame: 0,
        }
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// `metadata["title"]`, falling back to the body.
    pub fn title(&self) -> &str {
        self.meta("title").unwrap_or(&self.body)
    }

    pub fn is_animating(&self) -> bool {
        (1..=ANIM_FRAMES).contains(&self.anim_frame)
    }

    /// Advance one animation frame; returns true while still animating.
    pub fn advance_animation(&mut self) -> bool {
        if !self.is_animating() {
            return false;
        }
        self.anim_frame += 1;
        if self.anim_frame > ANIM_FRAMES {
            self.anim_frame = 0;
        }
        true
    }
}

/// Flatten a metadata payload into a string map. Objects keep string values
/// as-is and other values as their JSON text; a string payload is parsed as
/// embedded JSON. Anything else is an empty map.
fn flatten_metadata(raw: Option<&serde_json::Value>) -> BTreeMap<String, String> {
    use serde_json::Value;
    let embedded;
    let value = match raw {
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(v) => {
                embedded = v;
                &embedded
            }
            Err(_) => return BTreeMap::new(),
        },
        Some(v) => v,
        None => return BTreeMap::new(),
    };
    let Value::Object(map) = value else {
        return BTreeMap::new();
    };
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let text = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), strip_controls(&text))
        })
        .collect()
}
