//! Record types for the session log, long-term notes, and index metadata.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flat metadata stored alongside every vector index entry.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Metadata key that separates long-term notes from document chunks.
pub const KIND_KEY: &str = "kind";
pub const KIND_NOTE: &str = "note";
pub const KIND_CHUNK: &str = "chunk";

/// Role of a session message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
    /// Free-form working note; the default when a caller names no role.
    #[default]
    Note,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Note => "note",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "system" => Ok(Self::System),
            "note" => Ok(Self::Note),
            _ => Err(format!(
                "unknown role: {s} (expected user, assistant, system or note)"
            )),
        }
    }
}

/// A row of the `messages` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: i64,
    pub session: String,
    pub agent: String,
    pub role: Role,
    pub content: String,
    /// Unix seconds with sub-second precision.
    pub timestamp: f64,
}

/// Caller-facing view of a session message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub agent: String,
    pub role: Role,
    pub content: String,
    pub ts: f64,
}

impl From<Message> for MessageRecord {
    fn from(m: Message) -> Self {
        Self {
            agent: m.agent,
            role: m.role,
            content: m.content,
            ts: m.timestamp,
        }
    }
}

/// A long-term note returned by recall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteHit {
    pub text: String,
    pub agent: String,
    pub tags: Vec<String>,
    /// L2 distance to the query; lower is more similar.
    pub score: f64,
}

/// Exact-match metadata constraints, combined with AND. Empty means unfiltered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFilter {
    constraints: BTreeMap<String, String>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constraint, replacing any earlier value for the same key.
    pub fn eq(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.constraints.insert(key.into(), value.into());
        self
    }

    /// Add a constraint only when `value` is present and non-empty.
    pub fn eq_opt(self, key: impl Into<String>, value: Option<&str>) -> Self {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => self.eq(key, v),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.constraints.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether `metadata` satisfies every constraint.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.iter().all(|(k, v)| {
            metadata.get(k).and_then(|value| value.as_str()) == Some(v)
        })
    }
}
