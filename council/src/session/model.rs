//! Session snapshot types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::phase::Phase;
use crate::document::UploadedDocument;
use crate::ids::new_id;
use crate::run::DebateRun;

/// Title given to sessions created without one.
pub const DEFAULT_SESSION_TITLE: &str = "New Council Session";

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Council,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Council => write!(f, "council"),
        }
    }
}

/// A factor pulled out of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factor {
    pub id: String,
    pub text: String,
    pub extracted: bool,
}

/// A chat-log entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factors: Option<Vec<Factor>>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            factors: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn council(content: impl Into<String>) -> Self {
        Self::new(Role::Council, content)
    }
}

/// A conversation with the council. Replaced wholesale on every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<Message>,
    pub documents: Vec<UploadedDocument>,
    pub debate_runs: Vec<DebateRun>,
    pub current_run_id: Option<String>,
    pub phase: Phase,
}

impl Session {
    /// Empty idle session.
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            title: title.into(),
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
            documents: Vec::new(),
            debate_runs: Vec::new(),
            current_run_id: None,
            phase: Phase::Idle,
        }
    }

    /// Document attached to the next query.
    pub fn latest_document(&self) -> Option<&UploadedDocument> {
        self.documents.last()
    }

    pub fn run(&self, run_id: &str) -> Option<&DebateRun> {
        self.debate_runs.iter().find(|r| r.id == run_id)
    }

    /// Run `current_run_id` points at.
    pub fn current_run(&self) -> Option<&DebateRun> {
        self.current_run_id.as_deref().and_then(|id| self.run(id))
    }

    /// Most recently started run.
    pub fn latest_run(&self) -> Option<&DebateRun> {
        self.debate_runs.last()
    }

    /// Whether a run is between submission and commit.
    pub fn is_busy(&self) -> bool {
        self.phase.is_in_flight()
    }
}

/// Session title derived from the first query: the first `max_chars`
/// characters, with `...` appended when truncated.
pub fn title_from_query(query: &str, max_chars: usize) -> String {
    let mut chars = query.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
