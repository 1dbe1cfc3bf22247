//! Debate transcript parsing.
//!
//! A transcript is line-oriented text: turn headers (`[Pro-A] (PRO):`) open a
//! turn, structural markers are dropped, everything else belongs to the open
//! turn. Parsing never fails; malformed input only yields miscategorised
//! turns.
//!
//! ```text
//! lines ──tokenize──▶ Header | Metadata | Content ──TranscriptParser──▶ DebateMessage[]
//!                                                          │
//!                                                          └─upsert──▶ AgentResponse[]
//! ```

pub mod parser;
pub mod token;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::roster::{AgentRef, Team};

pub use parser::{parse_transcript, ParsedTranscript, TranscriptParser};
pub use token::{classify_line, tokenize, Token, METADATA_PREFIXES};

/// One turn of the debate. Never overwritten once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateMessage {
    pub id: String,
    pub agent: AgentRef,
    pub agent_name: String,
    pub team: Team,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Latest response per speaker, keyed by display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub agent: AgentRef,
    pub agent_name: String,
    pub team: Team,
    pub response: String,
}

/// Upsert `message` into `responses`: overwrite the entry with the same
/// display name, or append a new one.
pub fn upsert_response(responses: &mut Vec<AgentResponse>, message: &DebateMessage) {
    match responses
        .iter_mut()
        .find(|r| r.agent_name == message.agent_name)
    {
        Some(existing) => existing.response = message.content.clone(),
        None => responses.push(AgentResponse {
            agent: message.agent.clone(),
            agent_name: message.agent_name.clone(),
            team: message.team,
            response: message.content.clone(),
        }),
    }
}

/// Rollup of an existing message list.
pub fn rollup(messages: &[DebateMessage]) -> Vec<AgentResponse> {
    let mut responses = Vec::new();
    for message in messages {
        upsert_response(&mut responses, message);
    }
    responses
}
