//! Single-context transcript parser over the token stream.

use chrono::Utc;
use tracing::debug;

use super::token::{tokenize, Token};
use super::{upsert_response, AgentResponse, DebateMessage};
use crate::ids::new_id;
use crate::roster::{AgentRef, Team};

/// Display name used before any header has been seen.
pub const DEFAULT_AGENT_NAME: &str = "Agent";

/// Output of a parse: every turn in order plus the per-speaker rollup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTranscript {
    pub messages: Vec<DebateMessage>,
    pub responses: Vec<AgentResponse>,
}

/// Current speaker context and the content buffer of the open turn.
#[derive(Debug)]
pub struct TranscriptParser {
    agent: AgentRef,
    agent_name: String,
    team: Team,
    buffer: String,
    out: ParsedTranscript,
}

impl Default for TranscriptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptParser {
    /// Parser positioned on the default context (first pro agent).
    pub fn new() -> Self {
        Self {
            agent: AgentRef::default(),
            agent_name: DEFAULT_AGENT_NAME.to_string(),
            team: Team::Pro,
            buffer: String::new(),
            out: ParsedTranscript::default(),
        }
    }

    /// Feed one token.
    pub fn push(&mut self, token: Token<'_>) {
        match token {
            Token::Header { name, team } => {
                self.flush();
                self.agent = AgentRef::from_display_name(name);
                self.agent_name = name.to_string();
                self.team = team;
            }
            Token::Metadata => {}
            Token::Content(line) => {
                self.buffer.push_str(line);
                self.buffer.push('\n');
            }
        }
    }

    /// Emit the open turn. No-op when the buffer is blank.
    pub fn flush(&mut self) {
        let content = self.buffer.trim();
        if !content.is_empty() {
            let message = DebateMessage {
                id: new_id(),
                agent: self.agent.clone(),
                agent_name: self.agent_name.clone(),
                team: self.team,
                content: content.to_string(),
                timestamp: Utc::now(),
            };
            upsert_response(&mut self.out.responses, &message);
            self.out.messages.push(message);
        }
        self.buffer.clear();
    }

    /// Flush the trailing turn and return the result.
    pub fn finish(mut self) -> ParsedTranscript {
        self.flush();
        self.out
    }
}

/// Parse a raw transcript.
pub fn parse_transcript(transcript: &str) -> ParsedTranscript {
    let mut parser = TranscriptParser::new();
    for token in tokenize(transcript) {
        parser.push(token);
    }
    let parsed = parser.finish();
    debug!(
        turns = parsed.messages.len(),
        speakers = parsed.responses.len(),
        "parsed debate transcript"
    );
    parsed
}
