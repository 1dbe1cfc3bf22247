//! Debate runs: one query-to-verdict cycle each.
//!
//! A run is created `pending` at submission and resolved exactly once:
//!
//! ```text
//! Pending ──remote call ok──▶ Complete
//!    └──────remote call failed──▶ Error
//! ```

pub mod controller;
pub mod summary;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::client::{ClassifyResponse, LegacyAgentEntry, LegacyDebateEntry, RunMetadata};
use crate::error::{CouncilError, CouncilResult};
use crate::ids::new_id;
use crate::roster::{AgentId, AgentRef, Team};
use crate::transcript::{
    parse_transcript, rollup, upsert_response, AgentResponse, DebateMessage, ParsedTranscript,
};

pub use controller::{RunController, RunOutcome};
pub use summary::strip_summary_label;

/// Lower bound of a peer review score.
pub const SCORE_MIN: f64 = 0.0;
/// Upper bound of a peer review score.
pub const SCORE_MAX: f64 = 10.0;

/// Status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Complete,
    Error,
}

impl RunStatus {
    /// Valid transitions from this status.
    pub fn valid_transitions(self) -> &'static [RunStatus] {
        match self {
            Self::Pending => &[Self::Complete, Self::Error],
            Self::Complete | Self::Error => &[],
        }
    }

    fn transition(self, to: RunStatus) -> CouncilResult<RunStatus> {
        if self.valid_transitions().contains(&to) {
            Ok(to)
        } else {
            Err(CouncilError::transition(self, to))
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Complete => write!(f, "complete"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One reviewer's scores for one debater.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentReview {
    pub reasoning: f64,
    pub bias: f64,
    pub insight: f64,
    pub evidence: f64,
    /// Absent from four-score reviews.
    pub debate_skill: Option<f64>,
    pub critique: String,
}

impl AgentReview {
    fn clamped(mut self) -> Self {
        let clamp = |v: f64| {
            if v.is_nan() {
                SCORE_MIN
            } else {
                v.clamp(SCORE_MIN, SCORE_MAX)
            }
        };
        self.reasoning = clamp(self.reasoning);
        self.bias = clamp(self.bias);
        self.insight = clamp(self.insight);
        self.evidence = clamp(self.evidence);
        self.debate_skill = self.debate_skill.map(clamp);
        self
    }

    /// Read one review from a wire value. The four core scores must be
    /// numbers (or numeric strings); `debate_skill` and `critique` are
    /// optional and ignored when malformed.
    pub fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;
        let score = |key: &str| match fields.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        Some(Self {
            reasoning: score("reasoning")?,
            bias: score("bias")?,
            insight: score("insight")?,
            evidence: score("evidence")?,
            debate_skill: score("debate_skill"),
            critique: fields
                .get("critique")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }

    /// Unweighted mean of the numeric scores present.
    pub fn mean_score(&self) -> f64 {
        let mut scores = vec![self.reasoning, self.bias, self.insight, self.evidence];
        scores.extend(self.debate_skill);
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// Reviewing model → reviewed agent → review.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerReview(BTreeMap<String, BTreeMap<String, AgentReview>>);

impl PeerReview {
    /// Build from the wire map, clamping scores into range.
    pub fn from_raw(raw: BTreeMap<String, BTreeMap<String, AgentReview>>) -> Self {
        Self(
            raw.into_iter()
                .map(|(model, reviews)| {
                    let reviews = reviews
                        .into_iter()
                        .map(|(agent, review)| (agent, review.clamped()))
                        .collect();
                    (model, reviews)
                })
                .collect(),
        )
    }

    /// Build from a wire value, dropping reviews that do not parse.
    /// `None` when nothing usable is left.
    pub fn from_value(value: &Value) -> Option<Self> {
        let Some(models) = value.as_object() else {
            warn!("peer reviews are not an object, dropped");
            return None;
        };

        let mut raw = BTreeMap::new();
        for (model, reviews) in models {
            let Some(reviews) = reviews.as_object() else {
                warn!(model = %model, "peer review block is not an object, dropped");
                continue;
            };
            let mut parsed = BTreeMap::new();
            for (agent, review) in reviews {
                match AgentReview::from_value(review) {
                    Some(review) => {
                        parsed.insert(agent.clone(), review);
                    }
                    None => warn!(model = %model, agent = %agent, "malformed peer review, dropped"),
                }
            }
            if !parsed.is_empty() {
                raw.insert(model.clone(), parsed);
            }
        }

        let review = Self::from_raw(raw);
        (!review.is_empty()).then_some(review)
    }

    /// Reviewing model names.
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Every review of `agent_name`, with the reviewing model.
    pub fn reviews_of<'a>(
        &'a self,
        agent_name: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a AgentReview)> + 'a {
        self.0
            .iter()
            .filter_map(move |(model, reviews)| reviews.get(agent_name).map(|r| (model.as_str(), r)))
    }

    /// Mean score of `agent_name` across all reviewers.
    pub fn average_for(&self, agent_name: &str) -> Option<f64> {
        let means: Vec<f64> = self.reviews_of(agent_name).map(|(_, r)| r.mean_score()).collect();
        if means.is_empty() {
            None
        } else {
            Some(means.iter().sum::<f64>() / means.len() as f64)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything a debate-shaped response contributes to its run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebateOutcome {
    pub messages: Vec<DebateMessage>,
    pub responses: Vec<AgentResponse>,
    pub peer_review: Option<PeerReview>,
    pub verdict: String,
    pub sources: Vec<String>,
    pub metadata: Option<RunMetadata>,
}

impl DebateOutcome {
    /// Interpret a debate-shaped response. The transcript is parsed when
    /// present; otherwise the legacy `debate` list is mapped directly.
    pub fn from_response(response: &ClassifyResponse) -> Self {
        let ParsedTranscript {
            messages,
            responses,
        } = match (&response.debate_transcript, &response.debate) {
            (Some(transcript), _) if !transcript.is_empty() => parse_transcript(transcript),
            (_, Some(entries)) => map_legacy(entries, response.agents.as_deref()),
            _ => ParsedTranscript::default(),
        };

        Self {
            messages,
            responses,
            peer_review: response.peer_review(),
            verdict: response.verdict.clone().unwrap_or_default(),
            sources: response.sources.clone().unwrap_or_default(),
            metadata: response.metadata.clone(),
        }
    }
}

fn map_legacy(entries: &[LegacyDebateEntry], agents: Option<&[LegacyAgentEntry]>) -> ParsedTranscript {
    let messages: Vec<DebateMessage> = entries
        .iter()
        .map(|entry| DebateMessage {
            id: new_id(),
            agent: entry
                .agent_id
                .as_deref()
                .map(AgentRef::from_raw_id)
                .unwrap_or_default(),
            agent_name: entry.agent_name.clone().unwrap_or_else(|| "Agent".to_string()),
            team: entry.team.as_deref().map(Team::from_tag).unwrap_or(Team::Pro),
            content: entry.content.clone().unwrap_or_default(),
            timestamp: Utc::now(),
        })
        .collect();

    let responses = match agents {
        Some(agents) if !agents.is_empty() => {
            let mut responses = Vec::new();
            for entry in agents {
                let name = entry.agent_name.clone().unwrap_or_else(|| "Agent".to_string());
                let stub = DebateMessage {
                    id: String::new(),
                    agent: entry
                        .agent_id
                        .as_deref()
                        .map(AgentRef::from_raw_id)
                        .unwrap_or_else(|| AgentRef::from_display_name(&name)),
                    agent_name: name,
                    team: entry.team.as_deref().map(Team::from_tag).unwrap_or(Team::Pro),
                    content: entry.response.clone().unwrap_or_default(),
                    timestamp: Utc::now(),
                };
                upsert_response(&mut responses, &stub);
            }
            responses
        }
        _ => rollup(&messages),
    };

    ParsedTranscript {
        messages,
        responses,
    }
}

/// A query-to-verdict cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateRun {
    pub id: String,
    pub query: String,
    pub document_text: Option<String>,
    /// Latest response per speaker.
    pub agents: Vec<AgentResponse>,
    /// Every turn in order.
    pub debate: Vec<DebateMessage>,
    pub peer_review: Option<PeerReview>,
    pub verdict: String,
    pub sources: Vec<String>,
    pub metadata: Option<RunMetadata>,
    pub timestamp: DateTime<Utc>,
    pub status: RunStatus,
    pub error: Option<String>,
}

impl DebateRun {
    /// New pending run.
    pub fn pending(query: impl Into<String>, document_text: Option<String>) -> Self {
        Self {
            id: new_id(),
            query: query.into(),
            document_text,
            agents: Vec::new(),
            debate: Vec::new(),
            peer_review: None,
            verdict: String::new(),
            sources: Vec::new(),
            metadata: None,
            timestamp: Utc::now(),
            status: RunStatus::Pending,
            error: None,
        }
    }

    /// Resolve as complete with the debate outcome.
    pub fn complete(&self, outcome: DebateOutcome) -> CouncilResult<Self> {
        let status = self.status.transition(RunStatus::Complete)?;
        Ok(Self {
            agents: outcome.responses,
            debate: outcome.messages,
            peer_review: outcome.peer_review,
            verdict: outcome.verdict,
            sources: outcome.sources,
            metadata: outcome.metadata,
            status,
            ..self.clone()
        })
    }

    /// Resolve as failed.
    pub fn fail(&self, error: impl Into<String>) -> CouncilResult<Self> {
        let status = self.status.transition(RunStatus::Error)?;
        Ok(Self {
            status,
            error: Some(error.into()),
            ..self.clone()
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == RunStatus::Pending
    }

    /// Latest text per registered roster member.
    pub fn roster_updates(&self) -> impl Iterator<Item = (AgentId, &str)> {
        self.agents
            .iter()
            .filter_map(|r| r.agent.registered().map(|id| (id, r.response.as_str())))
    }
}
