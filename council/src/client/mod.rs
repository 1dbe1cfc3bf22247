//! Remote debate service seam.
//!
//! The service is opaque: it either answers a query directly or returns a
//! debate transcript plus verdict. [`CouncilBackend`] is the only way the run
//! controller talks to it; [`HttpBackend`] is the production implementation.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::CouncilResult;
use crate::run::PeerReview;

pub use http::HttpBackend;

/// Fields checked, in order, for the summary text in an object payload.
pub const SUMMARY_FIELDS: [&str; 6] = ["tldr", "summary", "response", "text", "content", "result"];

/// Classification request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub query: String,
    pub history: String,
}

/// Summary request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub query: String,
    pub resp: String,
}

/// Legacy structured debate entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDebateEntry {
    pub agent_id: Option<String>,
    pub agent_name: Option<String>,
    pub team: Option<String>,
    pub content: Option<String>,
}

/// Legacy per-agent response entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyAgentEntry {
    pub agent_id: Option<String>,
    pub agent_name: Option<String>,
    pub team: Option<String>,
    pub response: Option<String>,
}

/// Run metadata reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub duration_seconds: Option<f64>,
    pub llm_count: Option<u32>,
    pub model: Option<String>,
    pub transcript_file: Option<String>,
}

impl RunMetadata {
    /// Read the fields that are present and well-typed; anything else is
    /// left unset. `None` only when `value` is not an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;
        let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            duration_seconds: fields.get("duration_seconds").and_then(Value::as_f64),
            llm_count: fields.get("llm_count").and_then(whole_number),
            model: text("model"),
            transcript_file: text("transcript_file"),
        })
    }
}

/// `4` and `4.0` both read as 4; negatives and fractions do not.
fn whole_number(value: &Value) -> Option<u32> {
    let n = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= f64::from(u32::MAX))
            .map(|f| f as u64)
    })?;
    u32::try_from(n).ok()
}

/// Classification response. Every field is optional; [`ClassifyResponse::shape`]
/// decides which kind of answer it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyResponse {
    // direct answer
    pub response: Option<String>,
    pub model: Option<String>,
    pub created_at: Option<String>,
    pub done: Option<bool>,
    pub done_reason: Option<String>,
    pub history: Option<String>,

    // debate
    pub verdict: Option<String>,
    pub debate_transcript: Option<String>,
    #[serde(deserialize_with = "lenient_peer_reviews")]
    pub peer_reviews: Option<PeerReview>,
    #[serde(deserialize_with = "lenient_sources")]
    pub sources: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_metadata")]
    pub metadata: Option<RunMetadata>,
    pub error: Option<String>,

    // legacy
    pub agents: Option<Vec<LegacyAgentEntry>>,
    pub debate: Option<Vec<LegacyDebateEntry>>,
}

/// Which kind of answer the service gave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape<'a> {
    /// Plain answer; the service judged no debate necessary.
    Direct(&'a str),
    /// Debate transcript (or legacy debate list) plus verdict.
    Debate,
}

impl ClassifyResponse {
    pub fn shape(&self) -> ResponseShape<'_> {
        let transcript_present = self
            .debate_transcript
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        match self.response.as_deref() {
            Some(answer) if !answer.is_empty() && !transcript_present => {
                ResponseShape::Direct(answer)
            }
            _ => ResponseShape::Debate,
        }
    }

    /// Peer review map with scores clamped into range.
    pub fn peer_review(&self) -> Option<PeerReview> {
        self.peer_reviews.clone()
    }
}

// Display-only blocks decode leniently: a malformed value is dropped (or
// partly kept) instead of failing the whole response.

fn lenient_peer_reviews<'de, D>(deserializer: D) -> Result<Option<PeerReview>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(PeerReview::from_value))
}

fn lenient_metadata<'de, D>(deserializer: D) -> Result<Option<RunMetadata>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(RunMetadata::from_value))
}

fn lenient_sources<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    }))
}

/// Classification query text, with the attached document appended under a
/// `Context:` section.
pub fn compose_query(query: &str, document: Option<&str>) -> String {
    match document {
        Some(doc) if !doc.is_empty() => format!("{query}\n\nContext:\n{doc}"),
        _ => query.to_string(),
    }
}

/// Pull the summary text out of a summary payload: a bare string is used
/// directly, otherwise the first non-empty field in [`SUMMARY_FIELDS`].
pub fn extract_summary(payload: &Value) -> Option<String> {
    if let Some(text) = payload.as_str() {
        return Some(text.to_string());
    }
    SUMMARY_FIELDS
        .iter()
        .filter_map(|field| payload.get(*field).and_then(|v| v.as_str()))
        .find(|text| !text.trim().is_empty())
        .map(str::to_string)
}

/// The remote debate service.
#[async_trait]
pub trait CouncilBackend: Send + Sync {
    /// Classify a query: direct answer or full debate.
    async fn classify(&self, query: &str, history: &str) -> CouncilResult<ClassifyResponse>;

    /// Short summary of `resp` as an answer to `query`.
    async fn summarize(&self, query: &str, resp: &str) -> CouncilResult<String>;
}
