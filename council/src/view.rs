//! View projection for the presentation layer.
//!
//! [`project`] is a pure function of the [`SessionManager`]; the resulting
//! [`ViewModel`] is read-only and holds no state of its own.

use std::sync::Arc;

use serde::Serialize;

use crate::roster::{AgentId, AgentStatus, Team};
use crate::run::DebateRun;
use crate::session::{Phase, Session, SessionManager};

/// Presentation tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tab {
    #[default]
    Chat,
    Agents,
    Debate,
    PeerReview,
    Verdict,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Self::Chat,
        Self::Agents,
        Self::Debate,
        Self::PeerReview,
        Self::Verdict,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Agents => "agents",
            Self::Debate => "debate",
            Self::PeerReview => "peer-review",
            Self::Verdict => "verdict",
        }
    }

    /// Parse a tab identifier, case-insensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tab| raw.trim().eq_ignore_ascii_case(tab.as_str()))
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display state of one roster agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentView {
    pub id: AgentId,
    pub name: String,
    pub team: Team,
    pub status: AgentStatus,
    pub reasoning: String,
    pub confidence: Option<f32>,
    /// Mean peer review score in the current run, if reviewed.
    pub review_score: Option<f64>,
}

/// Everything presentation needs to render.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub sessions: Vec<Arc<Session>>,
    pub active_session: Option<Arc<Session>>,
    pub roster: Vec<AgentView>,
    pub phase: Phase,
    pub tab: Tab,
    /// Last run of the active session.
    pub current_run: Option<DebateRun>,
    /// Id of the last debate turn in the current run, for scroll anchoring.
    pub debate_anchor: Option<String>,
    pub busy: bool,
}

/// Derive the view model from manager state.
pub fn project(manager: &SessionManager) -> ViewModel {
    let active_session = manager.active_session();
    let current_run = active_session
        .as_deref()
        .and_then(Session::latest_run)
        .cloned();

    let roster = manager
        .roster()
        .agents()
        .iter()
        .map(|agent| {
            let review_score = current_run.as_ref().and_then(|run| mean_review_score(run, agent.id));
            AgentView {
                id: agent.id,
                name: agent.name.clone(),
                team: agent.team,
                status: agent.status,
                reasoning: agent.reasoning.clone(),
                confidence: agent.confidence,
                review_score,
            }
        })
        .collect();

    let debate_anchor = current_run
        .as_ref()
        .and_then(|run| run.debate.last())
        .map(|m| m.id.clone());

    ViewModel {
        sessions: manager.sessions().to_vec(),
        busy: manager.phase().is_in_flight(),
        active_session,
        roster,
        phase: manager.phase(),
        tab: manager.tab(),
        current_run,
        debate_anchor,
    }
}

/// Mean peer review score for roster member `id`, looked up by the display
/// name it spoke under in `run`.
fn mean_review_score(run: &DebateRun, id: AgentId) -> Option<f64> {
    let name = run
        .agents
        .iter()
        .find(|r| r.agent.registered() == Some(id))?
        .agent_name
        .as_str();
    run.peer_review.as_ref()?.average_for(name)
}
