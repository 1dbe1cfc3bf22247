//! Session phase state machine.
//!
//! ```text
//!          Submit                DebateReceived          SummaryRequested
//! Idle ───────────▶ Analyzing ─────────────────▶ Debating ──────────────▶ Synthesizing
//!  ▲                 │  │                           │                         │
//!  └──DirectAnswer───┘  └──Failed──┐      Failed────┘         Committed/Failed│
//!                                  ▼                                          ▼
//!                               Complete ◀────────────────────────────────────┘
//!                                  │
//!                                  └──Submit──▶ Analyzing
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CouncilError, CouncilResult};

/// Coarse lifecycle stage of a session's current run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No run, or the last run was answered directly.
    #[default]
    Idle,
    /// Waiting on the classification call.
    Analyzing,
    /// Debate received, being turned into a run.
    Debating,
    /// Waiting on the summary call.
    Synthesizing,
    /// Request cycle finished (successfully or not).
    Complete,
}

/// Input to the phase transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseEvent {
    Submit,
    DirectAnswer,
    DebateReceived,
    SummaryRequested,
    Committed,
    Failed,
}

impl Phase {
    /// Whether a run is between submission and commit.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Analyzing | Self::Debating | Self::Synthesizing)
    }

    /// Phase reached from `self` on `event`, if the table allows it.
    pub fn on(self, event: PhaseEvent) -> Option<Phase> {
        use Phase::*;
        use PhaseEvent::*;
        match (self, event) {
            (Idle | Complete, Submit) => Some(Analyzing),
            (Analyzing, DirectAnswer) => Some(Idle),
            (Analyzing, DebateReceived) => Some(Debating),
            (Debating, SummaryRequested) => Some(Synthesizing),
            (Synthesizing, Committed) => Some(Complete),
            (Analyzing | Debating | Synthesizing, Failed) => Some(Complete),
            _ => None,
        }
    }

    /// Apply `event`, rejecting transitions outside the table.
    pub fn transition(self, event: PhaseEvent) -> CouncilResult<Phase> {
        self.on(event)
            .ok_or_else(|| CouncilError::transition(self, format!("{event:?}")))
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Analyzing => write!(f, "analyzing"),
            Self::Debating => write!(f, "debating"),
            Self::Synthesizing => write!(f, "synthesizing"),
            Self::Complete => write!(f, "complete"),
        }
    }
}
