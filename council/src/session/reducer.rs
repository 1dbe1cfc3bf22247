//! Session reducer: `(Session, SessionEvent) → Session`.
//!
//! Every change produces a new snapshot; the input is never patched in
//! place. Phase changes go through the [`super::phase::Phase`] transition table and run
//! status changes through [`crate::run::RunStatus`].

use chrono::Utc;
use tracing::debug;

use super::model::{Message, Session};
use super::phase::PhaseEvent;
use crate::document::UploadedDocument;
use crate::error::{CouncilError, CouncilResult};
use crate::run::DebateRun;

/// A change to one session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Chat message that does not move the phase (the user's query).
    MessageAppended(Message),
    DocumentAdded(UploadedDocument),
    /// New pending run becomes current.
    RunStarted(DebateRun),
    /// Remote service answered directly; the chat answer is appended.
    DirectAnswer(Message),
    DebateReceived,
    SummaryRequested,
    /// Completed run replaces its pending entry; summary goes to chat.
    RunCompleted { run: DebateRun, summary: Message },
    /// Run marked error; the error description goes to chat.
    RunFailed {
        run_id: String,
        error: String,
        message: Message,
    },
    /// Point `current_run_id` at an existing run.
    RunSelected(String),
}

impl SessionEvent {
    fn phase_event(&self) -> Option<PhaseEvent> {
        match self {
            Self::RunStarted(_) => Some(PhaseEvent::Submit),
            Self::DirectAnswer(_) => Some(PhaseEvent::DirectAnswer),
            Self::DebateReceived => Some(PhaseEvent::DebateReceived),
            Self::SummaryRequested => Some(PhaseEvent::SummaryRequested),
            Self::RunCompleted { .. } => Some(PhaseEvent::Committed),
            Self::RunFailed { .. } => Some(PhaseEvent::Failed),
            Self::MessageAppended(_) | Self::DocumentAdded(_) | Self::RunSelected(_) => None,
        }
    }
}

/// Apply `event` to `session`, returning the next snapshot.
pub fn reduce(session: &Session, event: SessionEvent) -> CouncilResult<Session> {
    let phase = match event.phase_event() {
        Some(pe) => {
            let next = session.phase.transition(pe)?;
            debug!(session = %session.id, from = %session.phase, to = %next, "phase transition");
            next
        }
        None => session.phase,
    };

    let mut next = Session {
        phase,
        updated_at: Utc::now(),
        ..session.clone()
    };

    match event {
        SessionEvent::MessageAppended(message) | SessionEvent::DirectAnswer(message) => {
            next.messages.push(message);
        }
        SessionEvent::DocumentAdded(document) => {
            next.documents.push(document);
        }
        SessionEvent::RunStarted(run) => {
            if !run.is_pending() {
                return Err(CouncilError::transition(run.status, "started"));
            }
            next.current_run_id = Some(run.id.clone());
            next.debate_runs.push(run);
        }
        SessionEvent::DebateReceived | SessionEvent::SummaryRequested => {}
        SessionEvent::RunCompleted { run, summary } => {
            if run.is_pending() {
                return Err(CouncilError::transition(run.status, "committed"));
            }
            let slot = pending_slot(&mut next, &run.id)?;
            *slot = run;
            next.messages.push(summary);
        }
        SessionEvent::RunFailed {
            run_id,
            error,
            message,
        } => {
            let slot = pending_slot(&mut next, &run_id)?;
            *slot = slot.fail(error)?;
            next.messages.push(message);
        }
        SessionEvent::RunSelected(run_id) => {
            if next.run(&run_id).is_none() {
                return Err(CouncilError::RunNotFound(run_id));
            }
            next.current_run_id = Some(run_id);
        }
    }

    Ok(next)
}

fn pending_slot<'a>(session: &'a mut Session, run_id: &str) -> CouncilResult<&'a mut DebateRun> {
    let slot = session
        .debate_runs
        .iter_mut()
        .find(|r| r.id == run_id)
        .ok_or_else(|| CouncilError::RunNotFound(run_id.to_string()))?;
    if !slot.is_pending() {
        return Err(CouncilError::transition(slot.status, "resolved"));
    }
    Ok(slot)
}

/// Whether a new run may start in `session`.
pub fn accepts_submission(session: &Session) -> bool {
    session.phase.on(PhaseEvent::Submit).is_some()
}
