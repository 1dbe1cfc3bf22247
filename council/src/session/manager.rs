//! Session manager. Owns every session, the active-session pointer, the
//! transient phase, the roster and the active tab.
//!
//! Sessions are held as `Arc<Session>` snapshots and replaced wholesale on
//! every change, so readers never observe a half-applied update.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use super::model::{title_from_query, Session, DEFAULT_SESSION_TITLE};
use super::phase::Phase;
use super::reducer::{reduce, SessionEvent};
use crate::document::UploadedDocument;
use crate::error::{CouncilError, CouncilResult};
use crate::ids::short_id;
use crate::roster::Roster;
use crate::view::Tab;

/// Shared reference to the session manager.
pub type SharedSessionManager = Arc<RwLock<SessionManager>>;

/// Owner of all session state.
#[derive(Debug, Default)]
pub struct SessionManager {
    /// Newest first.
    sessions: Vec<Arc<Session>>,
    active: Option<String>,
    roster: Roster,
    phase: Phase,
    tab: Tab,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap in a shared lock.
    pub fn shared(self) -> SharedSessionManager {
        Arc::new(RwLock::new(self))
    }

    /// Create a session, make it active and reset transient state.
    pub fn create_session(&mut self, title: Option<&str>) -> Arc<Session> {
        let session = Arc::new(Session::new(title.unwrap_or(DEFAULT_SESSION_TITLE)));
        info!(session = short_id(&session.id), title = %session.title, "created session");

        self.sessions.insert(0, Arc::clone(&session));
        self.active = Some(session.id.clone());
        self.phase = Phase::Idle;
        self.reset_roster();
        self.tab = Tab::Chat;
        session
    }

    /// Switch the active session. The transient phase follows the
    /// session's stored phase; the roster always returns to baseline.
    pub fn select_session(&mut self, session_id: &str) -> CouncilResult<Arc<Session>> {
        let session = self
            .session(session_id)
            .ok_or_else(|| CouncilError::SessionNotFound(session_id.to_string()))?;
        info!(session = short_id(session_id), phase = %session.phase, "selected session");

        self.active = Some(session.id.clone());
        self.phase = session.phase;
        self.reset_roster();
        self.tab = Tab::Chat;
        Ok(session)
    }

    /// Active session, creating one titled after `query` if there is none.
    pub fn resolve_for_query(&mut self, query: &str, title_max_chars: usize) -> Arc<Session> {
        match self.active_session() {
            Some(session) => session,
            None => self.create_session(Some(&title_from_query(query, title_max_chars))),
        }
    }

    /// Attach a document to the active session.
    pub fn add_document(&mut self, document: UploadedDocument) -> CouncilResult<Arc<Session>> {
        let session_id = self.active.clone().ok_or(CouncilError::NoActiveSession)?;
        debug!(
            session = short_id(&session_id),
            document = %document.name,
            chars = document.char_len(),
            "attaching document"
        );
        self.apply(&session_id, SessionEvent::DocumentAdded(document))
    }

    /// Point the active session at one of its runs.
    pub fn select_run(&mut self, run_id: &str) -> CouncilResult<Arc<Session>> {
        let session_id = self.active.clone().ok_or(CouncilError::NoActiveSession)?;
        self.apply(&session_id, SessionEvent::RunSelected(run_id.to_string()))
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    /// Reduce `event` into the named session and swap in the new snapshot.
    /// The transient phase tracks the session while it is active.
    pub fn apply(&mut self, session_id: &str, event: SessionEvent) -> CouncilResult<Arc<Session>> {
        let index = self
            .sessions
            .iter()
            .position(|s| s.id == session_id)
            .ok_or_else(|| CouncilError::SessionNotFound(session_id.to_string()))?;

        let next = Arc::new(reduce(&self.sessions[index], event)?);
        self.sessions[index] = Arc::clone(&next);

        if self.is_active(session_id) {
            self.phase = next.phase;
        }
        Ok(next)
    }

    /// The one place the roster returns to its idle baseline.
    pub fn reset_roster(&mut self) {
        self.roster.reset();
    }

    pub(crate) fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    pub fn sessions(&self) -> &[Arc<Session>] {
        &self.sessions
    }

    pub fn session(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.iter().find(|s| s.id == session_id).cloned()
    }

    pub fn active_session(&self) -> Option<Arc<Session>> {
        self.active.as_deref().and_then(|id| self.session(id))
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_active(&self, session_id: &str) -> bool {
        self.active.as_deref() == Some(session_id)
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }
}
