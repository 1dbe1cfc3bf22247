//! Run controller: drives one query-to-verdict cycle.
//!
//! The manager lock is never held across a backend call. Each state change
//! between the two suspension points (classification and summary) is a
//! single [`SessionManager::apply`] under the write lock.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::{strip_summary_label, DebateOutcome, DebateRun};
use crate::client::{compose_query, ClassifyResponse, CouncilBackend, ResponseShape};
use crate::config::CouncilConfig;
use crate::error::{CouncilError, CouncilResult};
use crate::ids::short_id;
use crate::session::reducer::{accepts_submission, SessionEvent};
use crate::session::{Message, SharedSessionManager};

/// Text sent for summarizing when the service gave neither verdict nor answer.
pub const NO_VERDICT_TEXT: &str = "No verdict available.";

/// How a submitted run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The service answered without a debate. The run stays pending.
    Direct { session_id: String, answer: String },
    /// Debate committed with its summary message.
    Debated { session_id: String, run_id: String },
    /// Primary call failed; the run is marked error.
    Failed {
        session_id: String,
        run_id: String,
        error: String,
    },
}

impl RunOutcome {
    pub fn session_id(&self) -> &str {
        match self {
            Self::Direct { session_id, .. }
            | Self::Debated { session_id, .. }
            | Self::Failed { session_id, .. } => session_id,
        }
    }
}

/// Executes runs against a [`CouncilBackend`] and commits the results
/// through the shared [`SessionManager`].
#[derive(Clone)]
pub struct RunController {
    state: SharedSessionManager,
    backend: Arc<dyn CouncilBackend>,
    config: CouncilConfig,
}

impl RunController {
    pub fn new(
        state: SharedSessionManager,
        backend: Arc<dyn CouncilBackend>,
        config: CouncilConfig,
    ) -> Self {
        Self {
            state,
            backend,
            config,
        }
    }

    pub fn state(&self) -> &SharedSessionManager {
        &self.state
    }

    pub fn config(&self) -> &CouncilConfig {
        &self.config
    }

    /// Submit a query to the active session (created if absent).
    ///
    /// Returns `Err` only when the submission is refused before a run is
    /// started: a blank query, or a run already in flight in the session.
    /// Remote failures are recorded on the run and reported as
    /// [`RunOutcome::Failed`].
    pub async fn submit(&self, query: &str) -> CouncilResult<RunOutcome> {
        if query.trim().is_empty() {
            return Err(CouncilError::EmptyQuery);
        }

        let (session_id, run) = self.start_run(query).await?;
        info!(
            session = short_id(&session_id),
            run = short_id(&run.id),
            "run started"
        );

        let composed = compose_query(query, run.document_text.as_deref());
        match self.backend.classify(&composed, "").await {
            Ok(response) => self.handle_response(&session_id, run, response).await,
            Err(e) => self.handle_failure(&session_id, &run, e).await,
        }
    }

    async fn start_run(&self, query: &str) -> CouncilResult<(String, DebateRun)> {
        let mut state = self.state.write().await;
        let session = state.resolve_for_query(query, self.config.title_max_chars);
        if !accepts_submission(&session) {
            warn!(session = short_id(&session.id), phase = %session.phase, "run already in flight");
            return Err(CouncilError::RunInFlight {
                session_id: session.id.clone(),
            });
        }

        state.apply(&session.id, SessionEvent::MessageAppended(Message::user(query)))?;

        let document_text = session.latest_document().map(|d| d.content.clone());
        let run = DebateRun::pending(query, document_text);
        state.apply(&session.id, SessionEvent::RunStarted(run.clone()))?;
        if state.is_active(&session.id) {
            state.roster_mut().begin_thinking();
        }
        Ok((session.id.clone(), run))
    }

    async fn handle_failure(
        &self,
        session_id: &str,
        run: &DebateRun,
        err: CouncilError,
    ) -> CouncilResult<RunOutcome> {
        let description = err.to_string();
        error!(
            session = short_id(session_id),
            run = short_id(&run.id),
            error = %description,
            "classification failed"
        );

        let mut state = self.state.write().await;
        state.apply(
            session_id,
            SessionEvent::RunFailed {
                run_id: run.id.clone(),
                error: description.clone(),
                message: Message::council(format!("Error during analysis: {description}")),
            },
        )?;
        if state.is_active(session_id) {
            state.roster_mut().fail();
        }

        Ok(RunOutcome::Failed {
            session_id: session_id.to_string(),
            run_id: run.id.clone(),
            error: description,
        })
    }

    async fn handle_response(
        &self,
        session_id: &str,
        run: DebateRun,
        response: ClassifyResponse,
    ) -> CouncilResult<RunOutcome> {
        if let ResponseShape::Direct(answer) = response.shape() {
            info!(session = short_id(session_id), "direct answer");
            let mut state = self.state.write().await;
            state.apply(
                session_id,
                SessionEvent::DirectAnswer(Message::council(answer)),
            )?;
            if state.is_active(session_id) {
                state.reset_roster();
            }
            return Ok(RunOutcome::Direct {
                session_id: session_id.to_string(),
                answer: answer.to_string(),
            });
        }

        if let Some(remote_error) = response.error.as_deref().filter(|e| !e.is_empty()) {
            warn!(session = short_id(session_id), error = %remote_error, "service reported an error");
        }

        let outcome = DebateOutcome::from_response(&response);
        debug!(
            run = short_id(&run.id),
            turns = outcome.messages.len(),
            agents = outcome.responses.len(),
            "debate parsed"
        );
        let completed = run.complete(outcome)?;

        {
            let mut state = self.state.write().await;
            state.apply(session_id, SessionEvent::DebateReceived)?;
            if state.is_active(session_id) {
                state.roster_mut().complete_with(completed.roster_updates());
            }
            state.apply(session_id, SessionEvent::SummaryRequested)?;
        }

        let summary = self.summarize(&completed.query, &response).await;

        let mut state = self.state.write().await;
        state.apply(
            session_id,
            SessionEvent::RunCompleted {
                run: completed.clone(),
                summary: Message::council(summary),
            },
        )?;
        info!(
            session = short_id(session_id),
            run = short_id(&completed.id),
            "run complete"
        );
        Ok(RunOutcome::Debated {
            session_id: session_id.to_string(),
            run_id: completed.id,
        })
    }

    /// Secondary summary call. Never fails: errors become the placeholder.
    async fn summarize(&self, query: &str, response: &ClassifyResponse) -> String {
        let text = [response.verdict.as_deref(), response.response.as_deref()]
            .into_iter()
            .flatten()
            .find(|t| !t.is_empty())
            .unwrap_or(NO_VERDICT_TEXT);

        match self.backend.summarize(query, text).await {
            Ok(raw) => {
                let stripped = strip_summary_label(&raw);
                if stripped.is_empty() {
                    self.config.summary_placeholder.clone()
                } else {
                    stripped
                }
            }
            Err(e) => {
                warn!(error = %e, "summary unavailable");
                self.config.summary_placeholder.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionManager;
    use async_trait::async_trait;
    use serde_json::json;

    struct Canned {
        classify: serde_json::Value,
        summary: Option<&'static str>,
    }

    #[async_trait]
    impl CouncilBackend for Canned {
        async fn classify(&self, _query: &str, _history: &str) -> CouncilResult<ClassifyResponse> {
            Ok(serde_json::from_value(self.classify.clone())?)
        }

        async fn summarize(&self, _query: &str, _resp: &str) -> CouncilResult<String> {
            self.summary
                .map(str::to_string)
                .ok_or_else(|| CouncilError::RequestFailed("down".to_string()))
        }
    }

    fn controller(classify: serde_json::Value, summary: Option<&'static str>) -> RunController {
        RunController::new(
            SessionManager::new().shared(),
            Arc::new(Canned { classify, summary }),
            CouncilConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_blank_query_rejected() {
        let c = controller(json!({"response": "x"}), None);
        assert!(matches!(c.submit("  \n").await, Err(CouncilError::EmptyQuery)));
        assert!(c.state().read().await.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_empty_summary_uses_placeholder() {
        let c = controller(json!({"verdict": "v"}), Some("**TL;DR:**  "));
        c.submit("q").await.unwrap();
        let state = c.state().read().await;
        let session = state.active_session().unwrap();
        assert_eq!(
            session.messages.last().unwrap().content,
            c.config().summary_placeholder
        );
    }

    #[tokio::test]
    async fn test_summary_label_stripped() {
        let c = controller(json!({"verdict": "v"}), Some("TL;DR: Adopt it."));
        let outcome = c.submit("q").await.unwrap();
        assert!(matches!(outcome, RunOutcome::Debated { .. }));
        let state = c.state().read().await;
        let session = state.active_session().unwrap();
        assert_eq!(session.messages.last().unwrap().content, "Adopt it.");
    }
}
