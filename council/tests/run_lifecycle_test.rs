//! End-to-end run lifecycle against a scripted in-memory backend.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

use council::client::ClassifyResponse;
use council::{
    project, AgentId, AgentStatus, CouncilBackend, CouncilConfig, CouncilError, CouncilResult,
    Phase, Role, RunController, RunOutcome, RunStatus, SessionManager, Tab, UploadedDocument,
};

/// Backend that replays queued classify/summary results and records calls.
#[derive(Default)]
struct ScriptedBackend {
    classify: Mutex<VecDeque<CouncilResult<serde_json::Value>>>,
    summaries: Mutex<VecDeque<CouncilResult<String>>>,
    classify_calls: Mutex<Vec<(String, String)>>,
    summary_calls: Mutex<Vec<(String, String)>>,
    /// When set, classify waits for a notification before answering.
    gate: Option<Arc<Notify>>,
}

impl ScriptedBackend {
    fn classify_ok(self, value: serde_json::Value) -> Self {
        self.classify.lock().unwrap().push_back(Ok(value));
        self
    }

    fn classify_err(self, err: CouncilError) -> Self {
        self.classify.lock().unwrap().push_back(Err(err));
        self
    }

    fn summary(self, result: CouncilResult<String>) -> Self {
        self.summaries.lock().unwrap().push_back(result);
        self
    }

    fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl CouncilBackend for ScriptedBackend {
    async fn classify(&self, query: &str, history: &str) -> CouncilResult<ClassifyResponse> {
        self.classify_calls
            .lock()
            .unwrap()
            .push((query.to_string(), history.to_string()));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let next = self
            .classify
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted classify call");
        Ok(serde_json::from_value(next?)?)
    }

    async fn summarize(&self, query: &str, resp: &str) -> CouncilResult<String> {
        self.summary_calls
            .lock()
            .unwrap()
            .push((query.to_string(), resp.to_string()));
        self.summaries
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted summary call")
    }
}

fn controller(backend: Arc<ScriptedBackend>) -> RunController {
    RunController::new(
        SessionManager::new().shared(),
        backend,
        CouncilConfig::default(),
    )
}

const TRANSCRIPT: &str = "[Pro-A] (PRO):\nPoint one.\n[Con-A] (CON):\nRebuttal.\n";

#[tokio::test]
async fn test_direct_answer_ends_idle() {
    let backend = Arc::new(ScriptedBackend::default().classify_ok(json!({"response": "42"})));
    let controller = controller(Arc::clone(&backend));

    let outcome = controller.submit("What is six times seven?").await.unwrap();
    assert!(matches!(outcome, RunOutcome::Direct { ref answer, .. } if answer == "42"));

    let state = controller.state().read().await;
    let session = state.active_session().unwrap();
    assert_eq!(session.title, "What is six times seven?");
    assert_eq!(session.phase, Phase::Idle);
    assert_eq!(state.phase(), Phase::Idle);

    let council: Vec<_> = session
        .messages
        .iter()
        .filter(|m| m.role == Role::Council)
        .collect();
    assert_eq!(council.len(), 1);
    assert_eq!(council[0].content, "42");
    assert_eq!(session.messages[0].role, Role::User);

    // No summary call, run left pending, roster back at baseline.
    assert!(backend.summary_calls.lock().unwrap().is_empty());
    assert_eq!(session.latest_run().unwrap().status, RunStatus::Pending);
    assert!(state.roster().is_baseline());
    assert_eq!(
        backend.classify_calls.lock().unwrap()[0],
        ("What is six times seven?".to_string(), String::new())
    );
}

#[tokio::test]
async fn test_debate_run_commits_summary() {
    let backend = Arc::new(
        ScriptedBackend::default()
            .classify_ok(json!({
                "verdict": "Adopt incrementally.",
                "debate_transcript": TRANSCRIPT,
                "sources": ["https://example.org/report"],
                "peer_reviews": {
                    "judge": {"Pro-A": {"reasoning": 8, "bias": 2, "insight": 7, "evidence": 7, "critique": "clear"}}
                }
            }))
            .summary(Ok("**TL;DR:** Adopt it step by step.".to_string())),
    );
    let controller = controller(Arc::clone(&backend));

    let outcome = controller.submit("Should we adopt Rust?").await.unwrap();
    let RunOutcome::Debated { run_id, .. } = outcome else {
        panic!("expected debate outcome, got {outcome:?}");
    };

    let state = controller.state().read().await;
    let session = state.active_session().unwrap();
    assert_eq!(session.phase, Phase::Complete);
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.messages[1].role, Role::Council);
    assert_eq!(session.messages[1].content, "Adopt it step by step.");

    let run = session.run(&run_id).unwrap();
    assert_eq!(run.status, RunStatus::Complete);
    assert_eq!(run.verdict, "Adopt incrementally.");
    assert_eq!(run.debate.len(), 2);
    assert_eq!(run.agents.len(), 2);
    assert_eq!(run.sources, vec!["https://example.org/report"]);
    assert!(run.peer_review.is_some());
    assert_eq!(session.current_run_id.as_deref(), Some(run_id.as_str()));

    let alpha = state.roster().get(AgentId::Alpha);
    assert_eq!(alpha.status, AgentStatus::Complete);
    assert_eq!(alpha.reasoning, "Point one.");
    assert_eq!(state.roster().get(AgentId::Beta).status, AgentStatus::Complete);

    assert_eq!(
        backend.summary_calls.lock().unwrap()[0],
        (
            "Should we adopt Rust?".to_string(),
            "Adopt incrementally.".to_string()
        )
    );
}

#[tokio::test]
async fn test_malformed_peer_reviews_do_not_sink_debate() {
    let backend = Arc::new(
        ScriptedBackend::default()
            .classify_ok(json!({
                "verdict": "Adopt incrementally.",
                "debate_transcript": TRANSCRIPT,
                "peer_reviews": {
                    "judge": {
                        "Pro-A": {"reasoning": null, "bias": 2, "insight": 7, "evidence": 7},
                        "Con-A": {"reasoning": 6, "bias": 6, "insight": 6, "evidence": 6}
                    }
                },
                "metadata": {"llm_count": 4.0, "duration_seconds": "n/a"}
            }))
            .summary(Ok("Adopt it.".to_string())),
    );
    let controller = controller(backend);

    let outcome = controller.submit("Should we adopt Rust?").await.unwrap();
    let RunOutcome::Debated { run_id, .. } = outcome else {
        panic!("expected debate outcome, got {outcome:?}");
    };

    let state = controller.state().read().await;
    let run = state.active_session().unwrap().run(&run_id).cloned().unwrap();
    assert_eq!(run.status, RunStatus::Complete);
    assert_eq!(run.verdict, "Adopt incrementally.");
    assert_eq!(run.debate.len(), 2);

    let review = run.peer_review.unwrap();
    assert_eq!(review.average_for("Pro-A"), None);
    assert_eq!(review.average_for("Con-A"), Some(6.0));
    assert_eq!(run.metadata.unwrap().llm_count, Some(4));
}

#[tokio::test]
async fn test_summary_failure_uses_placeholder() {
    let backend = Arc::new(
        ScriptedBackend::default()
            .classify_ok(json!({"verdict": "v", "debate_transcript": TRANSCRIPT}))
            .summary(Err(CouncilError::HttpStatus {
                status: 503,
                body: String::new(),
            })),
    );
    let controller = controller(backend);

    controller.submit("q").await.unwrap();

    let state = controller.state().read().await;
    let session = state.active_session().unwrap();
    let council: Vec<_> = session
        .messages
        .iter()
        .filter(|m| m.role == Role::Council)
        .collect();
    assert_eq!(council.len(), 1);
    assert_eq!(council[0].content, "Summary unavailable.");
    assert_eq!(session.latest_run().unwrap().status, RunStatus::Complete);
    assert_eq!(session.phase, Phase::Complete);
}

#[tokio::test]
async fn test_primary_failure_marks_run_error() {
    let backend = Arc::new(ScriptedBackend::default().classify_err(CouncilError::HttpStatus {
        status: 500,
        body: "boom".to_string(),
    }));
    let controller = controller(Arc::clone(&backend));

    let outcome = controller.submit("q").await.unwrap();
    assert!(matches!(outcome, RunOutcome::Failed { ref error, .. } if error == "API error: 500"));

    let state = controller.state().read().await;
    let session = state.active_session().unwrap();
    assert_eq!(session.phase, Phase::Complete);
    assert_eq!(state.phase(), Phase::Complete);

    let run = session.latest_run().unwrap();
    assert_eq!(run.status, RunStatus::Error);
    assert_eq!(run.error.as_deref(), Some("API error: 500"));

    // User message plus exactly one error message.
    assert_eq!(session.messages.len(), 2);
    assert!(session.messages[1].content.contains("API error: 500"));
    assert!(backend.summary_calls.lock().unwrap().is_empty());
    assert!(state
        .roster()
        .agents()
        .iter()
        .all(|a| a.status == AgentStatus::Error));
}

#[tokio::test]
async fn test_legacy_debate_list_without_transcript() {
    let backend = Arc::new(
        ScriptedBackend::default()
            .classify_ok(json!({
                "response": "",
                "debate": [
                    {"agentId": "beta", "agentName": "Pro-B", "team": "pro", "content": "For."},
                    {"agentId": "delta", "agentName": "Con-B", "team": "con", "content": "Against."}
                ]
            }))
            .summary(Ok("short".to_string())),
    );
    let controller = controller(Arc::clone(&backend));

    controller.submit("q").await.unwrap();

    let state = controller.state().read().await;
    let run = state.active_session().unwrap().latest_run().cloned().unwrap();
    assert_eq!(run.debate.len(), 2);
    assert_eq!(run.debate[1].team, council::Team::Con);
    assert_eq!(state.roster().get(AgentId::Delta).reasoning, "Against.");
    // Neither verdict nor answer: the fixed fallback text is summarized.
    assert_eq!(
        backend.summary_calls.lock().unwrap()[0].1,
        "No verdict available."
    );
}

#[tokio::test]
async fn test_document_context_is_sent() {
    let backend = Arc::new(ScriptedBackend::default().classify_ok(json!({"response": "ok"})));
    let controller = controller(Arc::clone(&backend));
    {
        let mut state = controller.state().write().await;
        state.create_session(None);
        state
            .add_document(UploadedDocument::from_text("old.txt", "stale", 100))
            .unwrap();
        state
            .add_document(UploadedDocument::from_text("notes.txt", "  fresh\n\tnotes ", 100))
            .unwrap();
    }

    controller.submit("Summarise").await.unwrap();

    let calls = backend.classify_calls.lock().unwrap();
    assert_eq!(calls[0].0, "Summarise\n\nContext:\nfresh notes");
    let state = controller.state().read().await;
    let run = state.active_session().unwrap().latest_run().cloned().unwrap();
    assert_eq!(run.document_text.as_deref(), Some("fresh notes"));
}

#[tokio::test]
async fn test_empty_query_rejected_without_state_change() {
    let backend = Arc::new(ScriptedBackend::default());
    let controller = controller(Arc::clone(&backend));

    assert!(matches!(
        controller.submit("   ").await,
        Err(CouncilError::EmptyQuery)
    ));
    assert!(controller.state().read().await.sessions().is_empty());
    assert!(backend.classify_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_second_submission_rejected_while_in_flight() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(
        ScriptedBackend::default()
            .classify_ok(json!({"response": "first"}))
            .gated(Arc::clone(&gate)),
    );
    let controller = controller(Arc::clone(&backend));

    let first = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.submit("first").await })
    };

    // Wait until the first run has reached the backend.
    while backend.classify_calls.lock().unwrap().is_empty() {
        tokio::task::yield_now().await;
    }
    assert!(project(&*controller.state().read().await).busy);

    let second = controller.submit("second").await;
    assert!(matches!(second, Err(CouncilError::RunInFlight { .. })));

    gate.notify_one();
    let outcome = first.await.unwrap().unwrap();
    assert!(matches!(outcome, RunOutcome::Direct { .. }));

    let state = controller.state().read().await;
    let session = state.active_session().unwrap();
    assert_eq!(session.debate_runs.len(), 1);
    assert_eq!(session.messages.len(), 2);
}

#[tokio::test]
async fn test_result_lands_in_originating_session() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(
        ScriptedBackend::default()
            .classify_ok(json!({"verdict": "v", "debate_transcript": TRANSCRIPT}))
            .summary(Ok("done".to_string()))
            .gated(Arc::clone(&gate)),
    );
    let controller = controller(Arc::clone(&backend));

    let first = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.submit("first").await })
    };
    while backend.classify_calls.lock().unwrap().is_empty() {
        tokio::task::yield_now().await;
    }

    let other = controller.state().write().await.create_session(Some("other"));
    gate.notify_one();
    let outcome = first.await.unwrap().unwrap();

    let state = controller.state().read().await;
    let origin = state.session(outcome.session_id()).unwrap();
    assert_eq!(origin.phase, Phase::Complete);
    assert_eq!(origin.messages.last().unwrap().content, "done");

    // The newly active session is untouched, and so is its transient state.
    let other = state.session(&other.id).unwrap();
    assert!(other.messages.is_empty());
    assert_eq!(state.active_id(), Some(other.id.as_str()));
    assert_eq!(state.phase(), Phase::Idle);
    assert!(state.roster().is_baseline());
}

#[tokio::test]
async fn test_select_session_resets_roster_after_completion() {
    let backend = Arc::new(
        ScriptedBackend::default()
            .classify_ok(json!({"verdict": "v", "debate_transcript": TRANSCRIPT}))
            .summary(Ok("s".to_string())),
    );
    let controller = controller(backend);
    controller.submit("q").await.unwrap();

    let mut state = controller.state().write().await;
    let id = state.active_id().unwrap().to_string();
    assert!(!state.roster().is_baseline());
    state.switch_tab(Tab::Debate);

    state.select_session(&id).unwrap();
    assert!(state.roster().is_baseline());
    assert_eq!(state.phase(), Phase::Complete);
    assert_eq!(state.tab(), Tab::Chat);
}

#[tokio::test]
async fn test_follow_up_query_reuses_session() {
    let backend = Arc::new(
        ScriptedBackend::default()
            .classify_ok(json!({"response": "one"}))
            .classify_ok(json!({"response": "two"})),
    );
    let controller = controller(backend);

    controller.submit("first question").await.unwrap();
    controller.submit("second question").await.unwrap();

    let state = controller.state().read().await;
    assert_eq!(state.sessions().len(), 1);
    let session = state.active_session().unwrap();
    assert_eq!(session.messages.len(), 4);
    assert_eq!(session.debate_runs.len(), 2);
    assert_eq!(session.title, "first question");
}
