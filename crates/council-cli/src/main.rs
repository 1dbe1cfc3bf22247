//! Line-oriented driver for the debate council client.
//!
//! Reads intents from stdin, one per line, and prints the projected view
//! after each one. Logs go to stderr.
//!
//! ```text
//! /new [title]        create a session
//! /select <id>        switch session (id prefix is enough)
//! /sessions           list sessions
//! /tab <tab>          chat | agents | debate | peer-review | verdict
//! /attach <path>      attach a document to the active session
//! /run [id]           show the current run, or select one by id
//! /quit
//! <anything else>     submit as a query
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use council::ids::short_id;
use council::view::ViewModel;
use council::{
    project, CouncilConfig, HttpBackend, RunController, RunOutcome, SessionManager, Tab,
    UploadedDocument,
};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file (env vars still override it)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base URL of the debate service (overrides COUNCIL_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Per-request timeout in seconds (overrides COUNCIL_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Submit this query, print the view and exit
    query: Option<String>,
}

impl Args {
    fn load_config(&self) -> Result<CouncilConfig> {
        let mut config = match &self.config {
            Some(path) => CouncilConfig::load(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => CouncilConfig::from_env(),
        };
        if let Some(url) = &self.api_url {
            config.base_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.load_config()?;
    info!(
        classify = %config.classify_url(),
        summary = %config.summary_url(),
        "council client starting"
    );

    let backend = Arc::new(HttpBackend::from_config(&config)?);
    let controller = RunController::new(SessionManager::new().shared(), backend, config);

    if let Some(query) = &args.query {
        submit(&controller, query).await;
        print_view(&controller).await;
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }
        if let Err(e) = handle(&controller, line).await {
            warn!("{e:#}");
            eprintln!("error: {e:#}");
        }
        print_view(&controller).await;
    }
    Ok(())
}

async fn handle(controller: &RunController, line: &str) -> Result<()> {
    let Some(command) = line.strip_prefix('/') else {
        submit(controller, line).await;
        return Ok(());
    };
    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map(|(n, a)| (n, a.trim()))
        .unwrap_or((command, ""));

    match name {
        "new" => {
            let title = (!arg.is_empty()).then_some(arg);
            controller.state().write().await.create_session(title);
        }
        "select" => {
            let mut state = controller.state().write().await;
            let id = state
                .sessions()
                .iter()
                .find(|s| !arg.is_empty() && s.id.starts_with(arg))
                .map(|s| s.id.clone())
                .ok_or_else(|| anyhow!("no session matches {arg:?}"))?;
            state.select_session(&id)?;
        }
        "sessions" => {
            let state = controller.state().read().await;
            for session in state.sessions() {
                let marker = if state.is_active(&session.id) { "*" } else { " " };
                println!(
                    "{marker} {} {:<34} {:>3} msgs  {}",
                    short_id(&session.id),
                    session.title,
                    session.messages.len(),
                    session.phase
                );
            }
        }
        "tab" => {
            let tab = Tab::parse(arg).ok_or_else(|| anyhow!("unknown tab {arg:?}"))?;
            controller.state().write().await.switch_tab(tab);
        }
        "attach" => {
            let max_chars = controller.config().max_document_chars;
            let document = UploadedDocument::read_from_path(arg, max_chars)
                .await
                .with_context(|| format!("reading {arg}"))?;
            controller.state().write().await.add_document(document)?;
        }
        "run" if arg.is_empty() => {
            let view = project(&*controller.state().read().await);
            match view.current_run {
                Some(run) => println!("{}", serde_json::to_string_pretty(&run)?),
                None => println!("(no run)"),
            }
        }
        "run" => {
            controller.state().write().await.select_run(arg)?;
        }
        other => return Err(anyhow!("unknown command /{other}")),
    }
    Ok(())
}

async fn submit(controller: &RunController, query: &str) {
    match controller.submit(query).await {
        Ok(RunOutcome::Failed { error, .. }) => eprintln!("run failed: {error}"),
        Ok(_) => {}
        Err(e) => eprintln!("rejected: {e}"),
    }
}

async fn print_view(controller: &RunController) {
    let view = project(&*controller.state().read().await);
    print!("{}", render(&view));
}

fn render(view: &ViewModel) -> String {
    let mut out = String::new();
    let title = view
        .active_session
        .as_ref()
        .map_or("(no session)", |s| s.title.as_str());
    out.push_str(&format!("== {title} [{}] tab={}\n", view.phase, view.tab));

    match view.tab {
        Tab::Chat => {
            if let Some(session) = &view.active_session {
                for message in &session.messages {
                    out.push_str(&format!("{:>7}: {}\n", message.role.to_string(), message.content));
                }
            }
        }
        Tab::Agents => {
            for agent in &view.roster {
                let score = agent
                    .review_score
                    .map(|s| format!(" score={s:.1}"))
                    .unwrap_or_default();
                out.push_str(&format!(
                    "{:<6} {:<3} {:<8}{score} {}\n",
                    agent.name,
                    agent.team.to_string(),
                    agent.status.to_string(),
                    agent.reasoning
                ));
            }
        }
        Tab::Debate => {
            for turn in view.current_run.iter().flat_map(|r| &r.debate) {
                out.push_str(&format!(
                    "[{}] ({}) {}\n",
                    turn.agent_name, turn.team, turn.content
                ));
            }
        }
        Tab::PeerReview => {
            if let Some(review) = view.current_run.as_ref().and_then(|r| r.peer_review.as_ref()) {
                for model in review.models() {
                    out.push_str(&format!("{model}\n"));
                }
                for response in view.current_run.iter().flat_map(|r| &r.agents) {
                    if let Some(avg) = review.average_for(&response.agent_name) {
                        out.push_str(&format!("  {:<12} {avg:.1}\n", response.agent_name));
                    }
                }
            }
        }
        Tab::Verdict => {
            if let Some(run) = &view.current_run {
                out.push_str(&format!("{} ({})\n", run.verdict, run.status));
                for source in &run.sources {
                    out.push_str(&format!("  - {source}\n"));
                }
            }
        }
    }
    out
}
