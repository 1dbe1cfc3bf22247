//! Client-side orchestration for a multi-agent debate interface.
//!
//! A user submits a query; a remote service answers directly or returns a
//! debate transcript plus verdict. This crate tracks the session and run
//! lifecycle, parses transcripts into per-agent turns and projects a
//! read-only view model for a presentation layer.
//!
//! # Components
//!
//! - [`ids`]: identifier generation
//! - [`document`]: uploaded reference text
//! - [`transcript`]: transcript tokenizer and parser
//! - [`run`]: debate runs and the [`RunController`]
//! - [`session`]: session snapshots, phase machine and [`SessionManager`]
//! - [`view`]: view projection
//! - [`client`]: the remote service seam and its HTTP implementation
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use council::{CouncilConfig, HttpBackend, RunController, SessionManager};
//!
//! # async fn demo() -> council::CouncilResult<()> {
//! let config = CouncilConfig::from_env();
//! let backend = Arc::new(HttpBackend::from_config(&config)?);
//! let controller = RunController::new(SessionManager::new().shared(), backend, config);
//! controller.submit("Should we adopt Rust for the ingest service?").await?;
//! let view = council::view::project(&*controller.state().read().await);
//! println!("{}", view.phase);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod ids;
pub mod roster;
pub mod run;
pub mod session;
pub mod transcript;
pub mod view;

pub use client::{ClassifyResponse, CouncilBackend, HttpBackend, ResponseShape};
pub use config::CouncilConfig;
pub use document::UploadedDocument;
pub use error::{CouncilError, CouncilResult};
pub use roster::{Agent, AgentId, AgentRef, AgentStatus, Roster, Team};
pub use run::{DebateRun, PeerReview, RunController, RunOutcome, RunStatus};
pub use session::{Message, Phase, Role, Session, SessionManager, SharedSessionManager};
pub use transcript::{parse_transcript, AgentResponse, DebateMessage};
pub use view::{project, Tab, ViewModel};
