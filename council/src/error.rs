//! Council error types
//!
//! One error enum for every fallible council operation. Remote failures are
//! turned into state updates by the run controller, so most of these surface
//! to callers only as rejected intents.

use thiserror::Error;

/// Result type alias for council operations
pub type CouncilResult<T> = Result<T, CouncilError>;

/// Errors that can occur in the council client
#[derive(Error, Debug)]
pub enum CouncilError {
    /// The request never produced an HTTP response
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The remote service answered with a non-2xx status
    #[error("API error: {status}")]
    HttpStatus { status: u16, body: String },

    /// The response body could not be decoded
    #[error("Response parse error: {0}")]
    ParseError(String),

    /// Configuration could not be built or loaded
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Session id does not exist
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Run id does not exist in the session
    #[error("Debate run not found: {0}")]
    RunNotFound(String),

    /// An intent needed an active session and there is none
    #[error("No active session")]
    NoActiveSession,

    /// Blank query text
    #[error("Query is empty")]
    EmptyQuery,

    /// A run is still pending in the target session
    #[error("A run is already in flight in session {session_id}")]
    RunInFlight { session_id: String },

    /// Phase or run-status transition not in the transition table
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl CouncilError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an invalid transition error
    pub fn transition(from: impl ToString, to: impl ToString) -> Self {
        Self::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Check if this error is retryable (transient failure)
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(message) => {
                let lower = message.to_lowercase();
                lower.contains("timeout") || lower.contains("connection")
            }
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for CouncilError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}
