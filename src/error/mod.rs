//! Error types for Ferry.

pub mod kind;

pub use kind::ErrorKind;

use thiserror::Error;

/// Primary error type for all Ferry operations.
#[derive(Error, Debug)]
pub enum FerryError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Could not route message: {0}")]
    Routing(String),

    #[error("No reply found from `{agent}`")]
    EmptyReply { agent: String },

    #[error("`{target}` did not answer the handoff from `{from}`")]
    HandoffNotAnswered { from: String, target: String },

    #[error("Handoff loop detected: {0}")]
    HandoffLoop(String),

    #[error("Run {run_id} did not finish within {timeout_ms}ms")]
    RunTimedOut { run_id: String, timeout_ms: u64 },

    #[error("Run {run_id} ended with status {status}: {message}")]
    RunFailed {
        run_id: String,
        status: String,
        message: String,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Document error: {0}")]
    Document(String),
}

impl FerryError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
            source: None,
        }
    }

    /// Classify this error into one of the closed error kinds.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Api { .. }
            | Self::Network(_)
            | Self::Serialization(_)
            | Self::Authentication(_)
            | Self::RateLimited { .. } => ErrorKind::RemoteCallFailure,
            Self::Routing(_) => ErrorKind::RoutingFailure,
            Self::EmptyReply { .. } => ErrorKind::EmptyReply,
            Self::HandoffNotAnswered { .. } => ErrorKind::HandoffNotAnswered,
            Self::HandoffLoop(_) => ErrorKind::HandoffLoop,
            Self::RunTimedOut { .. } => ErrorKind::RunTimedOut,
            Self::RunFailed { .. } => ErrorKind::RunFailed,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Io(_) | Self::Document(_) => ErrorKind::Document,
        }
    }

    /// Whether a caller could reasonably try the same call again.
    ///
    /// Nothing in Ferry retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::RateLimited { .. } | Self::RunTimedOut { .. } => true,
            Self::Api { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, FerryError>;
