//! Error types for the daily draft generator.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Longest detail message kept in notes and error snippets.
pub const MAX_NOTE_CHARS: usize = 400;

/// Mask credentials echoed back in URLs (`key=...`) and cap the length.
pub fn sanitize_message(message: &str) -> String {
    static KEY_PARAM: OnceLock<Regex> = OnceLock::new();
    let pattern = KEY_PARAM.get_or_init(|| Regex::new(r#"key=[^&\s"']*"#).expect("static regex"));
    let redacted = pattern.replace_all(message, "key=REDACTED");
    redacted.chars().take(MAX_NOTE_CHARS).collect()
}

/// Closed classification of everything that can go wrong while producing a record.
///
/// Produced directly by the request executor, parser and diversity guard; the retry
/// policy and the run orchestrator branch on this value only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Network-level failure: timeout, connection reset, DNS.
    Transport,
    /// 429 from the backend.
    RateLimited,
    /// 401 / 403 from the backend.
    AccessDenied,
    /// 400 and other client-side statuses.
    BadRequest,
    /// 404 from the backend.
    ModelNotFound,
    /// 5xx from the backend.
    ServerError,
    /// Text could not be turned into a record.
    MalformedOutput,
    /// Record parsed but too few fields were filled.
    LowSignalOutput,
    /// Record too similar to one already accepted in this run.
    LowDiversity,
    /// Catalog produced nothing usable.
    NoEligibleModels,
}

impl FailureKind {
    /// Map a non-success HTTP status to its failure kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => FailureKind::RateLimited,
            401 | 403 => FailureKind::AccessDenied,
            404 => FailureKind::ModelNotFound,
            500..=599 => FailureKind::ServerError,
            _ => FailureKind::BadRequest,
        }
    }

    /// Quota and permission failures: the backend is unusable for this key today.
    pub fn is_quota(self) -> bool {
        matches!(self, FailureKind::RateLimited | FailureKind::AccessDenied)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Transport => "transport_error",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::AccessDenied => "access_denied",
            FailureKind::BadRequest => "bad_request",
            FailureKind::ModelNotFound => "model_not_found",
            FailureKind::ServerError => "server_error",
            FailureKind::MalformedOutput => "malformed_output",
            FailureKind::LowSignalOutput => "low_signal_output",
            FailureKind::LowDiversity => "low_diversity",
            FailureKind::NoEligibleModels => "no_eligible_models",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure with its (already sanitized) detail message.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct GenerationError {
    pub kind: FailureKind,
    pub message: String,
    /// Server-provided wait hint, when the backend sent one.
    pub retry_after: Option<Duration>,
}

impl GenerationError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transport, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(FailureKind::MalformedOutput, message)
    }

    pub fn no_eligible_models() -> Self {
        Self::new(FailureKind::NoEligibleModels, "no eligible models")
    }
}

/// Crate-level errors that end a run before or outside generation.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Store request failed with status {status}: {message}")]
    StoreRequestFailed { status: u16, message: String },

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),
}

impl From<config::ConfigError> for DraftError {
    fn from(err: config::ConfigError) -> Self {
        DraftError::ConfigError(err.to_string())
    }
}
