//! Unified adapter error types.
//!
//! `AdapterError` is what every canonical operation returns. Each variant maps
//! to one machine-checkable [`ErrorKind`] and carries a human-readable
//! explanation. Transport-level errors (`HttpError`, `WsError`) stay internal
//! to their layer and are folded into `SourceUnavailable` at the component
//! boundary.

use crate::capability::Operation;
use crate::shared::Symbol;
use serde::Serialize;
use thiserror::Error;

// ─── ErrorKind ───────────────────────────────────────────────────────────────

/// Machine-checkable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    NotSupported,
    Unsupported,
    SourceUnavailable,
    Stale,
    InvalidRequest,
    SigningFailure,
    Timeout,
}

impl ErrorKind {
    /// Structurally impossible requests: returned immediately, never retried.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ErrorKind::NotSupported | ErrorKind::Unsupported | ErrorKind::InvalidRequest
        )
    }

    /// Whether the facade retries this kind (once, with backoff).
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::SourceUnavailable)
    }
}

// ─── Backend ─────────────────────────────────────────────────────────────────

/// Which backend a `SourceUnavailable` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Backend {
    ReyaRest,
    ReyaStream,
    Fallback,
    Signer,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::ReyaRest => write!(f, "Reya REST"),
            Backend::ReyaStream => write!(f, "Reya market-data stream"),
            Backend::Fallback => write!(f, "fallback spot exchange"),
            Backend::Signer => write!(f, "signer"),
        }
    }
}

// ─── NotSupportedCause ───────────────────────────────────────────────────────

/// Why something is `NotSupported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotSupportedCause {
    /// The adapter's allow-list does not include it yet.
    AdapterNotExtended,
    /// Allow-listed, but the backend does not list it.
    BackendLacksMarket,
    /// No backend (native or fallback) serves this timeframe.
    Timeframe,
}

impl std::fmt::Display for NotSupportedCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotSupportedCause::AdapterNotExtended => {
                write!(f, "adapter has not been extended to this market")
            }
            NotSupportedCause::BackendLacksMarket => write!(f, "backend does not list this market"),
            NotSupportedCause::Timeframe => write!(f, "no backend serves this timeframe"),
        }
    }
}

// ─── AdapterError ────────────────────────────────────────────────────────────

/// Top-level adapter error.
#[derive(Error, Debug, Clone)]
pub enum AdapterError {
    #[error("Not supported: {subject}: {cause} ({detail})")]
    NotSupported {
        subject: String,
        cause: NotSupportedCause,
        detail: String,
    },

    #[error("Unsupported operation {operation}: {reason}")]
    Unsupported {
        operation: Operation,
        reason: &'static str,
    },

    #[error("Source unavailable ({backend}): {detail}")]
    SourceUnavailable { backend: Backend, detail: String },

    #[error("Stale data for {symbol}: {detail}")]
    Stale { symbol: Symbol, detail: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Signing failure: {0}")]
    SigningFailure(String),

    #[error("Timeout: {operation} gave no terminal response within {after_ms}ms")]
    Timeout { operation: String, after_ms: u64 },
}

impl AdapterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::NotSupported { .. } => ErrorKind::NotSupported,
            AdapterError::Unsupported { .. } => ErrorKind::Unsupported,
            AdapterError::SourceUnavailable { .. } => ErrorKind::SourceUnavailable,
            AdapterError::Stale { .. } => ErrorKind::Stale,
            AdapterError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            AdapterError::SigningFailure(_) => ErrorKind::SigningFailure,
            AdapterError::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    pub fn unavailable(backend: Backend, detail: impl std::fmt::Display) -> Self {
        AdapterError::SourceUnavailable {
            backend,
            detail: detail.to_string(),
        }
    }

    pub fn invalid(detail: impl Into<String>) -> Self {
        AdapterError::InvalidRequest(detail.into())
    }
}

impl From<WsError> for AdapterError {
    fn from(e: WsError) -> Self {
        AdapterError::unavailable(Backend::ReyaStream, e)
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(e: serde_json::Error) -> Self {
        AdapterError::unavailable(
            Backend::ReyaRest,
            format!("unexpected response shape: {}", e),
        )
    }
}

/// Convenience alias used across the crate.
pub type AdapterResult<T> = Result<T, AdapterError>;

// ─── HttpError ───────────────────────────────────────────────────────────────

/// HTTP-layer errors.
#[derive(Error, Debug)]
pub enum HttpError {
    #[cfg(feature = "http")]
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Rate limited")]
    RateLimited,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl HttpError {
    /// Attach the backend the request went to.
    pub fn into_adapter(self, backend: Backend) -> AdapterError {
        AdapterError::unavailable(backend, self)
    }
}

// ─── WsError ─────────────────────────────────────────────────────────────────

/// WebSocket errors.
#[derive(Error, Debug)]
pub enum WsError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Connection closed: code={code:?} reason={reason}")]
    Closed { code: Option<u16>, reason: String },
}
