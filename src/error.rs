//! Error types for the conversation orchestration engine.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds produced across the provider, memory, and orchestrator layers.
///
/// Transport failures from `reqwest` convert via `#[from]` into [`Error::Unknown`]
/// at the boundary; the OpenAI-compatible provider reclassifies them into
/// `Authentication`/`RateLimit`/`InvalidRequest`/`Server` by HTTP status before
/// they reach a caller, since the same transport error class means different
/// things at different status codes.
#[derive(Error, Debug)]
pub enum Error {
    /// 401/403 from the provider.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// 429, or an explicit quota message in the response body.
    #[error("rate limited: {0}")]
    RateLimit(String),

    /// 400: bad parameters, over-context-length, malformed request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// 5xx, or a stream-carried `error` payload.
    #[error("server error: {0}")]
    Server(String),

    /// Any other transport failure, including non-SSE-framed error bodies.
    #[error("unknown provider error: {0}")]
    Unknown(String),

    /// Storage-layer failure. Logged and swallowed on background persistence
    /// paths; surfaced only when raised synchronously through a user-invoked
    /// memory operation.
    #[error("storage error: {0}")]
    Io(String),

    /// JSON (de)serialization failure. The only kind that triggers
    /// re-prompting inside the structured-output retry loop.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Caller misuse: template/strategy conflict, invalid tool schema,
    /// switch/delete of an unknown session, delete of the active session.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// Library not initialized, or another invalid-state condition that
    /// must be raised rather than logged. Max-tool-rounds-exceeded is
    /// intentionally NOT this variant — per spec it is logged and returns
    /// the last text, never raised.
    #[error("invalid state: {0}")]
    State(String),

    /// Propagated unchanged; never converted to another kind.
    #[error("cancelled")]
    Cancellation,

    /// Transport failure before status-based classification.
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub fn authentication(msg: impl Into<String>) -> Self {
        Error::Authentication(msg.into())
    }

    pub fn rate_limit(msg: impl Into<String>) -> Self {
        Error::RateLimit(msg.into())
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Error::InvalidRequest(msg.into())
    }

    pub fn server(msg: impl Into<String>) -> Self {
        Error::Server(msg.into())
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        Error::Unknown(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Error::Io(msg.into())
    }

    pub fn argument(msg: impl Into<String>) -> Self {
        Error::Argument(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Error::State(msg.into())
    }

    /// True for kinds a caller might reasonably retry. Used by [`crate::retry`].
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RateLimit(_) | Error::Server(_))
    }

    /// Maps an HTTP status code to the corresponding error kind, carrying
    /// `body` as the message. Used by the OpenAI-compatible provider on
    /// non-2xx responses (both streaming and non-streaming paths).
    pub fn from_status(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        let body = body.into();
        match status.as_u16() {
            401 | 403 => Error::authentication(body),
            429 => Error::rate_limit(body),
            400 => Error::invalid_request(body),
            500..=599 => Error::server(body),
            _ => Error::unknown(format!("unexpected status {status}: {body}")),
        }
    }
}
