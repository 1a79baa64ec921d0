//! Errors surfaced while resolving a flow.
//!
//! Expired or unknown flows are not errors: they are recovered by redirecting
//! to a fresh flow. Everything here is propagated to the host error handler.

use std::fmt;

/// Categories of flow lookup failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowErrorKind {
    /// Identity provider answered with a status we do not recover from
    Upstream,
    /// The identity provider could not be reached (connect, timeout, I/O)
    Transport,
    /// A 200 body that is not a flow
    Decode,
}

impl fmt::Display for FlowErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowErrorKind::Upstream => write!(f, "upstream"),
            FlowErrorKind::Transport => write!(f, "transport"),
            FlowErrorKind::Decode => write!(f, "decode"),
        }
    }
}

/// Structured flow error with kind and details.
#[derive(Debug, Clone)]
pub struct FlowError {
    pub kind: FlowErrorKind,
    /// One-line summary suitable for logs
    pub message: String,
    /// Upstream status, when the provider answered at all
    pub status: Option<u16>,
    /// Raw response body or client error text
    pub details: Option<String>,
}

impl FlowError {
    /// Creates an error for an unrecoverable upstream status, keeping the raw body.
    pub fn upstream(status: u16, body: Option<String>) -> Self {
        Self {
            kind: FlowErrorKind::Upstream,
            message: format!("identity provider returned HTTP {status}"),
            status: Some(status),
            details: body.filter(|b| !b.is_empty()),
        }
    }

    /// Creates a transport error from the client's failure.
    pub fn transport(error: &impl fmt::Display) -> Self {
        Self {
            kind: FlowErrorKind::Transport,
            message: "identity provider unreachable".to_string(),
            status: None,
            details: Some(error.to_string()),
        }
    }

    /// Creates a decode error for a 200 body that is not a flow.
    pub fn decode(error: &serde_json::Error, body: &str) -> Self {
        Self {
            kind: FlowErrorKind::Decode,
            message: format!("invalid flow payload: {error}"),
            status: Some(200),
            details: Some(body.to_string()),
        }
    }

    /// Raw upstream body, if any.
    pub fn body(&self) -> Option<&str> {
        self.details.as_deref()
    }
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for FlowError {}

/// Result type for flow operations.
pub type FlowResult<T> = std::result::Result<T, FlowError>;
