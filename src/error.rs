//! Error types for mcp-bridge
//!
//! Centralized error handling using thiserror. Every failure an invocation
//! can produce maps onto exactly one wire-visible `ErrorKind`; callers see
//! the kind plus a public message, and internal detail stays in the logs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tools::ValidationFailure;

/// Machine-readable error category carried in the failure envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    ValidationError,
    InvalidArgument,
    UpstreamError,
    UpstreamTimeout,
    InternalError,
}

impl ErrorKind {
    /// True for failures originating in the inference backend.
    /// `UpstreamTimeout` is a specialization of `UpstreamError`.
    pub fn is_upstream(self) -> bool {
        matches!(self, Self::UpstreamError | Self::UpstreamTimeout)
    }
}

/// All error conditions that can surface from the bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Requested tool name has no registered descriptor
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Arguments failed the tool's declared schema
    #[error("{0}")]
    Validation(#[from] ValidationFailure),

    /// Arguments were well-typed but a tool precondition failed
    #[error("{0}")]
    InvalidArgument(String),

    /// Inference backend rejected the call or is unreachable
    #[error("{0}")]
    Upstream(String),

    /// Inference backend did not answer within the configured deadline
    #[error("{0}")]
    UpstreamTimeout(String),

    /// IO error outside any classified precondition
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unclassified failure inside a tool body, including a caught panic
    #[error("{0}")]
    Internal(String),
}

impl BridgeError {
    /// The wire-visible category for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ToolNotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Upstream(_) => ErrorKind::UpstreamError,
            Self::UpstreamTimeout(_) => ErrorKind::UpstreamTimeout,
            Self::Io(_) | Self::Json(_) | Self::Internal(_) => ErrorKind::InternalError,
        }
    }

    pub fn is_upstream(&self) -> bool {
        self.kind().is_upstream()
    }

    /// Message safe to return to the caller. Internal errors collapse to a
    /// fixed string; the full detail is only logged server-side.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::InternalError => "unexpected internal error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;
