// crates/chrysalis-core/src/error.rs

use std::time::Duration;

use thiserror::Error;

/// Failures of the remote image-transformation backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransformError {
    /// Transport-level failure (connection refused, DNS, broken body).
    #[error("Transform request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("Transform backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The call did not complete within the configured bound.
    #[error("Transform timed out after {0:?}")]
    Timeout(Duration),

    /// The backend answered successfully but with no image bytes.
    #[error("Transform backend returned an empty image")]
    EmptyImage,

    /// No usable credential could be obtained for the backend.
    #[error("Transform credentials unavailable: {0}")]
    Credentials(String),
}

/// Failures of the content-addressed storage backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PublishError {
    /// Transport-level failure talking to the storage API.
    #[error("Publish request failed: {0}")]
    Request(String),

    /// The storage API answered with a non-success status.
    #[error("Storage backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The call did not complete within the configured bound.
    #[error("Publish timed out after {0:?}")]
    Timeout(Duration),

    /// Metadata could not be serialized or deserialized.
    #[error("Metadata serialization error: {0}")]
    Serialization(String),

    /// The storage API answered with a body we could not interpret.
    #[error("Malformed storage response: {0}")]
    MalformedResponse(String),

    /// No usable credential could be obtained for the storage API.
    #[error("Storage credentials unavailable: {0}")]
    Credentials(String),

    /// A reference string does not point at a metadata document we can resolve.
    #[error("Invalid metadata reference: {0}")]
    InvalidReference(String),
}

impl From<serde_json::Error> for PublishError {
    fn from(e: serde_json::Error) -> Self {
        PublishError::Serialization(e.to_string())
    }
}

/// Failures that leave the caller with nothing usable.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Stage 0 could not be published, so no chain exists.
    #[error("Genesis stage could not be published: {0}")]
    Genesis(#[source] PublishError),

    /// The orchestrator attempted a state transition it does not allow.
    #[error("Invalid pipeline transition: {0}")]
    InvalidTransition(String),

    /// A chain was assembled in a way that breaks its linkage rules.
    #[error("Invalid chain state: {0}")]
    InvalidState(String),

    /// A published chain could not be fetched back for verification.
    #[error("Verification error: {0}")]
    Verification(String),
}
