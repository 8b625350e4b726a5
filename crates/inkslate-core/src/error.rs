//! Error types for the engine's fallible edges.
//!
//! Geometry and interaction code is total and never returns these; they only
//! surface from configuration, document parsing and sink callbacks.

use crate::annotation::AnnotationId;
use thiserror::Error;

/// Errors raised while configuring the engine or reading annotation documents.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported annotations file version: {0}")]
    UnsupportedVersion(u32),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors reported by an [`AnnotationSink`](crate::sink::AnnotationSink).
///
/// The engine logs these and carries on; persistence failures belong to the
/// caller.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SinkError {
    #[error("Annotation not found: {0}")]
    NotFound(AnnotationId),
    #[error("Rejected by sink: {0}")]
    Rejected(String),
}

/// Result type for sink callbacks.
pub type SinkResult<T> = Result<T, SinkError>;
