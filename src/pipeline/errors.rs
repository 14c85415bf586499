//! Pipeline error types
//!
//! Every variant ends the run. Nothing is retried; a failed run is re-run as
//! a whole by the operator, which is safe because repairs are idempotent.

use thiserror::Error;

use crate::envelope::{CodecError, CodecErrorCode};
use crate::kv::StoreError;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Failure classes a caller can match on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedEnvelope,
    SchemaMismatch,
    EncodingError,
    StoreReadError,
    StoreWriteError,
    DeadlineExceeded,
}

/// Why a repair run stopped early
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to decode record {key}: {source}")]
    Decode { key: String, source: CodecError },

    #[error("Failed to encode record {key}: {source}")]
    Encode { key: String, source: CodecError },

    #[error("Failed to scan records: {0}")]
    Scan(#[source] StoreError),

    #[error("Failed to write record {key}: {source}")]
    Write { key: String, source: StoreError },

    #[error("Deadline exceeded after {processed} records ({repaired} repaired)")]
    DeadlineExceeded { processed: usize, repaired: usize },
}

impl PipelineError {
    /// Failure class
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Decode { source, .. } | PipelineError::Encode { source, .. } => {
                match source.code() {
                    CodecErrorCode::MalformedEnvelope => ErrorKind::MalformedEnvelope,
                    CodecErrorCode::SchemaMismatch => ErrorKind::SchemaMismatch,
                    CodecErrorCode::EncodingError => ErrorKind::EncodingError,
                }
            }
            PipelineError::Scan(_) => ErrorKind::StoreReadError,
            PipelineError::Write { .. } => ErrorKind::StoreWriteError,
            PipelineError::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
        }
    }

    /// Key of the record being processed when the run stopped
    pub fn key(&self) -> Option<&str> {
        match self {
            PipelineError::Decode { key, .. }
            | PipelineError::Encode { key, .. }
            | PipelineError::Write { key, .. } => Some(key),
            PipelineError::Scan(_) | PipelineError::DeadlineExceeded { .. } => None,
        }
    }
}
