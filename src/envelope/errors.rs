//! Envelope codec error types
//!
//! Error codes:
//! - RESETPV_MALFORMED_ENVELOPE (FATAL) - bad magic or broken protobuf structure
//! - RESETPV_SCHEMA_MISMATCH (FATAL) - embedded type identity differs from the descriptor
//! - RESETPV_ENCODING_ERROR (FATAL) - output buffer could not be allocated
//!
//! Every codec error aborts the repair run. None of them is retried.

use std::collections::TryReserveError;
use std::fmt;

/// Codec-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecErrorCode {
    /// Magic prefix missing or wire structure invalid
    MalformedEnvelope,
    /// Type identity in the wrapper does not match the expected kind
    SchemaMismatch,
    /// Buffer exhaustion while encoding
    EncodingError,
}

impl CodecErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            CodecErrorCode::MalformedEnvelope => "RESETPV_MALFORMED_ENVELOPE",
            CodecErrorCode::SchemaMismatch => "RESETPV_SCHEMA_MISMATCH",
            CodecErrorCode::EncodingError => "RESETPV_ENCODING_ERROR",
        }
    }
}

impl fmt::Display for CodecErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Envelope codec error with context
#[derive(Debug)]
pub struct CodecError {
    /// Error code
    code: CodecErrorCode,
    /// Human-readable message
    message: String,
    /// Optional context (byte offset, expected identity)
    details: Option<String>,
    /// Allocation failure behind an encoding error
    source: Option<TryReserveError>,
}

impl CodecError {
    /// Create a malformed envelope error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            code: CodecErrorCode::MalformedEnvelope,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create a malformed envelope error pointing at a byte offset
    pub fn malformed_at(offset: usize, message: impl Into<String>) -> Self {
        Self {
            code: CodecErrorCode::MalformedEnvelope,
            message: message.into(),
            details: Some(format!("byte_offset: {}", offset)),
            source: None,
        }
    }

    /// Create a schema mismatch error
    pub fn schema_mismatch(expected: &str, found: &str) -> Self {
        Self {
            code: CodecErrorCode::SchemaMismatch,
            message: format!("Envelope carries type {}", found),
            details: Some(format!("expected: {}", expected)),
            source: None,
        }
    }

    /// Create an encoding error from a failed buffer reservation
    pub fn encoding(requested: usize, source: TryReserveError) -> Self {
        Self {
            code: CodecErrorCode::EncodingError,
            message: "Failed to reserve output buffer".to_string(),
            details: Some(format!("requested_bytes: {}", requested)),
            source: Some(source),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> CodecErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Shift a byte offset recorded against a nested buffer so it points into
    /// the enclosing one.
    pub(crate) fn offset_by(mut self, base: usize) -> Self {
        if let Some(rest) = self
            .details
            .as_deref()
            .and_then(|d| d.strip_prefix("byte_offset: "))
        {
            if let Ok(offset) = rest.parse::<usize>() {
                self.details = Some(format!("byte_offset: {}", offset + base));
            }
        }
        self
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FATAL] {}: {}", self.code.code(), self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
