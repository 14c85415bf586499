//! KV store error types
//!
//! Error codes:
//! - RESETPV_STORE_OPEN_FAILED - database could not be opened or configured
//! - RESETPV_STORE_READ_ERROR - scan query failed
//! - RESETPV_STORE_WRITE_ERROR - update could not commit
//! - RESETPV_INVALID_SELECTOR - selector or table name rejected before use

use std::fmt;

/// Store-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    StoreOpenFailed,
    StoreReadError,
    StoreWriteError,
    InvalidSelector,
}

impl StoreErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::StoreOpenFailed => "RESETPV_STORE_OPEN_FAILED",
            StoreErrorCode::StoreReadError => "RESETPV_STORE_READ_ERROR",
            StoreErrorCode::StoreWriteError => "RESETPV_STORE_WRITE_ERROR",
            StoreErrorCode::InvalidSelector => "RESETPV_INVALID_SELECTOR",
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Store error with the key involved, if any
#[derive(Debug)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
    key: Option<String>,
    source: Option<rusqlite::Error>,
}

impl StoreError {
    /// Database could not be opened
    pub fn open_failed(message: impl Into<String>, source: rusqlite::Error) -> Self {
        Self {
            code: StoreErrorCode::StoreOpenFailed,
            message: message.into(),
            key: None,
            source: Some(source),
        }
    }

    /// Scan failed
    pub fn read_failed(message: impl Into<String>, source: rusqlite::Error) -> Self {
        Self {
            code: StoreErrorCode::StoreReadError,
            message: message.into(),
            key: None,
            source: Some(source),
        }
    }

    /// Update of `key` failed to commit
    pub fn write_failed(key: &str, source: rusqlite::Error) -> Self {
        Self {
            code: StoreErrorCode::StoreWriteError,
            message: "Failed to write repaired value".to_string(),
            key: Some(key.to_string()),
            source: Some(source),
        }
    }

    /// Selector or table name rejected
    pub fn invalid_selector(message: impl Into<String>) -> Self {
        Self {
            code: StoreErrorCode::InvalidSelector,
            message: message.into(),
            key: None,
            source: None,
        }
    }

    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Key the failing operation targeted
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code.code(), self.message)?;
        if let Some(ref key) = self.key {
            write!(f, " (key: {})", key)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(StoreErrorCode::StoreOpenFailed.code(), "RESETPV_STORE_OPEN_FAILED");
        assert_eq!(StoreErrorCode::StoreReadError.code(), "RESETPV_STORE_READ_ERROR");
        assert_eq!(StoreErrorCode::StoreWriteError.code(), "RESETPV_STORE_WRITE_ERROR");
        assert_eq!(StoreErrorCode::InvalidSelector.code(), "RESETPV_INVALID_SELECTOR");
    }

    #[test]
    fn test_write_failed_carries_key() {
        let err = StoreError::write_failed(
            "/registry/persistentvolumes/pv-1",
            rusqlite::Error::QueryReturnedNoRows,
        );
        assert_eq!(err.key(), Some("/registry/persistentvolumes/pv-1"));
        let display = err.to_string();
        assert!(display.contains("RESETPV_STORE_WRITE_ERROR"));
        assert!(display.contains("pv-1"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
