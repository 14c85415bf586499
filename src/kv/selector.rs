//! Key selectors
//!
//! A selector is a SQL `LIKE` pattern over record keys: `%` matches any run
//! of characters and `_` matches one. SQLite compares ASCII letters
//! case-insensitively.

use std::fmt;

use super::errors::{StoreError, StoreResult};

/// Key prefix under which the API server stores PersistentVolumes
pub const PERSISTENT_VOLUME_PREFIX: &str = "/registry/persistentvolumes/";

/// Selector used when none is configured
pub const DEFAULT_SELECTOR: &str = "/registry/persistentvolumes/%";

const MAX_NAME_LEN: usize = 253;

/// Pattern scoping which records a scan visits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pattern: String,
}

impl Selector {
    /// Selector for a raw `LIKE` pattern
    pub fn new(pattern: impl Into<String>) -> StoreResult<Self> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(StoreError::invalid_selector("Selector pattern is empty"));
        }
        Ok(Self { pattern })
    }

    /// Selector matching exactly one named PersistentVolume.
    ///
    /// The name must be a DNS subdomain, which keeps `LIKE` wildcards out of
    /// the pattern.
    pub fn for_volume(name: &str) -> StoreResult<Self> {
        validate_object_name(name)?;
        Ok(Self {
            pattern: format!("{}{}", PERSISTENT_VOLUME_PREFIX, name),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_SELECTOR.to_string(),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

fn validate_object_name(name: &str) -> StoreResult<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(StoreError::invalid_selector(format!(
            "Object name must be 1-{} characters",
            MAX_NAME_LEN
        )));
    }

    let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.';
    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();

    let first = name.chars().next().unwrap_or('-');
    let last = name.chars().last().unwrap_or('-');
    if !name.chars().all(allowed) || !alnum(first) || !alnum(last) {
        return Err(StoreError::invalid_selector(format!(
            "Invalid object name '{}': must be a lowercase DNS subdomain",
            name
        )));
    }
    Ok(())
}

/// Reject table names that are not plain SQL identifiers.
///
/// The table name is spliced into statements, so only `[A-Za-z_][A-Za-z0-9_]*`
/// is accepted.
pub fn validate_table_name(table: &str) -> StoreResult<()> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if !valid {
        return Err(StoreError::invalid_selector(format!(
            "Invalid table name '{}'",
            table
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::StoreErrorCode;

    #[test]
    fn test_default_selector() {
        assert_eq!(Selector::default().pattern(), "/registry/persistentvolumes/%");
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let err = Selector::new("").unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::InvalidSelector);
    }

    #[test]
    fn test_for_volume() {
        let selector = Selector::for_volume("pvc-3f1e.data-0").unwrap();
        assert_eq!(selector.pattern(), "/registry/persistentvolumes/pvc-3f1e.data-0");
    }

    #[test]
    fn test_for_volume_rejects_wildcards_and_case() {
        assert!(Selector::for_volume("pv%").is_err());
        assert!(Selector::for_volume("pv_1").is_err());
        assert!(Selector::for_volume("PV1").is_err());
        assert!(Selector::for_volume("-pv").is_err());
        assert!(Selector::for_volume("pv.").is_err());
        assert!(Selector::for_volume("").is_err());
        assert!(Selector::for_volume(&"a".repeat(254)).is_err());
    }

    #[test]
    fn test_table_names() {
        assert!(validate_table_name("kine").is_ok());
        assert!(validate_table_name("_kine_v2").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("2kine").is_err());
        assert!(validate_table_name("kine; DROP TABLE kine").is_err());
        assert!(validate_table_name("\"kine\"").is_err());
    }
}
