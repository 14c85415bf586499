//! Key-value store access
//!
//! The store is a table of `name`/`value` rows. This module only streams
//! rows by key pattern and overwrites values by key; it never looks inside a
//! value.

mod errors;
mod selector;
mod sqlite;

pub use errors::{StoreError, StoreErrorCode, StoreResult};
pub use selector::{validate_table_name, Selector, DEFAULT_SELECTOR, PERSISTENT_VOLUME_PREFIX};
pub use sqlite::{SqliteCursor, SqliteStore, DEFAULT_PAGE_SIZE};

/// One stored row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Row identifier; defines scan order
    pub row_id: i64,
    /// Key (`name` column)
    pub key: String,
    /// Opaque value (`value` column)
    pub value: Vec<u8>,
}

/// Access to the records a repair run reads and writes
pub trait KvStore {
    /// Lazy, single-pass sequence of matching records
    type Cursor<'a>: Iterator<Item = StoreResult<Record>>
    where
        Self: 'a;

    /// Start a scan over every record whose key matches `selector`.
    ///
    /// The match set is bounded by the store contents at scan start.
    fn scan(&self, selector: &Selector) -> StoreResult<Self::Cursor<'_>>;

    /// Unconditionally replace the value stored under `key`.
    ///
    /// Each call commits on its own. Returns the number of rows changed.
    fn update(&self, key: &str, value: &[u8]) -> StoreResult<usize>;
}
