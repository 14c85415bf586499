//! SQLite-backed store accessor
//!
//! Reads and writes the `name`/`value` columns of a kine-style table.
//!
//! Scans are keyset-paginated on `rowid`. The highest rowid is captured when
//! the scan starts, so rows inserted during the scan are never visited and no
//! statement is held open while the pipeline writes.
//!
//! kine keeps several revisions under one `name` and `update` rewrites all of
//! them. While a scan is open, `update` first stashes the current value of
//! every revision the cursor has not fetched yet, and the cursor hands those
//! out instead of the rewritten bytes. Every record is therefore yielded as it
//! stood when the scan started, whatever the page size.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use super::errors::{StoreError, StoreResult};
use super::selector::{validate_table_name, Selector};
use super::{KvStore, Record};

/// Default number of rows fetched per page
pub const DEFAULT_PAGE_SIZE: usize = 128;

/// Rows of the open scan the cursor has not fetched yet
#[derive(Debug, Default)]
struct ScanWindow {
    pattern: String,
    fetched_upto: i64,
    upto: i64,
    // rowid -> value at scan start, for rows rewritten before being fetched
    preserved: HashMap<i64, Vec<u8>>,
}

/// Store accessor over one SQLite table
pub struct SqliteStore {
    conn: Connection,
    table: String,
    page_size: usize,
    window: RefCell<Option<ScanWindow>>,
}

impl SqliteStore {
    /// Open an existing database file read-write.
    ///
    /// A missing file is an error; the accessor never creates a database.
    pub fn open(path: &Path, table: &str) -> StoreResult<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|e| {
            StoreError::open_failed(format!("Failed to open {}", path.display()), e)
        })?;
        Self::from_connection(conn, table)
    }

    /// Wrap an already open connection
    pub fn from_connection(conn: Connection, table: &str) -> StoreResult<Self> {
        validate_table_name(table)?;
        Ok(Self {
            conn,
            table: table.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            window: RefCell::new(None),
        })
    }

    /// Rows fetched per page; zero is treated as one
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// How long SQLite waits on a locked database before failing
    pub fn set_busy_timeout(&self, timeout: Duration) -> StoreResult<()> {
        self.conn
            .busy_timeout(timeout)
            .map_err(|e| StoreError::open_failed("Failed to set busy timeout", e))
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Hand the connection back, e.g. to close it explicitly
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    fn max_row_id(&self) -> StoreResult<i64> {
        let sql = format!("SELECT MAX(rowid) FROM {}", self.table);
        let max: Option<Option<i64>> = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .optional()
            .map_err(|e| StoreError::read_failed("Failed to read scan bound", e))?;
        Ok(max.flatten().unwrap_or(0))
    }

    fn fetch_page(&self, pattern: &str, after: i64, upto: i64) -> StoreResult<Vec<Record>> {
        let sql = format!(
            "SELECT rowid, name, value FROM {} \
             WHERE rowid > ?1 AND rowid <= ?2 AND name LIKE ?3 \
             ORDER BY rowid LIMIT ?4",
            self.table
        );
        let read_err = |e| StoreError::read_failed("Failed to scan records", e);

        let mut stmt = self.conn.prepare_cached(&sql).map_err(read_err)?;
        let rows = stmt
            .query_map(params![after, upto, pattern, self.page_size as i64], |row| {
                let value: Option<Vec<u8>> = row.get(2)?;
                Ok(Record {
                    row_id: row.get(0)?,
                    key: row.get(1)?,
                    value: value.unwrap_or_default(),
                })
            })
            .map_err(read_err)?;

        let mut page = Vec::with_capacity(self.page_size);
        for row in rows {
            page.push(row.map_err(read_err)?);
        }

        let mut window = self.window.borrow_mut();
        if let Some(window) = window.as_mut() {
            if let Some(last) = page.last() {
                window.fetched_upto = last.row_id;
            }
            for record in &mut page {
                if let Some(original) = window.preserved.remove(&record.row_id) {
                    record.value = original;
                }
            }
        }
        Ok(page)
    }

    /// Stash the values of `key`'s unfetched revisions before they are rewritten
    fn preserve_unfetched(&self, key: &str) -> StoreResult<()> {
        let mut window = self.window.borrow_mut();
        let window = match window.as_mut() {
            Some(window) => window,
            None => return Ok(()),
        };

        let sql = format!(
            "SELECT rowid, value FROM {} \
             WHERE name = ?1 AND rowid > ?2 AND rowid <= ?3 AND name LIKE ?4",
            self.table
        );
        let write_err = |e| StoreError::write_failed(key, e);

        let mut stmt = self.conn.prepare_cached(&sql).map_err(write_err)?;
        let rows = stmt
            .query_map(
                params![key, window.fetched_upto, window.upto, window.pattern],
                |row| {
                    let value: Option<Vec<u8>> = row.get(1)?;
                    Ok((row.get::<_, i64>(0)?, value.unwrap_or_default()))
                },
            )
            .map_err(write_err)?;

        for row in rows {
            let (row_id, value) = row.map_err(write_err)?;
            // a second rewrite must not replace the scan-start value
            window.preserved.entry(row_id).or_insert(value);
        }
        Ok(())
    }
}

impl KvStore for SqliteStore {
    type Cursor<'a> = SqliteCursor<'a>;

    fn scan(&self, selector: &Selector) -> StoreResult<SqliteCursor<'_>> {
        let upto = self.max_row_id()?;
        *self.window.borrow_mut() = Some(ScanWindow {
            pattern: selector.pattern().to_string(),
            fetched_upto: 0,
            upto,
            preserved: HashMap::new(),
        });
        Ok(SqliteCursor {
            store: self,
            pattern: selector.pattern().to_string(),
            last_row_id: 0,
            upto,
            buffer: VecDeque::new(),
            done: false,
        })
    }

    fn update(&self, key: &str, value: &[u8]) -> StoreResult<usize> {
        self.preserve_unfetched(key)?;

        let sql = format!("UPDATE {} SET value = ?1 WHERE name = ?2", self.table);
        let mut stmt = self
            .conn
            .prepare_cached(&sql)
            .map_err(|e| StoreError::write_failed(key, e))?;
        stmt.execute(params![value, key])
            .map_err(|e| StoreError::write_failed(key, e))
    }
}

/// Single-pass cursor over the rows a selector matches.
///
/// Yields rows in rowid order, each with its value as of scan start. After
/// the first error it yields nothing more. Only one cursor per store is open
/// at a time; starting a new scan ends the previous one.
pub struct SqliteCursor<'a> {
    store: &'a SqliteStore,
    pattern: String,
    last_row_id: i64,
    upto: i64,
    buffer: VecDeque<Record>,
    done: bool,
}

impl Iterator for SqliteCursor<'_> {
    type Item = StoreResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.done {
            match self.store.fetch_page(&self.pattern, self.last_row_id, self.upto) {
                Ok(page) => {
                    if page.len() < self.store.page_size {
                        self.done = true;
                        self.store.window.borrow_mut().take();
                    }
                    if let Some(last) = page.last() {
                        self.last_row_id = last.row_id;
                    }
                    self.buffer.extend(page);
                }
                Err(e) => {
                    self.done = true;
                    self.store.window.borrow_mut().take();
                    return Some(Err(e));
                }
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}
