//! Shared fixtures for integration tests
//!
//! Envelopes are built field by field in the order the API server writes
//! them, so that expected bytes can be constructed independently of the
//! codec under test.

#![allow(dead_code)]

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use resetpv::envelope::{Message, ENVELOPE_MAGIC};
use resetpv::pipeline::Clock;
use rusqlite::{params, Connection};
use tempfile::TempDir;

// =============================================================================
// Envelopes
// =============================================================================

/// Deletion state of a fixture volume
#[derive(Debug, Clone, Copy)]
pub struct Deletion {
    pub seconds: i64,
    pub grace: Option<i64>,
}

pub const TERMINATING: Deletion = Deletion {
    seconds: 1_700_000_000,
    grace: Some(0),
};

fn time(seconds: i64) -> Message {
    Message::new().with_varint(1, seconds as u64)
}

/// ObjectMeta of a bound volume, with labels, a finalizer and an unknown
/// trailing field
pub fn object_meta(name: &str, deletion: Option<Deletion>) -> Message {
    let label = Message::new()
        .with_string(1, "topology.kubernetes.io/zone")
        .with_string(2, "eu-west-1a");

    let mut meta = Message::new()
        .with_string(1, name)
        .with_string(2, "")
        .with_string(3, "")
        .with_string(4, "")
        .with_string(5, "6f0c1a2e-1d3b-4c5a-9e7f-0a1b2c3d4e5f")
        .with_string(6, "4711")
        .with_varint(7, 0)
        .with_message(8, &time(1_690_000_000));
    if let Some(deletion) = deletion {
        meta = meta.with_message(9, &time(deletion.seconds));
        if let Some(grace) = deletion.grace {
            meta = meta.with_varint(10, grace as u64);
        }
    }
    meta.with_message(11, &label)
        .with_string(14, "kubernetes.io/pv-protection")
        .with_fixed32(99, 0xdead_beef)
}

/// Full typed envelope of a PersistentVolume
pub fn pv_envelope(name: &str, deletion: Option<Deletion>) -> Vec<u8> {
    typed_envelope("v1", "PersistentVolume", &pv_object(name, deletion))
}

pub fn pv_object(name: &str, deletion: Option<Deletion>) -> Message {
    let spec = Message::new()
        .with_message(
            1,
            &Message::new().with_message(
                1,
                &Message::new().with_string(1, "storage").with_string(2, "10Gi"),
            ),
        )
        .with_string(4, "Retain")
        .with_string(6, "local-path");
    let status = Message::new().with_string(1, "Bound");

    Message::new()
        .with_message(1, &object_meta(name, deletion))
        .with_message(2, &spec)
        .with_message(3, &status)
}

pub fn typed_envelope(api_version: &str, kind: &str, object: &Message) -> Vec<u8> {
    let type_meta = Message::new()
        .with_string(1, api_version)
        .with_string(2, kind);
    let envelope = Message::new()
        .with_message(1, &type_meta)
        .with_message(2, object)
        .with_string(3, "")
        .with_string(4, "");

    let mut bytes = ENVELOPE_MAGIC.to_vec();
    envelope.encode_into(&mut bytes);
    bytes
}

/// Bytes from a hex string; panics on malformed input
pub fn from_hex(hex: &str) -> Vec<u8> {
    assert!(hex.len() % 2 == 0, "odd hex length");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
        .collect()
}

// =============================================================================
// Datastore
// =============================================================================

/// A kine-shaped SQLite database in a temp directory
pub struct KineDb {
    _dir: TempDir,
    path: PathBuf,
}

impl KineDb {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("state.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE kine (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                created INTEGER,
                deleted INTEGER,
                create_revision INTEGER,
                prev_revision INTEGER,
                lease INTEGER,
                value BLOB,
                old_value BLOB
            );",
        )
        .unwrap();
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connect(&self) -> Connection {
        Connection::open(&self.path).unwrap()
    }

    pub fn insert(&self, key: &str, value: &[u8]) {
        self.connect()
            .execute(
                "INSERT INTO kine (name, created, deleted, value) VALUES (?1, 1, 0, ?2)",
                params![key, value],
            )
            .unwrap();
    }

    /// Value of the latest row for `key`
    pub fn value(&self, key: &str) -> Vec<u8> {
        self.connect()
            .query_row(
                "SELECT value FROM kine WHERE name = ?1 ORDER BY id DESC LIMIT 1",
                params![key],
                |row| row.get(0),
            )
            .unwrap()
    }

    /// Every `(name, value)` row in id order
    pub fn dump(&self) -> Vec<(String, Vec<u8>)> {
        let conn = self.connect();
        let mut stmt = conn
            .prepare("SELECT name, value FROM kine ORDER BY id")
            .unwrap();
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap();
        rows.map(|r| r.unwrap()).collect()
    }
}

// =============================================================================
// Clocks
// =============================================================================

/// Clock that advances by a fixed step every time it is read
pub struct StepClock {
    now: Cell<Instant>,
    step: Duration,
}

impl StepClock {
    pub fn new(step: Duration) -> Self {
        Self {
            now: Cell::new(Instant::now()),
            step,
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> Instant {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}
