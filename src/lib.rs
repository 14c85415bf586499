//! resetpv - reset Terminating PersistentVolumes in a k3s SQLite datastore
//!
//! Scans the kine table for PersistentVolume records, decodes each
//! Kubernetes protobuf envelope, clears the deletion timestamp and grace
//! period of volumes pending deletion and writes them back. Every byte
//! the repair does not touch is preserved.

pub mod cli;
pub mod envelope;
pub mod kv;
pub mod observability;
pub mod pipeline;
pub mod policy;
pub mod schema;
