//! CLI command implementation
//!
//! `reset` opens the database, runs one repair pass and closes the
//! connection. The run summary is written to stdout as a single JSON line.

use std::io::{self, Write};

use serde_json::{json, Value};

use super::config::RepairConfig;
use super::errors::{CliError, CliResult};
use crate::envelope::EnvelopeCodec;
use crate::kv::SqliteStore;
use crate::observability::{log_event, Event};
use crate::pipeline::{RecordOutcome, RepairPipeline, RunReport};
use crate::policy::ClearPendingDeletion;
use crate::schema::SchemaDescriptor;

/// Run one repair pass against the configured database
pub fn reset(config: &RepairConfig) -> CliResult<RunReport> {
    let db_path = config.db_path.display().to_string();

    let store = SqliteStore::open(&config.db_path, &config.table)?
        .with_page_size(config.page_size);
    // Another writer (the k3s server itself) may hold the lock briefly.
    store.set_busy_timeout(config.timeout())?;

    log_event(
        Event::StoreOpened,
        &[("db_path", db_path.as_str()), ("table", store.table())],
    );

    let report = {
        let pipeline = RepairPipeline::new(
            &store,
            EnvelopeCodec,
            SchemaDescriptor::persistent_volume(),
            ClearPendingDeletion,
            config.pipeline_config()?,
        );
        pipeline.run()?
    };

    store
        .into_connection()
        .close()
        .map_err(|(_, e)| CliError::store_error(format!("Failed to close {}: {}", db_path, e)))?;

    Ok(report)
}

/// JSON summary of a finished run
pub fn summary(config: &RepairConfig, report: &RunReport) -> Value {
    json!({
        "db_path": config.db_path.display().to_string(),
        "dry_run": config.dry_run,
        "scanned": report.scanned(),
        "repaired": report.keys_with(RecordOutcome::Repaired),
        "would_repair": report.keys_with(RecordOutcome::WouldRepair),
        "skipped": report.skipped(),
    })
}

/// Write a JSON value as one line to `out`
pub fn write_json<W: Write>(out: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Resolve, run and report
pub fn run_reset(config: &RepairConfig) -> CliResult<()> {
    let report = reset(config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_json(&mut out, &summary(config, &report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reset_missing_database_fails() {
        let dir = TempDir::new().unwrap();
        let config = RepairConfig {
            db_path: dir.path().join("absent.db"),
            ..RepairConfig::default()
        };
        let err = reset(&config).unwrap_err();
        assert_eq!(err.code(), &crate::cli::CliErrorCode::StoreError);
        assert!(!dir.path().join("absent.db").exists());
    }

    #[test]
    fn test_write_json_single_line() {
        let mut buf = Vec::new();
        write_json(&mut buf, &json!({"scanned": 3})).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "{\"scanned\":3}\n");
    }

    #[test]
    fn test_summary_on_empty_report() {
        let config = RepairConfig::default();
        let value = summary(&config, &RunReport::new());
        assert_eq!(value["scanned"], 0);
        assert_eq!(value["repaired"], json!([]));
        assert_eq!(value["dry_run"], false);
    }
}
