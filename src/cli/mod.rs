//! Command-line interface
//!
//! Parses flags, resolves the run configuration and runs the repair.

mod args;
mod commands;
mod config;
mod errors;

pub use args::Cli;
pub use commands::{reset, run_reset, summary, write_json};
pub use config::RepairConfig;
pub use errors::{CliError, CliErrorCode, CliResult};

use crate::observability::{bool_field, log_event, Event};

/// Parse arguments and run
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let config = RepairConfig::resolve(&cli)?;

    let db_path = config.db_path.display().to_string();
    let timeout = config.timeout_secs.to_string();
    log_event(
        Event::ConfigLoaded,
        &[
            ("db_path", db_path.as_str()),
            ("table", config.table.as_str()),
            ("selector", config.selector.as_str()),
            ("volume", config.volume.as_deref().unwrap_or("")),
            ("timeout_secs", timeout.as_str()),
            ("dry_run", bool_field(config.dry_run)),
        ],
    );

    run_reset(&config)
}
