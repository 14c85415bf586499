//! CLI argument definitions using clap
//!
//! resetpv [--db <path>] [--selector <pattern> | <name>] [--table <table>]
//!         [--timeout <secs>] [--dry-run] [--config <path>]
//!
//! Flags override values from the configuration file.

use clap::Parser;
use std::path::PathBuf;

/// Reset Terminating PersistentVolumes back to their previous phase by
/// clearing the deletion timestamp stored in the cluster's SQLite datastore
#[derive(Parser, Debug, Default)]
#[command(name = "resetpv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Name of a single PersistentVolume to reset
    #[arg(conflicts_with = "selector")]
    pub name: Option<String>,

    /// SQLite database file [default: state.db]
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Key selector (SQL LIKE pattern) [default: /registry/persistentvolumes/%]
    #[arg(long)]
    pub selector: Option<String>,

    /// Table holding the key/value rows [default: kine]
    #[arg(long)]
    pub table: Option<String>,

    /// Timeout for the whole run, in seconds [default: 5]
    #[arg(long = "timeout", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Report what would be repaired without writing
    #[arg(long)]
    pub dry_run: bool,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
