//! Run configuration
//!
//! Resolved from, in increasing precedence: built-in defaults, an optional
//! JSON file, command-line flags. The result is validated once and then
//! passed down explicitly.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::args::Cli;
use super::errors::{CliError, CliResult};
use crate::kv::{validate_table_name, Selector, DEFAULT_PAGE_SIZE, DEFAULT_SELECTOR};
use crate::pipeline::PipelineConfig;

/// Configuration of one repair run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepairConfig {
    /// SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Table with `name`/`value` columns
    #[serde(default = "default_table")]
    pub table: String,

    /// Key selector, SQL LIKE pattern
    #[serde(default = "default_selector")]
    pub selector: String,

    /// Single PersistentVolume name; replaces the selector when set
    #[serde(default)]
    pub volume: Option<String>,

    /// Timeout for the whole run
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Decide without writing
    #[serde(default)]
    pub dry_run: bool,

    /// Rows fetched per scan page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("state.db")
}
fn default_table() -> String {
    "kine".to_string()
}
fn default_selector() -> String {
    DEFAULT_SELECTOR.to_string()
}
fn default_timeout_secs() -> u64 {
    5
}
fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            table: default_table(),
            selector: default_selector(),
            volume: None,
            timeout_secs: default_timeout_secs(),
            dry_run: false,
            page_size: default_page_size(),
        }
    }
}

impl RepairConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::config_error(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let config: RepairConfig = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Defaults or `--config` file, overridden by flags, then validated
    pub fn resolve(cli: &Cli) -> CliResult<Self> {
        let mut config = match cli.config {
            Some(ref path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(ref db) = cli.db {
            config.db_path = db.clone();
        }
        if let Some(ref table) = cli.table {
            config.table = table.clone();
        }
        if let Some(ref selector) = cli.selector {
            config.selector = selector.clone();
            config.volume = None;
        }
        if let Some(ref name) = cli.name {
            config.volume = Some(name.clone());
        }
        if let Some(timeout) = cli.timeout_secs {
            config.timeout_secs = timeout;
        }
        if cli.dry_run {
            config.dry_run = true;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.timeout_secs == 0 {
            return Err(CliError::config_error("timeout_secs must be > 0"));
        }
        if self.page_size == 0 {
            return Err(CliError::config_error("page_size must be > 0"));
        }
        validate_table_name(&self.table).map_err(|e| CliError::config_error(e.message()))?;
        self.key_selector()?;
        Ok(())
    }

    /// Selector for this run
    pub fn key_selector(&self) -> CliResult<Selector> {
        let selector = match self.volume {
            Some(ref name) => Selector::for_volume(name),
            None => Selector::new(self.selector.as_str()),
        };
        selector.map_err(|e| CliError::config_error(e.message()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Settings handed to the pipeline
    pub fn pipeline_config(&self) -> CliResult<PipelineConfig> {
        Ok(PipelineConfig {
            selector: self.key_selector()?,
            timeout: self.timeout(),
            dry_run: self.dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = RepairConfig::resolve(&Cli::default()).unwrap();
        assert_eq!(config.db_path, PathBuf::from("state.db"));
        assert_eq!(config.table, "kine");
        assert_eq!(config.selector, "/registry/persistentvolumes/%");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(!config.dry_run);
    }

    #[test]
    fn test_file_values_with_partial_fields() {
        let file = write_config(r#"{"db_path": "/tmp/k3s.db", "timeout_secs": 60}"#);
        let config = RepairConfig::load(file.path()).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/k3s.db"));
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.table, "kine");
    }

    #[test]
    fn test_flags_override_file() {
        let file = write_config(r#"{"timeout_secs": 60, "selector": "/a/%"}"#);
        let cli = Cli {
            config: Some(file.path().to_path_buf()),
            timeout_secs: Some(2),
            selector: Some("/b/%".to_string()),
            ..Cli::default()
        };
        let config = RepairConfig::resolve(&cli).unwrap();
        assert_eq!(config.timeout_secs, 2);
        assert_eq!(config.key_selector().unwrap().pattern(), "/b/%");
    }

    #[test]
    fn test_name_replaces_selector() {
        let cli = Cli {
            name: Some("pv-data-0".to_string()),
            ..Cli::default()
        };
        let config = RepairConfig::resolve(&cli).unwrap();
        assert_eq!(
            config.pipeline_config().unwrap().selector.pattern(),
            "/registry/persistentvolumes/pv-data-0"
        );
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let cli = Cli {
            timeout_secs: Some(0),
            ..Cli::default()
        };
        let err = RepairConfig::resolve(&cli).unwrap_err();
        assert!(err.message().contains("timeout_secs"));
    }

    #[test]
    fn test_rejects_bad_table() {
        let file = write_config(r#"{"table": "kine where 1=1"}"#);
        assert!(RepairConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let file = write_config(r#"{"selectr": "/x/%"}"#);
        let err = RepairConfig::load(file.path()).unwrap_err();
        assert!(err.message().contains("Invalid config JSON"));
    }

    #[test]
    fn test_rejects_bad_volume_name() {
        let cli = Cli {
            name: Some("PV_1".to_string()),
            ..Cli::default()
        };
        assert!(RepairConfig::resolve(&cli).is_err());
    }
}
