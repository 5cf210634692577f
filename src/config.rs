//! Configuration loading and management.
//!
//! Configuration is resolved from the first of: an explicit path in the
//! `TASK_LEDGER_CONFIG` environment variable, the project-level
//! `task-ledger/config.yaml` in the working directory, the user-level
//! `~/.task-ledger/config.yaml`. Missing files fall back to defaults; CLI
//! flags override individual fields afterwards.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "TASK_LEDGER_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Default report output format when the CLI does not pass one.
    /// Unrecognized names fall back to txt at the formatter boundary.
    #[serde(default = "default_format")]
    pub default_format: String,

    /// Actor id recorded for CLI-initiated transitions when `--actor` is not
    /// given.
    #[serde(default = "default_actor")]
    pub default_actor: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("task-ledger/ledger.db")
}

fn default_format() -> String {
    "txt".to_string()
}

fn default_actor() -> String {
    "cli".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            default_format: default_format(),
            default_actor: default_actor(),
        }
    }
}

impl Config {
    /// Load configuration from the resolution chain.
    pub fn load() -> Result<Self> {
        if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
            return Self::load_from(Path::new(&explicit));
        }

        for candidate in Self::candidate_paths() {
            if candidate.exists() {
                return Self::load_from(&candidate);
            }
        }

        debug!("No config file found; using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Project-level then user-level config locations.
    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("task-ledger/config.yaml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".task-ledger").join("config.yaml"));
        }
        paths
    }

    /// Ensure the database's parent directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.default_format, "txt");
        assert_eq!(config.default_actor, "cli");
        assert!(config.db_path.ends_with("ledger.db"));
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str("db_path: /tmp/x.db\n").unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.default_format, "txt");
    }
}
