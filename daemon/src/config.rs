//! Daemon configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use agegate_store_lmdb::DEFAULT_MAP_SIZE;
use agegate_utils::LogFormat;
use agegate_verification::{LockoutPolicy, LOCKOUT_WINDOW_SECS, MAX_REPEAT_FAILED_ATTEMPTS};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Configuration for the age gate daemon.
///
/// Loaded from a TOML file via [`GateConfig::from_toml_file`]; every field is
/// optional in the file. CLI flags and env vars override file values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Trailing window in which failed attempts count towards lock-out.
    #[serde(default = "default_lockout_window_secs")]
    pub lockout_window_secs: u64,

    /// Failed attempts inside the window that lock out the next one.
    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./agegate_data")
}

fn default_map_size() -> usize {
    DEFAULT_MAP_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_lockout_window_secs() -> u64 {
    LOCKOUT_WINDOW_SECS
}

fn default_max_failed_attempts() -> u64 {
    MAX_REPEAT_FAILED_ATTEMPTS
}

// ── Impl ───────────────────────────────────────────────────────────────

impl GateConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_failed_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_failed_attempts must be at least 1".to_string(),
            ));
        }
        if self.map_size == 0 {
            return Err(ConfigError::Invalid("map_size must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy {
            max_failed_attempts: self.max_failed_attempts,
            window_secs: self.lockout_window_secs,
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size: default_map_size(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            lockout_window_secs: default_lockout_window_secs(),
            max_failed_attempts: default_max_failed_attempts(),
        }
    }
}
