//! Configuration loading and typed config structures for a replay.
//!
//! Configuration is optional: every field has a default, so an empty YAML
//! document (or no file at all) yields a working setup. Environment
//! variables override the file, and command-line flags override both.

use std::path::Path;
use std::time::Duration;

use rewind_db::SqliteConfig;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level replay configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReplayConfig {
    /// Ingestion behaviour.
    #[serde(default)]
    pub replay: ReplaySettings,

    /// History database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ReplayConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `REWIND_COMMIT_INTERVAL` overrides `replay.commit_interval`
    /// - `REWIND_LOG_LEVEL` overrides `logging.level`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Defaults plus environment overrides, for runs without a config file.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Override settings with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override settings from an arbitrary variable source.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("REWIND_COMMIT_INTERVAL") {
            match val.trim().parse::<usize>() {
                Ok(n) => self.replay.commit_interval = n,
                Err(e) => tracing::warn!(
                    value = val.as_str(),
                    error = %e,
                    "Ignoring invalid REWIND_COMMIT_INTERVAL"
                ),
            }
        }
        if let Some(val) = lookup("REWIND_LOG_LEVEL") {
            self.logging.level = val;
        }
    }
}

/// Ingestion behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplaySettings {
    /// Lines processed between batched commits. Zero is treated as one.
    #[serde(default = "default_commit_interval")]
    pub commit_interval: usize,

    /// Name of the top-level frame; snapshots start once it is pushed.
    #[serde(default = "default_module_frame_name")]
    pub module_frame_name: String,

    /// Reserved local name that receives a frame's return or yield value.
    #[serde(default = "default_return_value_name")]
    pub return_value_name: String,

    /// Whether to read each code file's source text from disk.
    #[serde(default = "default_true")]
    pub read_sources: bool,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            commit_interval: default_commit_interval(),
            module_frame_name: default_module_frame_name(),
            return_value_name: default_return_value_name(),
            read_sources: true,
        }
    }
}

/// History database connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// Maximum pooled connections. Ingestion needs only one.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Milliseconds a statement waits on a locked database.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    /// Pool settings for [`rewind_db::HistoryDb`].
    pub fn sqlite(&self) -> SqliteConfig {
        SqliteConfig::default()
            .with_max_connections(self.max_connections.max(1))
            .with_busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter
    /// directive. `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const fn default_commit_interval() -> usize {
    1000
}

fn default_module_frame_name() -> String {
    "<module>".to_owned()
}

fn default_return_value_name() -> String {
    "return value".to_owned()
}

const fn default_true() -> bool {
    true
}

const fn default_max_connections() -> u32 {
    1
}

const fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_owned()
}
