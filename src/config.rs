//! Layered application configuration.
//!
//! Sources, lowest to highest priority:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. TOML file: `--config PATH`, or `config.toml` in the platform config
//!    directory (e.g. `~/.config/dupsweep/config.toml`)
//! 3. Environment variables prefixed with `DUPSWEEP_` (`DUPSWEEP_IO_THREADS=8`)
//! 4. CLI flags, applied by the caller on top of the loaded value
//!
//! ```toml
//! excluded = [".git", "__pycache__", "node_modules", "target"]
//! exclude_mode = "segment"
//! algorithm = "blake3"
//! chunk_size = 65536
//! io_threads = 8
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::scanner::{
    ExcludeMode, HashAlgorithm, HasherConfig, WalkerConfig, DEFAULT_CHUNK_SIZE, DEFAULT_EXCLUDES,
    MAX_CHUNK_SIZE,
};

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "DUPSWEEP_";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A source could not be parsed or a key has the wrong type.
    #[error("Invalid configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    /// A key parsed but holds an unusable value.
    #[error("Invalid value for `{key}`: {message}")]
    Invalid {
        /// Offending key
        key: &'static str,
        /// What is wrong with it
        message: String,
    },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Excluded path fragments
    pub excluded: Vec<String>,
    /// How excluded fragments are matched
    pub exclude_mode: ExcludeMode,
    /// Digest algorithm
    pub algorithm: HashAlgorithm,
    /// Read chunk size in bytes
    pub chunk_size: usize,
    /// Hashing threads
    pub io_threads: usize,
    /// Skip files larger than this many bytes
    pub max_file_size: Option<u64>,
    /// Per-file hashing deadline in seconds
    pub hash_timeout_secs: Option<f64>,
    /// Append log lines to this file
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            excluded: DEFAULT_EXCLUDES.iter().map(|s| (*s).to_string()).collect(),
            exclude_mode: ExcludeMode::default(),
            algorithm: HashAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            io_threads: 4,
            max_file_size: None,
            hash_timeout_secs: None,
            log_file: None,
        }
    }
}

impl Config {
    /// Load and validate the layered configuration.
    ///
    /// `explicit` must exist when given; the platform default file is
    /// optional.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a source is missing, malformed, or a value
    /// is out of range. The message names the offending key.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(explicit)?.extract().map_err(Box::new)?;
        config.validate()?;
        log::debug!("Loaded configuration: {config:?}");
        Ok(config)
    }

    /// Build the figment without extracting it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` when `explicit` does not exist.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match explicit {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => {
                if let Some(path) = Self::default_path() {
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Platform-specific default config file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "dupsweep", "dupsweep")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Reject values that parse but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                key: "chunk_size",
                message: "must be at least 1 byte".to_string(),
            });
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(ConfigError::Invalid {
                key: "chunk_size",
                message: format!(
                    "must be at most {MAX_CHUNK_SIZE} bytes, got {}",
                    self.chunk_size
                ),
            });
        }
        if self.io_threads == 0 {
            return Err(ConfigError::Invalid {
                key: "io_threads",
                message: "must be at least 1".to_string(),
            });
        }
        if let Some(secs) = self.hash_timeout_secs {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(ConfigError::Invalid {
                    key: "hash_timeout_secs",
                    message: format!("must be a positive number of seconds, got {secs}"),
                });
            }
        }
        Ok(())
    }

    /// Walker settings derived from this config.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::new(
            self.excluded.clone(),
            self.exclude_mode,
            self.max_file_size,
        )
    }

    /// Hasher settings derived from this config.
    #[must_use]
    pub fn hasher_config(&self) -> HasherConfig {
        HasherConfig::default()
            .with_algorithm(self.algorithm)
            .with_chunk_size(self.chunk_size)
            .with_timeout(
                self.hash_timeout_secs
                    .and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
            )
    }
}
