use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use supaprobe_attacks::{Category, DEFAULT_ATTACK_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, Severity};

use crate::selection::Selection;

/// Project-level configuration loaded from `.supaprobe.toml`.
///
/// Every field is optional. Command-line flags and environment variables
/// take precedence over values read from the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the Supabase project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,

    /// Anonymous (publishable) API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anon_key: Option<String>,

    /// Service-role key, enabling comparison probes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_key: Option<String>,

    /// Minimum severity of attacks to run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    /// Categories to run. Empty means every category.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<Category>,

    /// Attack ids never to run (e.g. `"dos/auth-rate-limit"`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled_attacks: Vec<String>,

    /// Per-request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Per-attack time budget in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_timeout_secs: Option<u64>,

    /// Maximum number of attacks in flight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Where `scan` writes its JSON report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_path: Option<String>,
}

impl Config {
    /// Creates a default configuration with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a `.supaprobe.toml` file.
    ///
    /// Returns the default configuration if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = read_file(path)?;
        parse_toml(path, &content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })
    }

    /// Atomically writes this configuration to a `.supaprobe.toml` file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serialise_toml(self)?;
        write_file(path, &content)
    }

    /// Serialises this configuration to a pretty-printed TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        serialise_toml(self)
    }

    /// Per-request timeout, falling back to the library default.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.timeout_secs
            .filter(|&s| s > 0)
            .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs)
    }

    /// Per-attack budget, falling back to the library default.
    #[must_use]
    pub fn attack_timeout(&self) -> Duration {
        self.attack_timeout_secs
            .filter(|&s| s > 0)
            .map_or(DEFAULT_ATTACK_TIMEOUT, Duration::from_secs)
    }

    /// Number of attacks allowed in flight, at least one.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency.unwrap_or(1).max(1)
    }

    /// Builds the attack selection described by this file.
    #[must_use]
    pub fn selection(&self) -> Selection {
        Selection {
            categories: self.categories.clone(),
            min_severity: self.severity,
            disabled: self.disabled_attacks.clone(),
            ..Selection::default()
        }
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, content: &str) -> Result<(), ConfigError> {
    crate::fs_util::atomic_write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_toml(path: &Path, content: &str) -> Result<Config, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn serialise_toml(config: &Config) -> Result<String, ConfigError> {
    toml::to_string_pretty(config).map_err(|source| ConfigError::Serialize { source })
}

/// Errors that can occur when reading, parsing, serialising, or writing
/// a `.supaprobe.toml` configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read from disk.
    #[error("failed to read config '{path}': {source}")]
    Read {
        /// Path to the config file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file contained invalid TOML or unexpected values.
    #[error("failed to parse config '{path}': {source}")]
    Parse {
        /// Path to the config file that could not be parsed.
        path: PathBuf,
        /// The underlying TOML deserialization error.
        #[source]
        source: toml::de::Error,
    },

    /// The in-memory configuration could not be serialised to TOML.
    #[error("failed to serialise config: {source}")]
    Serialize {
        /// The underlying TOML serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// The config file could not be written to disk.
    #[error("failed to write config '{path}': {source}")]
    Write {
        /// Path to the config file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Returns the file path associated with this error, if any.
    ///
    /// `ConfigError::Serialize` errors have no associated path.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Write { path, .. } => Some(path),
            Self::Serialize { .. } => None,
        }
    }
}
