//! # Shell Configuration
//!
//! A session is bootstrapped from a small descriptor naming the user, the
//! displayed host, the archive to expand into the sandbox and the audit log
//! destination.
//!
//! Descriptors are JSON (`.json`) or TOML (`.toml`); the format is picked from
//! the file extension. Relative paths inside a descriptor are resolved against
//! the directory that contains it, so a descriptor can travel together with its
//! archive.
//!
//! ```json
//! {
//!   "username": "user",
//!   "hostname": "sandbox",
//!   "fs_archive": "fs.zip",
//!   "log_file": "session.csv"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse TOML config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Unsupported config format for {0} (expected .json or .toml)")]
    UnsupportedFormat(PathBuf),

    #[error("Config field '{0}' must not be empty")]
    EmptyField(&'static str),
}

/// Everything needed to start a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShellConfig {
    pub username: String,
    pub hostname: String,
    /// Zip archive expanded into the sandbox root.
    #[serde(alias = "fs_zip")]
    pub fs_archive: PathBuf,
    /// Audit log destination.
    pub log_file: PathBuf,
}

impl ShellConfig {
    /// Loads a descriptor and resolves its relative paths.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => Self::from_json(&contents).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?,
            Some("toml") => Self::from_toml(&contents).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let config = config.relative_to(base);
        config.validate()?;
        tracing::debug!(config = ?config, "loaded shell config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Rebases relative archive and log paths onto `base`.
    pub fn relative_to(mut self, base: &Path) -> Self {
        if self.fs_archive.is_relative() {
            self.fs_archive = base.join(&self.fs_archive);
        }
        if self.log_file.is_relative() {
            self.log_file = base.join(&self.log_file);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.trim().is_empty() {
            return Err(ConfigError::EmptyField("username"));
        }
        if self.hostname.trim().is_empty() {
            return Err(ConfigError::EmptyField("hostname"));
        }
        if self.fs_archive.as_os_str().is_empty() {
            return Err(ConfigError::EmptyField("fs_archive"));
        }
        if self.log_file.as_os_str().is_empty() {
            return Err(ConfigError::EmptyField("log_file"));
        }
        Ok(())
    }
}
