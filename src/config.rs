//! Application configuration
//!
//! Configuration is a TOML file loaded at startup, with defaults for
//! every field so a missing or partial file still yields a working app.
//! The default location is the platform config directory
//! (`~/.config/shotdash/config.toml` on Linux).
//!
//! # Sections
//!
//! - `[paths]` - shot storage directory (UI default for the add-files
//!   dialog) and the shared-drive prefix mapping used to translate
//!   network-submitted paths to local ones
//! - `[server]` - request listener port
//! - `[ingest]` - extractor retry and UI-dispatch tunables

use crate::error::{Result, ShotDashError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "config.toml";
const APP_DIR: &str = "shotdash";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Filesystem paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory the add-files dialog opens to. Not a functional
    /// dependency of the pipeline.
    pub shot_storage: PathBuf,

    /// Prefix that network-submitted paths arrive with (e.g. a shared
    /// drive mount as seen by the acquisition machine).
    pub shared_drive: PathBuf,

    /// Local prefix the shared drive is mounted at on this machine.
    pub local_drive: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            shot_storage: PathBuf::from("."),
            shared_drive: PathBuf::new(),
            local_drive: PathBuf::new(),
        }
    }
}

impl PathsConfig {
    /// Translate a network-submitted path to a local filesystem path.
    ///
    /// If the path starts with the configured shared-drive prefix, that
    /// prefix is swapped for the local mount; otherwise the path is
    /// passed through unchanged.
    pub fn path_to_local(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if self.shared_drive.as_os_str().is_empty() {
            return path.to_path_buf();
        }
        match path.strip_prefix(&self.shared_drive) {
            Ok(rest) => self.local_drive.join(rest),
            Err(_) => path.to_path_buf(),
        }
    }
}

/// Request listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP port the request listener binds to
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig { port: 42519 }
    }
}

/// Ingestion pipeline tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Read attempts for a possibly-locked shot file
    pub open_retries: u32,
    /// Milliseconds between read attempts
    pub retry_delay_ms: u64,
    /// Seconds to wait for the UI thread to apply one merge
    pub dispatch_timeout_s: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            open_retries: 5,
            retry_delay_ms: 100,
            dispatch_timeout_s: 10,
        }
    }
}

impl IngestConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_s)
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ShotDashError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| {
            ShotDashError::Config(format!("failed to parse {}: {e}", path.display()))
        })
    }

    /// Load from the default location, falling back to defaults if the
    /// file is missing or malformed.
    pub fn load_or_default() -> Self {
        let Some(path) = default_config_path() else {
            tracing::warn!("could not determine config directory, using defaults");
            return Self::default();
        };
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            Self::default()
        })
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ShotDashError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }
}

/// Platform config file location.
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_usable() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 42519);
        assert_eq!(config.ingest.open_retries, 5);
        assert_eq!(config.ingest.retry_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 9000\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.ingest.open_retries, 5);
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.paths.shot_storage = PathBuf::from("/data/shots");
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.paths.shot_storage, PathBuf::from("/data/shots"));
    }

    #[test]
    fn test_path_to_local_swaps_prefix() {
        let paths = PathsConfig {
            shot_storage: PathBuf::from("."),
            shared_drive: PathBuf::from("/mnt/labshare"),
            local_drive: PathBuf::from("/data"),
        };
        assert_eq!(
            paths.path_to_local("/mnt/labshare/2026/shot_001.json"),
            PathBuf::from("/data/2026/shot_001.json")
        );
        assert_eq!(
            paths.path_to_local("/elsewhere/shot.json"),
            PathBuf::from("/elsewhere/shot.json")
        );
    }
}
