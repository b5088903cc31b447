//! # Sync Configuration
//!
//! Configuration for the terminal sync engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     CAISSE_BASE_URL=https://ledger.example.com                         │
//! │     CAISSE_DEVICE_ID=abc-123                                           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/caisse/sync.toml (Linux)                                 │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     auto-generated device id, 60s interval, batch of 100               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # sync.toml
//! [device]
//! id = "550e8400-e29b-41d4-a716-446655440000"
//! name = "Caisse 1"
//!
//! [site]
//! id = "site-001"
//!
//! [sync]
//! base_url = "https://ledger.example.com"
//! batch_size = 100
//! interval_secs = 60
//! http_timeout_secs = 30
//! retry_limit = 0          # 0 = retry forever (default)
//! probe_interval_secs = 30
//! probe_timeout_secs = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Device Configuration
// =============================================================================

/// Identity of this terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Unique device identifier (UUID v4).
    /// Auto-generated on first run if not provided.
    pub id: String,

    /// Human-readable device name (e.g., "Caisse 1").
    #[serde(default = "default_device_name")]
    pub name: String,
}

fn default_device_name() -> String {
    "Caisse Terminal".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            id: Uuid::new_v4().to_string(),
            name: default_device_name(),
        }
    }
}

// =============================================================================
// Site Configuration
// =============================================================================

/// The site this terminal belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site identifier, as known by the central ledger.
    #[serde(default)]
    pub id: String,
}

// =============================================================================
// Sync Settings
// =============================================================================

/// Sync behavior settings. Nothing here is hard-coded in the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Base URL of the central ledger API.
    #[serde(default)]
    pub base_url: String,

    /// Number of pending tickets to send per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Interval between automatic sync passes (seconds).
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// HTTP timeout for the batch upload (seconds).
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Server-rejected deliveries tolerated per ticket before it is
    /// quarantined to `Error`. 0 means retry forever (the default:
    /// tickets must never be silently dropped).
    #[serde(default)]
    pub retry_limit: u32,

    /// Interval between connectivity probes (seconds).
    #[serde(default = "default_probe_interval")]
    pub probe_interval_secs: u64,

    /// Timeout for a single health probe (seconds).
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

fn default_batch_size() -> u32 {
    100
}

fn default_interval() -> u64 {
    60
}

fn default_http_timeout() -> u64 {
    30
}

fn default_probe_interval() -> u64 {
    30
}

fn default_probe_timeout() -> u64 {
    5
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            base_url: String::new(),
            batch_size: default_batch_size(),
            interval_secs: default_interval(),
            http_timeout_secs: default_http_timeout(),
            retry_limit: 0,
            probe_interval_secs: default_probe_interval(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

// =============================================================================
// Sync Config
// =============================================================================

/// Full terminal sync configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub sync: SyncSettings,
}

impl SyncConfig {
    /// Loads configuration from the default platform location, applying
    /// environment overrides. Missing file means defaults.
    pub fn load() -> SyncResult<Self> {
        let path = Self::default_path()?;
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            SyncConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a specific TOML file.
    pub fn load_from(path: &PathBuf) -> SyncResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SyncError::ConfigLoadFailed(format!("{}: {}", path.display(), e)))?;
        let config: SyncConfig = toml::from_str(&raw)
            .map_err(|e| SyncError::ConfigLoadFailed(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Loaded sync config");
        Ok(config)
    }

    /// Persists the configuration (e.g. after generating a device id on
    /// first run).
    pub fn save(&self) -> SyncResult<()> {
        let path = Self::default_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;
        }
        let raw =
            toml::to_string_pretty(self).map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;
        std::fs::write(&path, raw).map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;
        Ok(())
    }

    /// Platform config file location (`~/.config/caisse/sync.toml` on
    /// Linux).
    pub fn default_path() -> SyncResult<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "caisse")
            .ok_or_else(|| SyncError::ConfigLoadFailed("No home directory".into()))?;
        Ok(dirs.config_dir().join("sync.toml"))
    }

    /// Environment variables win over the file.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("CAISSE_BASE_URL") {
            self.sync.base_url = url;
        }
        if let Ok(id) = std::env::var("CAISSE_DEVICE_ID") {
            self.device.id = id;
        }
        if let Ok(id) = std::env::var("CAISSE_SITE_ID") {
            self.site.id = id;
        }
    }

    /// Validates that the configuration can drive a sync engine.
    pub fn validate(&self) -> SyncResult<()> {
        if self.sync.base_url.trim().is_empty() {
            return Err(SyncError::InvalidConfig("base_url is required".into()));
        }
        if !self.sync.base_url.starts_with("http://") && !self.sync.base_url.starts_with("https://")
        {
            return Err(SyncError::InvalidConfig(format!(
                "base_url must be http(s), got '{}'",
                self.sync.base_url
            )));
        }
        if self.sync.batch_size == 0 {
            return Err(SyncError::InvalidConfig("batch_size must be > 0".into()));
        }
        if self.sync.interval_secs == 0 {
            return Err(SyncError::InvalidConfig("interval_secs must be > 0".into()));
        }
        Ok(())
    }

    /// Sync pass interval.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.sync.interval_secs)
    }

    /// HTTP timeout for batch uploads.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.sync.http_timeout_secs)
    }

    /// Connectivity probe cadence.
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.sync.probe_interval_secs)
    }

    /// Per-probe timeout.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.sync.probe_timeout_secs)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = SyncConfig::default();
        assert_eq!(config.sync.batch_size, 100);
        assert_eq!(config.sync.interval_secs, 60);
        assert_eq!(config.sync.retry_limit, 0);
        assert!(Uuid::parse_str(&config.device.id).is_ok());
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let raw = r#"
            [device]
            id = "dev-1"

            [sync]
            base_url = "http://ledger:8080"
            batch_size = 25
        "#;
        let config: SyncConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.device.id, "dev-1");
        assert_eq!(config.sync.base_url, "http://ledger:8080");
        assert_eq!(config.sync.batch_size, 25);
        // unspecified fields fall back to defaults
        assert_eq!(config.sync.probe_timeout_secs, 5);
    }

    #[test]
    fn validate_rejects_missing_base_url() {
        let config = SyncConfig::default();
        assert!(matches!(
            config.validate(),
            Err(SyncError::InvalidConfig(_))
        ));
    }

    #[test]
    fn validate_rejects_non_http_url() {
        let mut config = SyncConfig::default();
        config.sync.base_url = "ftp://nope".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_complete_config() {
        let mut config = SyncConfig::default();
        config.sync.base_url = "https://ledger.example.com".into();
        assert!(config.validate().is_ok());
    }
}
