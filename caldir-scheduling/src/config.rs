//! Scheduling configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SchedulingError, SchedulingResult};
use crate::transport::status;

const DEFAULT_MAX_CONCURRENT_SENDS: usize = 8;
const DEFAULT_SEND_TIMEOUT_SECS: u64 = 30;

fn default_max_concurrent_sends() -> usize {
    DEFAULT_MAX_CONCURRENT_SENDS
}

fn default_send_timeout_secs() -> u64 {
    DEFAULT_SEND_TIMEOUT_SECS
}

fn default_failure_status() -> String {
    status::DELIVERY_FAILED.to_string()
}

/// Configuration at ~/.config/caldir/scheduling.toml
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SchedulingConfig {
    /// How many recipients are sent to at once
    #[serde(default = "default_max_concurrent_sends")]
    pub max_concurrent_sends: usize,

    /// Per-recipient send timeout
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,

    /// SCHEDULE-STATUS recorded when a send fails or times out
    #[serde(default = "default_failure_status")]
    pub failure_status: String,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        SchedulingConfig {
            max_concurrent_sends: DEFAULT_MAX_CONCURRENT_SENDS,
            send_timeout_secs: DEFAULT_SEND_TIMEOUT_SECS,
            failure_status: default_failure_status(),
        }
    }
}

impl SchedulingConfig {
    pub fn config_path() -> SchedulingResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SchedulingError::Config("Could not determine config directory".into()))?
            .join("caldir");

        Ok(config_dir.join("scheduling.toml"))
    }

    /// Load from the default location, falling back to defaults if the file
    /// does not exist.
    pub fn load() -> SchedulingResult<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> SchedulingResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SchedulingError::Config(format!("Could not read {}: {e}", path.display()))
        })?;
        let config: SchedulingConfig =
            toml::from_str(&content).map_err(|e| SchedulingError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> SchedulingResult<()> {
        if self.max_concurrent_sends == 0 {
            return Err(SchedulingError::Config(
                "max_concurrent_sends must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    /// Save the current config to `path`
    pub fn save(&self, path: &Path) -> SchedulingResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| SchedulingError::Config(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| SchedulingError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> SchedulingResult<()> {
        let contents = format!(
            "\
# caldir scheduling configuration

# Recipients sent to at the same time:
# max_concurrent_sends = {}

# Seconds to wait for one delivery:
# send_timeout_secs = {}

# SCHEDULE-STATUS written when a delivery fails:
# failure_status = \"{}\"
",
            DEFAULT_MAX_CONCURRENT_SENDS,
            DEFAULT_SEND_TIMEOUT_SECS,
            status::DELIVERY_FAILED
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SchedulingError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| SchedulingError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
