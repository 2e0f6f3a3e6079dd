//! Configuration loading and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use fj_core::cluster::DEFAULT_WINDOW_MINUTES;
use fj_core::layout::{DEFAULT_HOUR_HEIGHT, MAX_HOUR_HEIGHT};
use fj_core::{ClusterConfig, DayZone, TimelineConfig};
use fj_db::StoreOptions;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Fixed UTC offset used to date entries. Local time when unset.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,

    /// Height of one hour slot on the day timeline.
    pub hour_height: u32,

    /// Entries within this many minutes of a cluster's anchor share columns.
    pub cluster_window_minutes: u16,

    /// Upper bound on a single storage call.
    pub persist_timeout_ms: u64,

    /// Reload-and-retry rounds when another process changed the journal.
    pub max_conflict_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("fj.db"),
            utc_offset_minutes: None,
            hour_height: DEFAULT_HOUR_HEIGHT,
            cluster_window_minutes: DEFAULT_WINDOW_MINUTES,
            persist_timeout_ms: 5_000,
            max_conflict_retries: 3,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (FJ_*)
        figment = figment.merge(Env::prefixed("FJ_"));

        figment.extract()
    }

    /// Zone that decides which calendar day an entry belongs to.
    pub fn day_zone(&self) -> Result<DayZone> {
        match self.utc_offset_minutes {
            None => Ok(DayZone::Local),
            Some(minutes) => match DayZone::from_offset_minutes(minutes) {
                Some(zone) => Ok(zone),
                None => bail!("utc_offset_minutes must be within ±1439, got {minutes}"),
            },
        }
    }

    /// Layout settings for the day timeline.
    pub fn timeline(&self) -> Result<TimelineConfig> {
        if self.hour_height == 0 {
            bail!("hour_height must be positive");
        }
        if self.hour_height > MAX_HOUR_HEIGHT {
            bail!(
                "hour_height must be at most {MAX_HOUR_HEIGHT}, got {}",
                self.hour_height
            );
        }
        Ok(TimelineConfig {
            hour_height: self.hour_height,
            cluster: ClusterConfig {
                window_minutes: self.cluster_window_minutes,
            },
        })
    }

    /// Settings for the entry store.
    pub fn store_options(&self) -> Result<StoreOptions> {
        if self.persist_timeout_ms == 0 {
            bail!("persist_timeout_ms must be positive");
        }
        Ok(StoreOptions {
            zone: self.day_zone()?,
            persist_timeout: Duration::from_millis(self.persist_timeout_ms),
            max_conflict_retries: self.max_conflict_retries,
        })
    }
}

/// Returns the platform-specific config directory for fj.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("fj"))
}

/// Returns the platform-specific data directory for fj.
///
/// On Linux: `~/.local/share/fj`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("fj"))
}
