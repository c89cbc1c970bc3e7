//! Configuration file support for the studio calendar.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/studio/config.toml`.

use crate::sequence::{FixedPerMovement, DEFAULT_MINUTES_PER_MOVEMENT};
use crate::{Error, Result};
use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub sequence: SequenceConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// First day shown in week and month views
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl From<WeekStart> for Weekday {
    fn from(start: WeekStart) -> Self {
        match start {
            WeekStart::Sunday => Weekday::Sun,
            WeekStart::Monday => Weekday::Mon,
        }
    }
}

/// Defaults applied when classes are created from templates or copies
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// `HH:MM`
    #[serde(default = "default_start_time")]
    pub default_start_time: String,

    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: u32,

    #[serde(default = "crate::types::default_category")]
    pub default_category: String,

    #[serde(default)]
    pub week_starts_on: WeekStart,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            default_start_time: default_start_time(),
            default_duration_minutes: default_duration_minutes(),
            default_category: crate::types::default_category(),
            week_starts_on: WeekStart::default(),
        }
    }
}

impl ScheduleConfig {
    pub fn start_time(&self) -> Result<NaiveTime> {
        crate::wire::parse_time(&self.default_start_time).map_err(|_| {
            Error::Config(format!(
                "default_start_time '{}' is not HH:MM",
                self.default_start_time
            ))
        })
    }

    pub fn week_start(&self) -> Weekday {
        self.week_starts_on.into()
    }
}

/// Sequence planning parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SequenceConfig {
    #[serde(default = "default_minutes_per_movement")]
    pub minutes_per_movement: f64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            minutes_per_movement: default_minutes_per_movement(),
        }
    }
}

impl SequenceConfig {
    pub fn estimator(&self) -> FixedPerMovement {
        FixedPerMovement {
            minutes_per_movement: self.minutes_per_movement,
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_dir().join(".local/share"));
    base.join("studio")
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_start_time() -> String {
    "09:00".into()
}

fn default_duration_minutes() -> u32 {
    60
}

fn default_minutes_per_movement() -> f64 {
    DEFAULT_MINUTES_PER_MOVEMENT
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values that would break scheduling defaults
    pub fn validate(&self) -> Result<()> {
        self.schedule.start_time()?;
        if self.schedule.default_duration_minutes == 0 {
            return Err(Error::Config(
                "default_duration_minutes must be positive".into(),
            ));
        }
        if !(self.sequence.minutes_per_movement.is_finite()
            && self.sequence.minutes_per_movement >= 0.0)
        {
            return Err(Error::Config(
                "minutes_per_movement must be a non-negative number".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_dir().join(".config"));
        base.join("studio").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
