pub mod manager;
pub use manager::ConfigManager;

use crate::constants::automation;
use crate::scheduler::{ScheduleConfig, ScheduleMode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub alarm_webhook_url: String,
    pub analysis: AnalysisConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Serverless function that scores a batch of unscored posts
    pub function_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub automation: AnalysisAutomation,
}

/// User-editable analysis automation settings. `batch_size` is opaque to the
/// scheduler; it rides along inside the job closure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisAutomation {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_mode")]
    pub mode: ScheduleMode,
    #[serde(default = "default_analysis_interval")]
    pub interval_minutes: i64,
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

impl Default for AnalysisAutomation {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: default_mode(),
            interval_minutes: default_analysis_interval(),
            batch_size: default_batch_size(),
        }
    }
}

impl AnalysisAutomation {
    /// Scheduling view of these settings.
    pub fn schedule(&self) -> ScheduleConfig {
        ScheduleConfig {
            enabled: self.enabled,
            mode: self.mode,
            interval_minutes: self.interval_minutes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Serverless function that pulls new posts from the external source
    pub function_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub automation: SyncAutomation,
}

/// Sync automation has no manual/immediate distinction: enabled means a
/// recurring timer at the configured interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncAutomation {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_sync_interval")]
    pub interval_minutes: i64,
}

impl Default for SyncAutomation {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_minutes: default_sync_interval(),
        }
    }
}

impl SyncAutomation {
    pub fn schedule(&self) -> ScheduleConfig {
        ScheduleConfig {
            enabled: self.enabled,
            mode: ScheduleMode::Delayed,
            interval_minutes: self.interval_minutes,
        }
    }
}

fn default_mode() -> ScheduleMode {
    ScheduleMode::Manual
}

fn default_analysis_interval() -> i64 {
    automation::DEFAULT_ANALYSIS_INTERVAL_MINUTES
}

fn default_sync_interval() -> i64 {
    automation::DEFAULT_SYNC_INTERVAL_MINUTES
}

fn default_batch_size() -> u32 {
    automation::DEFAULT_BATCH_SIZE
}
