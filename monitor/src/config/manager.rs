use super::{AnalysisAutomation, Config, SyncAutomation};
use crate::errors::ConfigError;
use crate::scheduler::ScheduleMode;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Loads the TOML configuration file and serves immutable snapshots of it.
/// Automation settings can be updated at runtime; updates are validated,
/// persisted back to the file, and change-detected so callers only
/// reconfigure schedules when a field actually changed.
pub struct ConfigManager {
    path: PathBuf,
    current: RwLock<Arc<Config>>,
}

impl ConfigManager {
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = Self::load(&path).await?;
        log_validation_warnings(&config);
        info!("Configuration loaded from {}", path.display());
        Ok(Self {
            path,
            current: RwLock::new(Arc::new(config)),
        })
    }

    pub async fn get_current_config(&self) -> Arc<Config> {
        self.current.read().await.clone()
    }

    /// Replace the analysis automation settings. Returns true when a field
    /// actually changed (deep equality), false when the update was a no-op.
    pub async fn update_analysis_automation(
        &self,
        settings: AnalysisAutomation,
    ) -> Result<bool, ConfigError> {
        validate_analysis_automation(&settings)?;

        let mut current = self.current.write().await;
        if current.analysis.automation == settings {
            debug!("Analysis automation settings unchanged");
            return Ok(false);
        }

        let mut updated = (**current).clone();
        updated.analysis.automation = settings;
        let updated = Arc::new(updated);
        self.persist(&updated).await?;
        *current = updated;

        info!("Analysis automation settings updated");
        Ok(true)
    }

    /// Replace the sync automation settings; same change-detection contract
    /// as the analysis variant.
    pub async fn update_sync_automation(
        &self,
        settings: SyncAutomation,
    ) -> Result<bool, ConfigError> {
        validate_sync_automation(&settings)?;

        let mut current = self.current.write().await;
        if current.sync.automation == settings {
            debug!("Sync automation settings unchanged");
            return Ok(false);
        }

        let mut updated = (**current).clone();
        updated.sync.automation = settings;
        let updated = Arc::new(updated);
        self.persist(&updated).await?;
        *current = updated;

        info!("Sync automation settings updated");
        Ok(true)
    }

    async fn load(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::LoadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            reason: e.to_string(),
        })
    }

    async fn persist(&self, config: &Config) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(config).map_err(|e| ConfigError::ParseError {
            reason: e.to_string(),
        })?;

        fs::write(&self.path, content)
            .await
            .map_err(|e| ConfigError::PersistFailed {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })
    }
}

fn validate_analysis_automation(settings: &AnalysisAutomation) -> Result<(), ConfigError> {
    if settings.mode == ScheduleMode::Delayed && settings.interval_minutes < 1 {
        return Err(ConfigError::InvalidValue {
            field: "analysis.automation.interval_minutes".to_string(),
            reason: format!(
                "delayed mode requires an interval of at least 1 minute, got {}",
                settings.interval_minutes
            ),
        });
    }
    if settings.batch_size == 0 {
        return Err(ConfigError::InvalidValue {
            field: "analysis.automation.batch_size".to_string(),
            reason: "batch size must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_sync_automation(settings: &SyncAutomation) -> Result<(), ConfigError> {
    if settings.interval_minutes < 1 {
        return Err(ConfigError::InvalidValue {
            field: "sync.automation.interval_minutes".to_string(),
            reason: format!(
                "interval must be at least 1 minute, got {}",
                settings.interval_minutes
            ),
        });
    }
    Ok(())
}

// Startup sanity checks. Nothing here is fatal; the schedulers degrade to
// idle on invalid intervals and the services fail per-call on missing URLs.
fn log_validation_warnings(config: &Config) {
    if config.alarm_webhook_url.is_empty() {
        warn!("No alarm webhook URL configured - automation outcomes will only be logged");
    }
    if config.analysis.function_url.is_empty() {
        warn!("No analysis function URL configured - analysis runs will fail");
    }
    if config.sync.function_url.is_empty() {
        warn!("No sync function URL configured - sync runs will fail");
    }
    if config.analysis.automation.schedule().is_active()
        && config.analysis.automation.mode == ScheduleMode::Delayed
        && config.analysis.automation.interval_minutes < 1
    {
        warn!(
            "Analysis automation enabled with invalid interval {}m - automation will stay idle",
            config.analysis.automation.interval_minutes
        );
    }
    if config.sync.automation.enabled && config.sync.automation.interval_minutes < 1 {
        warn!(
            "Sync automation enabled with invalid interval {}m - automation will stay idle",
            config.sync.automation.interval_minutes
        );
    }
}
