use crate::config::{AnalysisAutomation, ConfigManager, SyncAutomation};
use crate::errors::ConfigError;
use crate::run_tracker::{RunKind, RunTracker};
use crate::scheduler::{
    AutomationJob, AutomationScheduler, BusyProbe, NotificationSink, SchedulerStatus,
};
use crate::services::{AnalysisService, SyncService};
use futures::FutureExt;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize)]
pub struct AutomationStatus {
    pub analysis: SchedulerStatus,
    pub sync: SchedulerStatus,
}

/// Wires the user-editable automation settings to the two schedulers and
/// builds their job closures. This is the reconfiguration boundary: settings
/// are deep-compared against the last applied value, so a host refresh that
/// changes nothing never re-arms a timer or re-fires an immediate run.
pub struct AutomationService {
    analysis: Arc<AnalysisService>,
    sync: Arc<SyncService>,
    tracker: Arc<RunTracker>,
    analysis_scheduler: AutomationScheduler,
    sync_scheduler: AutomationScheduler,
    applied_analysis: Mutex<Option<AnalysisAutomation>>,
    applied_sync: Mutex<Option<SyncAutomation>>,
    // Serializes persist+apply so the applied schedule always matches the
    // last persisted settings, even across concurrent updates.
    update_gate: tokio::sync::Mutex<()>,
}

impl AutomationService {
    pub fn new(
        analysis: Arc<AnalysisService>,
        sync: Arc<SyncService>,
        tracker: Arc<RunTracker>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        // The run tracker doubles as the advisory busy probe on top of the
        // schedulers' own re-entrancy guard.
        let analysis_probe: BusyProbe = {
            let tracker = tracker.clone();
            Arc::new(move || tracker.is_running(RunKind::Analysis))
        };
        let sync_probe: BusyProbe = {
            let tracker = tracker.clone();
            Arc::new(move || tracker.is_running(RunKind::Sync))
        };

        Self {
            analysis_scheduler: AutomationScheduler::new(
                "analysis-automation",
                notifier.clone(),
                Some(analysis_probe),
            ),
            sync_scheduler: AutomationScheduler::new(
                "sync-automation",
                notifier,
                Some(sync_probe),
            ),
            analysis,
            sync,
            tracker,
            applied_analysis: Mutex::new(None),
            applied_sync: Mutex::new(None),
            update_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Persist new analysis settings and reconfigure the schedule as one
    /// step. Updates are serialized, so two concurrent calls can never
    /// persist in one order and apply in the other.
    pub async fn update_analysis_settings(
        &self,
        config_manager: &ConfigManager,
        settings: &AnalysisAutomation,
    ) -> Result<bool, ConfigError> {
        let _gate = self.update_gate.lock().await;
        let changed = config_manager
            .update_analysis_automation(settings.clone())
            .await?;
        if changed {
            self.apply_analysis_settings(settings);
        }
        Ok(changed)
    }

    /// Persist new sync settings and reconfigure the schedule as one step;
    /// same serialization contract as the analysis variant.
    pub async fn update_sync_settings(
        &self,
        config_manager: &ConfigManager,
        settings: &SyncAutomation,
    ) -> Result<bool, ConfigError> {
        let _gate = self.update_gate.lock().await;
        let changed = config_manager
            .update_sync_automation(settings.clone())
            .await?;
        if changed {
            self.apply_sync_settings(settings);
        }
        Ok(changed)
    }

    /// Apply analysis automation settings, reconfiguring the scheduler only
    /// when a field actually changed.
    pub fn apply_analysis_settings(&self, settings: &AnalysisAutomation) {
        let mut applied = self
            .applied_analysis
            .lock()
            .expect("applied settings mutex poisoned");
        if applied.as_ref() == Some(settings) {
            debug!("Analysis automation settings unchanged, schedule left as-is");
            return;
        }

        info!(
            "Applying analysis automation: enabled={} mode={:?} interval={}m batch_size={}",
            settings.enabled, settings.mode, settings.interval_minutes, settings.batch_size
        );
        self.analysis_scheduler
            .configure(&settings.schedule(), self.analysis_job(settings.batch_size));
        *applied = Some(settings.clone());
    }

    /// Apply sync automation settings, reconfiguring the scheduler only when
    /// a field actually changed.
    pub fn apply_sync_settings(&self, settings: &SyncAutomation) {
        let mut applied = self
            .applied_sync
            .lock()
            .expect("applied settings mutex poisoned");
        if applied.as_ref() == Some(settings) {
            debug!("Sync automation settings unchanged, schedule left as-is");
            return;
        }

        info!(
            "Applying sync automation: enabled={} interval={}m",
            settings.enabled, settings.interval_minutes
        );
        self.sync_scheduler
            .configure(&settings.schedule(), self.sync_job());
        *applied = Some(settings.clone());
    }

    /// Trigger an analysis run outside the schedule. Returns false when a
    /// run is already in flight.
    pub fn run_analysis_now(&self) -> bool {
        let batch_size = self
            .applied_analysis
            .lock()
            .expect("applied settings mutex poisoned")
            .as_ref()
            .map(|s| s.batch_size)
            .unwrap_or(crate::constants::automation::DEFAULT_BATCH_SIZE);
        self.analysis_scheduler
            .trigger_now(self.analysis_job(batch_size))
    }

    /// Trigger a sync run outside the schedule. Returns false when a run is
    /// already in flight.
    pub fn run_sync_now(&self) -> bool {
        self.sync_scheduler.trigger_now(self.sync_job())
    }

    pub fn status(&self) -> AutomationStatus {
        AutomationStatus {
            analysis: self.analysis_scheduler.status(),
            sync: self.sync_scheduler.status(),
        }
    }

    /// Cancel both timers. In-flight runs are left to finish and report.
    pub fn shutdown(&self) {
        self.analysis_scheduler.teardown();
        self.sync_scheduler.teardown();
    }

    fn analysis_job(&self, batch_size: u32) -> AutomationJob {
        let service = self.analysis.clone();
        let tracker = self.tracker.clone();
        Arc::new(move || {
            let service = service.clone();
            let tracker = tracker.clone();
            async move {
                // Unreachable in practice (the busy probe runs first), but a
                // conflict is a skip, not a failure.
                if tracker.try_start_run(RunKind::Analysis).is_err() {
                    debug!("Analysis run skipped, already in flight");
                    return Ok(());
                }
                match service.run_batch(batch_size).await {
                    Ok(_) => {
                        tracker.finish_run(RunKind::Analysis, true, None);
                        Ok(())
                    }
                    Err(e) => {
                        tracker.finish_run(RunKind::Analysis, false, Some(e.to_string()));
                        Err(e)
                    }
                }
            }
            .boxed()
        })
    }

    fn sync_job(&self) -> AutomationJob {
        let service = self.sync.clone();
        let tracker = self.tracker.clone();
        Arc::new(move || {
            let service = service.clone();
            let tracker = tracker.clone();
            async move {
                if tracker.try_start_run(RunKind::Sync).is_err() {
                    debug!("Sync run skipped, already in flight");
                    return Ok(());
                }
                match service.run_sync().await {
                    Ok(_) => {
                        tracker.finish_run(RunKind::Sync, true, None);
                        Ok(())
                    }
                    Err(e) => {
                        tracker.finish_run(RunKind::Sync, false, Some(e.to_string()));
                        Err(e)
                    }
                }
            }
            .boxed()
        })
    }
}
