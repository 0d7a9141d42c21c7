//! In-memory tracking of automation runs
//!
//! Tracks which job kinds are currently in flight and keeps a bounded
//! history of recent runs for the dashboard. The in-flight view doubles as
//! the advisory busy probe the schedulers consult before starting a run.
//!
//! State is process-lifetime only; nothing here survives a restart.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    Analysis,
    Sync,
}

impl RunKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunKind::Analysis => "analysis",
            RunKind::Sync => "sync",
        }
    }
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub id: String,
    pub kind: RunKind,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub success: Option<bool>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunTrackerStatus {
    pub active_runs: Vec<RunRecord>,
    pub total_active: usize,
}

struct TrackerState {
    active: HashMap<RunKind, RunRecord>,
    history: Vec<RunRecord>,
}

pub struct RunTracker {
    state: Mutex<TrackerState>,
    history_limit: usize,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::with_history_limit(crate::constants::cleanup::RUN_HISTORY_LIMIT)
    }

    pub fn with_history_limit(history_limit: usize) -> Self {
        Self {
            state: Mutex::new(TrackerState {
                active: HashMap::new(),
                history: Vec::new(),
            }),
            history_limit: history_limit.max(1),
        }
    }

    /// Register the start of a run. Returns an error if a run of the same
    /// kind is already in flight.
    pub fn try_start_run(&self, kind: RunKind) -> Result<String> {
        let mut state = self.state.lock().expect("run tracker mutex poisoned");

        if let Some(current) = state.active.get(&kind) {
            let minutes = Utc::now()
                .signed_duration_since(current.started_at)
                .num_minutes();
            return Err(anyhow::anyhow!(
                "{} run already in progress (started {}m ago)",
                kind,
                minutes
            ));
        }

        let record = RunRecord {
            id: Uuid::new_v4().to_string(),
            kind,
            started_at: Utc::now(),
            completed_at: None,
            success: None,
            error_message: None,
        };
        let id = record.id.clone();
        state.active.insert(kind, record);

        info!("Started {} run {}", kind, id);
        Ok(id)
    }

    /// Mark the in-flight run of this kind as finished and move it into the
    /// history.
    pub fn finish_run(&self, kind: RunKind, success: bool, error_message: Option<String>) {
        let mut state = self.state.lock().expect("run tracker mutex poisoned");

        let Some(mut record) = state.active.remove(&kind) else {
            warn!("Tried to finish a {} run but none was in flight", kind);
            return;
        };

        record.completed_at = Some(Utc::now());
        record.success = Some(success);
        record.error_message = error_message;

        let minutes = Utc::now()
            .signed_duration_since(record.started_at)
            .num_minutes();
        if success {
            info!("Finished {} run {} (took {}m)", kind, record.id, minutes);
        } else {
            warn!(
                "{} run {} failed after {}m: {}",
                kind,
                record.id,
                minutes,
                record.error_message.as_deref().unwrap_or("unknown error")
            );
        }

        state.history.insert(0, record);
        let limit = self.history_limit;
        state.history.truncate(limit);
    }

    pub fn is_running(&self, kind: RunKind) -> bool {
        let state = self.state.lock().expect("run tracker mutex poisoned");
        state.active.contains_key(&kind)
    }

    pub fn status(&self) -> RunTrackerStatus {
        let state = self.state.lock().expect("run tracker mutex poisoned");
        let active_runs: Vec<RunRecord> = state.active.values().cloned().collect();
        RunTrackerStatus {
            total_active: active_runs.len(),
            active_runs,
        }
    }

    pub fn recent_runs(&self, limit: usize) -> Vec<RunRecord> {
        let state = self.state.lock().expect("run tracker mutex poisoned");
        state.history.iter().take(limit).cloned().collect()
    }

    /// Move runs that exceeded the maximum expected runtime into the history
    /// as failures. Returns the number of runs cleaned.
    pub fn cleanup_stuck_runs(&self, max_minutes: i64) -> usize {
        let mut state = self.state.lock().expect("run tracker mutex poisoned");
        let cutoff = Utc::now() - chrono::Duration::minutes(max_minutes);

        let stuck: Vec<RunKind> = state
            .active
            .iter()
            .filter(|(_, record)| record.started_at <= cutoff)
            .map(|(kind, _)| *kind)
            .collect();

        for kind in &stuck {
            if let Some(mut record) = state.active.remove(kind) {
                warn!(
                    "Cleaning up stuck {} run {} (started {}m ago)",
                    kind,
                    record.id,
                    Utc::now()
                        .signed_duration_since(record.started_at)
                        .num_minutes()
                );
                record.completed_at = Some(Utc::now());
                record.success = Some(false);
                record.error_message = Some(format!(
                    "run exceeded maximum runtime of {}m",
                    max_minutes
                ));
                state.history.insert(0, record);
            }
        }
        let limit = self.history_limit;
        state.history.truncate(limit);

        stuck.len()
    }
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}
