//! Recurring automation scheduling for analysis and sync jobs
//!
//! This module owns the decision of *when* to run a user-configurable
//! asynchronous job (an analysis batch or a source sync), guarantees
//! at-most-one-concurrent execution per schedule, and publishes next/last
//! run times for display.
//!
//! # Modes
//!
//! - **Manual**: automation disabled, runs only via explicit trigger
//! - **Immediate**: fires once per distinct configuration change
//! - **Delayed**: recurring timer, first fire after one full interval
//!
//! A delayed configuration with a non-positive interval is invalid and
//! degrades to idle with a warning instead of arming a timer.

pub mod automation;
pub use automation::AutomationScheduler;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Asynchronous unit of work driven by a scheduler. The scheduler does not
/// know what the job does; it only consumes success/failure signaling.
pub type AutomationJob = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Host-supplied advisory check for an equivalent job already in flight
/// outside the scheduler's own tracking. Read-only from the scheduler's
/// perspective; the internal running flag remains the authoritative guard.
pub type BusyProbe = Arc<dyn Fn() -> bool + Send + Sync>;

/// Receives fire-and-forget success/failure notifications for job runs.
/// Implementations must not block the caller.
pub trait NotificationSink: Send + Sync {
    fn notify_success(&self, source: &str, message: &str);
    fn notify_failure(&self, source: &str, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    Manual,
    Immediate,
    Delayed,
}

/// Declarative scheduling configuration, owned by the host. Every field
/// change counts as a new configuration; partial mutation is not supported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub enabled: bool,
    pub mode: ScheduleMode,
    pub interval_minutes: i64,
}

/// Concrete timer behavior derived from a [`ScheduleConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arming {
    /// No timer: disabled, manual mode, or invalid interval.
    Inactive,
    /// Fire once now, no recurring timer afterward.
    OneShot,
    /// Recurring timer with the given period.
    Recurring(Duration),
}

impl ScheduleConfig {
    pub fn manual() -> Self {
        Self {
            enabled: false,
            mode: ScheduleMode::Manual,
            interval_minutes: 30,
        }
    }

    pub fn immediate() -> Self {
        Self {
            enabled: true,
            mode: ScheduleMode::Immediate,
            interval_minutes: 30,
        }
    }

    pub fn delayed(interval_minutes: i64) -> Self {
        Self {
            enabled: true,
            mode: ScheduleMode::Delayed,
            interval_minutes,
        }
    }

    /// Whether this configuration represents active automation.
    pub fn is_active(&self) -> bool {
        self.enabled && self.mode != ScheduleMode::Manual
    }

    /// Translate this configuration into concrete timer behavior.
    pub fn arming(&self) -> Arming {
        if !self.enabled {
            return Arming::Inactive;
        }
        match self.mode {
            ScheduleMode::Manual => Arming::Inactive,
            ScheduleMode::Immediate => Arming::OneShot,
            ScheduleMode::Delayed => {
                if self.interval_minutes >= 1 {
                    Arming::Recurring(Duration::from_secs(self.interval_minutes as u64 * 60))
                } else {
                    Arming::Inactive
                }
            }
        }
    }
}

/// Display snapshot of a scheduler instance. Process-lifetime only; the
/// timestamps are hints for the UI, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub name: String,
    pub active: bool,
    pub running: bool,
    pub next_run_at: Option<DateTime<Utc>>,
    pub last_run_at: Option<DateTime<Utc>>,
}
