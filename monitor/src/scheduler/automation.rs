// Timer lifecycle and job wrapping for automation schedules.

use crate::scheduler::{
    Arming, AutomationJob, BusyProbe, NotificationSink, ScheduleConfig, ScheduleMode,
    SchedulerStatus,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

// Timestamps are epoch millis behind atomics so status reads and the timer
// task never contend on a lock; 0 means "not set".
struct Shared {
    name: String,
    running: AtomicBool,
    active: AtomicBool,
    next_run_millis: AtomicI64,
    last_run_millis: AtomicI64,
    notifier: Arc<dyn NotificationSink>,
    busy_probe: Option<BusyProbe>,
}

impl Shared {
    fn set_next_run(&self, at: Option<DateTime<Utc>>) {
        self.next_run_millis
            .store(at.map(|t| t.timestamp_millis()).unwrap_or(0), Ordering::SeqCst);
    }

    fn set_last_run(&self, at: DateTime<Utc>) {
        self.last_run_millis
            .store(at.timestamp_millis(), Ordering::SeqCst);
    }

    fn next_run_at(&self) -> Option<DateTime<Utc>> {
        match self.next_run_millis.load(Ordering::SeqCst) {
            0 => None,
            millis => DateTime::from_timestamp_millis(millis),
        }
    }

    fn last_run_at(&self) -> Option<DateTime<Utc>> {
        match self.last_run_millis.load(Ordering::SeqCst) {
            0 => None,
            millis => DateTime::from_timestamp_millis(millis),
        }
    }
}

/// Translates a declarative [`ScheduleConfig`] into concrete timer behavior
/// and invokes an injected job with at-most-one-concurrent execution.
///
/// `configure` and `teardown` are the only mutators. Job failures are caught
/// at the wrapper boundary, logged, and reported through the notification
/// sink; they never reach the timer machinery, so a failing job cannot stop
/// future scheduled runs.
pub struct AutomationScheduler {
    shared: Arc<Shared>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl AutomationScheduler {
    pub fn new(
        name: impl Into<String>,
        notifier: Arc<dyn NotificationSink>,
        busy_probe: Option<BusyProbe>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                running: AtomicBool::new(false),
                active: AtomicBool::new(false),
                next_run_millis: AtomicI64::new(0),
                last_run_millis: AtomicI64::new(0),
                notifier,
                busy_probe,
            }),
            timer: Mutex::new(None),
        }
    }

    /// Apply a new configuration. The previously armed timer is always
    /// cancelled first, so reconfiguration replaces timers and never stacks
    /// them; an interval change restarts the period from now.
    pub fn configure(&self, config: &ScheduleConfig, job: AutomationJob) {
        self.teardown();

        match config.arming() {
            Arming::Inactive => {
                if config.enabled && config.mode == ScheduleMode::Delayed {
                    warn!(
                        "{}: delayed automation configured with invalid interval {}m, staying idle",
                        self.shared.name, config.interval_minutes
                    );
                } else {
                    debug!("{}: automation inactive", self.shared.name);
                }
            }
            Arming::OneShot => {
                self.shared.active.store(true, Ordering::SeqCst);
                info!("{}: immediate automation fired", self.shared.name);
                Self::spawn_run(self.shared.clone(), job);
            }
            Arming::Recurring(period) => {
                self.shared.active.store(true, Ordering::SeqCst);
                self.shared.set_next_run(Some(next_run_after(period)));

                let shared = self.shared.clone();
                let handle = tokio::spawn(async move {
                    // First fire waits one full period; delayed mode never
                    // fires at configuration time.
                    let start = tokio::time::Instant::now() + period;
                    let mut ticker = tokio::time::interval_at(start, period);
                    loop {
                        ticker.tick().await;
                        // Displayed next run moves one period out regardless
                        // of this run's outcome; ticks are the only writer.
                        shared.set_next_run(Some(next_run_after(period)));
                        Self::spawn_run(shared.clone(), job.clone());
                    }
                });

                *self.timer.lock().expect("timer mutex poisoned") = Some(handle);
                info!(
                    "{}: recurring automation armed every {}m",
                    self.shared.name, config.interval_minutes
                );
            }
        }
    }

    /// Cancel the armed timer unconditionally. No further ticks fire after
    /// this returns. An in-flight run is not cancelled; it still reports its
    /// outcome but cannot re-arm anything.
    pub fn teardown(&self) {
        if let Some(handle) = self.timer.lock().expect("timer mutex poisoned").take() {
            handle.abort();
            debug!("{}: armed timer cancelled", self.shared.name);
        }
        self.shared.active.store(false, Ordering::SeqCst);
        self.shared.set_next_run(None);
    }

    /// Run the job once outside the timer, honoring the same re-entrancy
    /// guard. Returns false when skipped because a run is already in flight.
    pub fn trigger_now(&self, job: AutomationJob) -> bool {
        Self::spawn_run(self.shared.clone(), job)
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            name: self.shared.name.clone(),
            active: self.shared.active.load(Ordering::SeqCst),
            running: self.shared.running.load(Ordering::SeqCst),
            next_run_at: self.shared.next_run_at(),
            last_run_at: self.shared.last_run_at(),
        }
    }

    // Job wrapper: re-entrancy guard plus outcome reporting. A busy tick is
    // dropped, never queued; the next opportunity is the next natural tick.
    fn spawn_run(shared: Arc<Shared>, job: AutomationJob) -> bool {
        if let Some(probe) = &shared.busy_probe {
            if probe() {
                debug!(
                    "{}: tick skipped, an equivalent job is already in flight",
                    shared.name
                );
                return false;
            }
        }

        if shared
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(
                "{}: tick skipped, previous run still in progress",
                shared.name
            );
            return false;
        }

        shared.set_last_run(Utc::now());

        tokio::spawn(async move {
            let outcome = AssertUnwindSafe(job()).catch_unwind().await;
            match outcome {
                Ok(Ok(())) => {
                    info!("{}: run completed", shared.name);
                    shared
                        .notifier
                        .notify_success(&shared.name, "automation run completed");
                }
                Ok(Err(e)) => {
                    error!("{}: run failed: {}", shared.name, e);
                    shared
                        .notifier
                        .notify_failure(&shared.name, &format!("automation run failed: {}", e));
                }
                Err(_) => {
                    error!("{}: run panicked", shared.name);
                    shared
                        .notifier
                        .notify_failure(&shared.name, "automation run panicked");
                }
            }
            shared.running.store(false, Ordering::SeqCst);
        });

        true
    }
}

impl Drop for AutomationScheduler {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn next_run_after(period: Duration) -> DateTime<Utc> {
    Utc::now() + ChronoDuration::from_std(period).unwrap_or_default()
}
