//! Shared fixtures for integration tests

use futures::FutureExt;
use monitor::scheduler::{AutomationJob, NotificationSink, ScheduleConfig, ScheduleMode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Job that counts invocations and resolves immediately.
pub fn counting_job(calls: Arc<AtomicUsize>) -> AutomationJob {
    Arc::new(move || {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        .boxed()
    })
}

/// Job that counts invocations and always fails.
pub fn failing_job(calls: Arc<AtomicUsize>) -> AutomationJob {
    Arc::new(move || {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(anyhow::anyhow!("scoring backend unavailable"))
        }
        .boxed()
    })
}

/// Job that counts invocations and holds the running flag for `duration` of
/// simulated time before resolving.
pub fn slow_job(calls: Arc<AtomicUsize>, duration: Duration) -> AutomationJob {
    Arc::new(move || {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(duration).await;
            Ok(())
        }
        .boxed()
    })
}

/// Notification sink that records messages instead of posting webhooks.
#[derive(Default)]
pub struct RecordingSink {
    pub successes: Mutex<Vec<String>>,
    pub failures: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn success_count(&self) -> usize {
        self.successes.lock().unwrap().len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.lock().unwrap().len()
    }
}

impl NotificationSink for RecordingSink {
    fn notify_success(&self, source: &str, message: &str) {
        self.successes
            .lock()
            .unwrap()
            .push(format!("{}: {}", source, message));
    }

    fn notify_failure(&self, source: &str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .push(format!("{}: {}", source, message));
    }
}

pub fn delayed(interval_minutes: i64) -> ScheduleConfig {
    ScheduleConfig {
        enabled: true,
        mode: ScheduleMode::Delayed,
        interval_minutes,
    }
}

pub fn immediate() -> ScheduleConfig {
    ScheduleConfig {
        enabled: true,
        mode: ScheduleMode::Immediate,
        interval_minutes: 30,
    }
}

pub fn disabled() -> ScheduleConfig {
    ScheduleConfig {
        enabled: false,
        mode: ScheduleMode::Delayed,
        interval_minutes: 30,
    }
}
