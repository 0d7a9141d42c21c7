//! Scheduler behavior tests on tokio's simulated clock
//!
//! These tests verify the automation scheduler's timer lifecycle,
//! re-entrancy guard, and failure policy without real waiting: the clock is
//! paused and advanced explicitly.

mod common;

use common::fixtures::*;
use monitor::scheduler::{AutomationScheduler, NotificationSink};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::yield_now;
use tokio::time::advance;

const MINUTE: Duration = Duration::from_secs(60);

// Let spawned tick and job tasks run after the clock moved.
async fn settle() {
    for _ in 0..10 {
        yield_now().await;
    }
}

fn scheduler(sink: Arc<RecordingSink>) -> AutomationScheduler {
    AutomationScheduler::new("test-automation", sink, None)
}

#[tokio::test(start_paused = true)]
async fn delayed_job_runs_once_per_interval() {
    let sink = RecordingSink::new();
    let sched = scheduler(sink.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    sched.configure(&delayed(30), counting_job(calls.clone()));

    // 90 minutes of simulated time: exactly 3 invocations.
    for _ in 0..3 {
        advance(30 * MINUTE + Duration::from_secs(1)).await;
        settle().await;
    }

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(sink.success_count(), 3);

    let status = sched.status();
    assert!(status.active);
    assert!(status.next_run_at.is_some());
    assert!(status.last_run_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn job_parameter_passes_through_unchanged() {
    let sink = RecordingSink::new();
    let sched = scheduler(sink.clone());
    let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));

    // The batch size is opaque to the scheduler; the job closure carries it.
    let batch_size: u32 = 50;
    let seen_clone = seen.clone();
    let job: monitor::scheduler::AutomationJob = Arc::new(move || {
        let seen = seen_clone.clone();
        Box::pin(async move {
            seen.lock().unwrap().push(batch_size);
            Ok(())
        })
    });

    sched.configure(&delayed(30), job);

    for _ in 0..3 {
        advance(30 * MINUTE + Duration::from_secs(1)).await;
        settle().await;
    }

    assert_eq!(*seen.lock().unwrap(), vec![50, 50, 50]);
}

#[tokio::test(start_paused = true)]
async fn overlapping_ticks_are_skipped_not_queued() {
    let sink = RecordingSink::new();
    let sched = scheduler(sink.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    // Job holds the running flag for 2.5 intervals.
    sched.configure(&delayed(1), slow_job(calls.clone(), 150 * Duration::from_secs(1)));

    // Ticks at 1m, 2m, 3m; the run started at 1m finishes at 3m30s.
    advance(MINUTE + Duration::from_secs(1)).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    advance(MINUTE).await;
    settle().await;
    advance(MINUTE).await;
    settle().await;
    // Both overlapped ticks were dropped, not deferred.
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // After the first run settles, the next natural tick runs again; the
    // skipped ticks are never retried early.
    advance(30 * Duration::from_secs(1)).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    advance(30 * Duration::from_secs(1)).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(sink.success_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn immediate_fires_exactly_once_per_configuration() {
    let sink = RecordingSink::new();
    let sched = scheduler(sink.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    sched.configure(&immediate(), counting_job(calls.clone()));
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // No recurring timer in immediate mode, regardless of elapsed time.
    advance(90 * MINUTE).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(sched.status().next_run_at.is_none());
    assert!(sched.status().active);

    // A fresh configure call is the re-fire boundary.
    sched.configure(&immediate(), counting_job(calls.clone()));
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn delayed_never_fires_before_one_full_interval() {
    let sink = RecordingSink::new();
    let sched = scheduler(sink.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    sched.configure(&delayed(5), counting_job(calls.clone()));
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    advance(4 * MINUTE + Duration::from_secs(59)).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    advance(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn failing_job_does_not_stop_the_schedule() {
    let sink = RecordingSink::new();
    let sched = scheduler(sink.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    sched.configure(&delayed(1), failing_job(calls.clone()));

    advance(MINUTE + Duration::from_secs(1)).await;
    settle().await;
    advance(MINUTE).await;
    settle().await;
    advance(MINUTE).await;
    settle().await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(sink.failure_count(), 3);
    assert_eq!(sink.success_count(), 0);
    assert!(sink.failures.lock().unwrap()[0].contains("automation run failed"));

    // Schedule survives the failures.
    let status = sched.status();
    assert!(status.active);
    assert!(status.next_run_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn teardown_is_immediate_and_final() {
    let sink = RecordingSink::new();
    let sched = scheduler(sink.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    sched.configure(&delayed(1), counting_job(calls.clone()));
    advance(MINUTE + Duration::from_secs(1)).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    sched.teardown();

    advance(10 * MINUTE).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let status = sched.status();
    assert!(!status.active);
    assert!(status.next_run_at.is_none());
}

#[tokio::test(start_paused = true)]
async fn reconfiguration_replaces_timers_and_never_stacks_them() {
    let sink = RecordingSink::new();
    let sched = scheduler(sink.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    sched.configure(&delayed(10), counting_job(calls.clone()));
    advance(5 * MINUTE).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // Interval change: full rearm, next run at now + 2m, not at the old
    // now + 10m.
    sched.configure(&delayed(2), counting_job(calls.clone()));

    advance(4 * MINUTE + Duration::from_secs(1)).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // The old timer's original deadline (10m after the first configure)
    // passes without an extra invocation.
    advance(2 * MINUTE).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn disabled_configuration_is_inactive() {
    let sink = RecordingSink::new();
    let sched = scheduler(sink.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    sched.configure(&disabled(), counting_job(calls.clone()));

    advance(6 * 60 * MINUTE).await;
    settle().await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    let status = sched.status();
    assert!(!status.active);
    assert!(status.next_run_at.is_none());
}

#[tokio::test(start_paused = true)]
async fn invalid_interval_degrades_to_idle() {
    let sink = RecordingSink::new();
    let sched = scheduler(sink.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    sched.configure(&delayed(0), counting_job(calls.clone()));
    advance(60 * MINUTE).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!sched.status().active);

    sched.configure(&delayed(-5), counting_job(calls.clone()));
    advance(60 * MINUTE).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn host_busy_probe_skips_ticks() {
    let sink = RecordingSink::new();
    let busy = Arc::new(AtomicBool::new(true));
    let busy_clone = busy.clone();
    let sched = AutomationScheduler::new(
        "test-automation",
        sink.clone() as Arc<dyn NotificationSink>,
        Some(Arc::new(move || busy_clone.load(Ordering::SeqCst))),
    );
    let calls = Arc::new(AtomicUsize::new(0));

    sched.configure(&delayed(1), counting_job(calls.clone()));

    // Three ticks elapse while the host reports an equivalent job in flight.
    advance(3 * MINUTE + Duration::from_secs(1)).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    busy.store(false, Ordering::SeqCst);
    advance(MINUTE).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn manual_trigger_honors_running_guard() {
    let sink = RecordingSink::new();
    let sched = scheduler(sink.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    assert!(sched.trigger_now(slow_job(calls.clone(), MINUTE)));
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Second trigger while the first run is in flight is refused.
    assert!(!sched.trigger_now(counting_job(calls.clone())));
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    advance(MINUTE + Duration::from_secs(1)).await;
    settle().await;
    assert!(sched.trigger_now(counting_job(calls.clone())));
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Manual runs report through the same sink, without claiming to be
    // scheduled.
    assert!(sink.successes.lock().unwrap()[0].contains("automation run completed"));
}

#[tokio::test(start_paused = true)]
async fn in_flight_run_survives_teardown_and_still_reports() {
    let sink = RecordingSink::new();
    let sched = scheduler(sink.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    sched.configure(&delayed(1), slow_job(calls.clone(), 2 * MINUTE));
    advance(MINUTE + Duration::from_secs(1)).await;
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Teardown cancels the timer but lets the run finish and report.
    sched.teardown();
    advance(5 * MINUTE).await;
    settle().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(sink.success_count(), 1);
    assert!(!sched.status().running);
    assert!(sched.status().next_run_at.is_none());
}

#[tokio::test(start_paused = true)]
async fn immediate_skipped_when_job_already_running() {
    let sink = RecordingSink::new();
    let sched = scheduler(sink.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    assert!(sched.trigger_now(slow_job(calls.clone(), 10 * MINUTE)));
    settle().await;

    // Immediate mode does not queue behind the in-flight run.
    sched.configure(&immediate(), counting_job(calls.clone()));
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
