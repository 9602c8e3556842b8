//! Integration tests for the retry module
//!
//! These tests drive the scheduler end to end against Tokio's paused clock:
//! time is virtual, sleeps auto-advance, and nothing spawned runs until the
//! test awaits.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::BackoffConfig;
use crate::retry::jitter::SequenceJitter;
use crate::retry::observer::StatsObserver;
use crate::retry::scheduler::RetryScheduler;

/// Doubling ladder with no jitter, for exact delay assertions
fn ladder_config() -> BackoffConfig {
    BackoffConfig {
        min_delay_ms: 1_000,
        max_delay_ms: 8_000,
        retry_exponent: 2.0,
        jitter_factor: 0.0,
    }
}

fn scheduler_with_stats(config: BackoffConfig) -> (RetryScheduler, Arc<StatsObserver>) {
    let stats = Arc::new(StatsObserver::new());
    let scheduler = RetryScheduler::builder()
        .with_config(config)
        .with_observer(Arc::clone(&stats))
        .build()
        .expect("test config is valid");
    (scheduler, stats)
}

/// Let the virtual clock run far enough for any pending timer to elapse
async fn run_clock(duration: Duration) {
    tokio::time::sleep(duration).await;
}

// ============================================================================
// Fast path
// ============================================================================

#[tokio::test(start_paused = true)]
async fn first_retry_is_immediate_but_asynchronous() {
    let scheduler = RetryScheduler::new(ladder_config()).expect("valid config");
    let fired = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&fired);
    scheduler.retry(move || flag.store(true, Ordering::SeqCst));

    // Never synchronous, even with zero delay.
    assert!(!fired.load(Ordering::SeqCst));
    assert!(scheduler.is_scheduled());

    run_clock(Duration::from_millis(1)).await;
    assert!(fired.load(Ordering::SeqCst));
    assert!(!scheduler.is_scheduled());
}

#[tokio::test(start_paused = true)]
async fn fast_path_is_consumed_exactly_once() {
    let (scheduler, stats) = scheduler_with_stats(ladder_config());

    scheduler.retry(|| {});
    scheduler.retry(|| {});
    scheduler.signal_success();
    scheduler.retry(|| {});
    scheduler.retry(|| {});

    // Initial fast path, floor, post-success fast path, floor again.
    assert_eq!(
        stats.scheduled_delays(),
        vec![
            Duration::ZERO,
            Duration::from_secs(1),
            Duration::ZERO,
            Duration::from_secs(1),
        ]
    );
    assert_eq!(stats.resets(), 1);
}

#[tokio::test(start_paused = true)]
async fn signal_success_leaves_outstanding_task_untouched() {
    let (scheduler, stats) = scheduler_with_stats(ladder_config());
    scheduler.retry(|| {});
    run_clock(Duration::from_millis(1)).await;

    let fired = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&fired);
    scheduler.retry(move || flag.store(true, Ordering::SeqCst));
    assert_eq!(stats.last_delay(), Some(Duration::from_secs(1)));

    scheduler.signal_success();
    assert!(scheduler.is_scheduled());

    run_clock(Duration::from_secs(2)).await;
    assert!(fired.load(Ordering::SeqCst), "success must not cancel the task");
    assert_eq!(scheduler.current_delay(), Duration::ZERO);
}

// ============================================================================
// Backoff ladder
// ============================================================================

#[tokio::test(start_paused = true)]
async fn consecutive_failures_climb_the_ladder_to_the_ceiling() {
    let (scheduler, stats) = scheduler_with_stats(ladder_config());

    // Consume the initial fast path, then fail five times in a row.
    scheduler.retry(|| {});
    for _ in 0..5 {
        scheduler.retry(|| {});
    }

    assert_eq!(
        stats.scheduled_delays(),
        vec![
            Duration::ZERO,
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4),
            Duration::from_secs(8),
            Duration::from_secs(8),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn current_delay_is_monotonic_until_reset() {
    let (scheduler, _stats) = scheduler_with_stats(BackoffConfig {
        retry_exponent: 1.3,
        jitter_factor: 0.0,
        ..ladder_config()
    });

    scheduler.retry(|| {});
    let mut previous = Duration::ZERO;
    for _ in 0..20 {
        scheduler.retry(|| {});
        let current = scheduler.current_delay();
        assert!(current >= previous);
        previous = current;
    }
    assert_eq!(previous, Duration::from_secs(8));
}

// ============================================================================
// Superseding
// ============================================================================

#[tokio::test(start_paused = true)]
async fn newer_retry_supersedes_pending_one() {
    let (scheduler, stats) = scheduler_with_stats(ladder_config());
    let a_fired = Arc::new(AtomicBool::new(false));
    let b_fired = Arc::new(AtomicBool::new(false));

    let a = Arc::clone(&a_fired);
    scheduler.retry(move || a.store(true, Ordering::SeqCst));
    let b = Arc::clone(&b_fired);
    scheduler.retry(move || b.store(true, Ordering::SeqCst));

    run_clock(Duration::from_secs(5)).await;

    assert!(!a_fired.load(Ordering::SeqCst), "superseded work must never run");
    assert!(b_fired.load(Ordering::SeqCst));
    assert_eq!(stats.superseded(), 1);
    assert_eq!(stats.fired(), 1);
}

#[tokio::test(start_paused = true)]
async fn each_fired_task_runs_exactly_once() {
    let scheduler = RetryScheduler::new(ladder_config()).expect("valid config");
    let runs = Arc::new(AtomicU32::new(0));

    let counter = Arc::clone(&runs);
    scheduler.retry(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    run_clock(Duration::from_secs(60)).await;

    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn cancel_prevents_fire_and_resets_backoff() {
    let (scheduler, stats) = scheduler_with_stats(ladder_config());
    scheduler.retry(|| {});
    scheduler.retry(|| {});
    scheduler.retry(|| {});
    assert_eq!(stats.last_delay(), Some(Duration::from_secs(2)));

    let fired = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&fired);
    scheduler.retry(move || flag.store(true, Ordering::SeqCst));

    scheduler.cancel();
    assert!(!scheduler.is_scheduled());
    assert_eq!(scheduler.current_delay(), Duration::ZERO);

    run_clock(Duration::from_secs(30)).await;
    assert!(!fired.load(Ordering::SeqCst), "cancelled work must never run");

    // Backoff restarts from the floor, not where it left off; the fast path
    // is unaffected by cancel (it was already consumed).
    scheduler.retry(|| {});
    assert_eq!(stats.last_delay(), Some(Duration::from_secs(1)));
}

#[tokio::test(start_paused = true)]
async fn cancel_is_idempotent_and_preserves_fast_path() {
    let (scheduler, stats) = scheduler_with_stats(ladder_config());

    scheduler.cancel();
    scheduler.cancel();
    assert_eq!(stats.cancelled(), 0, "no pending task, nothing to cancel");

    // A fresh scheduler's fast path survives cancel.
    scheduler.retry(|| {});
    assert_eq!(stats.last_delay(), Some(Duration::ZERO));
}

#[tokio::test(start_paused = true)]
async fn drop_cancels_the_pending_task() {
    let fired = Arc::new(AtomicBool::new(false));
    {
        let scheduler = RetryScheduler::new(ladder_config()).expect("valid config");
        let flag = Arc::clone(&fired);
        scheduler.retry(move || flag.store(true, Ordering::SeqCst));
    }
    run_clock(Duration::from_secs(5)).await;
    assert!(!fired.load(Ordering::SeqCst));
}

// ============================================================================
// Jitter
// ============================================================================

#[tokio::test(start_paused = true)]
async fn injected_jitter_draws_are_applied_per_call() {
    let stats = Arc::new(StatsObserver::new());
    let scheduler = RetryScheduler::builder()
        .with_config(BackoffConfig {
            min_delay_ms: 1_000,
            max_delay_ms: 30_000,
            retry_exponent: 1.3,
            jitter_factor: 0.7,
        })
        .with_jitter(SequenceJitter::new([0.0, 0.5]))
        .with_observer(Arc::clone(&stats))
        .build()
        .expect("valid config");

    scheduler.retry(|| {});
    scheduler.retry(|| {});
    scheduler.retry(|| {});

    let delays = stats.scheduled_delays();
    assert_eq!(delays[0], Duration::ZERO);

    // First backoff: base 1s, unit 0.0 -> (1 - 0.7) * 1s = 0.3s.
    assert!((delays[1].as_secs_f64() - 0.3).abs() < 1e-9, "{:?}", delays[1]);

    // Second backoff: base 1.3s, unit 0.5 -> 1.3 * (0.3 + 0.35) = 0.845s.
    assert!((delays[2].as_secs_f64() - 0.845).abs() < 1e-9, "{:?}", delays[2]);
}

#[tokio::test(start_paused = true)]
async fn jittered_delays_stay_within_configured_bounds() {
    let stats = Arc::new(StatsObserver::new());
    let scheduler = RetryScheduler::builder()
        .with_config(BackoffConfig {
            min_delay_ms: 1_000,
            max_delay_ms: 8_000,
            retry_exponent: 2.0,
            jitter_factor: 0.7,
        })
        .with_observer(Arc::clone(&stats))
        .build()
        .expect("valid config");

    scheduler.retry(|| {});
    for _ in 0..10 {
        scheduler.retry(|| {});
        let base = scheduler.current_delay();
        let scheduled = stats.last_delay().expect("a delay was recorded");
        let floor = base.mul_f64(0.3);
        assert!(
            scheduled >= floor && scheduled <= base,
            "scheduled {scheduled:?} outside [{floor:?}, {base:?}]"
        );
    }
}
