//! # ripcord
//!
//! Reconnect retry scheduling for long-lived client connections:
//! - Exponential backoff with configurable jitter
//! - Zero-delay fast path for the first retry after a reported success
//! - Single-slot scheduling with cooperative cancellation
//! - Reconnect supervision with interrupt-reason gating
//!
//! The scheduler decides *when* to re-invoke a caller-supplied unit of work;
//! what that work does, and whether it succeeded, stays with the caller.

pub mod config;
pub mod error;
pub mod reconnect;
pub mod retry;

pub use config::BackoffConfig;
pub use error::{Error, Result};
pub use reconnect::{ReconnectSupervisor, DEFAULT_HEALTHY_AFTER};
pub use retry::{
    apply_jitter, next_backoff, FixedJitter, JitterSource, NoOpObserver, RetryObserver,
    RetryScheduler, RetrySchedulerBuilder, SequenceJitter, StatsObserver, ThreadRngJitter,
    TracingObserver,
};
