//! Reconnect supervision
//!
//! A [`ReconnectSupervisor`] sits between a persistent-connection owner and a
//! [`RetryScheduler`]: it tracks the reasons reconnection is currently not
//! wanted (app backgrounded, session torn down, waiting for open), classifies
//! lost connections as healthy or not, and schedules connection attempts
//! through the scheduler only when nothing is interrupting.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::config::BackoffConfig;
use crate::error::Result;
use crate::retry::RetryScheduler;

const POISONED: &str = "reconnect supervisor state poisoned";

/// How long a connection must stay up before its eventual loss still counts
/// as a success for backoff purposes
pub const DEFAULT_HEALTHY_AFTER: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

struct SupervisorState {
    interrupt_reasons: HashSet<String>,
    connection: ConnectionState,
    established_at: Option<Instant>,
}

struct SupervisorInner {
    scheduler: RetryScheduler,
    connect: Box<dyn Fn() + Send + Sync>,
    healthy_after: Duration,
    state: Mutex<SupervisorState>,
}

/// Supervises reconnection attempts for a long-lived connection
///
/// The supervisor owns a [`RetryScheduler`] and a connect callback, invoked
/// once per scheduled attempt. The owner reports attempt outcomes back via
/// [`attempt_failed`](Self::attempt_failed),
/// [`connection_established`](Self::connection_established), and
/// [`connection_lost`](Self::connection_lost); the supervisor decides when
/// the next attempt runs.
///
/// Reconnection is gated on an interrupt-reason set: while any reason is
/// present nothing is scheduled, and removing the last reason triggers
/// exactly one attempt. A connection that stayed up longer than the healthy
/// threshold resets backoff when it drops, so a client recovering from a
/// long-lived session is not penalized with a stale large delay.
pub struct ReconnectSupervisor {
    inner: Arc<SupervisorInner>,
}

impl ReconnectSupervisor {
    /// Create a supervisor with a default scheduler for `config`
    ///
    /// `connect` is invoked once per scheduled attempt, from the scheduler's
    /// timer task.
    pub fn new<F>(config: BackoffConfig, connect: F) -> Result<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        Ok(Self::with_scheduler(
            RetryScheduler::new(config)?,
            DEFAULT_HEALTHY_AFTER,
            connect,
        ))
    }

    /// Create a supervisor around an already-built scheduler
    ///
    /// Use this to inject an observer or a deterministic jitter source, or
    /// to tune the healthy-connection threshold.
    pub fn with_scheduler<F>(scheduler: RetryScheduler, healthy_after: Duration, connect: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(SupervisorInner {
                scheduler,
                connect: Box::new(connect),
                healthy_after,
                state: Mutex::new(SupervisorState {
                    interrupt_reasons: HashSet::new(),
                    connection: ConnectionState::Disconnected,
                    established_at: None,
                }),
            }),
        }
    }

    /// Stop reconnecting for the given reason
    ///
    /// Cancels any scheduled attempt and resets backoff, so that the resume
    /// after an interruption reconnects promptly rather than inheriting a
    /// stale delay.
    pub fn interrupt(&self, reason: &str) {
        tracing::debug!(reason, "reconnect interrupted");
        {
            let mut state = self.inner.state.lock().expect(POISONED);
            state.interrupt_reasons.insert(reason.to_string());
        }
        self.inner.scheduler.cancel();
        self.inner.scheduler.signal_success();
    }

    /// Allow reconnecting again for the given reason
    ///
    /// If no other reason remains and the connection is down, schedules one
    /// attempt.
    pub fn resume(&self, reason: &str) {
        tracing::debug!(reason, "reconnect no longer interrupted");
        let schedule = {
            let mut state = self.inner.state.lock().expect(POISONED);
            state.interrupt_reasons.remove(reason);
            state.interrupt_reasons.is_empty()
                && state.connection == ConnectionState::Disconnected
        };
        if schedule {
            self.schedule_attempt();
        }
    }

    /// Whether reconnection is currently interrupted for `reason`
    pub fn is_interrupted(&self, reason: &str) -> bool {
        self.inner
            .state
            .lock()
            .expect(POISONED)
            .interrupt_reasons
            .contains(reason)
    }

    /// Whether nothing is currently interrupting reconnection
    pub fn should_reconnect(&self) -> bool {
        self.inner
            .state
            .lock()
            .expect(POISONED)
            .interrupt_reasons
            .is_empty()
    }

    /// Whether the supervised connection is currently established
    pub fn is_connected(&self) -> bool {
        self.inner.state.lock().expect(POISONED).connection == ConnectionState::Connected
    }

    /// The underlying scheduler
    pub fn scheduler(&self) -> &RetryScheduler {
        &self.inner.scheduler
    }

    /// Report that a scheduled attempt failed before establishing
    ///
    /// Schedules the next attempt with grown backoff, unless interrupted.
    pub fn attempt_failed(&self) {
        let schedule = {
            let mut state = self.inner.state.lock().expect(POISONED);
            state.connection = ConnectionState::Disconnected;
            state.interrupt_reasons.is_empty()
        };
        if schedule {
            self.schedule_attempt();
        }
    }

    /// Report that the connection is up
    ///
    /// Records the establishment time; whether the connection counts as a
    /// success for backoff purposes is decided when it is lost, based on how
    /// long it stayed up.
    pub fn connection_established(&self) {
        let mut state = self.inner.state.lock().expect(POISONED);
        state.connection = ConnectionState::Connected;
        state.established_at = Some(Instant::now());
    }

    /// Report that an established connection dropped
    ///
    /// A connection that the server explicitly reset, or that stayed up past
    /// the healthy threshold, resets backoff before the reconnect attempt is
    /// scheduled. Nothing is scheduled while interrupted.
    pub fn connection_lost(&self, server_reset: bool) {
        let (was_healthy, schedule) = {
            let mut state = self.inner.state.lock().expect(POISONED);
            let was_healthy = state
                .established_at
                .take()
                .is_some_and(|at| at.elapsed() >= self.inner.healthy_after);
            state.connection = ConnectionState::Disconnected;
            (was_healthy, state.interrupt_reasons.is_empty())
        };
        if server_reset || was_healthy {
            self.inner.scheduler.signal_success();
        }
        if schedule {
            self.schedule_attempt();
        }
    }

    /// Report that the network became reachable again
    ///
    /// Resets backoff and, if the connection is down, schedules an immediate
    /// attempt. The app-foregrounded notification takes the same path.
    pub fn network_recovered(&self) {
        self.inner.scheduler.signal_success();
        let schedule = {
            let state = self.inner.state.lock().expect(POISONED);
            state.interrupt_reasons.is_empty()
                && state.connection == ConnectionState::Disconnected
        };
        if schedule {
            self.schedule_attempt();
        }
    }

    fn schedule_attempt(&self) {
        tracing::debug!("scheduling connection attempt");
        let inner = Arc::clone(&self.inner);
        self.inner.scheduler.retry(move || {
            {
                let mut state = inner.state.lock().expect(POISONED);
                // An interrupt or an established connection that raced this
                // timer makes the attempt moot.
                if !state.interrupt_reasons.is_empty()
                    || state.connection == ConnectionState::Connected
                {
                    return;
                }
                state.connection = ConnectionState::Connecting;
            }
            (inner.connect)();
        });
    }
}

impl Drop for ReconnectSupervisor {
    fn drop(&mut self) {
        self.inner.scheduler.cancel();
    }
}

impl std::fmt::Debug for ReconnectSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock().expect(POISONED);
        f.debug_struct("ReconnectSupervisor")
            .field("connection", &state.connection)
            .field("interrupt_reasons", &state.interrupt_reasons)
            .field("healthy_after", &self.inner.healthy_after)
            .finish()
    }
}
