//! Readiness gate driven by time since process start.
//!
//! The gate opens once the configured delay has elapsed and stays open for
//! the rest of the process lifetime. Elapsed time comes from a monotonic
//! [`Clock`], so wall-clock adjustments cannot close it again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of monotonic time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Production clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Used to drive the gate in tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Decides whether this instance should receive traffic.
pub struct ReadinessGate {
    clock: Arc<dyn Clock>,
    started_at: Instant,
    delay: Duration,
    /// Set the first time a caller observes the open gate, for logging only
    announced: AtomicBool,
}

impl ReadinessGate {
    /// Start the gate now, using the system monotonic clock.
    pub fn start(delay: Duration) -> Self {
        Self::with_clock(Arc::new(MonotonicClock), delay)
    }

    /// Start the gate at the clock's current instant.
    pub fn with_clock(clock: Arc<dyn Clock>, delay: Duration) -> Self {
        let started_at = clock.now();
        Self {
            clock,
            started_at,
            delay,
            announced: AtomicBool::new(false),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Time elapsed since the gate was started.
    pub fn uptime(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.started_at)
    }

    /// Time left until the gate opens; zero once open.
    pub fn remaining(&self) -> Duration {
        self.delay.saturating_sub(self.uptime())
    }

    /// True once `delay` has elapsed since start.
    pub fn is_ready(&self) -> bool {
        let ready = self.uptime() >= self.delay;
        if ready && !self.announced.swap(true, Ordering::Relaxed) {
            tracing::info!(
                delay_secs = self.delay.as_secs_f64(),
                "Instance became ready"
            );
        }
        ready
    }
}

impl std::fmt::Debug for ReadinessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadinessGate")
            .field("started_at", &self.started_at)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}
