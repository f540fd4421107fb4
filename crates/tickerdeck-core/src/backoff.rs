//! Rate-limit backoff state machine.

use std::time::{Duration, Instant};

/// Tracks the lockout window and escalating retry delay after provider
/// rate-limit responses.
///
/// The delay starts at a fixed floor, doubles on each consecutive rate-limit
/// error up to a fixed ceiling, and snaps back to the floor after any
/// successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffState {
    floor: Duration,
    ceiling: Duration,
    current_delay: Duration,
    limited_until: Option<Instant>,
}

impl BackoffState {
    pub fn new(floor: Duration, ceiling: Duration) -> Self {
        Self {
            floor,
            ceiling,
            current_delay: floor,
            limited_until: None,
        }
    }

    /// Time left in the active lockout window, if any.
    pub fn remaining_lockout(&self) -> Option<Duration> {
        let deadline = self.limited_until?;
        let now = Instant::now();
        if deadline > now {
            Some(deadline - now)
        } else {
            None
        }
    }

    /// Record a rate-limit failure: lock dispatch out for the current delay,
    /// then double the delay for the next occurrence (capped at the ceiling).
    pub fn record_rate_limit(&mut self) {
        self.limited_until = Some(Instant::now() + self.current_delay);
        self.current_delay = (self.current_delay * 2).min(self.ceiling);
    }

    /// Any successful dispatch resets the delay to its floor.
    pub fn record_success(&mut self) {
        self.current_delay = self.floor;
    }

    /// Full reset: no lockout, delay back at the floor.
    pub fn reset(&mut self) {
        self.current_delay = self.floor;
        self.limited_until = None;
    }

    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }
}
