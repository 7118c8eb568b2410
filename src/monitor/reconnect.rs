//! Reconnection state machine.
//!
//! Wraps source liveness failures in a fixed backoff ladder. The machine is
//! pure; the health loop owns the actual sleeping and probing.

use std::time::Duration;

/// Backoff ladder for reconnection attempts; attempts beyond the ladder
/// reuse the last rung.
const BACKOFF: [Duration; 5] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(5),
    Duration::from_secs(10),
    Duration::from_secs(30),
];

/// Where the controller currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectState {
    /// Source is believed healthy.
    Connected,
    /// Waiting out backoff before attempt `n + 1`.
    Reconnecting(u32),
    /// All attempts spent; monitoring must stop.
    Exhausted,
}

/// What the caller should do after reporting a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDirective {
    /// Wait `delay`, then probe again. `attempt` is 1-based.
    Retry { attempt: u32, delay: Duration },
    /// Stop monitoring and surface a fatal event.
    GiveUp,
}

/// Drives `Connected → Reconnecting(n) → Connected | Exhausted`.
#[derive(Debug)]
pub struct ReconnectController {
    state: ReconnectState,
    max_attempts: u32,
}

impl ReconnectController {
    /// Create a controller allowing `max_attempts` consecutive failures.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            state: ReconnectState::Connected,
            max_attempts,
        }
    }

    #[must_use]
    pub fn state(&self) -> ReconnectState {
        self.state
    }

    /// Record a probe failure and decide the next step.
    pub fn on_failure(&mut self) -> ReconnectDirective {
        let attempts_so_far = match self.state {
            ReconnectState::Connected => 0,
            ReconnectState::Reconnecting(n) => n,
            ReconnectState::Exhausted => return ReconnectDirective::GiveUp,
        };
        let attempt = attempts_so_far + 1;
        if attempt > self.max_attempts {
            self.state = ReconnectState::Exhausted;
            return ReconnectDirective::GiveUp;
        }
        self.state = ReconnectState::Reconnecting(attempt);
        let rung = (attempt as usize - 1).min(BACKOFF.len() - 1);
        ReconnectDirective::Retry {
            attempt,
            delay: BACKOFF[rung],
        }
    }

    /// Record a successful probe: attempts reset, monitoring continues with
    /// the channel set intact.
    pub fn on_success(&mut self) {
        if self.state != ReconnectState::Exhausted {
            self.state = ReconnectState::Connected;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_delays_in_order() {
        let mut controller = ReconnectController::new(5);
        let expected = [1u64, 2, 5, 10, 30];
        for (i, secs) in expected.iter().enumerate() {
            match controller.on_failure() {
                ReconnectDirective::Retry { attempt, delay } => {
                    assert_eq!(attempt, i as u32 + 1);
                    assert_eq!(delay, Duration::from_secs(*secs));
                }
                ReconnectDirective::GiveUp => panic!("gave up at attempt {}", i + 1),
            }
        }
    }

    #[test]
    fn exhausts_after_max_attempts() {
        let mut controller = ReconnectController::new(5);
        for _ in 0..5 {
            assert!(matches!(
                controller.on_failure(),
                ReconnectDirective::Retry { .. }
            ));
        }
        assert_eq!(controller.on_failure(), ReconnectDirective::GiveUp);
        assert_eq!(controller.state(), ReconnectState::Exhausted);
    }

    #[test]
    fn exhausted_never_retries_again() {
        let mut controller = ReconnectController::new(1);
        let _ = controller.on_failure();
        assert_eq!(controller.on_failure(), ReconnectDirective::GiveUp);
        assert_eq!(controller.on_failure(), ReconnectDirective::GiveUp);

        // success after exhaustion does not resurrect the controller
        controller.on_success();
        assert_eq!(controller.state(), ReconnectState::Exhausted);
    }

    #[test]
    fn success_resets_attempt_count() {
        let mut controller = ReconnectController::new(5);
        let _ = controller.on_failure();
        let _ = controller.on_failure();
        controller.on_success();
        assert_eq!(controller.state(), ReconnectState::Connected);

        match controller.on_failure() {
            ReconnectDirective::Retry { attempt, delay } => {
                assert_eq!(attempt, 1);
                assert_eq!(delay, Duration::from_secs(1));
            }
            ReconnectDirective::GiveUp => panic!("should retry after reset"),
        }
    }
}
