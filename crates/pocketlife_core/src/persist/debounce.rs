//! Explicit cancellable trailing-edge timer.
//!
//! # Invariants
//! - At most one pending deadline exists; arming again moves it, it never
//!   stacks.
//! - The timer holds no thread or callback; the host drives it by asking
//!   [`DebounceTimer::is_due`] with its own notion of now.

use std::time::{Duration, Instant};

/// Arm/reset/fire-now timer used for flush debouncing.
#[derive(Debug)]
pub struct DebounceTimer {
    quiet_window: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn new(quiet_window: Duration) -> Self {
        Self {
            quiet_window,
            deadline: None,
        }
    }

    /// Arms (or re-arms) the timer to fire one quiet window after `now`.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet_window);
    }

    /// Clears any pending deadline.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns whether the quiet window has elapsed at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    pub fn quiet_window(&self) -> Duration {
        self.quiet_window
    }
}

#[cfg(test)]
mod tests {
    use super::DebounceTimer;
    use std::time::{Duration, Instant};

    const WINDOW: Duration = Duration::from_millis(1000);

    #[test]
    fn unarmed_timer_is_never_due() {
        let timer = DebounceTimer::new(WINDOW);
        assert!(!timer.is_due(Instant::now()));
    }

    #[test]
    fn rearming_resets_the_deadline_instead_of_stacking() {
        // Writes at t0, t0+200ms, t0+400ms with a 1000ms window must yield
        // one deadline at t0+1400ms.
        let t0 = Instant::now();
        let mut timer = DebounceTimer::new(WINDOW);
        timer.arm(t0);
        timer.arm(t0 + Duration::from_millis(200));
        timer.arm(t0 + Duration::from_millis(400));

        assert!(!timer.is_due(t0 + Duration::from_millis(1399)));
        assert!(timer.is_due(t0 + Duration::from_millis(1400)));
    }

    #[test]
    fn cancel_clears_pending_deadline() {
        let t0 = Instant::now();
        let mut timer = DebounceTimer::new(WINDOW);
        timer.arm(t0);
        timer.cancel();
        assert!(!timer.is_armed());
        assert!(!timer.is_due(t0 + WINDOW + WINDOW));
    }
}
