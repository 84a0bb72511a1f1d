// SPDX-License-Identifier: GPL-3.0-only

//! Last-activity timestamp

use super::clock::Clock;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::trace;

/// When the unit was last used
///
/// Touched by user-facing commands and button presses, never by passive
/// status reads: a dashboard polling status must not keep the unit awake.
#[derive(Debug)]
pub struct ActivityClock {
    clock: Arc<dyn Clock>,
    last_active: Mutex<Instant>,
}

impl ActivityClock {
    /// Start the clock with "now" as the last activity
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            clock,
            last_active: Mutex::new(now),
        }
    }

    /// Record activity now
    pub fn touch(&self) {
        let now = self.clock.now();
        let mut last = self.last_active.lock().unwrap_or_else(PoisonError::into_inner);
        // Two racing touches may read the clock out of order
        if now > *last {
            *last = now;
        }
        trace!("Activity recorded");
    }

    /// Instant of the last recorded activity
    ///
    /// Changes on every effective [`touch`](Self::touch), so a caller that
    /// remembers it can tell whether the unit was used in between.
    pub fn last_active(&self) -> Instant {
        *self.last_active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Time since the last activity
    pub fn idle_duration(&self) -> Duration {
        let last = *self.last_active.lock().unwrap_or_else(PoisonError::into_inner);
        self.clock.now().saturating_duration_since(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordination::clock::{ManualClock, SystemClock};

    #[test]
    fn test_touch_resets_idle_duration() {
        let clock = Arc::new(ManualClock::new());
        let activity = ActivityClock::new(clock.clone());

        clock.advance(Duration::from_secs(42));
        assert_eq!(activity.idle_duration(), Duration::from_secs(42));

        activity.touch();
        assert_eq!(activity.idle_duration(), Duration::ZERO);
    }

    #[test]
    fn test_last_active_moves_with_touch() {
        let clock = Arc::new(ManualClock::new());
        let activity = ActivityClock::new(clock.clone());
        let started = activity.last_active();

        clock.advance(Duration::from_secs(5));
        assert_eq!(activity.last_active(), started);

        activity.touch();
        assert_eq!(activity.last_active(), started + Duration::from_secs(5));
    }

    #[test]
    fn test_touch_then_read_is_near_zero_on_real_clock() {
        let activity = Arc::new(ActivityClock::new(Arc::new(SystemClock)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let activity = Arc::clone(&activity);
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        activity.touch();
                        assert!(activity.idle_duration() < Duration::from_millis(250));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
