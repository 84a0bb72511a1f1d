// SPDX-License-Identifier: GPL-3.0-only

//! Single-flight LED pulse sequence

use crate::hardware::Led;
use crate::hardware::led::set_logged;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{error, trace};

/// Pulses the indicator LED to acknowledge a ping
///
/// At most one sequence runs at a time; a trigger while one is running is
/// dropped, not queued.
#[derive(Clone)]
pub struct BlinkSignal {
    led: Arc<dyn Led>,
    busy: Arc<AtomicBool>,
    completed: Arc<AtomicUsize>,
    count: u32,
    period: Duration,
}

impl BlinkSignal {
    pub fn new(led: Arc<dyn Led>, count: u32, period: Duration) -> Self {
        Self {
            led,
            busy: Arc::new(AtomicBool::new(false)),
            completed: Arc::new(AtomicUsize::new(0)),
            count,
            period,
        }
    }

    /// Start a blink sequence unless one is already running
    ///
    /// Returns `true` if this call started a sequence.
    pub fn trigger(&self) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            trace!("Blink already running");
            return false;
        }

        let led = Arc::clone(&self.led);
        let guard = BusyGuard(Arc::clone(&self.busy));
        let completed = Arc::clone(&self.completed);
        let (count, period) = (self.count, self.period);

        let spawned = thread::Builder::new()
            .name("blink".into())
            .spawn(move || {
                let _guard = guard;
                for _ in 0..count {
                    set_logged(led.as_ref(), true);
                    thread::sleep(period);
                    set_logged(led.as_ref(), false);
                    thread::sleep(period);
                }
                completed.fetch_add(1, Ordering::AcqRel);
            });

        // On spawn failure the closure, and with it the guard, is dropped
        if let Err(e) = spawned {
            error!(error = %e, "Failed to spawn blink thread");
            return false;
        }
        true
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Number of sequences that ran to completion
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }
}

/// Clears the busy flag on every exit path of a sequence
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::VirtualLed;
    use std::time::Instant;

    fn wait_idle(signal: &BlinkSignal) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while signal.is_busy() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_trigger_while_busy_is_dropped() {
        let led = Arc::new(VirtualLed::new("indicator"));
        let signal = BlinkSignal::new(led.clone(), 3, Duration::from_millis(20));

        assert!(signal.trigger());
        assert!(!signal.trigger());
        assert!(!signal.trigger());

        wait_idle(&signal);
        assert!(!signal.is_busy());
        assert_eq!(signal.completed(), 1);
        assert!(!led.is_active());

        // Free again once the sequence is over
        assert!(signal.trigger());
        wait_idle(&signal);
        assert_eq!(signal.completed(), 2);
    }
}
