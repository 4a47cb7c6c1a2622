//! Reseed on a fixed time interval.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use once_cell::sync::Lazy;

use super::{Action, ReseedSchedule, StickyFlag};

/// Clock queried by [`TimerSchedule`]; returns monotonic nanoseconds.
pub type Clock = fn() -> u64;

/// Monotonic nanoseconds since the first call in this process.
pub fn monotonic_ns() -> u64 {
    static EPOCH: Lazy<Instant> = Lazy::new(Instant::now);
    Instant::now().duration_since(*EPOCH).as_nanos() as u64
}

/// Recommends a reseed once an interval has elapsed.
///
/// The interval bounds how long a compromised generator state keeps
/// producing predictable output.
#[derive(Debug)]
pub struct TimerSchedule {
    clock: Clock,
    interval_ns: u64,
    last_reseed_ns: AtomicU64,
    sticky: StickyFlag,
}

impl TimerSchedule {
    /// Creates a schedule that recommends a reseed whenever `interval_ns`
    /// has elapsed since the last acknowledged reseed.
    pub fn new(clock: Clock, interval_ns: u64) -> Self {
        Self {
            clock,
            interval_ns,
            last_reseed_ns: AtomicU64::new(clock()),
            sticky: StickyFlag::new(),
        }
    }
}

impl ReseedSchedule for TimerSchedule {
    fn poll(&self) -> Action {
        let now = (self.clock)();
        let last = self.last_reseed_ns.load(Ordering::Relaxed);
        if now.wrapping_sub(last) >= self.interval_ns {
            Action::MustReseed
        } else {
            Action::Continue
        }
    }

    fn acknowledge(&self) {
        self.last_reseed_ns.store((self.clock)(), Ordering::Relaxed);
    }

    fn sticky(&self) -> &StickyFlag {
        &self.sticky
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TIME_SIM: AtomicU64 = AtomicU64::new(0);

    fn clock_sim() -> u64 {
        TIME_SIM.load(Ordering::Relaxed)
    }

    fn advance(ns: u64) {
        TIME_SIM.fetch_add(ns, Ordering::Relaxed);
    }

    #[test]
    fn test_timer_interval() {
        let schedule = TimerSchedule::new(clock_sim, 2);

        assert_eq!(schedule.read(), Action::Continue);

        advance(1);
        assert_eq!(schedule.read(), Action::Continue);

        advance(1);
        assert_eq!(schedule.read(), Action::MustReseed);

        schedule.notify_reseed();
        assert_eq!(schedule.read(), Action::Continue);

        // Well past the interval: the recommendation returns.
        advance(5);
        assert_eq!(schedule.read(), Action::MustReseed);
    }

    #[test]
    fn test_monotonic_clock_advances() {
        let a = monotonic_ns();
        let b = monotonic_ns();
        assert!(b >= a);
    }
}
