//! Reseed schedules.
//!
//! A schedule decides, at each generate, whether the consumer should keep
//! going, opportunistically reseed, or refuse output until a reseed
//! succeeds. Implementations use only atomics and are safe to read from
//! multiple threads without external locking.

mod constant;
mod counter;
mod flag;
mod timer;
mod tree;

pub use constant::ConstantSchedule;
pub use counter::CounterSchedule;
pub use flag::{FlagSchedule, FlagSetter};
pub use timer::{monotonic_ns, Clock, TimerSchedule};
pub use tree::TreeSchedule;

use std::sync::atomic::{AtomicBool, Ordering};

/// Recommendation returned by [`ReseedSchedule::read`].
///
/// Ordered by urgency: `Continue < TryReseed < MustReseed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Action {
    /// No reseed required; proceed to generate.
    Continue,
    /// Attempt to pull fresh seed; generate anyway if the source is empty.
    TryReseed,
    /// Reseed must succeed before any output is produced.
    MustReseed,
}

/// Latches the must-reseed recommendation until a reseed is acknowledged.
#[derive(Debug, Default)]
pub struct StickyFlag {
    must_reseed: AtomicBool,
}

impl StickyFlag {
    /// Creates an unlatched flag.
    pub fn new() -> Self {
        Self::default()
    }

    fn observe(&self, action: Action) -> Action {
        if action == Action::MustReseed {
            self.must_reseed.store(true, Ordering::Relaxed);
        }
        if self.must_reseed.load(Ordering::Relaxed) {
            Action::MustReseed
        } else {
            action
        }
    }

    fn clear(&self) {
        self.must_reseed.store(false, Ordering::Relaxed);
    }
}

/// When to reseed, and how to acknowledge that a reseed happened.
///
/// Implementors provide [`poll`](Self::poll) and
/// [`acknowledge`](Self::acknowledge); consumers call only
/// [`read`](Self::read) and [`notify_reseed`](Self::notify_reseed), which
/// add the latching rule shared by every variant: once `MustReseed` has
/// been observed, every subsequent read reports `MustReseed` until a
/// reseed is acknowledged.
pub trait ReseedSchedule: Send + Sync {
    /// Variant-specific recommendation.
    fn poll(&self) -> Action;

    /// Variant-specific reaction to a completed reseed.
    fn acknowledge(&self);

    /// The shared latch consulted by [`read`](Self::read).
    fn sticky(&self) -> &StickyFlag;

    /// Returns the current recommendation, applying the latching rule.
    fn read(&self) -> Action {
        self.sticky().observe(self.poll())
    }

    /// Acknowledges a completed reseed and clears the latch.
    fn notify_reseed(&self) {
        self.sticky().clear();
        self.acknowledge();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU8;

    /// Reports whatever action was last stored; for latch tests.
    pub(crate) struct StaticSchedule {
        action: AtomicU8,
        sticky: StickyFlag,
    }

    impl StaticSchedule {
        pub(crate) fn new(action: Action) -> Self {
            let schedule = Self {
                action: AtomicU8::new(0),
                sticky: StickyFlag::new(),
            };
            schedule.set(action);
            schedule
        }

        pub(crate) fn set(&self, action: Action) {
            let raw = match action {
                Action::Continue => 0,
                Action::TryReseed => 1,
                Action::MustReseed => 2,
            };
            self.action.store(raw, Ordering::Relaxed);
        }
    }

    impl ReseedSchedule for StaticSchedule {
        fn poll(&self) -> Action {
            match self.action.load(Ordering::Relaxed) {
                0 => Action::Continue,
                1 => Action::TryReseed,
                _ => Action::MustReseed,
            }
        }

        fn acknowledge(&self) {}

        fn sticky(&self) -> &StickyFlag {
            &self.sticky
        }
    }

    #[test]
    fn test_action_ordering() {
        assert!(Action::Continue < Action::TryReseed);
        assert!(Action::TryReseed < Action::MustReseed);
    }

    #[test]
    fn test_must_reseed_is_sticky() {
        let schedule = StaticSchedule::new(Action::MustReseed);

        assert_eq!(schedule.read(), Action::MustReseed);

        // The underlying recommendation relaxes, but no reseed has
        // occurred to clear the latch.
        schedule.set(Action::Continue);
        assert_eq!(schedule.read(), Action::MustReseed);

        schedule.notify_reseed();
        assert_eq!(schedule.read(), Action::Continue);
    }

    #[test]
    fn test_try_reseed_does_not_latch() {
        let schedule = StaticSchedule::new(Action::TryReseed);

        assert_eq!(schedule.read(), Action::TryReseed);
        schedule.set(Action::Continue);
        assert_eq!(schedule.read(), Action::Continue);
    }
}
