//! A schedule driven by a DRBG's reseed counter.

use crate::drbg::{Drbg, ReseedCounter};

use super::{Action, ReseedSchedule, StickyFlag};

/// Recommends `MustReseed` once the observed DRBG would refuse to
/// generate.
///
/// Holds a shared handle to the DRBG's reseed counter and compares it
/// against the DRBG's reseed interval, so the recommendation surfaces no
/// later than the generator's own saturation.
#[derive(Debug)]
pub struct CounterSchedule {
    counter: ReseedCounter,
    interval: u64,
    sticky: StickyFlag,
}

impl CounterSchedule {
    /// Creates a schedule watching `counter` against `interval`.
    pub fn new(counter: ReseedCounter, interval: u64) -> Self {
        Self {
            counter,
            interval,
            sticky: StickyFlag::new(),
        }
    }

    /// Creates a schedule watching `drbg`'s own counter and interval.
    pub fn for_drbg<D: Drbg>(drbg: &D) -> Self {
        Self::new(drbg.reseed_counter(), drbg.reseed_interval())
    }
}

impl ReseedSchedule for CounterSchedule {
    fn poll(&self) -> Action {
        if self.counter.get() > self.interval {
            Action::MustReseed
        } else {
            Action::Continue
        }
    }

    fn acknowledge(&self) {}

    fn sticky(&self) -> &StickyFlag {
        &self.sticky
    }
}
