//! A single atomically set reseed flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{Action, ReseedSchedule, StickyFlag};

/// Reads `MustReseed` while the flag is raised.
///
/// Producers raise the flag through a [`FlagSetter`]; the flag is consumed
/// when a reseed is acknowledged. This is the one schedule shared across
/// components (fork handling, first-seed delivery), so both sides go
/// through atomic read-modify-write operations.
#[derive(Debug, Default)]
pub struct FlagSchedule {
    flag: Arc<AtomicBool>,
    sticky: StickyFlag,
}

impl FlagSchedule {
    /// Creates a schedule with the flag lowered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle that can raise the flag from another component.
    pub fn setter(&self) -> FlagSetter {
        FlagSetter {
            flag: Arc::clone(&self.flag),
        }
    }
}

impl ReseedSchedule for FlagSchedule {
    fn poll(&self) -> Action {
        if self.flag.load(Ordering::Acquire) {
            Action::MustReseed
        } else {
            Action::Continue
        }
    }

    fn acknowledge(&self) {
        self.flag.swap(false, Ordering::AcqRel);
    }

    fn sticky(&self) -> &StickyFlag {
        &self.sticky
    }
}

/// Producer handle for a [`FlagSchedule`].
#[derive(Debug, Clone)]
pub struct FlagSetter {
    flag: Arc<AtomicBool>,
}

impl FlagSetter {
    /// Raises the flag; the next schedule read reports `MustReseed`.
    pub fn set(&self) {
        self.flag.store(true, Ordering::Release);
    }
}
