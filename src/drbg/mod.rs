//! Deterministic random bit generators.
//!
//! The crypto RNG layer drives any DRBG through this narrow contract:
//! reseed with fresh seed material, generate output, and expose the
//! reseed counter the schedule layer watches. Two constructions are
//! provided: an AES-256 counter-mode DRBG with a derivation function
//! (the production choice) and an HMAC-SHA-256 DRBG.

mod ctr_aes;
mod hmac;

pub use self::hmac::HmacDrbg;
pub use ctr_aes::CtrDrbg;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::Error;

/// Shared, observable reseed counter of a DRBG instance.
///
/// The generator increments it once per generate call and rewinds it to
/// one on reseed. [`CounterSchedule`](crate::schedule::CounterSchedule)
/// holds a clone to watch for saturation.
#[derive(Debug, Clone)]
pub struct ReseedCounter(Arc<AtomicU64>);

impl Default for ReseedCounter {
    fn default() -> Self {
        Self(Arc::new(AtomicU64::new(1)))
    }
}

impl ReseedCounter {
    /// Current counter value.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn rewind(&self) {
        self.0.store(1, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub(crate) fn force(&self, value: u64) {
        self.0.store(value, Ordering::Relaxed);
    }
}

/// A deterministic random bit generator.
///
/// Instantiation is by constructor; teardown is `Drop`, which zeroizes
/// the working state.
pub trait Drbg: Send {
    /// Mixes fresh `seed` material and optional `additional` input into
    /// the state, rewinding the reseed counter.
    fn reseed(&mut self, seed: &[u8], additional: &[u8]) -> Result<(), Error>;

    /// Fills `out` with pseudorandom bytes.
    ///
    /// Fails with [`Error::NeedsReseed`] once the reseed interval is
    /// exhausted, and with [`Error::Parameter`] if `out` exceeds
    /// [`max_request_nbytes`](Self::max_request_nbytes).
    fn generate(&mut self, out: &mut [u8], additional: &[u8]) -> Result<(), Error>;

    /// Largest request a single generate call accepts, in bytes.
    fn max_request_nbytes(&self) -> usize;

    /// Generate calls permitted between reseeds.
    fn reseed_interval(&self) -> u64;

    /// A shared handle to this instance's reseed counter.
    fn reseed_counter(&self) -> ReseedCounter;
}
