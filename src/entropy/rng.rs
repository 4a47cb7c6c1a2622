//! An entropy source backed by another generator.

use super::EntropySource;
use crate::error::Error;
use crate::rng::RandomSource;

/// Forwards seed requests to an underlying byte generator.
///
/// Used where a lower-level RNG (the OS, or the Fortuna core) stands in as
/// the seed supply for a DRBG consumer. Never accumulates.
pub struct RngSource<R> {
    rng: R,
}

impl<R: RandomSource> RngSource<R> {
    /// Wraps `rng` as an entropy source.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: RandomSource> EntropySource for RngSource<R> {
    fn get_seed(&mut self, out: &mut [u8]) -> Result<(), Error> {
        self.rng.generate(out)
    }
}
