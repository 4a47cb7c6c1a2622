//! A digest-backed accumulation pool.

use sha2::digest::{Digest, FixedOutputReset};
use zeroize::Zeroize;

use super::EntropySource;
use crate::error::Error;

/// Accumulates samples into a running digest until a threshold is met.
///
/// `get_seed` finalizes the digest into the caller's buffer and restarts
/// the pool. The sample count is the caller's entropy estimate; the
/// threshold is chosen to match it (e.g. one sample per input byte when a
/// byte is credited with one bit).
pub struct DigestPool<D> {
    hasher: D,
    nsamples: u64,
    threshold: u64,
}

impl<D: Digest + FixedOutputReset> DigestPool<D> {
    /// Creates a pool that reports seed-ready at `threshold` samples.
    pub fn new(threshold: u64) -> Self {
        Self {
            hasher: D::new(),
            nsamples: 0,
            threshold,
        }
    }

    /// Returns whether a full seed's worth of samples has been gathered.
    pub fn seed_ready(&self) -> bool {
        self.nsamples >= self.threshold
    }
}

impl<D: Digest + FixedOutputReset + Send> EntropySource for DigestPool<D> {
    fn get_seed(&mut self, out: &mut [u8]) -> Result<(), Error> {
        if !self.seed_ready() {
            return Err(Error::OutOfEntropy);
        }
        if out.len() > <D as Digest>::output_size() {
            return Err(Error::Config);
        }

        let mut output = self.hasher.finalize_reset();
        out.copy_from_slice(&output[..out.len()]);
        output.as_mut_slice().zeroize();

        self.nsamples = 0;
        Ok(())
    }

    fn add_entropy(&mut self, nsamples: u32, data: &[u8]) -> Result<bool, Error> {
        Digest::update(&mut self.hasher, data);
        self.nsamples = self.nsamples.saturating_add(u64::from(nsamples));
        Ok(self.seed_ready())
    }

    fn reset(&mut self) {
        Digest::reset(&mut self.hasher);
        self.nsamples = 0;
        tracing::debug!("digest pool reset");
    }
}
