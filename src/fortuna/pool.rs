//! Entropy pools: running SHA-256 digests with sample accounting.

use sha2::{Digest, Sha256};
use zeroize::Zeroize;

/// Number of accumulation pools.
///
/// Fixed by design: the pool count sets the reseed-rate geometry and must
/// not be tuned.
pub const NPOOLS: usize = 32;

const _: () = assert!(NPOOLS == 32, "the pool count is a design constant");

/// Domain-separation label for pool absorption.
const LABEL_ADDENTROPY: [u8; 8] = [0x78, 0x6e, 0x75, 0x70, 0x72, 0x6e, 0x67, 0x03];

/// One accumulation pool.
#[derive(Clone, Zeroize)]
pub(crate) struct Pool {
    pub data: [u8; 32],
    pub nsamples: u64,
    pub ndrains: u64,
    pub nsamples_max: u64,
}

impl Pool {
    pub const fn new() -> Self {
        Self {
            data: [0; 32],
            nsamples: 0,
            ndrains: 0,
            nsamples_max: 0,
        }
    }

    /// Mixes `entropy` into the pool under the absorb label.
    ///
    /// The hardware random word is additional input; absorption succeeds
    /// whether or not the hardware delivers.
    pub fn absorb(&mut self, pool_idx: u32, entropy: &[u8], nsamples: u32) {
        let mut hasher = Sha256::new();
        hasher.update(LABEL_ADDENTROPY);
        hasher.update(pool_idx.to_be_bytes());
        hasher.update(self.data);
        hasher.update(crate::hwrand::rand64().unwrap_or(0).to_be_bytes());
        hasher.update(entropy);
        self.data.copy_from_slice(&hasher.finalize());

        self.nsamples = self.nsamples.saturating_add(u64::from(nsamples));
        self.nsamples_max = self.nsamples_max.max(self.nsamples);
    }

    /// Zeroes the digest and sample count after the pool is mixed into
    /// the generator key. Returns the samples it held.
    pub fn drain(&mut self) -> u64 {
        let nsamples = self.nsamples;
        self.data.zeroize();
        self.nsamples = 0;
        self.ndrains += 1;
        nsamples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_changes_data_and_counts() {
        let mut pool = Pool::new();
        pool.absorb(0, &[0x01; 64], 7);

        assert_ne!(pool.data, [0u8; 32]);
        assert_eq!(pool.nsamples, 7);
        assert_eq!(pool.nsamples_max, 7);
    }

    #[test]
    fn test_absorb_chains_previous_digest() {
        let mut pool = Pool::new();
        pool.absorb(0, &[0x01; 16], 1);
        let first = pool.data;

        pool.absorb(0, &[0x01; 16], 1);
        assert_ne!(pool.data, first);
        assert_eq!(pool.nsamples, 2);
    }

    #[test]
    fn test_drain_resets_and_counts() {
        let mut pool = Pool::new();
        pool.absorb(3, &[0xff; 32], 100);

        let drained = pool.drain();
        assert_eq!(drained, 100);
        assert_eq!(pool.data, [0u8; 32]);
        assert_eq!(pool.nsamples, 0);
        assert_eq!(pool.ndrains, 1);
        assert_eq!(pool.nsamples_max, 100);
    }
}
