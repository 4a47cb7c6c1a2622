//! Byte generators and uniform sampling.

mod crypto;
mod os;

pub use crypto::{CryptoRng, SEED_MAX_NBYTES};
pub use os::OsEntropyRng;

use crate::error::Error;

/// A fallible generator of random bytes.
pub trait RandomSource: Send {
    /// Fills `out` with random bytes.
    fn generate(&mut self, out: &mut [u8]) -> Result<(), Error>;

    /// Returns a uniformly distributed value in `[0, bound)`.
    ///
    /// Rejection-sampled so every value is equally likely; fails with
    /// [`Error::Parameter`] when `bound` is zero.
    fn uniform(&mut self, bound: u64) -> Result<u64, Error> {
        if bound == 0 {
            return Err(Error::Parameter);
        }
        if bound == 1 {
            return Ok(0);
        }

        let width = 64 - (bound - 1).leading_zeros();
        let mask = if width == 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        };

        loop {
            let mut bytes = [0u8; 8];
            self.generate(&mut bytes)?;
            let value = u64::from_le_bytes(bytes) & mask;
            if value < bound {
                return Ok(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand_chacha::rand_core::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    pub(crate) struct TestSource(pub ChaCha20Rng);

    impl TestSource {
        pub(crate) fn seeded(seed: u8) -> Self {
            Self(ChaCha20Rng::from_seed([seed; 32]))
        }
    }

    impl RandomSource for TestSource {
        fn generate(&mut self, out: &mut [u8]) -> Result<(), Error> {
            self.0.fill_bytes(out);
            Ok(())
        }
    }

    fn chisq(cells: &[u64]) -> f64 {
        let total: u64 = cells.iter().sum();
        let expected = total as f64 / cells.len() as f64;
        cells
            .iter()
            .map(|&observed| {
                let delta = observed as f64 - expected;
                delta * delta / expected
            })
            .sum()
    }

    #[test]
    fn test_uniform_rejects_zero_bound() {
        let mut rng = TestSource::seeded(1);
        assert_eq!(rng.uniform(0), Err(Error::Parameter));
    }

    #[test]
    fn test_uniform_edge_bounds() {
        let mut rng = TestSource::seeded(2);

        assert_eq!(rng.uniform(1), Ok(0));

        let value = rng.uniform(u64::MAX).unwrap();
        assert!(value < u64::MAX);
    }

    #[test]
    fn test_uniform_distribution_sanity() {
        // A very weak statistical check designed to catch catastrophic
        // failures only. qchisq(1 - 2^-32, df=2) = 44.36142: under the
        // null hypothesis the statistic exceeds that bound with
        // probability 2^-32.
        let mut rng = TestSource::seeded(3);
        let mut cells = [0u64; 3];

        for _ in 0..(1 << 20) {
            let value = rng.uniform(3).unwrap();
            assert!(value < 3);
            cells[value as usize] += 1;
        }

        assert!(chisq(&cells) < 44.36142);
    }

    proptest! {
        #[test]
        fn test_uniform_stays_in_bound(bound in 1u64.., seed: u8) {
            let mut rng = TestSource::seeded(seed);
            let value = rng.uniform(bound).unwrap();
            prop_assert!(value < bound);
        }
    }
}
