//! The process-wide RNG.
//!
//! A mutex-wrapped crypto RNG over the OS entropy source, reseeded every
//! five seconds and at fork boundaries. The runtime's fork hooks call
//! [`ProcessRng::atfork_prepare`] / [`ProcessRng::atfork_parent`] /
//! [`ProcessRng::atfork_child`] so parent and child diverge immediately.

#![allow(unsafe_code)]

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use zeroize::Zeroizing;

use crate::drbg::CtrDrbg;
use crate::entropy::RngSource;
use crate::error::{self, Error};
use crate::rng::{CryptoRng, OsEntropyRng, RandomSource};
use crate::schedule::{monotonic_ns, FlagSchedule, FlagSetter, TimerSchedule, TreeSchedule};

/// Elapsed time beyond which a reseed is requested, i.e. the maximum time
/// a compromised state leads to predictable output.
const RESEED_PERIOD_NS: u64 = 5_000_000_000;

const CACHE_NBYTES: usize = 256;
const MAX_REQUEST_NBYTES: usize = 4096;
const SEED_NBYTES: usize = 32;
const PERSONALIZATION: &[u8] = b"fortuna-rng process";

type ProcessSchedule = TreeSchedule<TimerSchedule, FlagSchedule>;
type Inner = CryptoRng<RngSource<OsEntropyRng>, ProcessSchedule, CtrDrbg>;

/// A lockable process RNG reseeded on a timer and at fork boundaries.
pub struct ProcessRng {
    inner: Mutex<Inner>,
    fork_flag: FlagSetter,
}

impl ProcessRng {
    /// Builds a process RNG seeded from the operating system.
    pub fn new() -> Result<Self, Error> {
        let timer = TimerSchedule::new(monotonic_ns, RESEED_PERIOD_NS);
        let flag = FlagSchedule::new();
        let fork_flag = flag.setter();
        let schedule = TreeSchedule::new(timer, flag);

        let mut os = OsEntropyRng::new();
        let mut seed = Zeroizing::new([0u8; SEED_NBYTES]);
        os.generate(&mut seed[..])?;
        let nonce = monotonic_ns().to_le_bytes();
        let drbg = CtrDrbg::new(&seed[..], &nonce, PERSONALIZATION)?;

        let inner = CryptoRng::new(
            RngSource::new(os),
            schedule,
            drbg,
            MAX_REQUEST_NBYTES,
            SEED_NBYTES,
            CACHE_NBYTES,
        )?;

        Ok(Self {
            inner: Mutex::new(inner),
            fork_flag,
        })
    }

    /// Fills `out` with random bytes.
    pub fn generate(&self, out: &mut [u8]) -> Result<(), Error> {
        self.inner.lock().generate(out)
    }

    /// Mixes caller-provided seed material into the RNG.
    pub fn reseed(&self, seed: &[u8], additional: &[u8]) -> Result<(), Error> {
        self.inner.lock().reseed(seed, additional)
    }

    /// Reseeds performed since construction.
    pub fn reseed_count(&self) -> u64 {
        self.inner.lock().reseed_count()
    }

    /// Pre-fork hook: takes the lock and forces a reseed on the next
    /// generate in either process.
    ///
    /// Must be paired with [`atfork_parent`](Self::atfork_parent) in the
    /// parent and [`atfork_child`](Self::atfork_child) in the child.
    pub fn atfork_prepare(&self) {
        let guard = self.inner.lock();
        self.fork_flag.set();
        // Held across the fork; the matching hooks release it.
        std::mem::forget(guard);
    }

    /// Post-fork hook for the parent: releases the lock taken in prepare.
    pub fn atfork_parent(&self) {
        unsafe { self.inner.force_unlock() };
    }

    /// Post-fork hook for the child: reinitializes the lock.
    ///
    /// The flag raised in prepare survives into the child, so the child's
    /// next generate reseeds from the OS before producing output.
    pub fn atfork_child(&self) {
        unsafe { self.inner.force_unlock() };
    }
}

static PROCESS_RNG: Lazy<ProcessRng> = Lazy::new(|| match ProcessRng::new() {
    Ok(rng) => rng,
    Err(_) => error::abort("process rng initialization failed"),
});

/// The lazily initialized process-wide RNG.
pub fn process_rng() -> &'static ProcessRng {
    &PROCESS_RNG
}

const RAND_ERROR_CODE: core::num::NonZeroU32 =
    match core::num::NonZeroU32::new(rand_core::Error::CUSTOM_START) {
        Some(code) => code,
        None => panic!("custom error range starts above zero"),
    };

impl rand_core::RngCore for &ProcessRng {
    fn next_u32(&mut self) -> u32 {
        rand_core::impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        if self.generate(dest).is_err() {
            error::abort("process rng generate failed");
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.generate(dest)
            .map_err(|_| rand_core::Error::from(RAND_ERROR_CODE))
    }
}

impl rand_core::CryptoRng for &ProcessRng {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_produces_output() {
        let rng = ProcessRng::new().unwrap();
        let mut out = [0u8; 64];
        rng.generate(&mut out).unwrap();
        assert!(out.iter().any(|&byte| byte != 0));
    }

    #[test]
    fn test_fork_flag_forces_reseed() {
        let rng = ProcessRng::new().unwrap();

        let mut out = [0u8; 32];
        rng.generate(&mut out).unwrap();
        assert_eq!(rng.reseed_count(), 0);

        rng.atfork_prepare();
        rng.atfork_child();

        rng.generate(&mut out).unwrap();
        assert_eq!(rng.reseed_count(), 1);
    }

    #[test]
    fn test_parent_resumes_after_fork() {
        let rng = ProcessRng::new().unwrap();

        rng.atfork_prepare();
        rng.atfork_parent();

        let mut out = [0u8; 32];
        rng.generate(&mut out).unwrap();
        assert_eq!(rng.reseed_count(), 1);
    }

    #[test]
    fn test_concurrent_generators_never_collide() {
        let rng = ProcessRng::new().unwrap();
        let outputs = Mutex::new(HashSet::new());

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..64 {
                        let mut out = [0u8; 32];
                        rng.generate(&mut out).unwrap();
                        outputs.lock().insert(out);
                    }
                });
            }
            scope.spawn(|| {
                for round in 0..50u8 {
                    rng.reseed(&[round; 32], &[]).unwrap();
                }
            });
        });

        // Every 32-byte output is distinct across all threads.
        assert_eq!(outputs.lock().len(), 4 * 64);
    }

    #[test]
    fn test_global_is_shared_and_rngcore_compatible() {
        use rand_core::RngCore;

        let mut rng = process_rng();
        let mut out = [0u8; 16];
        rng.fill_bytes(&mut out);

        let value = rng.next_u64();
        let _ = value;

        assert!(std::ptr::eq(process_rng(), process_rng()));
    }
}
