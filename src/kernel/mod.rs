//! The kernel-profile RNG: a Fortuna-backed crypto RNG with seed
//! persistence.
//!
//! The Fortuna core doubles as the in-kernel entropy collector (refreshed
//! from host interrupt samples) and as the seed supply for the DRBG
//! layer. Until the very first seed's worth of samples has been gathered,
//! interrupt entropy is diverted into a SHA-512 pool; when that pool
//! fills it raises the reseed flag, so the next generate pulls from it
//! before any output flows.

pub mod config;
pub mod seed;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use sha2::Sha512;

use crate::drbg::CtrDrbg;
use crate::entropy::{DigestPool, EntropySource, ListSource, LockSource, RngSource};
use crate::error::{self, Error};
use crate::fortuna::{Diagnostics as FortunaDiagnostics, EntropyCallback, EntropyRead, Fortuna};
use crate::rng::CryptoRng;
use crate::schedule::{FlagSchedule, FlagSetter};

/// Seed bytes drawn from the entropy path per reseed (the SHA-512 output
/// size).
const SEED_NBYTES: usize = 64;

const CACHE_NBYTES: usize = 256;
const MAX_REQUEST_NBYTES: usize = 4096;

/// First-seed accumulation threshold, in samples.
///
/// One sample is credited per input byte, at an assumed bit of entropy
/// each; the threshold matches the SHA-512 output in bits.
const FIRST_SEED_NSAMPLES: u64 = 512;

/// Domain-separation label for DRBG instantiation.
const LABEL_INIT: [u8; 8] = [0x78, 0x6e, 0x75, 0x70, 0x72, 0x6e, 0x67, 0x01];

type FirstSeedPool = LockSource<DigestPool<Sha512>>;

/// Diverts early interrupt samples into the first-seed pool until it
/// fills.
struct FirstSeedInterceptor<E> {
    inner: E,
    pool: FirstSeedPool,
    flag: FlagSetter,
    done: bool,
}

impl<E: EntropyCallback> EntropyCallback for FirstSeedInterceptor<E> {
    fn read_entropy(&mut self, buf: &mut [u8]) -> EntropyRead {
        let read = self.inner.read_entropy(buf);

        let (len, nsamples) = match read {
            EntropyRead::Fault => {
                self.pool.reset();
                self.done = false;
                return read;
            }
            EntropyRead::Empty => return read,
            EntropyRead::Samples { len, nsamples } => (len.min(buf.len()), nsamples),
        };

        if self.done {
            return read;
        }

        match self.pool.add_entropy(nsamples, &buf[..len]) {
            Ok(seed_ready) => {
                if seed_ready {
                    self.done = true;
                    self.flag.set();
                    tracing::info!("first entropy seed gathered");
                }
            }
            Err(_) => error::abort("first-seed pool rejected entropy"),
        }

        buf[..len].fill(0);
        EntropyRead::Empty
    }
}

/// The kernel RNG: the Fortuna core underneath the crypto RNG layer.
pub struct KernelRng<E: EntropyCallback> {
    fortuna: Arc<Fortuna<FirstSeedInterceptor<E>>>,
    inner: Mutex<CryptoRng<ListSource, FlagSchedule, CtrDrbg>>,
    reseed_flag: FlagSetter,
    user_reseeds: AtomicU64,
}

impl<E: EntropyCallback + 'static> KernelRng<E> {
    /// Builds the kernel RNG from a boot seed, a nonce, and the host's
    /// interrupt-sample callback.
    ///
    /// The boot seed typically comes from the persisted seed file (see
    /// [`seed`]); a missing file is survivable because the DRBG reseeds
    /// from gathered interrupt entropy as soon as it is available.
    pub fn new(boot_seed: &[u8], nonce: &[u8], callback: E) -> Result<Self, Error> {
        let pool = LockSource::new(DigestPool::<Sha512>::new(FIRST_SEED_NSAMPLES));
        let schedule = FlagSchedule::new();
        let flag = schedule.setter();
        let reseed_flag = schedule.setter();

        let fortuna = Arc::new(Fortuna::new(FirstSeedInterceptor {
            inner: callback,
            pool: pool.clone(),
            flag,
            done: false,
        }));

        let entropy = ListSource::new(vec![
            Box::new(pool),
            Box::new(RngSource::new(Arc::clone(&fortuna))),
        ]);

        let drbg = CtrDrbg::new(boot_seed, nonce, &LABEL_INIT)?;
        let inner = CryptoRng::new(
            entropy,
            schedule,
            drbg,
            MAX_REQUEST_NBYTES,
            SEED_NBYTES,
            CACHE_NBYTES,
        )?;

        Ok(Self {
            fortuna,
            inner: Mutex::new(inner),
            reseed_flag,
            user_reseeds: AtomicU64::new(0),
        })
    }

    /// Fills `out` with random bytes.
    ///
    /// Failures here are fatal: the kernel has no fallback generator.
    pub fn generate(&self, out: &mut [u8]) {
        if self.inner.lock().generate(out).is_err() {
            error::abort("kernel rng generate failed");
        }
    }

    /// Injects caller-supplied seed material (a user reseed).
    pub fn reseed(&self, seed: &[u8], additional: &[u8]) {
        if self.inner.lock().reseed(seed, additional).is_err() {
            error::abort("kernel rng reseed failed");
        }
        self.user_reseeds.fetch_add(1, Ordering::Relaxed);
    }

    /// Opportunistic entropy-collection tick; safe from interrupt-like
    /// contexts. Returns `true` iff the Fortuna core completed a reseed.
    pub fn refresh(&self) -> bool {
        self.fortuna.refresh()
    }

    /// Requests a mandatory DRBG reseed before the next generate.
    pub fn request_reseed(&self) {
        self.reseed_flag.set();
    }

    /// Whether the Fortuna core has absorbed a full seed.
    pub fn is_seeded(&self) -> bool {
        self.fortuna.is_seeded()
    }

    /// Snapshot of the generator's observability counters.
    pub fn diagnostics(&self) -> KernelDiagnostics {
        KernelDiagnostics {
            user_reseed_count: self.user_reseeds.load(Ordering::Relaxed),
            fortuna: self.fortuna.diagnostics(),
        }
    }
}

/// Kernel RNG counters: the Fortuna core's plus the user-reseed count.
#[derive(Debug, Clone, Copy)]
pub struct KernelDiagnostics {
    /// Caller-injected reseeds.
    pub user_reseed_count: u64,
    /// The Fortuna core's counters.
    pub fortuna: FortunaDiagnostics,
}
