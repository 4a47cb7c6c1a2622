//! The Fortuna entropy accumulator and generator.
//!
//! Thirty-two hash pools absorb entropy samples round-robin. Every time
//! the cursor returns to pool 0, a scheduled reseed mixes a prefix of the
//! pools into the AES-256-CTR generator key: pool 0 contributes to every
//! reseed, pool 1 to every other, pool k to every 2^k-th. The staggering
//! guarantees recovery from state compromise even against an adversary
//! who controls a fraction of the entropy inputs.
//!
//! [`Fortuna::refresh`] is the collection tick: it uses a non-blocking
//! lock acquisition so interrupt-like contexts can call it freely.
//! [`Fortuna::generate`] produces output only after a scheduled reseed
//! has absorbed a minimum number of samples.

mod pool;

pub use pool::NPOOLS;

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{self, Error};
use crate::rng::RandomSource;
use pool::Pool;

/// Largest single generate request, in bytes.
///
/// Exceeding it is a fatal caller error, not a recoverable one.
pub const GENERATE_MAX_NBYTES: usize = 512;

/// Cumulative samples a scheduled reseed must absorb before output flows.
const MIN_SEED_NSAMPLES: u64 = 1024;

/// Capacity handed to the entropy callback on each refresh.
const REFRESH_ENTROPY_NBYTES: usize = 64;

/// Domain-separation label for scheduled reseeds.
const LABEL_SCHEDRESEED: [u8; 8] = [0x78, 0x6e, 0x75, 0x70, 0x72, 0x6e, 0x67, 0x02];

type Aes256Ctr = ctr::Ctr64BE<Aes256>;

/// Result of one entropy-callback invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntropyRead {
    /// `len` bytes were written with an estimated quality of `nsamples`.
    ///
    /// The sample count is an opaque quality metric, not a byte count.
    Samples {
        /// Bytes written into the buffer.
        len: usize,
        /// Estimated quality of the delivered bytes.
        nsamples: u32,
    },
    /// Nothing gathered this call; try again later.
    Empty,
    /// The entropy source failed; the accumulator must reset.
    Fault,
}

/// Supplies raw entropy samples to the accumulator.
///
/// Called with the Fortuna lock held: implementations must not call back
/// into the generator that owns them.
pub trait EntropyCallback: Send {
    /// Fills up to `buf.len()` bytes and reports the outcome.
    fn read_entropy(&mut self, buf: &mut [u8]) -> EntropyRead;
}

impl<F> EntropyCallback for F
where
    F: FnMut(&mut [u8]) -> EntropyRead + Send,
{
    fn read_entropy(&mut self, buf: &mut [u8]) -> EntropyRead {
        self(buf)
    }
}

struct State<E> {
    pools: [Pool; NPOOLS],
    reseed_sched: u64,
    pool_idx: u32,
    key: [u8; 32],
    ctr: [u8; 16],
    seeded: bool,
    nreseeds: u64,
    schedreseed_nsamples_max: u64,
    addentropy_nsamples_max: u64,
    callback: E,
}

/// The Fortuna PRNG: a 32-pool entropy accumulator over an AES-256-CTR
/// generator.
pub struct Fortuna<E> {
    state: Mutex<State<E>>,
}

impl<E: EntropyCallback> Fortuna<E> {
    /// Creates an unseeded generator that pulls entropy from `callback`.
    pub fn new(callback: E) -> Self {
        Self {
            state: Mutex::new(State {
                pools: std::array::from_fn(|_| Pool::new()),
                reseed_sched: 0,
                pool_idx: 0,
                key: [0; 32],
                ctr: [0; 16],
                seeded: false,
                nreseeds: 0,
                schedreseed_nsamples_max: 0,
                addentropy_nsamples_max: 0,
                callback,
            }),
        }
    }

    /// Pulls entropy and runs one step of the pool schedule.
    ///
    /// Non-blocking: if the lock is contended the call returns `false`
    /// immediately, which makes it safe from interrupt-like contexts.
    /// Returns `true` iff a scheduled reseed ran in this call and the
    /// generator is seeded.
    pub fn refresh(&self) -> bool {
        let Some(mut state) = self.state.try_lock() else {
            return false;
        };

        let mut entropy = Zeroizing::new([0u8; REFRESH_ENTROPY_NBYTES]);
        match state.callback.read_entropy(&mut entropy[..]) {
            EntropyRead::Samples { len, nsamples } if nsamples > 0 => {
                let len = len.min(REFRESH_ENTROPY_NBYTES);
                let (pool_in, pool_out) = state.schedule();
                state.absorb(pool_in, &entropy[..len], nsamples);
                state.sched_reseed(pool_out)
            }
            EntropyRead::Samples { .. } | EntropyRead::Empty => false,
            EntropyRead::Fault => {
                state.reset();
                false
            }
        }
    }

    /// Fills `out` with generator output.
    ///
    /// Performs no I/O and never consults the entropy callback; the only
    /// blocking is the internal lock. Requests larger than
    /// [`GENERATE_MAX_NBYTES`] abort via the installed handler. Fails
    /// with [`Error::NotSeeded`] (and zeroes `out`) until a scheduled
    /// reseed has absorbed enough samples.
    pub fn generate(&self, out: &mut [u8]) -> Result<(), Error> {
        if out.len() > GENERATE_MAX_NBYTES {
            error::abort("fortuna generate: maximum request size exceeded");
        }

        let mut state = self.state.lock();
        if !state.seeded {
            out.fill(0);
            return Err(Error::NotSeeded);
        }

        let mut cipher = Aes256Ctr::new(&state.key.into(), &state.ctr.into());

        // Key rotation comes first: output blocks follow the two
        // rotation blocks in the keystream.
        let mut new_key = Zeroizing::new([0u8; 32]);
        cipher.apply_keystream(&mut new_key[..]);
        state.key.copy_from_slice(&new_key[..]);

        out.fill(0);
        cipher.apply_keystream(out);

        let mut counter = [0u8; 8];
        counter.copy_from_slice(&state.ctr[8..]);
        let next = u64::from_be_bytes(counter).wrapping_add(1);
        state.ctr[8..].copy_from_slice(&next.to_be_bytes());

        Ok(())
    }

    /// Whether a scheduled reseed has absorbed a full seed.
    pub fn is_seeded(&self) -> bool {
        self.state.lock().seeded
    }

    /// Snapshot of the observability counters.
    pub fn diagnostics(&self) -> Diagnostics {
        let state = self.state.lock();
        let mut pools = [PoolDiagnostics::default(); NPOOLS];
        for (diag, pool) in pools.iter_mut().zip(state.pools.iter()) {
            *diag = PoolDiagnostics {
                nsamples: pool.nsamples,
                ndrains: pool.ndrains,
                nsamples_max: pool.nsamples_max,
            };
        }
        Diagnostics {
            nreseeds: state.nreseeds,
            schedreseed_nsamples_max: state.schedreseed_nsamples_max,
            addentropy_nsamples_max: state.addentropy_nsamples_max,
            pools,
        }
    }
}

#[cfg(test)]
impl<E: EntropyCallback> Fortuna<E> {
    fn pool_data(&self, idx: usize) -> [u8; 32] {
        self.state.lock().pools[idx].data
    }

    fn pool_cursor(&self) -> u32 {
        self.state.lock().pool_idx
    }

    fn reseed_sched(&self) -> u64 {
        self.state.lock().reseed_sched
    }

    fn key(&self) -> [u8; 32] {
        self.state.lock().key
    }

    fn ctr(&self) -> [u8; 16] {
        self.state.lock().ctr
    }
}

impl<E> State<E> {
    /// Advances the round-robin cursor; on wrap to pool 0, picks the
    /// reseed prefix from the low bit of the schedule counter.
    fn schedule(&mut self) -> (u32, Option<usize>) {
        let pool_in = self.pool_idx;
        self.pool_idx = (self.pool_idx + 1) % NPOOLS as u32;

        let mut pool_out = None;
        if pool_in == 0 {
            self.reseed_sched += 1;
            let idx = self.reseed_sched.trailing_zeros() as usize;
            pool_out = Some(idx.min(NPOOLS - 1));
        }
        (pool_in, pool_out)
    }

    fn absorb(&mut self, pool_idx: u32, entropy: &[u8], nsamples: u32) {
        self.pools[pool_idx as usize].absorb(pool_idx, entropy, nsamples);
        self.addentropy_nsamples_max = self.addentropy_nsamples_max.max(u64::from(nsamples));
    }

    /// Mixes pools `[0..=last]` into the generator key and drains them.
    fn sched_reseed(&mut self, pool_out: Option<usize>) -> bool {
        let Some(last) = pool_out else {
            return false;
        };

        let mut hasher = Sha256::new();
        hasher.update(LABEL_SCHEDRESEED);
        hasher.update(self.reseed_sched.to_be_bytes());
        hasher.update(self.key);

        let mut nsamples = 0u64;
        for pool in &mut self.pools[..=last] {
            hasher.update(pool.data);
            nsamples += pool.drain();
        }
        self.key.copy_from_slice(&hasher.finalize());

        if nsamples >= MIN_SEED_NSAMPLES && !self.seeded {
            self.seeded = true;
            tracing::info!(nsamples, "fortuna seeded");
        }

        self.nreseeds += 1;
        self.schedreseed_nsamples_max = self.schedreseed_nsamples_max.max(nsamples);

        self.seeded
    }

    fn reset(&mut self) {
        tracing::warn!("entropy source failure; resetting accumulator");

        for pool in &mut self.pools {
            pool.zeroize();
        }
        self.reseed_sched = 0;
        self.pool_idx = 0;
        self.seeded = false;
        self.nreseeds = 0;
        self.schedreseed_nsamples_max = 0;
        self.addentropy_nsamples_max = 0;
    }
}

impl<E> Drop for State<E> {
    fn drop(&mut self) {
        self.key.zeroize();
        self.ctr.zeroize();
        for pool in &mut self.pools {
            pool.zeroize();
        }
    }
}

impl<E: EntropyCallback> RandomSource for Fortuna<E> {
    fn generate(&mut self, out: &mut [u8]) -> Result<(), Error> {
        Fortuna::generate(self, out)
    }
}

impl<E: EntropyCallback> RandomSource for std::sync::Arc<Fortuna<E>> {
    fn generate(&mut self, out: &mut [u8]) -> Result<(), Error> {
        Fortuna::generate(self, out)
    }
}

/// Aggregate and per-pool observability counters.
///
/// Monotonic except across a failure reset; not correctness-critical.
#[derive(Debug, Clone, Copy, Default)]
pub struct Diagnostics {
    /// Scheduled reseeds performed.
    pub nreseeds: u64,
    /// Largest sample total absorbed by a single scheduled reseed.
    pub schedreseed_nsamples_max: u64,
    /// Largest sample count delivered by a single callback read.
    pub addentropy_nsamples_max: u64,
    /// Per-pool counters.
    pub pools: [PoolDiagnostics; NPOOLS],
}

/// Counters for one accumulation pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolDiagnostics {
    /// Samples currently pending in the pool.
    pub nsamples: u64,
    /// Times the pool has been drained into the key.
    pub ndrains: u64,
    /// High-water mark of pending samples.
    pub nsamples_max: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    /// Callback scripted through a shared cell: positive values are a
    /// sample count, zero is an empty read, negative is a fault.
    fn scripted(cell: Arc<AtomicI64>) -> impl FnMut(&mut [u8]) -> EntropyRead + Send {
        move |buf: &mut [u8]| {
            buf.fill(0x01);
            match cell.load(Ordering::Relaxed) {
                n if n > 0 => EntropyRead::Samples {
                    len: buf.len(),
                    nsamples: n as u32,
                },
                0 => EntropyRead::Empty,
                _ => EntropyRead::Fault,
            }
        }
    }

    #[test]
    fn test_generate_fails_unseeded() {
        let fortuna = Fortuna::new(|_buf: &mut [u8]| EntropyRead::Empty);

        let mut out = [0xffu8; 16];
        assert_eq!(fortuna.generate(&mut out), Err(Error::NotSeeded));
        assert_eq!(out, [0u8; 16]);
    }

    #[test]
    fn test_empty_reads_do_not_advance_schedule() {
        let fortuna = Fortuna::new(|_buf: &mut [u8]| EntropyRead::Empty);

        for _ in 0..10 {
            assert!(!fortuna.refresh());
        }
        assert_eq!(fortuna.pool_cursor(), 0);
        assert_eq!(fortuna.reseed_sched(), 0);
    }

    #[test]
    fn test_minimum_reseed_seeds_generator() {
        let script = Arc::new(AtomicI64::new(1024));
        let fortuna = Fortuna::new(scripted(Arc::clone(&script)));

        // First refresh hits pool 0 and triggers a scheduled reseed
        // absorbing the full 1024 samples.
        assert!(fortuna.refresh());
        assert!(fortuna.is_seeded());
        script.store(0, Ordering::Relaxed);

        let mut out = [0u8; 32];
        assert_eq!(fortuna.generate(&mut out), Ok(()));
        assert_ne!(out, [0u8; 32]);
    }

    #[test]
    fn test_pool_cursor_is_round_robin() {
        let script = Arc::new(AtomicI64::new(1));
        let fortuna = Fortuna::new(scripted(script));

        for k in 1..=100u32 {
            fortuna.refresh();
            assert_eq!(fortuna.pool_cursor(), k % 32);
        }
    }

    #[test]
    fn test_scheduled_reseed_drains_prefix() {
        let script = Arc::new(AtomicI64::new(1));
        let fortuna = Fortuna::new(scripted(script));

        // Refresh 1 absorbs into pool 0 and immediately drains it.
        fortuna.refresh();
        assert_eq!(fortuna.reseed_sched(), 1);
        assert_eq!(fortuna.pool_data(0), [0u8; 32]);
        assert_eq!(fortuna.diagnostics().pools[0].ndrains, 1);

        // Refreshes 2..=32 fill pools 1..=31 and leave them pending.
        for _ in 1..32 {
            fortuna.refresh();
        }
        assert_ne!(fortuna.pool_data(1), [0u8; 32]);

        // Refresh 33 wraps to pool 0; the schedule counter becomes 2, so
        // pools 0 and 1 drain while pool 2 is untouched.
        fortuna.refresh();
        assert_eq!(fortuna.reseed_sched(), 2);
        assert_eq!(fortuna.pool_data(0), [0u8; 32]);
        assert_eq!(fortuna.pool_data(1), [0u8; 32]);
        assert_ne!(fortuna.pool_data(2), [0u8; 32]);

        let diag = fortuna.diagnostics();
        assert_eq!(diag.pools[1].ndrains, 1);
        assert_eq!(diag.pools[2].ndrains, 0);
    }

    #[test]
    fn test_entropy_failure_resets_everything() {
        let script = Arc::new(AtomicI64::new(1024));
        let fortuna = Fortuna::new(scripted(Arc::clone(&script)));

        assert!(fortuna.refresh());
        assert!(fortuna.is_seeded());

        script.store(-1, Ordering::Relaxed);
        assert!(!fortuna.refresh());

        assert!(!fortuna.is_seeded());
        assert_eq!(fortuna.reseed_sched(), 0);
        assert_eq!(fortuna.pool_cursor(), 0);
        for idx in 0..NPOOLS {
            assert_eq!(fortuna.pool_data(idx), [0u8; 32]);
            assert_eq!(fortuna.diagnostics().pools[idx].nsamples, 0);
        }

        let mut out = [0u8; 16];
        assert_eq!(fortuna.generate(&mut out), Err(Error::NotSeeded));
    }

    #[test]
    fn test_generate_matches_ctr_construction() {
        let script = Arc::new(AtomicI64::new(1024));
        let fortuna = Fortuna::new(scripted(script));
        assert!(fortuna.refresh());

        let key = fortuna.key();
        let ctr = fortuna.ctr();

        let mut reference = Aes256Ctr::new(&key.into(), &ctr.into());
        let mut rotated_key = [0u8; 32];
        reference.apply_keystream(&mut rotated_key);
        let mut expected = [0u8; 48];
        reference.apply_keystream(&mut expected);

        let mut out = [0u8; 48];
        fortuna.generate(&mut out).unwrap();

        assert_eq!(out, expected);
        assert_eq!(fortuna.key(), rotated_key);

        let mut expected_ctr = ctr;
        let mut counter = [0u8; 8];
        counter.copy_from_slice(&expected_ctr[8..]);
        let next = u64::from_be_bytes(counter).wrapping_add(1);
        expected_ctr[8..].copy_from_slice(&next.to_be_bytes());
        assert_eq!(fortuna.ctr(), expected_ctr);
    }

    #[test]
    fn test_successive_outputs_differ() {
        let script = Arc::new(AtomicI64::new(1024));
        let fortuna = Fortuna::new(scripted(script));
        assert!(fortuna.refresh());

        let mut first = [0u8; 32];
        let mut second = [0u8; 32];
        fortuna.generate(&mut first).unwrap();
        fortuna.generate(&mut second).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_diagnostics_track_maxima() {
        let script = Arc::new(AtomicI64::new(1024));
        let fortuna = Fortuna::new(scripted(Arc::clone(&script)));
        fortuna.refresh();

        let diag = fortuna.diagnostics();
        assert_eq!(diag.nreseeds, 1);
        assert_eq!(diag.schedreseed_nsamples_max, 1024);
        assert_eq!(diag.addentropy_nsamples_max, 1024);
    }
}
