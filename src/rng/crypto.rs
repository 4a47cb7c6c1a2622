//! The cryptographic RNG: a DRBG driven by an entropy source and a
//! reseed schedule.

use zeroize::{Zeroize, Zeroizing};

use super::RandomSource;
use crate::drbg::Drbg;
use crate::entropy::EntropySource;
use crate::error::Error;
use crate::schedule::{Action, ReseedSchedule};

/// Upper bound on the per-reseed seed size, in bytes.
pub const SEED_MAX_NBYTES: usize = 64;

/// Consumed-from-front output buffer amortizing DRBG call overhead.
struct OutputCache {
    buf: Vec<u8>,
    pos: usize,
}

impl OutputCache {
    fn new(nbytes: usize) -> Self {
        Self {
            buf: vec![0; nbytes],
            pos: nbytes,
        }
    }

    fn available(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn invalidate(&mut self) {
        self.buf.zeroize();
        self.pos = self.buf.len();
    }
}

impl Drop for OutputCache {
    fn drop(&mut self) {
        self.buf.zeroize();
    }
}

/// A DRBG consumer that reseeds according to a schedule.
///
/// On every generate the schedule is consulted; `TryReseed` pulls fresh
/// seed material opportunistically, `MustReseed` refuses output until a
/// reseed succeeds. The component itself is single-threaded; wrappers
/// that share it across threads own the lock (see
/// [`ProcessRng`](crate::ProcessRng)).
pub struct CryptoRng<E, S, D> {
    entropy: E,
    schedule: S,
    drbg: D,
    max_request_nbytes: usize,
    seed_nbytes: usize,
    cache: Option<OutputCache>,
    nreseeds: u64,
}

impl<E, S, D> CryptoRng<E, S, D>
where
    E: EntropySource,
    S: ReseedSchedule,
    D: Drbg,
{
    /// Builds the RNG over an instantiated DRBG.
    ///
    /// `seed_nbytes` is the amount drawn from the entropy source on each
    /// reseed and must not exceed [`SEED_MAX_NBYTES`]; `cache_nbytes` of
    /// zero disables the output cache.
    pub fn new(
        entropy: E,
        schedule: S,
        drbg: D,
        max_request_nbytes: usize,
        seed_nbytes: usize,
        cache_nbytes: usize,
    ) -> Result<Self, Error> {
        if seed_nbytes == 0 || seed_nbytes > SEED_MAX_NBYTES {
            return Err(Error::Config);
        }
        if max_request_nbytes == 0 {
            return Err(Error::Config);
        }

        Ok(Self {
            entropy,
            schedule,
            drbg,
            max_request_nbytes,
            seed_nbytes,
            cache: (cache_nbytes > 0).then(|| OutputCache::new(cache_nbytes)),
            nreseeds: 0,
        })
    }

    /// Fills `out`, reseeding first if the schedule calls for it.
    ///
    /// The output buffer is zeroed on any error return.
    pub fn generate(&mut self, out: &mut [u8]) -> Result<(), Error> {
        let result = self.generate_inner(out);
        if result.is_err() {
            out.fill(0);
        }
        result
    }

    /// Mixes caller-provided seed material into the DRBG immediately.
    ///
    /// Invalidates the cache and notifies the schedule, like any other
    /// reseed.
    pub fn reseed(&mut self, seed: &[u8], additional: &[u8]) -> Result<(), Error> {
        self.drbg.reseed(seed, additional)?;
        self.finish_reseed();
        Ok(())
    }

    /// Reseeds performed since construction.
    pub fn reseed_count(&self) -> u64 {
        self.nreseeds
    }

    fn generate_inner(&mut self, out: &mut [u8]) -> Result<(), Error> {
        match self.schedule.read() {
            Action::Continue => {}
            Action::TryReseed => self.reseed_from_entropy(false)?,
            Action::MustReseed => self.reseed_from_entropy(true)?,
        }

        if let Some(cache) = self.cache.take() {
            if out.len() <= cache.buf.len() {
                return self.serve_cached(cache, out);
            }
            self.cache = Some(cache);
        }
        self.generate_chunks(out)
    }

    fn serve_cached(&mut self, mut cache: OutputCache, out: &mut [u8]) -> Result<(), Error> {
        if cache.available() < out.len() {
            match self.generate_chunks(&mut cache.buf) {
                Ok(()) => cache.pos = 0,
                Err(err) => {
                    cache.invalidate();
                    self.cache = Some(cache);
                    return Err(err);
                }
            }
        }

        let end = cache.pos + out.len();
        out.copy_from_slice(&cache.buf[cache.pos..end]);
        // Consumed bytes never survive in the cache.
        cache.buf[cache.pos..end].zeroize();
        cache.pos = end;

        self.cache = Some(cache);
        Ok(())
    }

    fn generate_chunks(&mut self, out: &mut [u8]) -> Result<(), Error> {
        let chunk_nbytes = self.max_request_nbytes.min(self.drbg.max_request_nbytes());
        for chunk in out.chunks_mut(chunk_nbytes) {
            match self.drbg.generate(chunk, &[]) {
                Ok(()) => {}
                Err(Error::NeedsReseed) => {
                    // One retry after a mandatory reseed; repeated
                    // failures propagate.
                    self.reseed_from_entropy(true)?;
                    self.drbg.generate(chunk, &[])?;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn reseed_from_entropy(&mut self, required: bool) -> Result<(), Error> {
        let mut seed = Zeroizing::new([0u8; SEED_MAX_NBYTES]);
        let seed = &mut seed[..self.seed_nbytes];

        match self.entropy.get_seed(seed) {
            Ok(()) => {
                self.drbg.reseed(seed, &[])?;
                self.finish_reseed();
                Ok(())
            }
            Err(Error::OutOfEntropy) if !required => Ok(()),
            Err(Error::OutOfEntropy) => Err(Error::NotSeeded),
            Err(err) => Err(err),
        }
    }

    fn finish_reseed(&mut self) {
        if let Some(cache) = &mut self.cache {
            cache.invalidate();
        }
        self.schedule.notify_reseed();
        self.nreseeds += 1;
        tracing::debug!(nreseeds = self.nreseeds, "rng reseeded");
    }
}

impl<E, S, D> RandomSource for CryptoRng<E, S, D>
where
    E: EntropySource,
    S: ReseedSchedule,
    D: Drbg,
{
    fn generate(&mut self, out: &mut [u8]) -> Result<(), Error> {
        CryptoRng::generate(self, out)
    }
}
