//! Entropy sources: objects that supply seed material.
//!
//! A source either hands out fresh seed bytes on demand or accumulates
//! samples into a pool until a full seed's worth has been gathered.
//! Combinators cover ordered fallback ([`ListSource`]) and cross-component
//! sharing ([`LockSource`]).

mod digest;
mod list;
mod lock;
mod rng;

pub use self::digest::DigestPool;
pub use self::rng::RngSource;
pub use list::ListSource;
pub use lock::LockSource;

use crate::error::Error;

/// Supplies seed material to a consumer such as
/// [`CryptoRng`](crate::CryptoRng).
///
/// Thread safety is the implementation's responsibility; wrap a source in
/// [`LockSource`] to share it.
pub trait EntropySource: Send {
    /// Fills `out` with seed material.
    ///
    /// Returns [`Error::OutOfEntropy`] when the source has nothing to give
    /// right now; implementations may block internally.
    fn get_seed(&mut self, out: &mut [u8]) -> Result<(), Error>;

    /// Records `data` as contributing `nsamples` worth of entropy.
    ///
    /// Returns whether a full seed's worth of material has now been
    /// gathered. Non-accumulating sources ignore the input and report
    /// `false`.
    fn add_entropy(&mut self, nsamples: u32, data: &[u8]) -> Result<bool, Error> {
        let _ = (nsamples, data);
        Ok(false)
    }

    /// Clears any internal pool after an upstream failure.
    fn reset(&mut self) {}
}
