//! Error taxonomy and the fatal-abort hook.
//!
//! Every fallible operation in this crate returns [`Error`]. The variants
//! map to stable integer codes (see [`Error::code`]) so embedders that
//! surface errors across logging or FFI boundaries observe fixed values.
//! Success is the absence of an error and carries the code [`OK`].

use once_cell::sync::OnceCell;
use thiserror::Error;

/// Stable integer code for success.
pub const OK: i32 = 0;

/// Errors reported by the generators, schedules, and entropy sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// Output was requested before the generator gathered a full seed, or
    /// a mandatory reseed could not be satisfied.
    #[error("generator is not seeded")]
    NotSeeded,
    /// The entropy source has nothing to give right now. Advisory; callers
    /// may retry later.
    #[error("out of entropy")]
    OutOfEntropy,
    /// Invalid parameters at initialization time.
    #[error("invalid configuration")]
    Config,
    /// An internal invariant was violated.
    #[error("internal error")]
    Internal,
    /// A caller passed an invalid argument to a public call.
    #[error("invalid parameter")]
    Parameter,
    /// The DRBG refuses to generate until it is reseeded.
    #[error("reseed required")]
    NeedsReseed,
}

impl Error {
    /// Returns the stable integer code for this error.
    ///
    /// Codes are part of the public API and do not change between
    /// releases: success is [`OK`] (zero), errors are small negative
    /// integers.
    pub const fn code(self) -> i32 {
        match self {
            Error::NotSeeded => -10,
            Error::OutOfEntropy => -11,
            Error::Config => -12,
            Error::Internal => -13,
            Error::Parameter => -14,
            Error::NeedsReseed => -15,
        }
    }
}

/// Handler invoked on fatal invariant violations.
pub type AbortHandler = fn(&str) -> !;

static ABORT_HANDLER: OnceCell<AbortHandler> = OnceCell::new();

/// Installs the handler used when a fatal invariant is violated.
///
/// Fatal violations (an oversized request to the Fortuna generator, an OS
/// entropy syscall failure) are never returned as errors; they end the
/// process through this hook. May be installed at most once; a second call
/// fails with [`Error::Config`].
pub fn set_abort_handler(handler: AbortHandler) -> Result<(), Error> {
    ABORT_HANDLER.set(handler).map_err(|_| Error::Config)
}

/// Ends the process through the installed abort handler.
pub(crate) fn abort(reason: &str) -> ! {
    if let Some(handler) = ABORT_HANDLER.get() {
        handler(reason);
    }
    tracing::error!(reason, "fatal invariant violation");
    std::process::abort();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(OK, 0);
        assert_eq!(Error::NotSeeded.code(), -10);
        assert_eq!(Error::OutOfEntropy.code(), -11);
        assert_eq!(Error::Config.code(), -12);
        assert_eq!(Error::Internal.code(), -13);
        assert_eq!(Error::Parameter.code(), -14);
        assert_eq!(Error::NeedsReseed.code(), -15);
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(Error::NotSeeded.to_string(), "generator is not seeded");
        assert_eq!(Error::OutOfEntropy.to_string(), "out of entropy");
    }
}
