//! The operating system's entropy interface.

use super::RandomSource;
use crate::error::{self, Error};

/// Bytes requested from the OS per syscall.
const CHUNK_NBYTES: usize = 256;

/// Draws randomness directly from the operating system.
///
/// Requests are chunked to 256 bytes per syscall. A syscall failure is
/// not a recoverable condition and aborts through the installed handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropyRng;

impl OsEntropyRng {
    /// Creates the OS-backed generator.
    pub const fn new() -> Self {
        Self
    }
}

impl RandomSource for OsEntropyRng {
    fn generate(&mut self, out: &mut [u8]) -> Result<(), Error> {
        for chunk in out.chunks_mut(CHUNK_NBYTES) {
            if getrandom::getrandom(chunk).is_err() {
                error::abort("getentropy failed");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_large_requests() {
        let mut rng = OsEntropyRng::new();
        let mut out = vec![0u8; 1000];
        rng.generate(&mut out).unwrap();

        // 1000 zero bytes from a working OS source is impossible.
        assert!(out.iter().any(|&byte| byte != 0));
    }
}
