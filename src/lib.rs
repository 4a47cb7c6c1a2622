//! Fortuna CSPRNG Subsystem
//!
//! A cryptographically secure random number generator built around a
//! Fortuna entropy accumulator: 32 hash pools absorb samples of unknown
//! quality, a power-of-two schedule drains them into an AES-256-CTR
//! generator, and a DRBG-backed crypto RNG layer sits on top, reseeding
//! according to pluggable schedules.
//!
//! # Architecture
//!
//! The system follows an explicit layering:
//!
//! ```text
//! entropy callback → fortuna pools → scheduled reseed → CTR generator
//!                                                            ↓
//!       entropy sources  ←─────────────────────────  (as seed supply)
//!             ↓
//!       crypto rng (DRBG + schedule + cache) → process / kernel wiring
//! ```
//!
//! # Design Principles
//!
//! - **Fail-closed**: no output before a full seed's worth of samples has
//!   been absorbed.
//! - **Forward secrecy**: the generator key rotates on every read.
//! - **Hardware as supplement**: hardware random words are folded in as
//!   additional input, never relied upon.
//! - **Uses standard primitives**: SHA-256/SHA-512 for pools and
//!   conditioning, AES-256 for generation.
//!
//! # Example
//!
//! ```no_run
//! use fortuna_rng::process_rng;
//! use rand_core::RngCore;
//!
//! let mut rng = process_rng();
//! let mut key = [0u8; 32];
//! rng.fill_bytes(&mut key);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod drbg;
pub mod entropy;
pub mod error;
pub mod fortuna;
pub mod hwrand;
pub mod kernel;
pub mod process;
pub mod rng;
pub mod schedule;

// Re-export commonly used types at crate root
pub use error::{set_abort_handler, Error};
pub use fortuna::{EntropyCallback, EntropyRead, Fortuna};
pub use process::{process_rng, ProcessRng};
pub use rng::{CryptoRng, OsEntropyRng, RandomSource};
pub use schedule::{Action, ReseedSchedule};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
