//! AES-256 counter-mode DRBG with a block-cipher derivation function.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes256;
use zeroize::{Zeroize, Zeroizing};

use super::{Drbg, ReseedCounter};
use crate::error::Error;

const BLOCK_NBYTES: usize = 16;
const KEY_NBYTES: usize = 32;
const SEED_NBYTES: usize = KEY_NBYTES + BLOCK_NBYTES;

/// Generate calls permitted between reseeds.
const RESEED_INTERVAL: u64 = 1 << 48;

/// Largest single generate request, in bytes.
const MAX_REQUEST_NBYTES: usize = 1 << 16;

/// AES-256 counter-mode DRBG with a derivation function.
///
/// Seed material of any length is condensed through the block-cipher
/// derivation function before it touches the key/counter state, so
/// callers may feed full-entropy and partial-entropy inputs alike.
pub struct CtrDrbg {
    key: [u8; KEY_NBYTES],
    v: [u8; BLOCK_NBYTES],
    counter: ReseedCounter,
}

impl CtrDrbg {
    /// Instantiates from seed material, a nonce, and a personalization
    /// string.
    pub fn new(seed: &[u8], nonce: &[u8], personalization: &[u8]) -> Result<Self, Error> {
        if seed.is_empty() {
            return Err(Error::Config);
        }

        let material = derive(&[seed, nonce, personalization]);
        let mut drbg = Self {
            key: [0; KEY_NBYTES],
            v: [0; BLOCK_NBYTES],
            counter: ReseedCounter::default(),
        };
        drbg.update(&material);
        Ok(drbg)
    }

    fn update(&mut self, provided: &[u8; SEED_NBYTES]) {
        let cipher = Aes256::new(GenericArray::from_slice(&self.key));
        let mut temp = Zeroizing::new([0u8; SEED_NBYTES]);

        for chunk in temp.chunks_mut(BLOCK_NBYTES) {
            increment(&mut self.v);
            let mut block = GenericArray::clone_from_slice(&self.v);
            cipher.encrypt_block(&mut block);
            chunk.copy_from_slice(&block);
        }

        for (out, byte) in temp.iter_mut().zip(provided.iter()) {
            *out ^= byte;
        }

        self.key.copy_from_slice(&temp[..KEY_NBYTES]);
        self.v.copy_from_slice(&temp[KEY_NBYTES..]);
    }
}

impl Drbg for CtrDrbg {
    fn reseed(&mut self, seed: &[u8], additional: &[u8]) -> Result<(), Error> {
        if seed.is_empty() {
            return Err(Error::Parameter);
        }

        let material = derive(&[seed, additional]);
        self.update(&material);
        self.counter.rewind();
        Ok(())
    }

    fn generate(&mut self, out: &mut [u8], additional: &[u8]) -> Result<(), Error> {
        if out.len() > MAX_REQUEST_NBYTES {
            return Err(Error::Parameter);
        }
        if self.counter.get() > RESEED_INTERVAL {
            return Err(Error::NeedsReseed);
        }

        let material = if additional.is_empty() {
            Zeroizing::new([0u8; SEED_NBYTES])
        } else {
            derive(&[additional])
        };
        if !additional.is_empty() {
            self.update(&material);
        }

        let cipher = Aes256::new(GenericArray::from_slice(&self.key));
        for chunk in out.chunks_mut(BLOCK_NBYTES) {
            increment(&mut self.v);
            let mut block = GenericArray::clone_from_slice(&self.v);
            cipher.encrypt_block(&mut block);
            chunk.copy_from_slice(&block[..chunk.len()]);
        }

        self.update(&material);
        self.counter.increment();
        Ok(())
    }

    fn max_request_nbytes(&self) -> usize {
        MAX_REQUEST_NBYTES
    }

    fn reseed_interval(&self) -> u64 {
        RESEED_INTERVAL
    }

    fn reseed_counter(&self) -> ReseedCounter {
        self.counter.clone()
    }
}

impl Drop for CtrDrbg {
    fn drop(&mut self) {
        self.key.zeroize();
        self.v.zeroize();
    }
}

/// Adds one to a big-endian block counter.
fn increment(v: &mut [u8; BLOCK_NBYTES]) {
    for byte in v.iter_mut().rev() {
        let (next, carry) = byte.overflowing_add(1);
        *byte = next;
        if !carry {
            break;
        }
    }
}

/// Block-cipher derivation function: condenses arbitrary-length input
/// into one seed's worth of full-entropy material.
fn derive(parts: &[&[u8]]) -> Zeroizing<[u8; SEED_NBYTES]> {
    let input_nbytes: usize = parts.iter().map(|part| part.len()).sum();

    // S = len(input) || len(output) || input || 0x80, zero-padded to the
    // block size.
    let mut s = Zeroizing::new(Vec::with_capacity(input_nbytes + 2 * BLOCK_NBYTES));
    s.extend_from_slice(&(input_nbytes as u32).to_be_bytes());
    s.extend_from_slice(&(SEED_NBYTES as u32).to_be_bytes());
    for part in parts {
        s.extend_from_slice(part);
    }
    s.push(0x80);
    while s.len() % BLOCK_NBYTES != 0 {
        s.push(0);
    }

    let mut key = [0u8; KEY_NBYTES];
    for (i, byte) in key.iter_mut().enumerate() {
        *byte = i as u8;
    }
    let cipher = Aes256::new(GenericArray::from_slice(&key));

    let mut temp = Zeroizing::new([0u8; SEED_NBYTES]);
    for (i, chunk) in temp.chunks_mut(BLOCK_NBYTES).enumerate() {
        let mut iv = [0u8; BLOCK_NBYTES];
        iv[..4].copy_from_slice(&(i as u32).to_be_bytes());
        chunk.copy_from_slice(&bcc(&cipher, &iv, &s));
    }

    // The condensed material keys a second pass that expands to the
    // output length.
    let cipher = Aes256::new(GenericArray::from_slice(&temp[..KEY_NBYTES]));
    let mut x = [0u8; BLOCK_NBYTES];
    x.copy_from_slice(&temp[KEY_NBYTES..]);

    let mut out = Zeroizing::new([0u8; SEED_NBYTES]);
    for chunk in out.chunks_mut(BLOCK_NBYTES) {
        let mut block = GenericArray::clone_from_slice(&x);
        cipher.encrypt_block(&mut block);
        x.copy_from_slice(&block);
        chunk.copy_from_slice(&x);
    }

    x.zeroize();
    out
}

/// CBC-MAC over `iv || data`; `data` must be block-aligned.
fn bcc(cipher: &Aes256, iv: &[u8; BLOCK_NBYTES], data: &[u8]) -> [u8; BLOCK_NBYTES] {
    let mut chain = GenericArray::default();
    for chunk in std::iter::once(&iv[..]).chain(data.chunks(BLOCK_NBYTES)) {
        for (lhs, rhs) in chain.iter_mut().zip(chunk.iter()) {
            *lhs ^= rhs;
        }
        cipher.encrypt_block(&mut chain);
    }
    chain.into()
}
