//! HMAC-SHA-256 DRBG.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

use super::{Drbg, ReseedCounter};
use crate::error::Error;

const OUT_NBYTES: usize = 32;

/// Generate calls permitted between reseeds.
const RESEED_INTERVAL: u64 = 1 << 48;

/// Largest single generate request, in bytes.
const MAX_REQUEST_NBYTES: usize = 1 << 16;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-based DRBG over SHA-256.
///
/// Simpler than the counter-mode construction and tolerant of
/// arbitrary-length seed input without a derivation function.
pub struct HmacDrbg {
    key: [u8; OUT_NBYTES],
    v: [u8; OUT_NBYTES],
    counter: ReseedCounter,
}

impl HmacDrbg {
    /// Instantiates from seed material, a nonce, and a personalization
    /// string.
    pub fn new(seed: &[u8], nonce: &[u8], personalization: &[u8]) -> Result<Self, Error> {
        if seed.is_empty() {
            return Err(Error::Config);
        }

        let mut drbg = Self {
            key: [0x00; OUT_NBYTES],
            v: [0x01; OUT_NBYTES],
            counter: ReseedCounter::default(),
        };
        drbg.update(&[seed, nonce, personalization]);
        Ok(drbg)
    }

    fn mac(key: &[u8; OUT_NBYTES]) -> HmacSha256 {
        HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length")
    }

    fn update(&mut self, provided: &[&[u8]]) {
        self.round(0x00, provided);
        if provided.iter().any(|part| !part.is_empty()) {
            self.round(0x01, provided);
        }
    }

    fn round(&mut self, tag: u8, provided: &[&[u8]]) {
        let mut mac = Self::mac(&self.key);
        mac.update(&self.v);
        mac.update(&[tag]);
        for part in provided {
            mac.update(part);
        }
        self.key.copy_from_slice(&mac.finalize().into_bytes());

        let mut mac = Self::mac(&self.key);
        mac.update(&self.v);
        self.v.copy_from_slice(&mac.finalize().into_bytes());
    }
}

impl Drbg for HmacDrbg {
    fn reseed(&mut self, seed: &[u8], additional: &[u8]) -> Result<(), Error> {
        if seed.is_empty() {
            return Err(Error::Parameter);
        }

        self.update(&[seed, additional]);
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

        if !additional.is_empty() {
            self.update(&[additional]);
        }

        for chunk in out.chunks_mut(OUT_NBYTES) {
            let mut mac = Self::mac(&self.key);
            mac.update(&self.v);
            self.v.copy_from_slice(&mac.finalize().into_bytes());
            chunk.copy_from_slice(&self.v[..chunk.len()]);
        }

        self.update(&[additional]);
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

impl Drop for HmacDrbg {
    fn drop(&mut self) {
        self.key.zeroize();
        self.v.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drbg() -> HmacDrbg {
        HmacDrbg::new(&[0x42; 32], &[0x24; 8], b"hmac drbg test").unwrap()
    }

    #[test]
    fn test_deterministic() {
        let mut a = drbg();
        let mut b = drbg();

        let mut out_a = [0u8; 80];
        let mut out_b = [0u8; 80];
        a.generate(&mut out_a, &[]).unwrap();
        b.generate(&mut out_b, &[]).unwrap();

        assert_eq!(out_a[..], out_b[..]);
        assert!(out_a.iter().any(|&byte| byte != 0));
    }

    #[test]
    fn test_personalization_separates_streams() {
        let mut a = HmacDrbg::new(&[0x42; 32], &[], b"left").unwrap();
        let mut b = HmacDrbg::new(&[0x42; 32], &[], b"right").unwrap();

        let mut out_a = [0u8; 32];
        let mut out_b = [0u8; 32];
        a.generate(&mut out_a, &[]).unwrap();
        b.generate(&mut out_b, &[]).unwrap();

        assert_ne!(out_a, out_b);
    }

    #[test]
    fn test_reseed_diverges_and_rewinds() {
        let mut a = drbg();
        let mut b = drbg();

        let mut scratch = [0u8; 32];
        b.generate(&mut scratch, &[]).unwrap();
        b.reseed(&[0x99; 16], &[]).unwrap();
        assert_eq!(b.reseed_counter().get(), 1);

        let mut out_a = [0u8; 32];
        let mut out_b = [0u8; 32];
        a.generate(&mut out_a, &[]).unwrap();
        b.generate(&mut out_b, &[]).unwrap();

        assert_ne!(out_a, out_b);
    }

    #[test]
    fn test_counter_saturation() {
        let mut drbg = drbg();
        drbg.reseed_counter().force(RESEED_INTERVAL + 1);

        let mut out = [0u8; 16];
        assert_eq!(drbg.generate(&mut out, &[]), Err(Error::NeedsReseed));
    }

    #[test]
    fn test_empty_reseed_rejected() {
        let mut drbg = drbg();
        assert_eq!(drbg.reseed(&[], &[]), Err(Error::Parameter));
    }
}
