//! A lock-serialized entropy source handle.

use std::sync::Arc;

use parking_lot::Mutex;

use super::EntropySource;
use crate::error::Error;

/// Shares one entropy source between components, serializing every call.
///
/// Clones refer to the same underlying source, so an accumulator can be
/// fed from one side and drained from another.
pub struct LockSource<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for LockSource<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: EntropySource> LockSource<S> {
    /// Wraps `source` behind a shared lock.
    pub fn new(source: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(source)),
        }
    }
}

impl<S: EntropySource> EntropySource for LockSource<S> {
    fn get_seed(&mut self, out: &mut [u8]) -> Result<(), Error> {
        self.inner.lock().get_seed(out)
    }

    fn add_entropy(&mut self, nsamples: u32, data: &[u8]) -> Result<bool, Error> {
        self.inner.lock().add_entropy(nsamples, data)
    }

    fn reset(&mut self) {
        self.inner.lock().reset()
    }
}
