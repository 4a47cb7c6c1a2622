//! An ordered list of entropy sources.

use super::EntropySource;
use crate::error::Error;

/// Tries each inner source in order until one can supply a seed.
///
/// `add_entropy` and `reset` fan out to every inner source. Sources that
/// report [`Error::OutOfEntropy`] are skipped; any other failure is
/// returned immediately.
pub struct ListSource {
    sources: Vec<Box<dyn EntropySource>>,
}

impl ListSource {
    /// Builds a list over `sources`, consulted in order.
    pub fn new(sources: Vec<Box<dyn EntropySource>>) -> Self {
        Self { sources }
    }
}

impl EntropySource for ListSource {
    fn get_seed(&mut self, out: &mut [u8]) -> Result<(), Error> {
        for source in &mut self.sources {
            match source.get_seed(out) {
                Ok(()) => return Ok(()),
                Err(Error::OutOfEntropy) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(Error::OutOfEntropy)
    }

    fn add_entropy(&mut self, nsamples: u32, data: &[u8]) -> Result<bool, Error> {
        let mut seed_ready = false;
        for source in &mut self.sources {
            seed_ready |= source.add_entropy(nsamples, data)?;
        }
        Ok(seed_ready)
    }

    fn reset(&mut self) {
        for source in &mut self.sources {
            source.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource {
        byte: u8,
        empty: bool,
    }

    impl EntropySource for FixedSource {
        fn get_seed(&mut self, out: &mut [u8]) -> Result<(), Error> {
            if self.empty {
                return Err(Error::OutOfEntropy);
            }
            out.fill(self.byte);
            Ok(())
        }
    }

    #[test]
    fn test_prefers_earlier_sources() {
        let mut list = ListSource::new(vec![
            Box::new(FixedSource {
                byte: 1,
                empty: false,
            }),
            Box::new(FixedSource {
                byte: 2,
                empty: false,
            }),
        ]);

        let mut out = [0u8; 4];
        list.get_seed(&mut out).unwrap();
        assert_eq!(out, [1; 4]);
    }

    #[test]
    fn test_falls_through_empty_sources() {
        let mut list = ListSource::new(vec![
            Box::new(FixedSource {
                byte: 1,
                empty: true,
            }),
            Box::new(FixedSource {
                byte: 2,
                empty: false,
            }),
        ]);

        let mut out = [0u8; 4];
        list.get_seed(&mut out).unwrap();
        assert_eq!(out, [2; 4]);
    }

    #[test]
    fn test_all_empty_reports_out_of_entropy() {
        let mut list = ListSource::new(vec![Box::new(FixedSource {
            byte: 0,
            empty: true,
        })]);

        let mut out = [0u8; 4];
        assert_eq!(list.get_seed(&mut out), Err(Error::OutOfEntropy));
    }
}
