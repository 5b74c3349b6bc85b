//! Random printable key/value generation

use kvbench_core::{KvPair, PRINTABLE_MAX, PRINTABLE_MIN};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

/// Produces fixed-length pairs over the printable ASCII alphabet
///
/// Keys and values are drawn independently with every byte uniform over
/// `0x20..=0x7E`. Nothing guarantees uniqueness; callers that need unique
/// keys check against the mirror and draw again.
#[derive(Debug, Clone)]
pub struct KeyValueSampler {
    key_length: usize,
    value_length: usize,
    alphabet: Uniform<u8>,
}

impl KeyValueSampler {
    /// Sampler for keys of `key_length` and values of `value_length` bytes
    pub fn new(key_length: usize, value_length: usize) -> Self {
        Self {
            key_length,
            value_length,
            alphabet: Uniform::new_inclusive(PRINTABLE_MIN, PRINTABLE_MAX),
        }
    }

    /// Key length in bytes
    pub fn key_length(&self) -> usize {
        self.key_length
    }

    /// Value length in bytes
    pub fn value_length(&self) -> usize {
        self.value_length
    }

    /// Draw a fresh pair
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> KvPair {
        let key = self.bytes(rng, self.key_length);
        let value = self.bytes(rng, self.value_length);
        KvPair::new(key, value)
    }

    /// Draw a value only
    pub fn sample_value<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<u8> {
        self.bytes(rng, self.value_length)
    }

    fn bytes<R: Rng + ?Sized>(&self, rng: &mut R, len: usize) -> Vec<u8> {
        (0..len).map(|_| self.alphabet.sample(rng)).collect()
    }
}
