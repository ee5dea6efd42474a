//! Deterministic hasher for packed k-mers using ahash.
//!
//! Hashes the full word array, so values wider than 32 bases hash on every
//! base rather than on the scalar view of word 0.

use crate::packed_mer::PackedMer;
use ahash::RandomState;
use std::hash::{BuildHasher, Hasher};

/// A deterministic hasher with a seeded state
#[derive(Clone)]
pub struct MerHasher {
    seed: u64,
    state: RandomState,
}

impl MerHasher {
    /// Create a new deterministic hasher with the given seed
    pub fn new(seed: u64) -> Self {
        let state = RandomState::with_seeds(seed, !seed, seed, !seed);
        Self { seed, state }
    }

    /// Hash a u64 value using a seeded AHasher
    #[inline]
    pub fn hash_u64(&self, value: u64) -> u64 {
        let mut hasher = self.state.build_hasher();
        hasher.write_u64(value);
        hasher.finish()
    }

    /// Hash every word of a k-mer; the value should be masked
    #[inline]
    pub fn hash_mer<const N: usize>(&self, mer: &PackedMer<N>) -> u64 {
        let mut hasher = self.state.build_hasher();
        for &word in mer.words() {
            hasher.write_u64(word);
        }
        hasher.finish()
    }

    /// Get the seed value
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl BuildHasher for MerHasher {
    type Hasher = ahash::AHasher;

    fn build_hasher(&self) -> Self::Hasher {
        self.state.build_hasher()
    }
}
