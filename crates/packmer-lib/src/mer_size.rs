//! Size configuration for packed k-mers
//!
//! A [`MerGeometry`] records where the active window of a packed value ends
//! inside its word array: which word holds the boundary, the mask that clears
//! everything above it, and where the most-significant symbol slot sits.

use crate::constants::{low_mask, symbol_capacity, BITS_PER_SYMBOL, SYMBOLS_PER_WORD, WORD_BITS};
use thiserror::Error;

/// Requests that do not fit in the fixed word capacity
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityError {
    /// The requested mer size exceeds `32 * words` symbols
    #[error("mer size {requested} larger than available storage ({words} words, max mer size {capacity})")]
    MerSize {
        /// Requested number of symbols
        requested: usize,
        /// Maximum number of symbols
        capacity: usize,
        /// Number of 64-bit words available
        words: usize,
    },
    /// A bit range reaches past the last word, or is wider than one word
    #[error("bit range pos={pos} width={width} outside of {words} words")]
    BitRange {
        /// First bit of the range
        pos: usize,
        /// Width of the range in bits
        width: u32,
        /// Number of 64-bit words available
        words: usize,
    },
}

/// Mask parameters derived from a mer size
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MerGeometry {
    /// Number of encoded symbols (the weight, for spaced seeds)
    pub mer_size: usize,
    /// Number of positions covered, gaps included
    pub mer_span: usize,
    /// Word containing the boundary bit
    pub mask_word: usize,
    /// Mask applied to `mask_word`
    pub mask: u64,
    /// Word holding the most-significant symbol
    pub last_word: usize,
    /// Bit offset of the most-significant symbol within `last_word`
    pub last_shift: u32,
}

impl MerGeometry {
    /// Compute the geometry of a `mer_size`-symbol window in `words` words
    ///
    /// A size that is a multiple of 32 fills whole words. The mask then
    /// clears the entire next word, or does nothing if there is no next word.
    ///
    /// # Errors
    /// Returns [`CapacityError::MerSize`] if `mer_size > 32 * words`.
    pub fn new(words: usize, mer_size: usize) -> Result<Self, CapacityError> {
        let capacity = symbol_capacity(words);
        if words == 0 || mer_size > capacity {
            return Err(CapacityError::MerSize {
                requested: mer_size,
                capacity,
                words,
            });
        }

        let top_bit = (BITS_PER_SYMBOL * mer_size).saturating_sub(BITS_PER_SYMBOL);
        let last_word = top_bit / WORD_BITS;
        let last_shift = (top_bit % WORD_BITS) as u32;

        let mut mask_word = mer_size / SYMBOLS_PER_WORD;
        let mask = if mer_size % SYMBOLS_PER_WORD == 0 {
            if mask_word >= words {
                mask_word = words - 1;
                u64::MAX
            } else {
                0
            }
        } else {
            low_mask((BITS_PER_SYMBOL * (mer_size % SYMBOLS_PER_WORD)) as u32)
        };

        Ok(Self {
            mer_size,
            mer_span: mer_size,
            mask_word,
            mask,
            last_word,
            last_shift,
        })
    }

    /// Number of bits in the active window
    #[inline]
    pub fn num_bits(&self) -> usize {
        BITS_PER_SYMBOL * self.mer_size
    }
}
