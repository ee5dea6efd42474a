//! Constants shared by the packed k-mer codec
//!
//! Word geometry, the supported word counts used by runtime dispatch, and
//! the persisted format version.

/// Bits in one storage word
pub const WORD_BITS: usize = 64;

/// Bits used to encode one symbol
pub const BITS_PER_SYMBOL: usize = 2;

/// Symbols held by one storage word
pub const SYMBOLS_PER_WORD: usize = WORD_BITS / BITS_PER_SYMBOL;

/// Default seed for hash functions
pub const DEFAULT_SEED: u64 = 1;

/// Word counts instantiated by [`dispatch_on_words!`](crate::dispatch_on_words)
pub const SUPPORTED_WORD_COUNTS: &[usize] = &[1, 2, 4, 8];

/// Largest k-mer size reachable through runtime dispatch
pub const MAX_DISPATCH_K: usize = 8 * SYMBOLS_PER_WORD;

/// Version number
pub const VERSION: (u8, u8, u8) = (0, 1, 0);

/// Number of symbols a value of `words` words can hold
#[inline]
pub const fn symbol_capacity(words: usize) -> usize {
    words * SYMBOLS_PER_WORD
}

/// Smallest word count able to hold `k` symbols (at least one word)
#[inline]
pub const fn words_for(k: usize) -> usize {
    if k == 0 {
        1
    } else {
        k.div_ceil(SYMBOLS_PER_WORD)
    }
}

/// Word count actually used by runtime dispatch for `k`, if any
#[inline]
pub const fn dispatch_words_for(k: usize) -> Option<usize> {
    match words_for(k) {
        1 => Some(1),
        2 => Some(2),
        3 | 4 => Some(4),
        5..=8 => Some(8),
        _ => None,
    }
}

/// Mask selecting the low `bits` bits of a word (`bits` may be 64)
#[inline]
pub const fn low_mask(bits: u32) -> u64 {
    if bits >= WORD_BITS as u32 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}
