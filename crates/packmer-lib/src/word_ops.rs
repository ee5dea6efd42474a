//! Word-array primitives behind [`PackedMer`](crate::PackedMer)
//!
//! Every function treats a `[u64]` slice as one unsigned integer with word 0
//! holding the least-significant bits. None of them know about mer sizes;
//! clearing bits above the active window is the caller's job.

use crate::constants::{low_mask, WORD_BITS};

/// Shift the whole array right (towards word 0) by `bits`
#[inline]
pub(crate) fn shift_right(words: &mut [u64], bits: usize) {
    let n = words.len();
    let whole = bits / WORD_BITS;
    let rem = (bits % WORD_BITS) as u32;

    if whole > 0 {
        if whole >= n {
            words.fill(0);
            return;
        }
        words.copy_within(whole.., 0);
        words[n - whole..].fill(0);
    }

    if rem > 0 && n > 0 {
        // low to high, so words[i + 1] is still unshifted when read
        for i in 0..n - 1 {
            words[i] = (words[i] >> rem) | (words[i + 1] << (64 - rem));
        }
        words[n - 1] >>= rem;
    }
}

/// Shift the whole array left (away from word 0) by `bits`
#[inline]
pub(crate) fn shift_left(words: &mut [u64], bits: usize) {
    let n = words.len();
    let whole = bits / WORD_BITS;
    let rem = (bits % WORD_BITS) as u32;

    if whole > 0 {
        if whole >= n {
            words.fill(0);
            return;
        }
        words.copy_within(..n - whole, whole);
        words[..whole].fill(0);
    }

    if rem > 0 && n > 0 {
        for i in (1..n).rev() {
            words[i] = (words[i] << rem) | (words[i - 1] >> (64 - rem));
        }
        words[0] <<= rem;
    }
}

/// Reverse the order of the 32 two-bit fields of a word
#[inline]
pub(crate) const fn reverse_symbols(mut x: u64) -> u64 {
    // Swap adjacent 2-bit pairs
    x = ((x >> 2) & 0x3333_3333_3333_3333) | ((x & 0x3333_3333_3333_3333) << 2);
    // Swap adjacent nibbles
    x = ((x >> 4) & 0x0F0F_0F0F_0F0F_0F0F) | ((x & 0x0F0F_0F0F_0F0F_0F0F) << 4);
    // Bytes, 16-bit halves and 32-bit halves in one go
    x.swap_bytes()
}

/// Split a bit position into (word index, bit offset)
#[inline]
const fn locate(pos: usize) -> (usize, u32) {
    (pos / WORD_BITS, (pos % WORD_BITS) as u32)
}

/// Whether `width` bits starting at `pos` lie inside `num_words` words
#[inline]
pub(crate) const fn range_fits(num_words: usize, pos: usize, width: u32) -> bool {
    if width > WORD_BITS as u32 {
        return false;
    }
    let (word, bit) = locate(pos);
    if word >= num_words {
        return false;
    }
    WORD_BITS as u32 - bit >= width || word + 1 < num_words
}

/// Read `width` bits starting at `pos`; the range must fit (see [`range_fits`])
#[inline]
pub(crate) fn get_bits(words: &[u64], pos: usize, width: u32) -> u64 {
    let (word, bit) = locate(pos);

    let val = if WORD_BITS as u32 - bit >= width {
        words[word] >> bit
    } else {
        let b1 = WORD_BITS as u32 - bit; // bits in the first word
        let b2 = width - b1; // bits in the second word
        (words[word] >> bit) | ((words[word + 1] & low_mask(b2)) << b1)
    };

    val & low_mask(width)
}

/// Overwrite `width` bits starting at `pos`; the range must fit
#[inline]
pub(crate) fn set_bits(words: &mut [u64], pos: usize, width: u32, value: u64) {
    let (word, bit) = locate(pos);
    let value = value & low_mask(width);

    if WORD_BITS as u32 - bit >= width {
        words[word] &= !(low_mask(width) << bit);
        words[word] |= value << bit;
    } else {
        let b1 = WORD_BITS as u32 - bit;
        let b2 = width - b1;

        words[word] &= !(low_mask(b1) << bit);
        words[word] |= (value & low_mask(b1)) << bit;

        words[word + 1] &= !low_mask(b2);
        words[word + 1] |= (value >> b1) & low_mask(b2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_right_within_word() {
        let mut w = [0xF0u64, 0x1];
        shift_right(&mut w, 4);
        assert_eq!(w, [0x1000_0000_0000_000F, 0]);
    }

    #[test]
    fn test_shift_right_whole_words() {
        let mut w = [1u64, 2, 3];
        shift_right(&mut w, 64);
        assert_eq!(w, [2, 3, 0]);

        let mut w = [1u64, 2, 3];
        shift_right(&mut w, 130);
        assert_eq!(w, [0, 0, 0]);

        let mut w = [1u64, 2, 3];
        shift_right(&mut w, 192);
        assert_eq!(w, [0, 0, 0]);

        let mut w = [1u64, 2, 3];
        shift_right(&mut w, 1000);
        assert_eq!(w, [0, 0, 0]);
    }

    #[test]
    fn test_shift_left_across_words() {
        let mut w = [u64::MAX, 0];
        shift_left(&mut w, 2);
        assert_eq!(w, [u64::MAX << 2, 0b11]);

        let mut w = [5u64, 0, 0];
        shift_left(&mut w, 65);
        assert_eq!(w, [0, 10, 0]);
    }

    #[test]
    fn test_shift_by_zero_is_identity() {
        let mut w = [0xDEAD_BEEFu64, 0x1234];
        shift_left(&mut w, 0);
        shift_right(&mut w, 0);
        assert_eq!(w, [0xDEAD_BEEF, 0x1234]);
    }

    #[test]
    fn test_reverse_symbols() {
        assert_eq!(reverse_symbols(0b01), 0b01 << 62);
        assert_eq!(reverse_symbols(0b1101), (0b01 << 62) | (0b11 << 60));
        let x = 0x0123_4567_89AB_CDEF;
        assert_eq!(reverse_symbols(reverse_symbols(x)), x);
    }

    #[test]
    fn test_range_fits() {
        assert!(range_fits(1, 0, 64));
        assert!(range_fits(1, 60, 4));
        assert!(!range_fits(1, 60, 5));
        assert!(range_fits(2, 60, 64));
        assert!(!range_fits(2, 128, 1));
        assert!(!range_fits(2, 0, 65));
        assert!(!range_fits(2, 128, 0));
    }

    #[test]
    fn test_bits_straddling_words() {
        let mut w = [0u64; 2];
        set_bits(&mut w, 60, 8, 0xAB);
        assert_eq!(w[0], 0xB << 60);
        assert_eq!(w[1], 0xA);
        assert_eq!(get_bits(&w, 60, 8), 0xAB);

        // neighbours untouched
        let mut w = [u64::MAX; 2];
        set_bits(&mut w, 62, 4, 0);
        assert_eq!(w[0], u64::MAX >> 2);
        assert_eq!(w[1], u64::MAX << 2);
    }

    #[test]
    fn test_set_bits_masks_value() {
        let mut w = [0u64; 1];
        set_bits(&mut w, 4, 4, 0xFFFF);
        assert_eq!(w[0], 0xF0);
        set_bits(&mut w, 0, 64, 7);
        assert_eq!(w[0], 7);
        set_bits(&mut w, 3, 0, 1);
        assert_eq!(w[0], 7);
    }

    mod model {
        use super::super::*;
        use proptest::prelude::*;

        /// Reference model: one bool per bit, index 0 least significant
        fn to_bits(words: &[u64]) -> Vec<bool> {
            (0..words.len() * 64).map(|i| (words[i / 64] >> (i % 64)) & 1 == 1).collect()
        }

        fn from_bits(bits: &[bool]) -> Vec<u64> {
            let mut words = vec![0u64; bits.len() / 64];
            for (i, &b) in bits.iter().enumerate() {
                if b {
                    words[i / 64] |= 1 << (i % 64);
                }
            }
            words
        }

        proptest! {
            #[test]
            fn prop_shift_right_matches_model(
                words in prop::collection::vec(any::<u64>(), 1..6),
                bits in 0usize..400,
            ) {
                let model = to_bits(&words);
                let expected: Vec<bool> = (0..model.len())
                    .map(|i| model.get(i + bits).copied().unwrap_or(false))
                    .collect();

                let mut actual = words.clone();
                shift_right(&mut actual, bits);
                prop_assert_eq!(actual, from_bits(&expected));
            }

            #[test]
            fn prop_shift_left_matches_model(
                words in prop::collection::vec(any::<u64>(), 1..6),
                bits in 0usize..400,
            ) {
                let model = to_bits(&words);
                let expected: Vec<bool> = (0..model.len())
                    .map(|i| i >= bits && model[i - bits])
                    .collect();

                let mut actual = words.clone();
                shift_left(&mut actual, bits);
                prop_assert_eq!(actual, from_bits(&expected));
            }

            #[test]
            fn prop_bit_range_matches_model(
                words in prop::collection::vec(any::<u64>(), 1..5),
                pos in 0usize..320,
                width in 0u32..=64,
                value in any::<u64>(),
            ) {
                prop_assume!(range_fits(words.len(), pos, width));

                let mut model = to_bits(&words);
                for j in 0..width as usize {
                    model[pos + j] = (value >> j) & 1 == 1;
                }

                let mut actual = words.clone();
                set_bits(&mut actual, pos, width, value);
                prop_assert_eq!(&actual, &from_bits(&model));
                prop_assert_eq!(get_bits(&actual, pos, width), value & low_mask(width));
            }

            #[test]
            fn prop_reverse_symbols_matches_model(word in any::<u64>()) {
                let mut expected = 0u64;
                for field in 0..32 {
                    expected |= ((word >> (2 * field)) & 0b11) << (2 * (31 - field));
                }
                prop_assert_eq!(reverse_symbols(word), expected);
            }
        }
    }
}
