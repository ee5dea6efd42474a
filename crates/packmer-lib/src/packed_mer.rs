//! Multi-word packed k-mer representation
//!
//! A [`PackedMer<N>`] stores up to `32 * N` bases at two bits per base in a
//! fixed `[u64; N]` array. Word 0 holds the least-significant bits, which
//! encode the rightmost bases of the k-mer; the leftmost base sits in the
//! highest active bit pair. Numeric order of the word array therefore matches
//! lexicographic order of the decoded strings.
//!
//! # Staged masking
//!
//! Shifting primitives work on the full capacity and do not clear bits that
//! move above the active window. Operations that can leave such bits carry
//! `_unmasked` in their name; follow them with [`PackedMer::mask_boundary`]
//! or [`PackedMer::mask_full`] before comparing, hashing or serializing.
//!
//! ```
//! use packmer_lib::PackedMer;
//!
//! let mut mer = PackedMer::<2>::with_mer_size(4).unwrap();
//! for &base in b"ACGTA" {
//!     mer.append_unmasked(packmer_lib::encoding::encode_base(base).unwrap());
//!     mer.mask_boundary();
//! }
//! assert_eq!(mer.to_string(), "CGTA");
//! ```

use crate::constants::{low_mask, BITS_PER_SYMBOL, WORD_BITS};
use crate::encoding::{complement_base, decode_base, encode_base, EncodingError};
use crate::mer_size::{CapacityError, MerGeometry};
use crate::word_ops;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// K-mer packed at two bits per base into `N` 64-bit words
#[derive(Clone, Copy)]
pub struct PackedMer<const N: usize> {
    words: [u64; N],
    geometry: MerGeometry,
}

impl<const N: usize> PackedMer<N> {
    /// Maximum number of bases this type can hold
    pub const CAPACITY: usize = N * WORD_BITS / BITS_PER_SYMBOL;

    /// Create an empty value (all words zero) with the given mer size
    ///
    /// # Errors
    /// Returns [`CapacityError::MerSize`] if `mer_size` exceeds [`Self::CAPACITY`].
    pub fn with_mer_size(mer_size: usize) -> Result<Self, CapacityError> {
        Ok(Self {
            words: [0; N],
            geometry: MerGeometry::new(N, mer_size)?,
        })
    }

    /// Build a value from 2-bit codes, leftmost base first
    ///
    /// The mer size becomes `symbols.len()`.
    ///
    /// # Panics
    /// Panics if a code is greater than 3.
    pub fn from_symbols(symbols: &[u8]) -> Result<Self, CapacityError> {
        let mut mer = Self::with_mer_size(symbols.len())?;
        for &code in symbols {
            mer.append_unmasked(code);
        }
        Ok(mer)
    }

    /// Build a value from ASCII bases (case-insensitive), leftmost base first
    ///
    /// # Errors
    /// Fails on a non-ACGT byte or if the input does not fit.
    pub fn from_ascii(bases: &[u8]) -> Result<Self, EncodingError> {
        let mut mer = Self::with_mer_size(bases.len())?;
        for (position, &base) in bases.iter().enumerate() {
            let code = encode_base(base).ok_or(EncodingError::InvalidBase { base, position })?;
            mer.append_unmasked(code);
        }
        Ok(mer)
    }

    /// Reconfigure the mer size, leaving the stored words untouched
    ///
    /// Shrinking a non-empty value leaves bases above the new window in
    /// place; follow with [`mask_full`](Self::mask_full) or [`clear`](Self::clear).
    /// The span is reset to the new size.
    ///
    /// # Errors
    /// Returns [`CapacityError::MerSize`] if `mer_size` exceeds [`Self::CAPACITY`];
    /// the value is unchanged in that case.
    pub fn set_mer_size(&mut self, mer_size: usize) -> Result<(), CapacityError> {
        self.geometry = MerGeometry::new(N, mer_size)?;
        Ok(())
    }

    /// Number of bases in the active window
    #[inline]
    pub fn mer_size(&self) -> usize {
        self.geometry.mer_size
    }

    /// Set the number of positions covered (for spaced seeds, `span >= size`)
    #[inline]
    pub fn set_mer_span(&mut self, mer_span: usize) {
        self.geometry.mer_span = mer_span;
    }

    /// Number of positions covered, gaps included
    #[inline]
    pub fn mer_span(&self) -> usize {
        self.geometry.mer_span
    }

    /// Mask parameters of the current mer size
    #[inline]
    pub fn geometry(&self) -> &MerGeometry {
        &self.geometry
    }

    /// Zero every word
    #[inline]
    pub fn clear(&mut self) {
        self.words = [0; N];
    }

    /// Set to the smallest value of the current size (all A)
    #[inline]
    pub fn smallest(&mut self) {
        self.clear();
    }

    /// Set to the largest value of the current size (all T)
    #[inline]
    pub fn largest(&mut self) {
        self.clear();
        self.reverse_complement();
    }

    /// The raw words, least-significant first
    #[inline]
    pub fn words(&self) -> &[u64; N] {
        &self.words
    }

    /// Read one word
    ///
    /// # Panics
    /// Panics if `index >= N`.
    #[inline]
    pub fn word(&self, index: usize) -> u64 {
        self.words[index]
    }

    /// Overwrite one word; no masking is applied
    ///
    /// # Panics
    /// Panics if `index >= N`.
    #[inline]
    pub fn set_word(&mut self, index: usize, value: u64) {
        self.words[index] = value;
    }

    /// Scalar view: word 0 only, meaningful when the mer size is at most 32
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.words[0]
    }

    /// Shift in a base at the low (rightmost) end
    ///
    /// The whole array moves up two bits, so once the window is full the
    /// leftmost base is pushed above it. Call [`mask_boundary`](Self::mask_boundary)
    /// afterwards to keep exactly `mer_size` bases.
    ///
    /// # Panics
    /// Panics if `code > 3`.
    #[inline]
    pub fn append_unmasked(&mut self, code: u8) {
        assert!(code <= 0b11, "Base value must be 0-3, got {}", code);
        word_ops::shift_left(&mut self.words, BITS_PER_SYMBOL);
        self.words[0] |= code as u64;
    }

    /// Drop the rightmost base and shift in a base at the high (leftmost) end
    ///
    /// Bits above the window must already be clear, otherwise they slide
    /// into the leftmost slot.
    ///
    /// # Panics
    /// Panics if `code > 3`.
    #[inline]
    pub fn insert_high(&mut self, code: u8) {
        assert!(code <= 0b11, "Base value must be 0-3, got {}", code);
        word_ops::shift_right(&mut self.words, BITS_PER_SYMBOL);
        self.words[self.geometry.last_word] |= (code as u64) << self.geometry.last_shift;
    }

    /// Clear bits above the window in the boundary word
    ///
    /// With `full`, every word above the boundary word is zeroed as well.
    #[inline]
    pub fn apply_mask(&mut self, full: bool) {
        let MerGeometry { mask_word, mask, .. } = self.geometry;
        self.words[mask_word] &= mask;
        if full {
            self.words[mask_word + 1..].fill(0);
        }
    }

    /// Clear the bits one shift can push above the window
    ///
    /// Sufficient after a single [`append_unmasked`](Self::append_unmasked)
    /// on a clean value.
    #[inline]
    pub fn mask_boundary(&mut self) {
        self.apply_mask(false);
    }

    /// Clear every bit above the window
    #[inline]
    pub fn mask_full(&mut self) {
        self.apply_mask(true);
    }

    /// Replace the value with its reverse complement, in place
    ///
    /// Works over the full capacity: reverse the words, reverse the bases in
    /// each word, complement, then shift the window back down to the low
    /// bits. The zero fill of the final shift leaves nothing above the window.
    pub fn reverse_complement(&mut self) -> &mut Self {
        self.words.reverse();
        for word in self.words.iter_mut() {
            *word = !word_ops::reverse_symbols(*word);
        }
        word_ops::shift_right(&mut self.words, N * WORD_BITS - self.geometry.num_bits());
        self
    }

    /// Get the reverse complement of this k-mer
    #[inline]
    pub fn reverse_complemented(&self) -> Self {
        let mut rc = *self;
        rc.reverse_complement();
        rc
    }

    /// Get the canonical representation (minimum of forward and reverse complement)
    ///
    /// Expects a masked value.
    pub fn canonical(&self) -> Self {
        let rc = self.reverse_complemented();
        if rc < *self {
            rc
        } else {
            *self
        }
    }

    /// Read `width <= 64` bits starting at bit `pos`
    ///
    /// The range may cross one word boundary.
    ///
    /// # Errors
    /// Returns [`CapacityError::BitRange`] if the range leaves the word array.
    pub fn get_bits(&self, pos: usize, width: u32) -> Result<u64, CapacityError> {
        self.check_range(pos, width)?;
        Ok(word_ops::get_bits(&self.words, pos, width))
    }

    /// Overwrite `width <= 64` bits starting at bit `pos` with the low bits of `value`
    ///
    /// # Errors
    /// Returns [`CapacityError::BitRange`] if the range leaves the word array.
    pub fn set_bits(&mut self, pos: usize, width: u32, value: u64) -> Result<(), CapacityError> {
        self.check_range(pos, width)?;
        word_ops::set_bits(&mut self.words, pos, width, value);
        Ok(())
    }

    #[inline]
    fn check_range(&self, pos: usize, width: u32) -> Result<(), CapacityError> {
        if word_ops::range_fits(N, pos, width) {
            Ok(())
        } else {
            Err(CapacityError::BitRange { pos, width, words: N })
        }
    }

    /// The top `bits` bits of the window (its leftmost bases)
    ///
    /// # Panics
    /// Panics if `bits` exceeds 64 or the window width.
    pub fn start_of_mer(&self, bits: u32) -> u64 {
        let num_bits = self.geometry.num_bits();
        assert!(
            bits as usize <= num_bits && bits as usize <= WORD_BITS,
            "cannot take {} bits from a {}-bit window",
            bits,
            num_bits
        );
        word_ops::get_bits(&self.words, num_bits - bits as usize, bits)
    }

    /// The bottom `bits` bits of the window (its rightmost bases)
    #[inline]
    pub fn end_of_mer(&self, bits: u32) -> u64 {
        self.words[0] & low_mask(bits)
    }

    /// Extract the base at position `pos`, counted from the left
    ///
    /// # Panics
    /// Panics if `pos >= mer_size`.
    pub fn symbol(&self, pos: usize) -> u8 {
        let k = self.geometry.mer_size;
        assert!(pos < k, "Position {} out of bounds for k-mer of length {}", pos, k);
        word_ops::get_bits(&self.words, BITS_PER_SYMBOL * (k - 1 - pos), 2) as u8
    }

    /// Overwrite the base at position `pos`, counted from the left
    ///
    /// # Panics
    /// Panics if `pos >= mer_size` or `code > 3`.
    pub fn set_symbol(&mut self, pos: usize, code: u8) {
        let k = self.geometry.mer_size;
        assert!(pos < k, "Position {} out of bounds for k-mer of length {}", pos, k);
        assert!(code <= 0b11, "Base value must be 0-3, got {}", code);
        word_ops::set_bits(&mut self.words, BITS_PER_SYMBOL * (k - 1 - pos), 2, code as u64);
    }

    /// Complement of the base at position `pos`
    #[inline]
    pub fn complement_symbol(&self, pos: usize) -> u8 {
        complement_base(self.symbol(pos))
    }

    /// Write the bases as ASCII, leftmost first, into `out[..mer_size]`
    ///
    /// The window is emitted in 32-base chunks from the top word down, with a
    /// leading partial chunk when the size is not a multiple of 32.
    ///
    /// # Panics
    /// Panics if `out` is shorter than the mer size.
    pub fn fill_ascii(&self, out: &mut [u8]) -> usize {
        let k = self.geometry.mer_size;
        assert!(out.len() >= k, "buffer of {} bytes too small for a {}-mer", out.len(), k);

        let per_word = WORD_BITS / BITS_PER_SYMBOL;
        let mut word = k / per_word;
        let partial = k % per_word;
        let mut offset = 0;

        if partial > 0 {
            word_to_ascii(self.words[word], &mut out[..partial]);
            offset = partial;
        }
        while word > 0 {
            word -= 1;
            word_to_ascii(self.words[word], &mut out[offset..offset + per_word]);
            offset += per_word;
        }
        k
    }

    /// The bases as an ASCII byte vector
    pub fn to_ascii(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.geometry.mer_size];
        self.fill_ascii(&mut out);
        out
    }
}

/// Decode the low `out.len()` bases of a word, most significant first
#[inline]
fn word_to_ascii(word: u64, out: &mut [u8]) {
    let n = out.len();
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = decode_base((word >> (BITS_PER_SYMBOL * (n - 1 - i))) as u8);
    }
}

impl<const N: usize> Default for PackedMer<N> {
    fn default() -> Self {
        Self {
            words: [0; N],
            geometry: MerGeometry::default(),
        }
    }
}

impl<const N: usize> PartialEq for PackedMer<N> {
    fn eq(&self, other: &Self) -> bool {
        self.words == other.words
    }
}

impl<const N: usize> Eq for PackedMer<N> {}

impl<const N: usize> PartialOrd for PackedMer<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<const N: usize> Ord for PackedMer<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.words.iter().rev().cmp(other.words.iter().rev())
    }
}

impl<const N: usize> Hash for PackedMer<N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.words.hash(state);
    }
}

impl<const N: usize> From<PackedMer<N>> for u64 {
    fn from(mer: PackedMer<N>) -> Self {
        mer.as_u64()
    }
}

impl<const N: usize> fmt::Debug for PackedMer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackedMer<{}>(\"{}\")", N, self)
    }
}

impl<const N: usize> fmt::Display for PackedMer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ascii = self.to_ascii();
        // decode_base only yields A/C/G/T
        f.write_str(std::str::from_utf8(&ascii).map_err(|_| fmt::Error)?)
    }
}

impl<const N: usize> std::str::FromStr for PackedMer<N> {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_ascii(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mer<const N: usize>(s: &str) -> PackedMer<N> {
        s.parse().unwrap()
    }

    #[test]
    fn test_storage_size() {
        assert_eq!(PackedMer::<1>::CAPACITY, 32);
        assert_eq!(PackedMer::<4>::CAPACITY, 128);
        assert_eq!(
            std::mem::size_of::<[u64; 4]>(),
            std::mem::size_of_val(PackedMer::<4>::default().words())
        );
    }

    #[test]
    fn test_from_str_and_display() {
        let m: PackedMer<1> = mer("ACGTG");
        assert_eq!(m.to_string(), "ACGTG");
        assert_eq!(m.as_u64(), 0b00_01_10_11_10);

        let s = "ACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTA";
        let m: PackedMer<2> = mer(s);
        assert_eq!(m.mer_size(), 41);
        assert_eq!(m.to_string(), s);
    }

    #[test]
    fn test_from_str_errors() {
        assert_eq!(
            "ACNT".parse::<PackedMer<1>>(),
            Err(EncodingError::InvalidBase { base: b'N', position: 2 })
        );
        let long = "A".repeat(33);
        assert!(matches!(
            long.parse::<PackedMer<1>>(),
            Err(EncodingError::Capacity(CapacityError::MerSize { requested: 33, .. }))
        ));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(mer::<1>("acgtg"), mer::<1>("ACGTG"));
    }

    #[test]
    fn test_palindrome_reverse_complement() {
        let mut m: PackedMer<2> = mer("ACGT");
        m.reverse_complement();
        m.mask_full();
        assert_eq!(m.to_string(), "ACGT");
    }

    #[test]
    fn test_poly_a_reverse_complement() {
        let mut m: PackedMer<1> = mer("AAAA");
        m.reverse_complement();
        m.mask_full();
        assert_eq!(m.to_string(), "TTTT");
    }

    #[test]
    fn test_reverse_complement_across_words() {
        let s = "AACCGGTTACGATCGATCGGCTAGCTAGCTAGGATCCA";
        let mut m: PackedMer<3> = mer(s);
        m.reverse_complement();
        assert_eq!(m.to_string(), "TGGATCCTAGCTAGCTAGCCGATCGATCGTAACCGGTT");
        m.reverse_complement();
        assert_eq!(m.to_string(), s);
    }

    #[test]
    fn test_reverse_complement_at_capacity() {
        let s = "ACGGTCATGCAAGTCCGATGCATTGACCGTAG";
        let mut m: PackedMer<1> = mer(s);
        let expected: String = s
            .bytes()
            .rev()
            .map(|b| match b {
                b'A' => 'T',
                b'C' => 'G',
                b'G' => 'C',
                _ => 'A',
            })
            .collect();
        m.reverse_complement();
        assert_eq!(m.to_string(), expected);
    }

    #[test]
    fn test_full_mask_clears_high_words() {
        let mut m = PackedMer::<4>::with_mer_size(40).unwrap();
        for i in 0..4 {
            m.set_word(i, u64::MAX);
        }
        m.mask_full();
        assert_eq!(m.geometry().mask_word, 1);
        assert_eq!(m.word(0), u64::MAX);
        assert_eq!(m.word(1), 0xFFFF);
        assert_eq!(m.word(2), 0);
        assert_eq!(m.word(3), 0);

        let mut m = PackedMer::<4>::with_mer_size(40).unwrap();
        m.set_word(3, 7);
        m.mask_boundary();
        assert_eq!(m.word(3), 7);
    }

    #[test]
    fn test_sliding_window() {
        let seq = b"GATTACAGATTACA";
        let k = 5;
        let mut window = PackedMer::<1>::with_mer_size(k).unwrap();
        for (i, &b) in seq.iter().enumerate() {
            window.append_unmasked(encode_base(b).unwrap());
            window.mask_boundary();
            if i + 1 >= k {
                let expected = &seq[i + 1 - k..=i];
                assert_eq!(window.to_ascii(), expected);
            }
        }
    }

    #[test]
    fn test_sliding_window_word_aligned() {
        // k = 32 in two words: the boundary mask clears the whole second word
        let seq: Vec<u8> = b"ACGT".iter().cycle().take(40).copied().collect();
        let mut window = PackedMer::<2>::with_mer_size(32).unwrap();
        for &b in &seq {
            window.append_unmasked(encode_base(b).unwrap());
            window.mask_boundary();
        }
        assert_eq!(window.word(1), 0);
        assert_eq!(window.to_ascii(), &seq[8..]);
    }

    #[test]
    fn test_insert_high() {
        let mut m: PackedMer<2> = mer("ACGTACGTACGTACGTACGTACGTACGTACGTACG");
        m.insert_high(encode_base(b'T').unwrap());
        assert_eq!(m.to_string(), "TACGTACGTACGTACGTACGTACGTACGTACGTAC");
    }

    #[test]
    #[should_panic(expected = "Base value must be 0-3")]
    fn test_append_rejects_bad_code() {
        PackedMer::<1>::with_mer_size(3).unwrap().append_unmasked(4);
    }

    #[test]
    fn test_set_mer_size_capacity() {
        let mut m = PackedMer::<2>::default();
        assert!(m.set_mer_size(64).is_ok());
        assert_eq!(
            m.set_mer_size(65),
            Err(CapacityError::MerSize { requested: 65, capacity: 64, words: 2 })
        );
        assert_eq!(m.mer_size(), 64);
    }

    #[test]
    fn test_mer_span() {
        let mut m = PackedMer::<1>::with_mer_size(12).unwrap();
        assert_eq!(m.mer_span(), 12);
        m.set_mer_span(20);
        assert_eq!(m.mer_span(), 20);
        m.set_mer_size(10).unwrap();
        assert_eq!(m.mer_span(), 10);
    }

    #[test]
    fn test_ordering() {
        let a: PackedMer<2> = mer("AAAAA");
        let b: PackedMer<2> = mer("AAAAC");
        let c: PackedMer<2> = mer("TTTTT");
        assert!(a < b && b < c && a < c);
        assert!(a <= a && a >= a);
        assert_eq!(a.cmp(&a), Ordering::Equal);
        assert!(c > a);
        assert!(a != b);
    }

    #[test]
    fn test_ordering_uses_high_word_first() {
        let mut lo = PackedMer::<2>::with_mer_size(64).unwrap();
        let mut hi = lo;
        lo.set_word(0, u64::MAX);
        hi.set_word(1, 1);
        assert!(lo < hi);
    }

    #[test]
    fn test_canonical() {
        let m: PackedMer<1> = mer("TTGCA");
        let canon = m.canonical();
        assert_eq!(canon.to_string(), "TGCAA");
        assert_eq!(canon, m.reverse_complemented().canonical());
    }

    #[test]
    fn test_smallest_largest() {
        let mut m = PackedMer::<2>::with_mer_size(35).unwrap();
        m.largest();
        assert_eq!(m.to_string(), "T".repeat(35));
        assert_eq!(m.word(1), 0b11_1111);
        m.smallest();
        assert_eq!(m.to_string(), "A".repeat(35));
    }

    #[test]
    fn test_get_set_bits() {
        let mut m = PackedMer::<2>::with_mer_size(64).unwrap();
        m.set_bits(50, 30, 0x2ABC_DEF1).unwrap();
        assert_eq!(m.get_bits(50, 30).unwrap(), 0x2ABC_DEF1);
        assert_eq!(
            m.set_bits(100, 30, 1),
            Err(CapacityError::BitRange { pos: 100, width: 30, words: 2 })
        );
        assert!(m.get_bits(128, 1).is_err());
    }

    #[test]
    fn test_start_end_of_mer() {
        let m: PackedMer<2> = mer("GATTACAGATTACAGATTACAGATTACAGATTACA");
        assert_eq!(m.start_of_mer(6), 0b10_00_11);
        assert_eq!(m.end_of_mer(6), 0b00_01_00);
    }

    #[test]
    fn test_symbol_access() {
        let mut m: PackedMer<1> = mer("AAAAA");
        assert_eq!(m.symbol(0), 0b00);
        m.set_symbol(2, 0b11);
        assert_eq!(m.to_string(), "AATAA");
        m.set_symbol(4, 0b10);
        assert_eq!(m.to_string(), "AATAG");
        assert_eq!(m.complement_symbol(4), 0b01);
    }

    #[test]
    fn test_fill_ascii_buffer() {
        let m: PackedMer<3> = mer(&"ACGT".repeat(16));
        let mut buf = [0u8; 70];
        let n = m.fill_ascii(&mut buf);
        assert_eq!(n, 64);
        assert_eq!(&buf[..64], "ACGT".repeat(16).as_bytes());
        assert_eq!(buf[64], 0);
    }

    #[test]
    fn test_scalar_view() {
        let m: PackedMer<2> = mer("CAT");
        assert_eq!(u64::from(m), 0b01_00_11);
    }
}
