//! Streaming k-mer extraction over a sequence
//!
//! [`MerStream`] slides a window across a byte sequence and yields every
//! k-mer made of valid bases together with its reverse complement. Both
//! strands are updated incrementally, one base per step:
//! - forward: append the new base at the low end, then mask the boundary
//! - reverse: drop the low base and insert the complement at the high end
//!
//! Any byte other than A/C/G/T (either case) restarts the window.

use crate::encoding::{complement_base, encode_base};
use crate::mer_size::CapacityError;
use crate::packed_mer::PackedMer;

/// One window position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamedMer<const N: usize> {
    /// Offset of the leftmost base in the sequence
    pub position: usize,
    /// The k-mer as read
    pub forward: PackedMer<N>,
    /// Its reverse complement
    pub reverse: PackedMer<N>,
}

impl<const N: usize> StreamedMer<N> {
    /// The smaller of the two strands
    #[inline]
    pub fn canonical(&self) -> PackedMer<N> {
        if self.reverse < self.forward {
            self.reverse
        } else {
            self.forward
        }
    }

    /// Whether the forward strand is the canonical one
    #[inline]
    pub fn is_forward_canonical(&self) -> bool {
        self.forward <= self.reverse
    }
}

/// Iterator over the k-mers of a sequence
pub struct MerStream<'a, const N: usize> {
    sequence: &'a [u8],
    k: usize,
    next_index: usize,
    valid_bases: usize,
    forward: PackedMer<N>,
    reverse: PackedMer<N>,
}

impl<'a, const N: usize> MerStream<'a, N> {
    /// Create a stream of `k`-mers over `sequence`
    ///
    /// # Errors
    /// Returns [`CapacityError::MerSize`] if `k` exceeds `PackedMer::<N>::CAPACITY`.
    pub fn new(sequence: &'a [u8], k: usize) -> Result<Self, CapacityError> {
        let empty = PackedMer::<N>::with_mer_size(k)?;
        Ok(Self {
            sequence,
            k,
            next_index: 0,
            valid_bases: 0,
            forward: empty,
            reverse: empty,
        })
    }

    /// K-mer size
    pub fn k(&self) -> usize {
        self.k
    }

    /// Restart the window, e.g. after an invalid base
    fn reset(&mut self) {
        self.valid_bases = 0;
        self.forward.clear();
        self.reverse.clear();
    }
}

impl<'a, const N: usize> Iterator for MerStream<'a, N> {
    type Item = StreamedMer<N>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.k == 0 {
            return None;
        }

        while self.next_index < self.sequence.len() {
            let base = self.sequence[self.next_index];
            self.next_index += 1;

            let Some(code) = encode_base(base) else {
                self.reset();
                continue;
            };

            self.forward.append_unmasked(code);
            self.forward.mask_boundary();
            self.reverse.insert_high(complement_base(code));
            self.valid_bases += 1;

            if self.valid_bases >= self.k {
                return Some(StreamedMer {
                    position: self.next_index - self.k,
                    forward: self.forward,
                    reverse: self.reverse,
                });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.sequence.len() - self.next_index;
        let upper = if self.k == 0 {
            0
        } else {
            (remaining + self.valid_bases.min(self.k - 1) + 1).saturating_sub(self.k)
        };
        (0, Some(upper))
    }
}
