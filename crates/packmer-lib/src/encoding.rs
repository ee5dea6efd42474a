//! DNA nucleotide encoding
//!
//! Two bits per base, in alphabetical order so that numeric order of packed
//! values matches lexicographic order of their strings:
//! - A (65/97)  -> 00
//! - C (67/99)  -> 01
//! - G (71/103) -> 10
//! - T (84/116) -> 11
//!
//! With this table the complement of a base is its bitwise NOT within two
//! bits, which the multi-word reverse complement relies on.

use thiserror::Error;

/// Code-to-letter table
pub const BITS_TO_LETTER: [u8; 4] = *b"ACGT";

/// Error type for encoding operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The input byte is not a valid DNA base (A/C/G/T)
    #[error("Invalid DNA base {base:?} at position {position}")]
    InvalidBase {
        /// Offending byte
        base: u8,
        /// Position of the byte in the input
        position: usize,
    },
    /// The input does not fit in the value's capacity
    #[error(transparent)]
    Capacity(#[from] crate::mer_size::CapacityError),
}

/// Encode a single DNA nucleotide to 2 bits, `None` for anything but ACGT
#[inline]
pub const fn encode_base(base: u8) -> Option<u8> {
    match base {
        b'A' | b'a' => Some(0b00),
        b'C' | b'c' => Some(0b01),
        b'G' | b'g' => Some(0b10),
        b'T' | b't' => Some(0b11),
        _ => None,
    }
}

/// Decode a 2-bit value to DNA nucleotide (uppercase)
#[inline]
pub const fn decode_base(bits: u8) -> u8 {
    BITS_TO_LETTER[(bits & 0b11) as usize]
}

/// Get the complement of a DNA base (encoded)
#[inline]
pub const fn complement_base(bits: u8) -> u8 {
    !bits & 0b11
}
