// packmer: fixed-capacity multi-word packed k-mers
//
// Two bits per base across an array of 64-bit words, with the shift, mask,
// reverse-complement, bit-range and bit-stream operations k-mer indexing
// and counting pipelines are built on.

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod bitstream;
pub mod config;
pub mod constants;
pub mod counter;
pub mod encoding;
pub mod hasher;
pub mod mer_size;
pub mod mer_stream;
pub mod packed_mer;
pub mod serialization;
mod word_ops;

// Re-export common types at crate root
pub use bitstream::{BitPackedReader, BitPackedWriter, BitSink, BitSource};
pub use config::CountConfiguration;
pub use counter::{count_mers, CountStatistics, MerCounts};
pub use encoding::EncodingError;
pub use hasher::MerHasher;
pub use mer_size::{CapacityError, MerGeometry};
pub use mer_stream::{MerStream, StreamedMer};
pub use packed_mer::PackedMer;
pub use serialization::{read_mer_file, write_mer_file, MerFileHeader};

/// Single-word k-mer (up to 32 bases)
pub type PackedMer1 = PackedMer<1>;
/// Two-word k-mer (up to 64 bases)
pub type PackedMer2 = PackedMer<2>;
/// Four-word k-mer (up to 128 bases)
pub type PackedMer4 = PackedMer<4>;

/// Run `$body` with `$n` bound to a const word count able to hold `$k` bases
///
/// Word counts are rounded up to 1, 2, 4 or 8. For larger `$k` the
/// `else` expression is evaluated instead.
///
/// ```
/// use packmer_lib::{dispatch_on_words, PackedMer};
///
/// fn width<const N: usize>() -> usize {
///     PackedMer::<N>::CAPACITY
/// }
///
/// let capacity = dispatch_on_words!(70, N => width::<N>(), else => 0);
/// assert_eq!(capacity, 128);
/// ```
#[macro_export]
macro_rules! dispatch_on_words {
    ($k:expr, $n:ident => $body:expr, else => $fallback:expr) => {{
        match $crate::constants::dispatch_words_for($k) {
            Some(1) => {
                const $n: usize = 1;
                $body
            }
            Some(2) => {
                const $n: usize = 2;
                $body
            }
            Some(4) => {
                const $n: usize = 4;
                $body
            }
            Some(8) => {
                const $n: usize = 8;
                $body
            }
            _ => $fallback,
        }
    }};
}

/// Version information
pub fn version() -> (u8, u8, u8) {
    constants::VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let (major, minor, patch) = version();
        assert_eq!(major, 0);
        assert_eq!(minor, 1);
        assert_eq!(patch, 0);
    }

    fn capacity_of<const N: usize>() -> usize {
        PackedMer::<N>::CAPACITY
    }

    #[test]
    fn test_dispatch_on_words() {
        assert_eq!(dispatch_on_words!(21, N => capacity_of::<N>(), else => 0), 32);
        assert_eq!(dispatch_on_words!(33, N => capacity_of::<N>(), else => 0), 64);
        assert_eq!(dispatch_on_words!(100, N => capacity_of::<N>(), else => 0), 128);
        assert_eq!(dispatch_on_words!(256, N => capacity_of::<N>(), else => 0), 256);
        assert_eq!(dispatch_on_words!(257, N => capacity_of::<N>(), else => 0), 0);
    }
}
