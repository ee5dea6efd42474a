//! Serialization of packed k-mers
//!
//! # Bit-stream layout of one value
//!
//! For a width of `w` bits (default `2 * mer_size`), the most-significant
//! word goes first: the partial top word contributes its low `w % 64` bits,
//! then every full word follows from high to low at 64 bits each. When `w`
//! is a multiple of 64 one extra holder word is written above the window.
//! Holder words past the end of the array are written as zero and skipped
//! on read.
//!
//! # Mer file format
//!
//! ```text
//! MerFileHeader (byte aligned, little endian)
//!   ├─ magic: "PKMER001"
//!   ├─ version_major: u32
//!   ├─ version_minor: u32
//!   ├─ words: u32
//!   ├─ mer_size: u64
//!   ├─ count: u64
//!   └─ with_counts: u8
//! Records (bit packed, `count` entries):
//!   ├─ k-mer bits (layout above)
//!   └─ abundance: 64 bits (only when with_counts)
//! ```

use crate::bitstream::{BitPackedReader, BitPackedWriter, BitSink, BitSource};
use crate::constants::WORD_BITS;
use crate::packed_mer::PackedMer;
use std::io::{self, Read, Write};
use tracing::{debug, info};

/// Magic bytes for the mer file format
const MAGIC: &[u8; 8] = b"PKMER001";

/// File format version: (major, minor)
/// Increment major on breaking changes, minor on compatible changes
const FORMAT_VERSION: (u32, u32) = (1, 0);

/// Word index just above the last word written for a `width`-bit value,
/// and the number of bits taken from the partial word
#[inline]
fn stream_layout(width: usize) -> (usize, u32) {
    let partial = (width % WORD_BITS) as u32;
    let mut last_word = width / WORD_BITS;
    if partial == 0 {
        last_word += 1;
    }
    (last_word, partial)
}

impl<const N: usize> PackedMer<N> {
    fn check_stream_width(width: usize) -> io::Result<()> {
        if width > N * WORD_BITS {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot stream {} bits from a {}-word k-mer", width, N),
            ));
        }
        Ok(())
    }

    /// Write the value to a bit stream
    ///
    /// `width` defaults to `2 * mer_size`. The value should be masked.
    ///
    /// # Errors
    /// Fails if `width` exceeds the capacity, or if the sink fails.
    pub fn write_bits<S: BitSink + ?Sized>(&self, sink: &mut S, width: Option<usize>) -> io::Result<()> {
        let width = width.unwrap_or(self.geometry().num_bits());
        Self::check_stream_width(width)?;

        let word_or_zero = |i: usize| self.words().get(i).copied().unwrap_or(0);
        let (mut last_word, partial) = stream_layout(width);

        if partial > 0 {
            sink.put_bits(word_or_zero(last_word), partial)?;
        }
        while last_word > 0 {
            last_word -= 1;
            sink.put_bits(word_or_zero(last_word), WORD_BITS as u32)?;
        }
        Ok(())
    }

    /// Read the value back from a bit stream, replacing all words
    ///
    /// The mer size must already be set; `width` defaults to `2 * mer_size`
    /// and must match the width used when writing.
    ///
    /// # Errors
    /// Fails if `width` exceeds the capacity, or if the source fails.
    pub fn read_bits<S: BitSource + ?Sized>(&mut self, source: &mut S, width: Option<usize>) -> io::Result<()> {
        let width = width.unwrap_or(self.geometry().num_bits());
        Self::check_stream_width(width)?;

        self.clear();
        let (mut last_word, partial) = stream_layout(width);

        if partial > 0 {
            let value = source.get_bits(partial)?;
            self.set_word(last_word, value);
        }
        while last_word > 0 {
            last_word -= 1;
            let value = source.get_bits(WORD_BITS as u32)?;
            if last_word < N {
                self.set_word(last_word, value);
            }
        }
        Ok(())
    }
}

/// Header of a mer file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerFileHeader {
    /// Magic number for format identification ("PKMER001")
    pub magic: [u8; 8],
    /// Format version major number
    pub version_major: u32,
    /// Format version minor number
    pub version_minor: u32,
    /// Word count of the values that wrote the file
    pub words: u32,
    /// K-mer size
    pub mer_size: u64,
    /// Number of records
    pub count: u64,
    /// Whether each record carries a 64-bit abundance
    pub with_counts: bool,
}

impl MerFileHeader {
    /// Create a new header
    pub fn new(words: u32, mer_size: u64, count: u64, with_counts: bool) -> Self {
        Self {
            magic: *MAGIC,
            version_major: FORMAT_VERSION.0,
            version_minor: FORMAT_VERSION.1,
            words,
            mer_size,
            count,
            with_counts,
        }
    }

    /// Write header to a writer
    pub fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_all(&self.version_major.to_le_bytes())?;
        writer.write_all(&self.version_minor.to_le_bytes())?;
        writer.write_all(&self.words.to_le_bytes())?;
        writer.write_all(&self.mer_size.to_le_bytes())?;
        writer.write_all(&self.count.to_le_bytes())?;
        writer.write_all(&[self.with_counts as u8])?;
        Ok(())
    }

    /// Read header from a reader
    pub fn read(reader: &mut dyn Read) -> io::Result<Self> {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;

        if &magic != MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Invalid magic number for mer file",
            ));
        }

        let mut u32_bytes = [0u8; 4];
        let mut u64_bytes = [0u8; 8];
        let mut flag = [0u8; 1];

        reader.read_exact(&mut u32_bytes)?;
        let version_major = u32::from_le_bytes(u32_bytes);
        reader.read_exact(&mut u32_bytes)?;
        let version_minor = u32::from_le_bytes(u32_bytes);

        if version_major != FORMAT_VERSION.0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Incompatible format version: {}.{}, expected {}.{}",
                    version_major, version_minor, FORMAT_VERSION.0, FORMAT_VERSION.1
                ),
            ));
        }

        reader.read_exact(&mut u32_bytes)?;
        let words = u32::from_le_bytes(u32_bytes);
        reader.read_exact(&mut u64_bytes)?;
        let mer_size = u64::from_le_bytes(u64_bytes);
        reader.read_exact(&mut u64_bytes)?;
        let count = u64::from_le_bytes(u64_bytes);
        reader.read_exact(&mut flag)?;

        Ok(Self {
            magic,
            version_major,
            version_minor,
            words,
            mer_size,
            count,
            with_counts: flag[0] != 0,
        })
    }
}

/// Write records to a mer file
///
/// All records must share `mer_size`. With `with_counts`, the abundance of
/// each record is stored after its bits; otherwise it is dropped.
pub fn write_mer_file<W: Write, const N: usize>(
    writer: W,
    mer_size: usize,
    records: &[(PackedMer<N>, u64)],
    with_counts: bool,
) -> io::Result<W> {
    let mut writer = writer;
    let header = MerFileHeader::new(N as u32, mer_size as u64, records.len() as u64, with_counts);
    header.write(&mut writer)?;

    let width = 2 * mer_size;
    let mut bits = BitPackedWriter::new(writer);
    for (mer, count) in records {
        if mer.mer_size() != mer_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("record of size {} in a file of {}-mers", mer.mer_size(), mer_size),
            ));
        }
        mer.write_bits(&mut bits, Some(width))?;
        if with_counts {
            bits.put_bits(*count, 64)?;
        }
    }
    debug!("Wrote {} bits of records", bits.bits_written());
    info!("Wrote {} {}-mers", records.len(), mer_size);
    bits.finish()
}

/// Read a whole mer file
///
/// Records without stored abundances get a count of 1.
///
/// # Errors
/// Fails on a bad header, on a mer size larger than `PackedMer<N>` holds,
/// or on a truncated file.
pub fn read_mer_file<R: Read, const N: usize>(
    reader: R,
) -> io::Result<(MerFileHeader, Vec<(PackedMer<N>, u64)>)> {
    let mut reader = reader;
    let header = MerFileHeader::read(&mut reader)?;
    let mer_size = header.mer_size as usize;

    let template = PackedMer::<N>::with_mer_size(mer_size)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let mut bits = BitPackedReader::new(reader);
    let mut records = Vec::with_capacity(header.count.min(1 << 20) as usize);
    for _ in 0..header.count {
        let mut mer = template;
        mer.read_bits(&mut bits, None)?;
        let count = if header.with_counts { bits.get_bits(64)? } else { 1 };
        records.push((mer, count));
    }
    info!("Read {} {}-mers", records.len(), mer_size);
    Ok((header, records))
}
