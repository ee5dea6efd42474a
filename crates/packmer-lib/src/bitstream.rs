//! Bit-packed streams
//!
//! Values of 0 to 64 bits are packed back to back, most-significant bit
//! first, into a byte stream. [`BitSink`] and [`BitSource`] are the narrow
//! interface the codec serializes through; [`BitPackedWriter`] and
//! [`BitPackedReader`] implement them over any [`Write`] / [`Read`].

use crate::constants::low_mask;
use std::io::{self, Read, Write};

/// Destination for bit-packed values
pub trait BitSink {
    /// Append the low `width` bits of `value` (`width <= 64`)
    fn put_bits(&mut self, value: u64, width: u32) -> io::Result<()>;
}

/// Source of bit-packed values
pub trait BitSource {
    /// Consume the next `width` bits (`width <= 64`)
    fn get_bits(&mut self, width: u32) -> io::Result<u64>;
}

fn check_width(width: u32) -> io::Result<()> {
    if width > 64 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("bit width {} larger than 64", width),
        ));
    }
    Ok(())
}

/// Packs bits MSB-first into an underlying writer
///
/// Call [`finish`](Self::finish) to pad the last byte and flush; dropping the
/// writer without it loses up to seven pending bits.
pub struct BitPackedWriter<W: Write> {
    inner: W,
    pending: u128,
    pending_bits: u32,
    bits_written: u64,
}

impl<W: Write> BitPackedWriter<W> {
    /// Wrap a writer
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            pending: 0,
            pending_bits: 0,
            bits_written: 0,
        }
    }

    /// Total bits accepted so far, padding excluded
    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    /// Pad the final partial byte with zeros, flush, and return the writer
    pub fn finish(mut self) -> io::Result<W> {
        if self.pending_bits > 0 {
            let byte = (self.pending << (8 - self.pending_bits)) as u8;
            self.inner.write_all(&[byte])?;
            self.pending = 0;
            self.pending_bits = 0;
        }
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> BitSink for BitPackedWriter<W> {
    fn put_bits(&mut self, value: u64, width: u32) -> io::Result<()> {
        check_width(width)?;
        if width == 0 {
            return Ok(());
        }

        // at most 7 bits are pending between calls, so 71 fit in the u128
        self.pending = (self.pending << width) | (value & low_mask(width)) as u128;
        self.pending_bits += width;
        self.bits_written += width as u64;

        let mut bytes = [0u8; 9];
        let mut n = 0;
        while self.pending_bits >= 8 {
            self.pending_bits -= 8;
            bytes[n] = (self.pending >> self.pending_bits) as u8;
            n += 1;
        }
        self.pending &= (1u128 << self.pending_bits) - 1;
        self.inner.write_all(&bytes[..n])
    }
}

/// Unpacks MSB-first bits from an underlying reader
pub struct BitPackedReader<R: Read> {
    inner: R,
    pending: u128,
    pending_bits: u32,
    bits_read: u64,
}

impl<R: Read> BitPackedReader<R> {
    /// Wrap a reader
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending: 0,
            pending_bits: 0,
            bits_read: 0,
        }
    }

    /// Total bits handed out so far
    pub fn bits_read(&self) -> u64 {
        self.bits_read
    }

    /// Return the underlying reader; buffered bits are discarded
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> BitSource for BitPackedReader<R> {
    fn get_bits(&mut self, width: u32) -> io::Result<u64> {
        check_width(width)?;
        if width == 0 {
            return Ok(0);
        }

        while self.pending_bits < width {
            let mut byte = [0u8; 1];
            self.inner.read_exact(&mut byte)?;
            self.pending = (self.pending << 8) | byte[0] as u128;
            self.pending_bits += 8;
        }

        self.pending_bits -= width;
        let value = (self.pending >> self.pending_bits) as u64 & low_mask(width);
        self.pending &= (1u128 << self.pending_bits) - 1;
        self.bits_read += width as u64;
        Ok(value)
    }
}
