//! Big-endian integer packing shared by the EBML encoder.
//!
//! Element IDs, vint size prefixes and unsigned payloads all reduce to "write
//! these bits, most significant first, left-padded to whole bytes". The
//! [`BitWriter`] below is that single primitive.

use thiserror::Error;

/// Widest representation the writer accepts, in bits.
pub const MAX_WIDTH_BITS: u32 = 64;

/// A value (or requested width) does not fit in [`MAX_WIDTH_BITS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("value {value} needs {bits} bits, maximum is {max_bits}")]
pub struct ValueTooLarge {
    pub value: u64,
    pub bits: u32,
    pub max_bits: u32,
}

/// Number of significant bits in `n` (0 for 0).
pub fn bit_length(n: u64) -> u32 {
    u64::BITS - n.leading_zeros()
}

/// MSB-first bit accumulator.
///
/// Fields are appended left to right; [`BitWriter::finish`] pads the front
/// with zero bits up to a whole number of bytes.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    acc: u64,
    len: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the low `width` bits of `value`.
    ///
    /// Fails if `value` has significant bits above `width` or the total
    /// would exceed [`MAX_WIDTH_BITS`].
    pub fn push(&mut self, value: u64, width: u32) -> Result<&mut Self, ValueTooLarge> {
        let needed = bit_length(value);
        let total = self.len + width;
        if needed > width || total > MAX_WIDTH_BITS {
            return Err(ValueTooLarge {
                value,
                bits: needed.max(total),
                max_bits: MAX_WIDTH_BITS,
            });
        }
        if width > 0 {
            // width may be 64 here only when acc is empty
            self.acc = self.acc.checked_shl(width).unwrap_or(0) | value;
            self.len = total;
        }
        Ok(self)
    }

    /// Bits written so far.
    pub fn bit_len(&self) -> u32 {
        self.len
    }

    /// Emit the accumulated bits as whole bytes, at least one byte.
    pub fn finish(&self) -> Vec<u8> {
        let byte_len = (self.len.div_ceil(8)).max(1) as usize;
        self.acc.to_be_bytes()[8 - byte_len..].to_vec()
    }
}

/// Shortest big-endian encoding of `n`; zero encodes as a single zero byte.
pub fn minimal_be_bytes(n: u64) -> Vec<u8> {
    let byte_len = (bit_length(n).div_ceil(8)).max(1) as usize;
    n.to_be_bytes()[8 - byte_len..].to_vec()
}

/// Encode `n` using at least `total_bits` bits, rounded up to whole bytes.
pub fn pack_bits(n: u64, total_bits: u32) -> Result<Vec<u8>, ValueTooLarge> {
    let width = bit_length(n).max(total_bits);
    let mut writer = BitWriter::new();
    writer.push(n, width)?;
    Ok(writer.finish())
}
