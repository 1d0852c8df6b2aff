//! Bit-level reader with bounded operations.

use crate::error::{BitError, BitResult};

/// Maximum number of bytes in an encoded `u32` varint.
pub const VARINT32_MAX_BYTES: usize = 5;

/// A bit-level reader for decoding packed binary data.
///
/// Bits are consumed most-significant first within each byte. All read
/// operations are bounds-checked and return errors on failure; the reader
/// never panics on malformed input and never copies the underlying buffer.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a new `BitReader` from a byte slice.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Returns the number of bits remaining to read.
    #[must_use]
    pub const fn bits_remaining(&self) -> usize {
        self.data
            .len()
            .saturating_mul(8)
            .saturating_sub(self.bit_pos)
    }

    /// Returns the number of whole bytes remaining after the current position.
    #[must_use]
    pub const fn bytes_remaining(&self) -> usize {
        self.bits_remaining() / 8
    }

    /// Returns `true` if there are no more bits to read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits_remaining() == 0
    }

    /// Returns the current bit position.
    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.bit_pos
    }

    /// Returns the index of the byte containing the next unread bit.
    #[must_use]
    pub const fn byte_position(&self) -> usize {
        self.bit_pos / 8
    }

    /// Returns `true` if the reader sits on a byte boundary.
    #[must_use]
    pub const fn is_aligned(&self) -> bool {
        self.bit_pos % 8 == 0
    }

    /// Reads a single bit as a boolean.
    pub fn read_bit(&mut self) -> BitResult<bool> {
        self.ensure_bits(1)?;
        let byte_idx = self.bit_pos / 8;
        let bit_idx = self.bit_pos % 8;
        let bit = (self.data[byte_idx] >> (7 - bit_idx)) & 1;
        self.bit_pos += 1;
        Ok(bit == 1)
    }

    /// Reads up to 64 bits as an unsigned integer.
    pub fn read_bits(&mut self, bits: u8) -> BitResult<u64> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount { bits, max_bits: 64 });
        }
        if bits == 0 {
            return Ok(0);
        }
        self.ensure_bits(bits as usize)?;

        let mut value = 0u64;
        let mut left = bits as usize;
        while left > 0 {
            let byte_idx = self.bit_pos / 8;
            let offset = self.bit_pos % 8;
            let take = (8 - offset).min(left);
            let shifted = self.data[byte_idx] >> (8 - offset - take);
            let chunk = u64::from(shifted) & ((1u64 << take) - 1);
            value = (value << take) | chunk;
            self.bit_pos += take;
            left -= take;
        }
        Ok(value)
    }

    /// Advances the cursor by `bits` without materializing them.
    pub fn skip_bits(&mut self, bits: usize) -> BitResult<()> {
        self.ensure_bits(bits)?;
        self.bit_pos += bits;
        Ok(())
    }

    /// Reads a 32-bit IEEE-754 float packed at any bit position.
    pub fn read_f32_bits(&mut self) -> BitResult<f32> {
        let raw = self.read_bits(32)? as u32;
        Ok(f32::from_bits(raw))
    }

    /// Reads an unsigned bit-varint.
    ///
    /// The encoding is a 6-bit head whose top two bits select how many
    /// extension bits follow (0, 4, 8 or 28).
    pub fn read_ubitvar(&mut self) -> BitResult<u32> {
        let head = self.read_bits(6)? as u32;
        let low = head & 0x0F;
        let ext = match head & 0x30 {
            0x10 => self.read_bits(4)?,
            0x20 => self.read_bits(8)?,
            0x30 => self.read_bits(28)?,
            _ => return Ok(head),
        };
        Ok(low | ((ext as u32) << 4))
    }

    /// Skips an unsigned bit-varint.
    pub fn skip_ubitvar(&mut self) -> BitResult<()> {
        let head = self.read_bits(6)?;
        let ext = match head & 0x30 {
            0x10 => 4,
            0x20 => 8,
            0x30 => 28,
            _ => 0,
        };
        self.skip_bits(ext)
    }

    /// Reads a LEB128 `u32` from 8-bit groups at any bit position.
    pub fn read_bit_varu32(&mut self) -> BitResult<u32> {
        let mut result = 0u32;
        for shift in (0..35).step_by(7) {
            let byte = self.read_bits(8)? as u8;
            result |= u32::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(BitError::InvalidVarint)
    }

    /// Reads a zigzag LEB128 `i32` from 8-bit groups at any bit position.
    pub fn read_bit_vars32(&mut self) -> BitResult<i32> {
        let value = self.read_bit_varu32()?;
        Ok(zigzag_decode(value))
    }

    /// Skips a LEB128 varint at any bit position.
    pub fn skip_bit_varu32(&mut self) -> BitResult<()> {
        for _ in 0..VARINT32_MAX_BYTES {
            let byte = self.read_bits(8)?;
            if byte & 0x80 == 0 {
                return Ok(());
            }
        }
        Err(BitError::InvalidVarint)
    }

    /// Reads `len` bytes at any bit position into `out`.
    ///
    /// When the reader is byte-aligned this is a single slice copy.
    pub fn read_bytes_into(&mut self, len: usize, out: &mut Vec<u8>) -> BitResult<()> {
        self.ensure_bits(len.saturating_mul(8))?;
        if self.is_aligned() {
            let idx = self.bit_pos / 8;
            out.extend_from_slice(&self.data[idx..idx + len]);
            self.bit_pos += len * 8;
            return Ok(());
        }
        out.reserve(len);
        for _ in 0..len {
            out.push(self.read_bits(8)? as u8);
        }
        Ok(())
    }

    /// Aligns to the next byte boundary.
    pub fn align_to_byte(&mut self) -> BitResult<()> {
        let rem = self.bit_pos % 8;
        if rem == 0 {
            return Ok(());
        }
        self.skip_bits(8 - rem)
    }

    /// Reads a byte-aligned `u8`.
    pub fn read_u8_aligned(&mut self) -> BitResult<u8> {
        self.ensure_aligned()?;
        self.ensure_bits(8)?;
        let idx = self.bit_pos / 8;
        let value = self.data[idx];
        self.bit_pos += 8;
        Ok(value)
    }

    /// Reads a byte-aligned `u16` (little-endian).
    pub fn read_u16_aligned(&mut self) -> BitResult<u16> {
        let bytes = self.read_aligned_bytes::<2>()?;
        Ok(u16::from_le_bytes(bytes))
    }

    /// Reads a byte-aligned `u32` (little-endian).
    pub fn read_u32_aligned(&mut self) -> BitResult<u32> {
        let bytes = self.read_aligned_bytes::<4>()?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Reads a byte-aligned `u64` (little-endian).
    pub fn read_u64_aligned(&mut self) -> BitResult<u64> {
        let bytes = self.read_aligned_bytes::<8>()?;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Reads a byte-aligned `f32` (little-endian IEEE-754).
    pub fn read_f32_aligned(&mut self) -> BitResult<f32> {
        let bytes = self.read_aligned_bytes::<4>()?;
        Ok(f32::from_le_bytes(bytes))
    }

    /// Reads a byte-aligned varint `u32`.
    pub fn read_varu32(&mut self) -> BitResult<u32> {
        self.ensure_aligned()?;
        let mut result = 0u32;
        for shift in (0..35).step_by(7) {
            let byte = self.read_u8_aligned()?;
            result |= u32::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(BitError::InvalidVarint)
    }

    /// Reads a byte-aligned zigzag varint `i32`.
    pub fn read_vars32(&mut self) -> BitResult<i32> {
        let value = self.read_varu32()?;
        Ok(zigzag_decode(value))
    }

    /// Borrows `len` byte-aligned bytes from the underlying buffer.
    pub fn read_bytes_aligned(&mut self, len: usize) -> BitResult<&'a [u8]> {
        self.ensure_aligned()?;
        self.ensure_bits(len.saturating_mul(8))?;
        let idx = self.bit_pos / 8;
        let data: &'a [u8] = self.data;
        self.bit_pos += len * 8;
        Ok(&data[idx..idx + len])
    }

    /// Borrows a byte-aligned, varint length-prefixed byte span.
    pub fn read_len_prefixed_aligned(&mut self) -> BitResult<&'a [u8]> {
        let len = self.read_varu32()? as usize;
        self.read_bytes_aligned(len)
    }

    /// Borrows everything after the current (aligned) position.
    pub fn read_rest_aligned(&mut self) -> BitResult<&'a [u8]> {
        let len = self.bytes_remaining();
        self.read_bytes_aligned(len)
    }

    fn ensure_aligned(&self) -> BitResult<()> {
        if !self.is_aligned() {
            return Err(BitError::MisalignedAccess {
                bit_position: self.bit_pos,
            });
        }
        Ok(())
    }

    fn ensure_bits(&self, bits: usize) -> BitResult<()> {
        let available = self.bits_remaining();
        if bits > available {
            return Err(BitError::UnexpectedEof {
                requested: bits,
                available,
            });
        }
        Ok(())
    }

    fn read_aligned_bytes<const N: usize>(&mut self) -> BitResult<[u8; N]> {
        self.ensure_aligned()?;
        self.ensure_bits(N * 8)?;
        let idx = self.bit_pos / 8;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[idx..idx + N]);
        self.bit_pos += N * 8;
        Ok(out)
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn zigzag_decode(value: u32) -> i32 {
    ((value >> 1) as i32) ^ (-((value & 1) as i32))
}
