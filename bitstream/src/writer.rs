//! Bit-level writer for encoding packed binary data.

use crate::error::{BitError, BitResult};

/// A bit-level writer for encoding packed binary data.
///
/// Writes are accumulated in an internal buffer, most-significant bit first,
/// mirroring [`BitReader`](crate::BitReader). Call [`finish`](Self::finish)
/// to get the final byte buffer.
#[derive(Debug, Default)]
pub struct BitWriter {
    /// The accumulated bytes.
    bytes: Vec<u8>,
    /// Current byte being written (not yet pushed to bytes).
    current_byte: u8,
    /// Number of bits written to `current_byte` (0-7).
    bit_count: u8,
}

impl BitWriter {
    /// Creates a new empty `BitWriter`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `BitWriter` with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            current_byte: 0,
            bit_count: 0,
        }
    }

    /// Returns the number of bits written so far.
    #[must_use]
    pub fn bits_written(&self) -> usize {
        self.bytes.len() * 8 + self.bit_count as usize
    }

    /// Writes a single bit.
    pub fn write_bit(&mut self, value: bool) {
        self.current_byte = (self.current_byte << 1) | u8::from(value);
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.bytes.push(self.current_byte);
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    /// Writes up to 64 bits from an unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits > 64`.
    /// Returns [`BitError::ValueOutOfRange`] if `value` doesn't fit in `bits`.
    pub fn write_bits(&mut self, value: u64, bits: u8) -> BitResult<()> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount { bits, max_bits: 64 });
        }
        if bits == 0 {
            return Ok(());
        }
        if bits < 64 && value >= (1u64 << bits) {
            return Err(BitError::ValueOutOfRange { value, bits });
        }

        for i in (0..bits).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
        Ok(())
    }

    /// Writes a 32-bit IEEE-754 float at the current bit position.
    pub fn write_f32_bits(&mut self, value: f32) {
        // 32 bits always fit.
        let _ = self.write_bits(u64::from(value.to_bits()), 32);
    }

    /// Writes an unsigned bit-varint (see [`BitReader::read_ubitvar`](crate::BitReader::read_ubitvar)).
    pub fn write_ubitvar(&mut self, value: u32) {
        let low = u64::from(value & 0x0F);
        let high = u64::from(value >> 4);
        let (selector, ext_bits) = if value < 0x10 {
            (0x00, 0)
        } else if high < (1 << 4) {
            (0x10, 4)
        } else if high < (1 << 8) {
            (0x20, 8)
        } else {
            (0x30, 28)
        };
        if ext_bits == 0 {
            let _ = self.write_bits(u64::from(value), 6);
            return;
        }
        let _ = self.write_bits(selector | low, 6);
        let _ = self.write_bits(high, ext_bits);
    }

    /// Writes a LEB128 `u32` as 8-bit groups at the current bit position.
    pub fn write_bit_varu32(&mut self, mut value: u32) {
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            let _ = self.write_bits(u64::from(byte), 8);
            if value == 0 {
                break;
            }
        }
    }

    /// Writes a zigzag LEB128 `i32` as 8-bit groups at the current bit position.
    pub fn write_bit_vars32(&mut self, value: i32) {
        self.write_bit_varu32(zigzag_encode(value));
    }

    /// Writes raw bytes at the current bit position.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.bit_count == 0 {
            self.bytes.extend_from_slice(bytes);
            return;
        }
        for byte in bytes {
            let _ = self.write_bits(u64::from(*byte), 8);
        }
    }

    /// Pads with zero bits up to the next byte boundary.
    pub fn align_to_byte(&mut self) {
        while self.bit_count != 0 {
            self.write_bit(false);
        }
    }

    /// Writes a byte-aligned `u8`.
    pub fn write_u8_aligned(&mut self, value: u8) -> BitResult<()> {
        self.ensure_aligned()?;
        self.bytes.push(value);
        Ok(())
    }

    /// Writes a byte-aligned `u16` (little-endian).
    pub fn write_u16_aligned(&mut self, value: u16) -> BitResult<()> {
        self.ensure_aligned()?;
        self.bytes.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Writes a byte-aligned `u32` (little-endian).
    pub fn write_u32_aligned(&mut self, value: u32) -> BitResult<()> {
        self.ensure_aligned()?;
        self.bytes.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Writes a byte-aligned `u64` (little-endian).
    pub fn write_u64_aligned(&mut self, value: u64) -> BitResult<()> {
        self.ensure_aligned()?;
        self.bytes.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Writes a byte-aligned `f32` (little-endian IEEE-754).
    pub fn write_f32_aligned(&mut self, value: f32) -> BitResult<()> {
        self.ensure_aligned()?;
        self.bytes.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Writes a byte-aligned varint `u32`.
    pub fn write_varu32(&mut self, value: u32) -> BitResult<()> {
        self.ensure_aligned()?;
        self.write_bit_varu32(value);
        Ok(())
    }

    /// Writes a byte-aligned zigzag varint `i32`.
    pub fn write_vars32(&mut self, value: i32) -> BitResult<()> {
        self.write_varu32(zigzag_encode(value))
    }

    /// Writes a byte-aligned, varint length-prefixed byte span.
    pub fn write_len_prefixed_aligned(&mut self, bytes: &[u8]) -> BitResult<()> {
        let len = u32::try_from(bytes.len()).map_err(|_| BitError::ValueOutOfRange {
            value: bytes.len() as u64,
            bits: 32,
        })?;
        self.write_varu32(len)?;
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }

    /// Finishes writing and returns the byte buffer.
    ///
    /// If the last byte is incomplete, it is padded with zeros on the right.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        if self.bit_count > 0 {
            self.current_byte <<= 8 - self.bit_count;
            self.bytes.push(self.current_byte);
        }
        self.bytes
    }

    fn ensure_aligned(&self) -> BitResult<()> {
        if self.bit_count != 0 {
            return Err(BitError::MisalignedAccess {
                bit_position: self.bits_written(),
            });
        }
        Ok(())
    }
}

#[allow(clippy::cast_sign_loss)]
const fn zigzag_encode(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}
