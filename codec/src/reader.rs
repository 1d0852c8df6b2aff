//! Bit reader that reports failures at absolute file offsets.

use bitstream::{BitError, BitReader};

use crate::error::{CodecError, CodecResult};

/// A [`BitReader`] over entity data that knows where its bytes live in the
/// file.
#[derive(Debug, Clone)]
pub struct DataReader<'a> {
    bits: BitReader<'a>,
    base_offset: usize,
}

impl<'a> DataReader<'a> {
    /// Creates a reader over `data`, which starts at `base_offset` in the file.
    #[must_use]
    pub const fn new(data: &'a [u8], base_offset: usize) -> Self {
        Self {
            bits: BitReader::new(data),
            base_offset,
        }
    }

    /// Absolute offset of the byte holding the next unread bit.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.base_offset + self.bits.byte_position()
    }

    #[must_use]
    pub const fn bits_remaining(&self) -> usize {
        self.bits.bits_remaining()
    }

    fn wrap<T>(&self, result: Result<T, BitError>, offset: usize) -> CodecResult<T> {
        result.map_err(|error| CodecError::Bitstream { error, offset })
    }

    pub fn read_bit(&mut self) -> CodecResult<bool> {
        let offset = self.offset();
        let result = self.bits.read_bit();
        self.wrap(result, offset)
    }

    pub fn read_bits(&mut self, bits: u8) -> CodecResult<u64> {
        let offset = self.offset();
        let result = self.bits.read_bits(bits);
        self.wrap(result, offset)
    }

    pub fn skip_bits(&mut self, bits: usize) -> CodecResult<()> {
        let offset = self.offset();
        let result = self.bits.skip_bits(bits);
        self.wrap(result, offset)
    }

    pub fn read_f32(&mut self) -> CodecResult<f32> {
        let offset = self.offset();
        let result = self.bits.read_f32_bits();
        self.wrap(result, offset)
    }

    pub fn read_ubitvar(&mut self) -> CodecResult<u32> {
        let offset = self.offset();
        let result = self.bits.read_ubitvar();
        self.wrap(result, offset)
    }

    pub fn read_varu32(&mut self) -> CodecResult<u32> {
        let offset = self.offset();
        let result = self.bits.read_bit_varu32();
        self.wrap(result, offset)
    }

    pub fn read_vars32(&mut self) -> CodecResult<i32> {
        let offset = self.offset();
        let result = self.bits.read_bit_vars32();
        self.wrap(result, offset)
    }

    pub fn skip_varu32(&mut self) -> CodecResult<()> {
        let offset = self.offset();
        let result = self.bits.skip_bit_varu32();
        self.wrap(result, offset)
    }

    pub fn read_bytes_into(&mut self, len: usize, out: &mut Vec<u8>) -> CodecResult<()> {
        let offset = self.offset();
        let result = self.bits.read_bytes_into(len, out);
        self.wrap(result, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eof_reports_base_plus_position() {
        let data = [0xFFu8, 0x00];
        let mut reader = DataReader::new(&data, 500);
        reader.read_bits(12).unwrap();
        assert_eq!(reader.offset(), 501);
        let err = reader.read_bits(8).unwrap_err();
        assert_eq!(err.offset(), 501);
        assert!(err.is_truncation());
    }
}
