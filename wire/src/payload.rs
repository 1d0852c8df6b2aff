//! Byte-aligned payload cursor shared by every payload decoder.
//!
//! Frame payloads and message bodies are byte-aligned; only entity data is
//! bit-packed. [`PayloadReader`] wraps a [`BitReader`] that never leaves a byte
//! boundary and translates failures into [`DecodeError`]s carrying absolute
//! file offsets.

use bitstream::{BitReader, BitWriter};

use crate::error::{DecodeError, EncodeError, WireResult};

/// Forward-only reader over a byte-aligned payload.
#[derive(Debug, Clone)]
pub struct PayloadReader<'a> {
    inner: BitReader<'a>,
    base_offset: usize,
}

impl<'a> PayloadReader<'a> {
    /// Creates a reader over `data`, which starts at `base_offset` in the file.
    #[must_use]
    pub const fn new(data: &'a [u8], base_offset: usize) -> Self {
        Self {
            inner: BitReader::new(data),
            base_offset,
        }
    }

    /// Absolute offset of the next unread byte.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.base_offset + self.inner.byte_position()
    }

    /// Bytes left in the payload.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.inner.bytes_remaining()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn read_u8(&mut self) -> WireResult<u8> {
        let offset = self.offset();
        self.inner
            .read_u8_aligned()
            .map_err(|e| DecodeError::from_bits(&e, offset))
    }

    pub fn read_i16(&mut self) -> WireResult<i16> {
        let bytes = self.read_bytes(2)?;
        Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> WireResult<u32> {
        let offset = self.offset();
        self.inner
            .read_u32_aligned()
            .map_err(|e| DecodeError::from_bits(&e, offset))
    }

    pub fn read_u64(&mut self) -> WireResult<u64> {
        let offset = self.offset();
        self.inner
            .read_u64_aligned()
            .map_err(|e| DecodeError::from_bits(&e, offset))
    }

    pub fn read_f32(&mut self) -> WireResult<f32> {
        let offset = self.offset();
        self.inner
            .read_f32_aligned()
            .map_err(|e| DecodeError::from_bits(&e, offset))
    }

    pub fn read_varu32(&mut self) -> WireResult<u32> {
        let offset = self.offset();
        self.inner
            .read_varu32()
            .map_err(|e| DecodeError::from_bits(&e, offset))
    }

    pub fn read_vars32(&mut self) -> WireResult<i32> {
        let offset = self.offset();
        self.inner
            .read_vars32()
            .map_err(|e| DecodeError::from_bits(&e, offset))
    }

    /// Borrows `len` bytes from the payload.
    pub fn read_bytes(&mut self, len: usize) -> WireResult<&'a [u8]> {
        let offset = self.offset();
        self.inner
            .read_bytes_aligned(len)
            .map_err(|e| DecodeError::from_bits(&e, offset))
    }

    /// Reads a varint length-prefixed string, replacing invalid UTF-8.
    pub fn read_string(&mut self) -> WireResult<String> {
        let offset = self.offset();
        let bytes = self
            .inner
            .read_len_prefixed_aligned()
            .map_err(|e| DecodeError::from_bits(&e, offset))?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Skips a varint length-prefixed string without decoding it.
    pub fn skip_string(&mut self) -> WireResult<()> {
        let offset = self.offset();
        self.inner
            .read_len_prefixed_aligned()
            .map(|_| ())
            .map_err(|e| DecodeError::from_bits(&e, offset))
    }

    /// Borrows everything that is left.
    pub fn read_rest(&mut self) -> &'a [u8] {
        // Always aligned, and the whole remainder is in bounds.
        self.inner.read_rest_aligned().unwrap_or_default()
    }
}

/// Byte-aligned payload writer, the encoding mirror of [`PayloadReader`].
#[derive(Debug, Default)]
pub struct PayloadWriter {
    bytes: Vec<u8>,
}

impl PayloadWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_varu32(&mut self, value: u32) {
        let mut writer = BitWriter::new();
        writer.write_bit_varu32(value);
        self.bytes.extend_from_slice(&writer.finish());
    }

    pub fn write_vars32(&mut self, value: i32) {
        let mut writer = BitWriter::new();
        writer.write_bit_vars32(value);
        self.bytes.extend_from_slice(&writer.finish());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Writes a varint length prefix followed by the bytes.
    pub fn write_len_prefixed(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        let len = u32::try_from(bytes.len()).map_err(|_| EncodeError::LengthOverflow {
            length: bytes.len(),
        })?;
        self.write_varu32(len);
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }

    pub fn write_string(&mut self, value: &str) -> Result<(), EncodeError> {
        self.write_len_prefixed(value.as_bytes())
    }

    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_fields_roundtrip() {
        let mut w = PayloadWriter::new();
        w.write_varu32(300);
        w.write_vars32(-5);
        w.write_string("de_dust2").unwrap();
        w.write_i16(-2);
        w.write_u64(76_561_198_000_000_001);
        w.write_f32(1.5);
        let bytes = w.finish();

        let mut r = PayloadReader::new(&bytes, 100);
        assert_eq!(r.read_varu32().unwrap(), 300);
        assert_eq!(r.read_vars32().unwrap(), -5);
        assert_eq!(r.read_string().unwrap(), "de_dust2");
        assert_eq!(r.read_i16().unwrap(), -2);
        assert_eq!(r.read_u64().unwrap(), 76_561_198_000_000_001);
        assert!((r.read_f32().unwrap() - 1.5).abs() < f32::EPSILON);
        assert!(r.is_empty());
        assert_eq!(r.offset(), 100 + bytes.len());
    }

    #[test]
    fn truncation_reports_absolute_offset() {
        let mut w = PayloadWriter::new();
        w.write_varu32(10);
        w.write_bytes(b"abc");
        let bytes = w.finish();

        let mut r = PayloadReader::new(&bytes, 64);
        let err = r.read_string().unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { offset: 64, .. }));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut w = PayloadWriter::new();
        w.write_len_prefixed(&[b'a', 0xFF, b'b']).unwrap();
        let bytes = w.finish();
        let mut r = PayloadReader::new(&bytes, 0);
        assert_eq!(r.read_string().unwrap(), "a\u{FFFD}b");
    }

    #[test]
    fn skip_string_advances() {
        let mut w = PayloadWriter::new();
        w.write_string("skip me").unwrap();
        w.write_u8(9);
        let bytes = w.finish();
        let mut r = PayloadReader::new(&bytes, 0);
        r.skip_string().unwrap();
        assert_eq!(r.read_u8().unwrap(), 9);
    }

    #[test]
    fn read_rest_takes_everything() {
        let data = [1u8, 2, 3];
        let mut r = PayloadReader::new(&data, 0);
        r.read_u8().unwrap();
        assert_eq!(r.read_rest(), &[2, 3]);
        assert!(r.is_empty());
    }
}
