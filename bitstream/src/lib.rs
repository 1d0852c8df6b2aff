//! Low-level bit packing primitives for the demofile decoder.
//!
//! This crate provides [`BitReader`] and [`BitWriter`] for bit-level decoding
//! and encoding. It is designed for bounded, panic-free operation with
//! explicit error handling.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - All reads are bounds-checked.
//! - **Borrowed input** - The reader walks a borrowed slice and never copies it.
//! - **Skip what you don't need** - Every read has a matching skip, so callers
//!   can step over values without materializing them.
//! - **No domain knowledge** - This crate knows nothing about frames, entities, or events.
//!
//! # Example
//!
//! ```
//! use bitstream::{BitWriter, BitReader};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bit(true);
//! writer.write_bits(42, 7).unwrap();
//! writer.write_ubitvar(300);
//!
//! let bytes = writer.finish();
//!
//! let mut reader = BitReader::new(&bytes);
//! assert_eq!(reader.read_bit().unwrap(), true);
//! assert_eq!(reader.read_bits(7).unwrap(), 42);
//! assert_eq!(reader.read_ubitvar().unwrap(), 300);
//! ```

mod error;
mod reader;
mod writer;

pub use error::{BitError, BitResult};
pub use reader::{BitReader, VARINT32_MAX_BYTES};
pub use writer::BitWriter;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changed_index_list_reads_back() {
        // `more` bit + ubitvar delta per index, then a clear `more` bit.
        let indices = [0u32, 1, 5, 40, 41, 300];
        let mut writer = BitWriter::new();
        let mut previous = -1i64;
        for &index in &indices {
            writer.write_bit(true);
            writer.write_ubitvar((i64::from(index) - previous - 1) as u32);
            previous = i64::from(index);
        }
        writer.write_bit(false);
        let bytes = writer.finish();

        let mut reader = BitReader::new(&bytes);
        let mut decoded = Vec::new();
        let mut previous = -1i64;
        while reader.read_bit().unwrap() {
            previous += 1 + i64::from(reader.read_ubitvar().unwrap());
            decoded.push(previous as u32);
        }
        assert_eq!(decoded, indices);
    }

    #[test]
    fn odd_widths_pack_without_padding() {
        let mut writer = BitWriter::new();
        for (value, bits) in [(1u64, 1u8), (0x1_FFFF, 17), (5, 3), (u64::MAX, 64)] {
            writer.write_bits(value, bits).unwrap();
        }
        let bytes = writer.finish();
        assert_eq!(bytes.len(), (1 + 17 + 3 + 64 + 7) / 8);

        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.read_bits(1).unwrap(), 1);
        assert_eq!(reader.read_bits(17).unwrap(), 0x1_FFFF);
        assert_eq!(reader.read_bits(3).unwrap(), 5);
        assert_eq!(reader.read_bits(64).unwrap(), u64::MAX);
    }

    #[test]
    fn mixed_packed_and_float() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_f32_bits(-12.5);
        writer.write_bit_vars32(-77);
        writer.write_bits(0b101, 3).unwrap();
        let bytes = writer.finish();

        let mut reader = BitReader::new(&bytes);
        assert!(reader.read_bit().unwrap());
        assert!((reader.read_f32_bits().unwrap() - -12.5).abs() < f32::EPSILON);
        assert_eq!(reader.read_bit_vars32().unwrap(), -77);
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
    }

    #[test]
    fn skips_land_where_reads_do() {
        let mut writer = BitWriter::new();
        writer.write_bit_varu32(1_000_000);
        writer.write_ubitvar(70_000);
        writer.write_bit(true);
        let bytes = writer.finish();

        let mut reader = BitReader::new(&bytes);
        reader.skip_bit_varu32().unwrap();
        reader.skip_ubitvar().unwrap();
        assert!(reader.read_bit().unwrap());
    }
}
