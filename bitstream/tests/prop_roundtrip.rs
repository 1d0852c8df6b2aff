use bitstream::{BitReader, BitWriter};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Bit(bool),
    Bits { bits: u8, value: u64 },
    UBitVar(u32),
    BitVarU32(u32),
    BitVarS32(i32),
    Float(u32),
    Bytes(Vec<u8>),
}

fn mask_value(bits: u8, value: u64) -> u64 {
    if bits >= 64 {
        value
    } else {
        let mask = (1u64 << bits) - 1;
        value & mask
    }
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<bool>().prop_map(Op::Bit),
        (1u8..=64, any::<u64>()).prop_map(|(bits, value)| Op::Bits {
            bits,
            value: mask_value(bits, value),
        }),
        any::<u32>().prop_map(Op::UBitVar),
        any::<u32>().prop_map(Op::BitVarU32),
        any::<i32>().prop_map(Op::BitVarS32),
        any::<u32>().prop_map(Op::Float),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(Op::Bytes),
    ]
}

fn write_ops(ops: &[Op]) -> Vec<u8> {
    let mut writer = BitWriter::new();
    for op in ops {
        match op {
            Op::Bit(b) => writer.write_bit(*b),
            Op::Bits { bits, value } => writer.write_bits(*value, *bits).unwrap(),
            Op::UBitVar(v) => writer.write_ubitvar(*v),
            Op::BitVarU32(v) => writer.write_bit_varu32(*v),
            Op::BitVarS32(v) => writer.write_bit_vars32(*v),
            Op::Float(raw) => writer.write_f32_bits(f32::from_bits(*raw)),
            Op::Bytes(bytes) => {
                writer.write_bit_varu32(bytes.len() as u32);
                writer.write_bytes(bytes);
            }
        }
    }
    writer.finish()
}

proptest! {
    #[test]
    fn prop_packed_roundtrip(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let bytes = write_ops(&ops);
        let mut reader = BitReader::new(&bytes);

        for op in &ops {
            match op {
                Op::Bit(b) => prop_assert_eq!(reader.read_bit().unwrap(), *b),
                Op::Bits { bits, value } => {
                    prop_assert_eq!(reader.read_bits(*bits).unwrap(), *value);
                }
                Op::UBitVar(v) => prop_assert_eq!(reader.read_ubitvar().unwrap(), *v),
                Op::BitVarU32(v) => prop_assert_eq!(reader.read_bit_varu32().unwrap(), *v),
                Op::BitVarS32(v) => prop_assert_eq!(reader.read_bit_vars32().unwrap(), *v),
                Op::Float(raw) => {
                    prop_assert_eq!(reader.read_f32_bits().unwrap().to_bits(), *raw);
                }
                Op::Bytes(bytes) => {
                    let len = reader.read_bit_varu32().unwrap() as usize;
                    let mut out = Vec::new();
                    reader.read_bytes_into(len, &mut out).unwrap();
                    prop_assert_eq!(&out, bytes);
                }
            }
        }
        prop_assert!(reader.bits_remaining() < 8);
    }

    /// Skipping a value must leave the cursor exactly where reading it would.
    #[test]
    fn prop_skip_matches_read(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let bytes = write_ops(&ops);
        let mut read = BitReader::new(&bytes);
        let mut skip = BitReader::new(&bytes);

        for op in &ops {
            match op {
                Op::Bit(_) => {
                    read.read_bit().unwrap();
                    skip.skip_bits(1).unwrap();
                }
                Op::Bits { bits, .. } => {
                    read.read_bits(*bits).unwrap();
                    skip.skip_bits(*bits as usize).unwrap();
                }
                Op::UBitVar(_) => {
                    read.read_ubitvar().unwrap();
                    skip.skip_ubitvar().unwrap();
                }
                Op::BitVarU32(_) | Op::BitVarS32(_) => {
                    read.read_bit_varu32().unwrap();
                    skip.skip_bit_varu32().unwrap();
                }
                Op::Float(_) => {
                    read.read_f32_bits().unwrap();
                    skip.skip_bits(32).unwrap();
                }
                Op::Bytes(bytes) => {
                    let len = read.read_bit_varu32().unwrap() as usize;
                    let mut out = Vec::new();
                    read.read_bytes_into(len, &mut out).unwrap();
                    let skip_len = skip.read_bit_varu32().unwrap() as usize;
                    prop_assert_eq!(skip_len, bytes.len());
                    skip.skip_bits(skip_len * 8).unwrap();
                }
            }
            prop_assert_eq!(read.bit_position(), skip.bit_position());
        }
    }
}
