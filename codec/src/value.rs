//! Decoded property and event values.

use std::fmt;

use bitstream::BitWriter;
use schema::PropType;

use crate::error::{CodecError, CodecResult, LimitKind};
use crate::reader::DataReader;

/// A decoded property or event key value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum PropValue {
    Bool(bool),
    UInt(u64),
    SInt(i64),
    Float(f32),
    Vector([f32; 3]),
    String(String),
    /// Raw entity handle; see [`EntityHandle`](crate::EntityHandle).
    Handle(u32),
}

impl PropValue {
    /// Short name of the variant, used in diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::UInt(_) => "uint",
            Self::SInt(_) => "sint",
            Self::Float(_) => "float",
            Self::Vector(_) => "vector",
            Self::String(_) => "string",
            Self::Handle(_) => "handle",
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an unsigned integer if it is one (or a
    /// non-negative signed integer).
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            Self::SInt(v) => u64::try_from(*v).ok(),
            Self::Handle(v) => Some(u64::from(*v)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::SInt(v) => Some(*v),
            Self::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_vector(&self) -> Option<[f32; 3]> {
        match self {
            Self::Vector(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_handle(&self) -> Option<u32> {
        match self {
            Self::Handle(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::SInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Vector([x, y, z]) => write!(f, "[{x}, {y}, {z}]"),
            Self::String(v) => write!(f, "{v}"),
            Self::Handle(v) => write!(f, "{v:#x}"),
        }
    }
}

/// Decodes one property value of type `ty`.
pub fn decode_prop(
    ty: &PropType,
    reader: &mut DataReader<'_>,
    max_string_bytes: usize,
) -> CodecResult<PropValue> {
    let value = match ty {
        PropType::Bool => PropValue::Bool(reader.read_bit()?),
        PropType::UInt { bits } => PropValue::UInt(reader.read_bits(*bits)?),
        PropType::SInt { bits } => PropValue::SInt(decode_sint(*bits, reader.read_bits(*bits)?)),
        PropType::VarUInt => PropValue::UInt(u64::from(reader.read_varu32()?)),
        PropType::VarSInt => PropValue::SInt(i64::from(reader.read_vars32()?)),
        PropType::Float32 => PropValue::Float(reader.read_f32()?),
        PropType::QuantizedFloat(q) => PropValue::Float(q.dequantize(reader.read_bits(q.bits)?)),
        PropType::Vector3 => {
            let x = reader.read_f32()?;
            let y = reader.read_f32()?;
            let z = reader.read_f32()?;
            PropValue::Vector([x, y, z])
        }
        PropType::String => {
            let len = read_string_len(reader, max_string_bytes)?;
            let mut bytes = Vec::with_capacity(len);
            reader.read_bytes_into(len, &mut bytes)?;
            PropValue::String(String::from_utf8_lossy(&bytes).into_owned())
        }
        PropType::UInt64 => PropValue::UInt(reader.read_bits(64)?),
        PropType::Handle => PropValue::Handle(reader.read_varu32()?),
    };
    Ok(value)
}

/// Advances past one property value of type `ty` without materializing it.
pub fn skip_prop(
    ty: &PropType,
    reader: &mut DataReader<'_>,
    max_string_bytes: usize,
) -> CodecResult<()> {
    match ty {
        PropType::Bool => reader.skip_bits(1),
        PropType::UInt { bits } | PropType::SInt { bits } => reader.skip_bits(usize::from(*bits)),
        PropType::VarUInt | PropType::VarSInt | PropType::Handle => reader.skip_varu32(),
        PropType::Float32 => reader.skip_bits(32),
        PropType::QuantizedFloat(q) => reader.skip_bits(usize::from(q.bits)),
        PropType::Vector3 => reader.skip_bits(96),
        PropType::String => {
            let len = read_string_len(reader, max_string_bytes)?;
            reader.skip_bits(len.saturating_mul(8))
        }
        PropType::UInt64 => reader.skip_bits(64),
    }
}

/// Encodes `value` as a property of type `ty`.
pub fn encode_prop(ty: &PropType, value: &PropValue, writer: &mut BitWriter) -> CodecResult<()> {
    match (ty, value) {
        (PropType::Bool, PropValue::Bool(v)) => writer.write_bit(*v),
        (PropType::UInt { bits }, PropValue::UInt(v)) => write_bits(writer, *v, *bits)?,
        (PropType::SInt { bits }, PropValue::SInt(v)) => {
            write_bits(writer, encode_sint(*bits, *v), *bits)?;
        }
        (PropType::VarUInt, PropValue::UInt(v)) => {
            let v = u32::try_from(*v).map_err(|_| mismatch(ty, value))?;
            writer.write_bit_varu32(v);
        }
        (PropType::VarSInt, PropValue::SInt(v)) => {
            let v = i32::try_from(*v).map_err(|_| mismatch(ty, value))?;
            writer.write_bit_vars32(v);
        }
        (PropType::Float32, PropValue::Float(v)) => writer.write_f32_bits(*v),
        (PropType::QuantizedFloat(q), PropValue::Float(v)) => {
            write_bits(writer, q.quantize(*v), q.bits)?;
        }
        (PropType::Vector3, PropValue::Vector(v)) => {
            for c in v {
                writer.write_f32_bits(*c);
            }
        }
        (PropType::String, PropValue::String(s)) => {
            let len = u32::try_from(s.len()).map_err(|_| mismatch(ty, value))?;
            writer.write_bit_varu32(len);
            writer.write_bytes(s.as_bytes());
        }
        (PropType::UInt64, PropValue::UInt(v)) => write_bits(writer, *v, 64)?,
        (PropType::Handle, PropValue::Handle(v)) => writer.write_bit_varu32(*v),
        _ => return Err(mismatch(ty, value)),
    }
    Ok(())
}

fn read_string_len(reader: &mut DataReader<'_>, max_string_bytes: usize) -> CodecResult<usize> {
    let offset = reader.offset();
    let len = reader.read_varu32()? as usize;
    if len > max_string_bytes {
        return Err(CodecError::LimitsExceeded {
            kind: LimitKind::StringBytes,
            limit: max_string_bytes,
            actual: len,
            offset,
        });
    }
    Ok(len)
}

fn write_bits(writer: &mut BitWriter, value: u64, bits: u8) -> CodecResult<()> {
    writer
        .write_bits(value, bits)
        .map_err(|error| CodecError::Bitstream { error, offset: 0 })
}

fn mismatch(ty: &PropType, value: &PropValue) -> CodecError {
    CodecError::ValueMismatch {
        expected: type_name(ty),
        found: value.kind_name(),
    }
}

const fn type_name(ty: &PropType) -> &'static str {
    match ty {
        PropType::Bool => "bool",
        PropType::UInt { .. } => "uint",
        PropType::SInt { .. } => "sint",
        PropType::VarUInt => "varuint",
        PropType::VarSInt => "varsint",
        PropType::Float32 => "float32",
        PropType::QuantizedFloat(_) => "quantized float",
        PropType::Vector3 => "vector3",
        PropType::String => "string",
        PropType::UInt64 => "uint64",
        PropType::Handle => "handle",
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn decode_sint(bits: u8, raw: u64) -> i64 {
    if bits == 0 || bits >= 64 {
        return raw as i64;
    }
    let sign_bit = 1u64 << (bits - 1);
    if raw & sign_bit == 0 {
        raw as i64
    } else {
        (raw as i64) - (1i64 << bits)
    }
}

#[allow(clippy::cast_sign_loss)]
const fn encode_sint(bits: u8, value: i64) -> u64 {
    if bits >= 64 {
        return value as u64;
    }
    (value as u64) & ((1u64 << bits) - 1)
}
