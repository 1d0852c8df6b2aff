//! Property type descriptors.

use wire::{PayloadReader, PayloadWriter};

use crate::error::{SchemaError, SchemaResult};

/// Quantized float parameters.
///
/// A raw value `r` of `bits` bits maps to `low + (high - low) * r / (2^bits - 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuantizedFloat {
    pub bits: u8,
    pub low: f32,
    pub high: f32,
}

impl QuantizedFloat {
    #[must_use]
    pub const fn new(bits: u8, low: f32, high: f32) -> Self {
        Self { bits, low, high }
    }

    /// Maps a raw quantized value into `[low, high]`.
    #[must_use]
    pub fn dequantize(&self, raw: u64) -> f32 {
        let steps = ((1u64 << self.bits) - 1) as f64;
        let t = raw as f64 / steps;
        (f64::from(self.low) + (f64::from(self.high) - f64::from(self.low)) * t) as f32
    }

    /// Maps a value onto the nearest raw quantized step, clamping to the range.
    #[must_use]
    pub fn quantize(&self, value: f32) -> u64 {
        let steps = ((1u64 << self.bits) - 1) as f64;
        let span = f64::from(self.high) - f64::from(self.low);
        if span <= 0.0 {
            return 0;
        }
        let t = ((f64::from(value) - f64::from(self.low)) / span).clamp(0.0, 1.0);
        (t * steps).round() as u64
    }
}

/// How a property is encoded in entity data.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropType {
    /// Boolean (1 bit).
    Bool,

    /// Unsigned integer with fixed bit width.
    UInt { bits: u8 },

    /// Signed integer with fixed bit width (two's complement).
    SInt { bits: u8 },

    /// Variable-length unsigned integer.
    VarUInt,

    /// Variable-length signed integer (zigzag encoded).
    VarSInt,

    /// 32-bit IEEE-754 float.
    Float32,

    /// Float quantized into a fixed number of bits.
    QuantizedFloat(QuantizedFloat),

    /// Three 32-bit floats.
    Vector3,

    /// Length-prefixed byte string.
    String,

    /// Unsigned 64-bit integer.
    UInt64,

    /// Entity handle.
    Handle,
}

impl PropType {
    pub const TAG_BOOL: u8 = 0;
    pub const TAG_UINT: u8 = 1;
    pub const TAG_SINT: u8 = 2;
    pub const TAG_VAR_UINT: u8 = 3;
    pub const TAG_VAR_SINT: u8 = 4;
    pub const TAG_FLOAT32: u8 = 5;
    pub const TAG_QUANTIZED_FLOAT: u8 = 6;
    pub const TAG_VECTOR3: u8 = 7;
    pub const TAG_STRING: u8 = 8;
    pub const TAG_UINT64: u8 = 9;
    pub const TAG_HANDLE: u8 = 10;

    /// Returns the wire tag for this type.
    #[must_use]
    pub const fn tag(&self) -> u8 {
        match self {
            Self::Bool => Self::TAG_BOOL,
            Self::UInt { .. } => Self::TAG_UINT,
            Self::SInt { .. } => Self::TAG_SINT,
            Self::VarUInt => Self::TAG_VAR_UINT,
            Self::VarSInt => Self::TAG_VAR_SINT,
            Self::Float32 => Self::TAG_FLOAT32,
            Self::QuantizedFloat(_) => Self::TAG_QUANTIZED_FLOAT,
            Self::Vector3 => Self::TAG_VECTOR3,
            Self::String => Self::TAG_STRING,
            Self::UInt64 => Self::TAG_UINT64,
            Self::Handle => Self::TAG_HANDLE,
        }
    }

    /// Decodes a type descriptor (tag plus parameters).
    pub fn decode(reader: &mut PayloadReader<'_>) -> SchemaResult<Self> {
        let offset = reader.offset();
        let tag = reader.read_u8()?;
        let ty = match tag {
            Self::TAG_BOOL => Self::Bool,
            Self::TAG_UINT | Self::TAG_SINT => {
                let bits_offset = reader.offset();
                let bits = reader.read_u8()?;
                if bits == 0 || bits > 64 {
                    return Err(SchemaError::InvalidBitWidth {
                        bits,
                        offset: bits_offset,
                    });
                }
                if tag == Self::TAG_UINT {
                    Self::UInt { bits }
                } else {
                    Self::SInt { bits }
                }
            }
            Self::TAG_VAR_UINT => Self::VarUInt,
            Self::TAG_VAR_SINT => Self::VarSInt,
            Self::TAG_FLOAT32 => Self::Float32,
            Self::TAG_QUANTIZED_FLOAT => {
                let bits_offset = reader.offset();
                let bits = reader.read_u8()?;
                if bits == 0 || bits > 32 {
                    return Err(SchemaError::InvalidBitWidth {
                        bits,
                        offset: bits_offset,
                    });
                }
                let low = reader.read_f32()?;
                let high = reader.read_f32()?;
                Self::QuantizedFloat(QuantizedFloat { bits, low, high })
            }
            Self::TAG_VECTOR3 => Self::Vector3,
            Self::TAG_STRING => Self::String,
            Self::TAG_UINT64 => Self::UInt64,
            Self::TAG_HANDLE => Self::Handle,
            _ => return Err(SchemaError::UnsupportedPropType { tag, offset }),
        };
        Ok(ty)
    }

    /// Encodes the type descriptor.
    pub fn encode(&self, writer: &mut PayloadWriter) {
        writer.write_u8(self.tag());
        match self {
            Self::UInt { bits } | Self::SInt { bits } => writer.write_u8(*bits),
            Self::QuantizedFloat(q) => {
                writer.write_u8(q.bits);
                writer.write_f32(q.low);
                writer.write_f32(q.high);
            }
            Self::Bool
            | Self::VarUInt
            | Self::VarSInt
            | Self::Float32
            | Self::Vector3
            | Self::String
            | Self::UInt64
            | Self::Handle => {}
        }
    }
}

/// A named property within a serializer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropDef {
    pub name: String,
    pub ty: PropType,
}

impl PropDef {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: PropType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}
