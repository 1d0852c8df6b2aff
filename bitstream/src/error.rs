//! Failures raised by [`BitReader`](crate::BitReader) and [`BitWriter`](crate::BitWriter).

use std::fmt;

pub type BitResult<T> = Result<T, BitError>;

/// A bit-level read or write failure.
///
/// Positions are relative to the start of the slice the reader was given;
/// callers that know the slice's file offset translate them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitError {
    /// The slice ended before the value did.
    UnexpectedEof { requested: usize, available: usize },

    /// A width outside `1..=max_bits` (or `0..=max_bits` for writes).
    InvalidBitCount { bits: u8, max_bits: u8 },

    /// A value wider than the field it is written into.
    ValueOutOfRange { value: u64, bits: u8 },

    /// A varint whose continuation bit is still set after five groups.
    InvalidVarint,

    /// A byte-aligned read or write attempted mid-byte.
    MisalignedAccess { bit_position: usize },
}

impl BitError {
    /// Returns `true` if more input would have let the read succeed.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::UnexpectedEof { .. })
    }
}

impl fmt::Display for BitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof {
                requested,
                available,
            } => write!(f, "needed {requested} bits, {available} left"),
            Self::InvalidBitCount { bits, max_bits } => {
                write!(f, "bit width {bits} outside 1..={max_bits}")
            }
            Self::ValueOutOfRange { value, bits } => {
                write!(f, "{value} does not fit in {bits} bits")
            }
            Self::InvalidVarint => f.write_str("varint longer than 5 bytes"),
            Self::MisalignedAccess { bit_position } => {
                write!(f, "aligned access at bit {bit_position}")
            }
        }
    }
}

impl std::error::Error for BitError {}
