//! Error types for wire format operations.

use std::fmt;

use bitstream::BitError;

/// Result type for wire format operations.
pub type WireResult<T> = Result<T, DecodeError>;

/// High-level decode errors for demo framing.
///
/// Every variant carries the absolute byte offset at which the problem was
/// detected so callers can report where a file went bad.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// The buffer does not start with the demo magic.
    InvalidMagic { found: Vec<u8> },

    /// The buffer ended inside a frame header, payload or message.
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A length or kind varint ran past five bytes.
    InvalidVarint { offset: usize },

    /// A frame payload could not be decompressed.
    Decompression { offset: usize, reason: String },

    /// Limits exceeded.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
        offset: usize,
    },
}

impl DecodeError {
    /// Returns the byte offset at which the error was detected.
    #[must_use]
    pub const fn offset(&self) -> usize {
        match self {
            Self::InvalidMagic { .. } => 0,
            Self::Truncated { offset, .. }
            | Self::InvalidVarint { offset }
            | Self::Decompression { offset, .. }
            | Self::LimitsExceeded { offset, .. } => *offset,
        }
    }

    /// Maps a bitstream failure at `offset` onto a framing error.
    pub(crate) fn from_bits(err: &BitError, offset: usize) -> Self {
        match err {
            BitError::InvalidVarint => Self::InvalidVarint { offset },
            BitError::UnexpectedEof {
                requested,
                available,
            } => Self::Truncated {
                offset,
                needed: requested.div_ceil(8),
                available: available / 8,
            },
            BitError::InvalidBitCount { .. }
            | BitError::ValueOutOfRange { .. }
            | BitError::MisalignedAccess { .. } => Self::Truncated {
                offset,
                needed: 0,
                available: 0,
            },
        }
    }
}

/// Specific wire limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    FrameBytes,
    DecompressedBytes,
    MessageBytes,
}

/// Errors that can occur during encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    LengthOverflow { length: usize },
    Compression { reason: String },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMagic { found } => {
                write!(f, "invalid demo magic: {found:02X?}")
            }
            Self::Truncated {
                offset,
                needed,
                available,
            } => {
                write!(
                    f,
                    "truncated input at byte {offset}: need {needed} bytes, have {available}"
                )
            }
            Self::InvalidVarint { offset } => write!(f, "invalid varint at byte {offset}"),
            Self::Decompression { offset, reason } => {
                write!(f, "failed to decompress frame at byte {offset}: {reason}")
            }
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
                offset,
            } => {
                write!(
                    f,
                    "{kind} limit exceeded at byte {offset}: {actual} > {limit}"
                )
            }
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FrameBytes => "frame bytes",
            Self::DecompressedBytes => "decompressed bytes",
            Self::MessageBytes => "message bytes",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthOverflow { length } => {
                write!(f, "length overflow: {length}")
            }
            Self::Compression { reason } => write!(f, "compression failed: {reason}"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl std::error::Error for EncodeError {}
