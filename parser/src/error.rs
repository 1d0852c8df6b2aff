//! The single failure type returned by every parse operation.

use std::fmt;

use codec::CodecError;
use schema::SchemaError;
use wire::DecodeError;

/// Result type for parse operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Fatal parse failure.
///
/// Every variant except [`ParseError::InvalidMagic`] carries the byte offset
/// at which the problem was detected; the magic is always at offset zero.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// The buffer ended in the middle of a frame, message or value.
    TruncatedInput { offset: usize },

    /// The buffer is not a demo file.
    InvalidMagic { found: Vec<u8> },

    /// The header declares a format version this parser cannot read.
    UnsupportedFormatVersion { found: u32, offset: usize },

    /// Framing corruption other than truncation.
    Wire(DecodeError),

    /// Malformed class or event schema.
    Schema(SchemaError),

    /// Malformed entity or event data.
    Codec(CodecError),
}

impl ParseError {
    /// Returns the byte offset at which the error was detected.
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::TruncatedInput { offset } | Self::UnsupportedFormatVersion { offset, .. } => {
                *offset
            }
            Self::InvalidMagic { .. } => 0,
            Self::Wire(err) => err.offset(),
            Self::Schema(err) => err.offset(),
            Self::Codec(err) => err.offset(),
        }
    }

    #[must_use]
    pub const fn is_truncation(&self) -> bool {
        matches!(self, Self::TruncatedInput { .. })
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedInput { offset } => write!(f, "input truncated at byte {offset}"),
            Self::InvalidMagic { found } => write!(f, "not a demo file (magic {found:02x?})"),
            Self::UnsupportedFormatVersion { found, offset } => {
                write!(f, "unsupported format version {found} at byte {offset}")
            }
            Self::Wire(e) => write!(f, "{e}"),
            Self::Schema(e) => write!(f, "{e}"),
            Self::Codec(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Wire(e) => Some(e),
            Self::Schema(e) => Some(e),
            Self::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for ParseError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Truncated { offset, .. } => Self::TruncatedInput { offset },
            DecodeError::InvalidMagic { found } => Self::InvalidMagic { found },
            other => Self::Wire(other),
        }
    }
}

impl From<SchemaError> for ParseError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::Decode(inner) => inner.into(),
            other => Self::Schema(other),
        }
    }
}

impl From<CodecError> for ParseError {
    fn from(err: CodecError) -> Self {
        if err.is_truncation() {
            return Self::TruncatedInput {
                offset: err.offset(),
            };
        }
        match err {
            CodecError::Wire(inner) => inner.into(),
            CodecError::Schema(inner) => inner.into(),
            CodecError::UnsupportedFormatVersion { found, offset } => {
                Self::UnsupportedFormatVersion { found, offset }
            }
            other => Self::Codec(other),
        }
    }
}
