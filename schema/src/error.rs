//! Schema decoding errors.

use std::fmt;

use wire::DecodeError;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur when decoding class tables or event descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The payload itself was malformed or truncated.
    Decode(DecodeError),

    /// A property declares a type tag this decoder cannot size.
    UnsupportedPropType { tag: u8, offset: usize },

    /// Invalid bit width for fixed-width or quantized properties.
    InvalidBitWidth { bits: u8, offset: usize },

    /// A schema limit was exceeded.
    LimitsExceeded {
        kind: SchemaLimitKind,
        limit: usize,
        actual: usize,
        offset: usize,
    },
}

impl SchemaError {
    /// Returns the byte offset at which the error was detected.
    #[must_use]
    pub const fn offset(&self) -> usize {
        match self {
            Self::Decode(err) => err.offset(),
            Self::UnsupportedPropType { offset, .. }
            | Self::InvalidBitWidth { offset, .. }
            | Self::LimitsExceeded { offset, .. } => *offset,
        }
    }
}

/// Specific schema limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaLimitKind {
    Classes,
    PropsPerClass,
    EventDescriptors,
    EventKeys,
}

impl From<DecodeError> for SchemaError {
    fn from(err: DecodeError) -> Self {
        Self::Decode(err)
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(err) => write!(f, "{err}"),
            Self::UnsupportedPropType { tag, offset } => {
                write!(f, "unsupported property type tag {tag} at byte {offset}")
            }
            Self::InvalidBitWidth { bits, offset } => {
                write!(f, "invalid bit width {bits} at byte {offset}")
            }
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
                offset,
            } => write!(
                f,
                "{kind} limit exceeded at byte {offset}: {actual} > {limit}"
            ),
        }
    }
}

impl fmt::Display for SchemaLimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Classes => "classes",
            Self::PropsPerClass => "props per class",
            Self::EventDescriptors => "event descriptors",
            Self::EventKeys => "event keys",
        };
        write!(f, "{name}")
    }
}

impl std::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_tag_display() {
        let err = SchemaError::UnsupportedPropType { tag: 42, offset: 99 };
        let msg = err.to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("99"));
        assert_eq!(err.offset(), 99);
    }

    #[test]
    fn decode_error_converts() {
        let err: SchemaError = DecodeError::InvalidVarint { offset: 5 }.into();
        assert_eq!(err.offset(), 5);
        assert!(std::error::Error::source(&err).is_some());
    }
}
