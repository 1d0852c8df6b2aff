//! Error types for codec operations.

use std::fmt;

use bitstream::BitError;
use schema::{ClassId, SchemaError};
use wire::DecodeError;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while decoding headers, entities or events.
///
/// Every decode failure records the byte offset at which it was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Wire format error.
    Wire(DecodeError),

    /// Schema payload error.
    Schema(SchemaError),

    /// Bit-packed data ended early or was malformed.
    Bitstream { error: BitError, offset: usize },

    /// Header declares a format version outside the supported range.
    UnsupportedFormatVersion { found: u32, offset: usize },

    /// An entity create referenced a class id that was never bound.
    UnknownClass { class_id: ClassId, offset: usize },

    /// An update referenced an entity slot that is not active.
    EntityNotFound {
        /// The missing entity index.
        index: u32,
        offset: usize,
    },

    /// A changed-property index is outside the class's property list.
    InvalidPropertyIndex {
        class_id: ClassId,
        index: usize,
        prop_count: usize,
        offset: usize,
    },

    /// Limits exceeded.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
        offset: usize,
    },

    /// Entities are not provided in ascending index order.
    InvalidEntityOrder { previous: u32, current: u32 },

    /// A value doesn't match the type it is being encoded as.
    ValueMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl CodecError {
    /// Returns the byte offset at which the error was detected.
    ///
    /// Encoding errors have no input position and report zero.
    #[must_use]
    pub const fn offset(&self) -> usize {
        match self {
            Self::Wire(err) => err.offset(),
            Self::Schema(err) => err.offset(),
            Self::Bitstream { offset, .. }
            | Self::UnsupportedFormatVersion { offset, .. }
            | Self::UnknownClass { offset, .. }
            | Self::EntityNotFound { offset, .. }
            | Self::InvalidPropertyIndex { offset, .. }
            | Self::LimitsExceeded { offset, .. } => *offset,
            Self::InvalidEntityOrder { .. } | Self::ValueMismatch { .. } => 0,
        }
    }

    /// Returns `true` if the input ended before a value was complete.
    #[must_use]
    pub const fn is_truncation(&self) -> bool {
        matches!(
            self,
            Self::Wire(DecodeError::Truncated { .. })
                | Self::Schema(SchemaError::Decode(DecodeError::Truncated { .. }))
                | Self::Bitstream {
                    error: BitError::UnexpectedEof { .. },
                    ..
                }
        )
    }
}

/// Specific limit that was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Entities,
    ChangedProps,
    StringBytes,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wire(e) => write!(f, "wire error: {e}"),
            Self::Schema(e) => write!(f, "schema error: {e}"),
            Self::Bitstream { error, offset } => {
                write!(f, "bitstream error near byte {offset}: {error}")
            }
            Self::UnsupportedFormatVersion { found, offset } => {
                write!(f, "unsupported demo format version {found} at byte {offset}")
            }
            Self::UnknownClass { class_id, offset } => {
                write!(f, "unknown class id {class_id} near byte {offset}")
            }
            Self::EntityNotFound { index, offset } => {
                write!(f, "entity {index} not found near byte {offset}")
            }
            Self::InvalidPropertyIndex {
                class_id,
                index,
                prop_count,
                offset,
            } => write!(
                f,
                "property index {index} out of range for class {class_id} ({prop_count} props) near byte {offset}"
            ),
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
                offset,
            } => write!(
                f,
                "{kind} limit exceeded near byte {offset}: {actual} > {limit}"
            ),
            Self::InvalidEntityOrder { previous, current } => {
                write!(f, "entity {current} written after entity {previous}")
            }
            Self::ValueMismatch { expected, found } => {
                write!(f, "value mismatch: expected {expected}, found {found}")
            }
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Entities => "entities",
            Self::ChangedProps => "changed props",
            Self::StringBytes => "string bytes",
        };
        write!(f, "{name}")
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Wire(e) => Some(e),
            Self::Schema(e) => Some(e),
            Self::Bitstream { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<DecodeError> for CodecError {
    fn from(err: DecodeError) -> Self {
        Self::Wire(err)
    }
}

impl From<SchemaError> for CodecError {
    fn from(err: SchemaError) -> Self {
        Self::Schema(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_propagate_from_lower_layers() {
        let err: CodecError = DecodeError::InvalidVarint { offset: 17 }.into();
        assert_eq!(err.offset(), 17);

        let err: CodecError = SchemaError::UnsupportedPropType { tag: 99, offset: 33 }.into();
        assert_eq!(err.offset(), 33);
    }

    #[test]
    fn truncation_is_recognized_at_every_layer() {
        let wire: CodecError = DecodeError::Truncated {
            offset: 1,
            needed: 2,
            available: 1,
        }
        .into();
        assert!(wire.is_truncation());

        let bits = CodecError::Bitstream {
            error: BitError::UnexpectedEof {
                requested: 8,
                available: 0,
            },
            offset: 3,
        };
        assert!(bits.is_truncation());

        let not = CodecError::EntityNotFound {
            index: 1,
            offset: 0,
        };
        assert!(!not.is_truncation());
    }

    #[test]
    fn display_mentions_details() {
        let err = CodecError::InvalidPropertyIndex {
            class_id: 4,
            index: 12,
            prop_count: 3,
            offset: 900,
        };
        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("900"));
    }

    #[test]
    fn limit_display() {
        let err = CodecError::LimitsExceeded {
            kind: LimitKind::Entities,
            limit: 10,
            actual: 20,
            offset: 0,
        };
        assert!(err.to_string().contains("entities"));
    }
}
