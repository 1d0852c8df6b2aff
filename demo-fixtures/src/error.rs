//! Error type for fixture encoding.

use std::fmt;

use codec::CodecError;
use wire::EncodeError;

pub type FixtureResult<T> = Result<T, FixtureError>;

/// Failure while encoding a synthetic demo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureError {
    Encode(EncodeError),
    Codec(CodecError),
}

impl fmt::Display for FixtureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(e) => write!(f, "encode failed: {e}"),
            Self::Codec(e) => write!(f, "entity or event encoding failed: {e}"),
        }
    }
}

impl std::error::Error for FixtureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(e) => Some(e),
            Self::Codec(e) => Some(e),
        }
    }
}

impl From<EncodeError> for FixtureError {
    fn from(err: EncodeError) -> Self {
        Self::Encode(err)
    }
}

impl From<CodecError> for FixtureError {
    fn from(err: CodecError) -> Self {
        Self::Codec(err)
    }
}
