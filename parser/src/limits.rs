//! Combined limits for one parse.

use codec::CodecLimits;
use wire::Limits;

/// Framing and decoding limits applied to a single parse call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserLimits {
    pub wire: Limits,
    pub codec: CodecLimits,
}

impl ParserLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            wire: Limits::for_testing(),
            codec: CodecLimits::for_testing(),
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            wire: Limits::unlimited(),
            codec: CodecLimits::unlimited(),
        }
    }
}
