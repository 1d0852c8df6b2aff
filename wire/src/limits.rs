//! Configurable limits for bounded decoding.

/// Wire-level limits for frame decoding.
///
/// These limits are enforced during framing to prevent resource exhaustion
/// on hostile or corrupt input and ensure bounded memory usage. Payload
/// parsing limits belong to higher layers (codec/schema).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum size of a single frame payload as stored in the file.
    pub max_frame_bytes: usize,

    /// Maximum size of a frame payload after decompression.
    pub max_decompressed_bytes: usize,

    /// Maximum length of a single embedded message body.
    pub max_message_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            // Full packets on large servers run to a few megabytes.
            max_frame_bytes: 32 * 1024 * 1024,
            max_decompressed_bytes: 64 * 1024 * 1024,
            max_message_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_frame_bytes: 64 * 1024,
            max_decompressed_bytes: 128 * 1024,
            max_message_bytes: 32 * 1024,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_frame_bytes: usize::MAX,
            max_decompressed_bytes: usize::MAX,
            max_message_bytes: usize::MAX,
        }
    }
}
