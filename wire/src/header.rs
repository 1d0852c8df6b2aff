//! Demo envelope: magic and the fixed-size preamble.

use crate::error::{DecodeError, WireResult};

/// Magic bytes identifying a demo file.
///
/// This value is fixed and must never change across versions.
pub const DEMO_MAGIC: [u8; 8] = *b"PBDEMS2\0";

/// Envelope size in bytes (16 total).
pub const ENVELOPE_SIZE: usize = 8 + 4 + 4;

/// The fixed preamble that precedes the first frame.
///
/// The magic is validated during decoding and is not stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Envelope {
    /// Byte offset of the trailing file-info frame, as written by the recorder.
    pub file_info_offset: u32,
    /// Reserved; carried through untouched.
    pub reserved: u32,
}

/// Decodes the envelope at the start of `buf`.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] if fewer than [`ENVELOPE_SIZE`] bytes
/// are available and [`DecodeError::InvalidMagic`] if the magic doesn't match.
pub fn decode_envelope(buf: &[u8]) -> WireResult<Envelope> {
    // A short buffer that still matches the magic so far is truncation, not garbage.
    let probe = buf.len().min(DEMO_MAGIC.len());
    if buf[..probe] != DEMO_MAGIC[..probe] {
        return Err(DecodeError::InvalidMagic {
            found: buf[..probe].to_vec(),
        });
    }
    if buf.len() < ENVELOPE_SIZE {
        return Err(DecodeError::Truncated {
            offset: 0,
            needed: ENVELOPE_SIZE,
            available: buf.len(),
        });
    }

    let file_info_offset = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
    let reserved = u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]);
    Ok(Envelope {
        file_info_offset,
        reserved,
    })
}

/// Appends the encoded envelope to `out`.
pub fn encode_envelope(envelope: &Envelope, out: &mut Vec<u8>) {
    out.extend_from_slice(&DEMO_MAGIC);
    out.extend_from_slice(&envelope.file_info_offset.to_le_bytes());
    out.extend_from_slice(&envelope.reserved.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_is_ascii_with_nul() {
        assert_eq!(&DEMO_MAGIC[..7], b"PBDEMS2");
        assert_eq!(DEMO_MAGIC[7], 0);
    }

    #[test]
    fn envelope_roundtrip() {
        let envelope = Envelope {
            file_info_offset: 0x1234,
            reserved: 7,
        };
        let mut buf = Vec::new();
        encode_envelope(&envelope, &mut buf);
        assert_eq!(buf.len(), ENVELOPE_SIZE);
        assert_eq!(decode_envelope(&buf).unwrap(), envelope);
    }

    #[test]
    fn wrong_magic_rejected() {
        let mut buf = vec![0u8; ENVELOPE_SIZE];
        buf[..8].copy_from_slice(b"HL2DEMO\0");
        let err = decode_envelope(&buf).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidMagic { .. }));
    }

    #[test]
    fn short_garbage_is_invalid_magic() {
        let err = decode_envelope(b"XY").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidMagic { .. }));
    }

    #[test]
    fn magic_prefix_is_truncated() {
        let err = decode_envelope(b"PBDEMS2\0\x01").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Truncated {
                offset: 0,
                needed: ENVELOPE_SIZE,
                available: 9
            }
        ));
        let err = decode_envelope(b"PBD").unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { .. }));
    }
}
