//! Top-level frame decoding.
//!
//! A demo is a sequence of frames after the [envelope](crate::Envelope). Each
//! frame is `varu32 command`, `varu32 tick`, `varu32 size` and `size` payload
//! bytes. Bit 6 of the command marks a snappy-compressed payload.

use std::borrow::Cow;

use crate::error::{DecodeError, EncodeError, LimitKind, WireResult};
use crate::header::{decode_envelope, Envelope, ENVELOPE_SIZE};
use crate::limits::Limits;
use crate::payload::{PayloadReader, PayloadWriter};

/// Command bit marking a snappy raw-compressed payload.
pub const COMPRESSED_FLAG: u32 = 0x40;

/// Tick value carried by frames recorded before the match starts.
pub const PREGAME_TICK: u32 = u32::MAX;

/// Frame kinds.
///
/// The set is closed; any command this decoder does not know is carried as
/// [`FrameKind::Unknown`] so callers can skip it and keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Stop,
    FileHeader,
    FileInfo,
    SyncTick,
    SendTables,
    ClassInfo,
    StringTables,
    Packet,
    SignonPacket,
    ConsoleCmd,
    UserCmd,
    FullPacket,
    Unknown(u32),
}

impl FrameKind {
    /// Maps a command (with the compression bit already stripped) to a kind.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Stop,
            1 => Self::FileHeader,
            2 => Self::FileInfo,
            3 => Self::SyncTick,
            4 => Self::SendTables,
            5 => Self::ClassInfo,
            6 => Self::StringTables,
            7 => Self::Packet,
            8 => Self::SignonPacket,
            9 => Self::ConsoleCmd,
            12 => Self::UserCmd,
            13 => Self::FullPacket,
            other => Self::Unknown(other),
        }
    }

    /// Returns the raw command value (without the compression bit).
    #[must_use]
    pub const fn raw(self) -> u32 {
        match self {
            Self::Stop => 0,
            Self::FileHeader => 1,
            Self::FileInfo => 2,
            Self::SyncTick => 3,
            Self::SendTables => 4,
            Self::ClassInfo => 5,
            Self::StringTables => 6,
            Self::Packet => 7,
            Self::SignonPacket => 8,
            Self::ConsoleCmd => 9,
            Self::UserCmd => 12,
            Self::FullPacket => 13,
            Self::Unknown(raw) => raw,
        }
    }

    /// Returns `true` if the payload is an embedded message stream.
    #[must_use]
    pub const fn carries_messages(self) -> bool {
        matches!(self, Self::Packet | Self::SignonPacket | Self::FullPacket)
    }
}

/// Decoded frame header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub kind: FrameKind,
    pub compressed: bool,
    pub tick: u32,
    pub size: u32,
}

impl FrameHeader {
    /// Returns `true` for frames recorded before the first game tick.
    #[must_use]
    pub const fn is_pregame(&self) -> bool {
        self.tick == PREGAME_TICK
    }
}

/// A framed payload borrowed from the demo buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub header: FrameHeader,
    /// Offset of the first header byte in the file.
    pub offset: usize,
    /// Offset of the first payload byte in the file.
    pub payload_offset: usize,
    /// Payload exactly as stored (possibly compressed).
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Returns the payload, decompressing it if needed.
    ///
    /// Uncompressed payloads are borrowed without copying.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Decompression`] for corrupt snappy data and
    /// [`DecodeError::LimitsExceeded`] if the declared decompressed size is
    /// larger than `limits.max_decompressed_bytes`.
    pub fn decompressed(&self, limits: &Limits) -> WireResult<Cow<'a, [u8]>> {
        if !self.header.compressed {
            return Ok(Cow::Borrowed(self.payload));
        }
        let declared =
            snap::raw::decompress_len(self.payload).map_err(|e| DecodeError::Decompression {
                offset: self.offset,
                reason: e.to_string(),
            })?;
        if declared > limits.max_decompressed_bytes {
            return Err(DecodeError::LimitsExceeded {
                kind: LimitKind::DecompressedBytes,
                limit: limits.max_decompressed_bytes,
                actual: declared,
                offset: self.offset,
            });
        }
        snap::raw::Decoder::new()
            .decompress_vec(self.payload)
            .map(Cow::Owned)
            .map_err(|e| DecodeError::Decompression {
                offset: self.offset,
                reason: e.to_string(),
            })
    }

    /// Base offset to use for positions inside the decoded payload.
    ///
    /// Compressed payloads have no byte-exact mapping back to the file, so
    /// positions inside them are reported relative to the frame start.
    #[must_use]
    pub const fn content_offset(&self) -> usize {
        if self.header.compressed {
            self.offset
        } else {
            self.payload_offset
        }
    }
}

/// Forward-only iterator over the frames of a demo buffer.
///
/// Yields frames until a [`FrameKind::Stop`] frame (which is yielded) or a
/// clean end of buffer. The first error is yielded once and ends iteration.
#[derive(Debug, Clone)]
pub struct FrameReader<'a> {
    buf: &'a [u8],
    pos: usize,
    limits: Limits,
    envelope: Envelope,
    done: bool,
}

impl<'a> FrameReader<'a> {
    /// Validates the envelope and positions the reader at the first frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope is missing or malformed.
    pub fn new(buf: &'a [u8], limits: Limits) -> WireResult<Self> {
        let envelope = decode_envelope(buf)?;
        Ok(Self {
            buf,
            pos: ENVELOPE_SIZE,
            limits,
            envelope,
            done: false,
        })
    }

    #[must_use]
    pub const fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    #[must_use]
    pub const fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Offset of the next frame header.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    fn decode_next(&mut self) -> WireResult<Frame<'a>> {
        let offset = self.pos;
        let mut header_reader = PayloadReader::new(&self.buf[offset..], offset);
        let command = header_reader
            .read_varu32()
            .map_err(|e| truncated_at(e, offset))?;
        let tick = header_reader
            .read_varu32()
            .map_err(|e| truncated_at(e, offset))?;
        let size = header_reader
            .read_varu32()
            .map_err(|e| truncated_at(e, offset))?;

        let len = size as usize;
        if len > self.limits.max_frame_bytes {
            return Err(DecodeError::LimitsExceeded {
                kind: LimitKind::FrameBytes,
                limit: self.limits.max_frame_bytes,
                actual: len,
                offset,
            });
        }
        let payload_offset = header_reader.offset();
        let available = self.buf.len() - payload_offset;
        if len > available {
            return Err(DecodeError::Truncated {
                offset,
                needed: len,
                available,
            });
        }

        let payload = &self.buf[payload_offset..payload_offset + len];
        self.pos = payload_offset + len;

        let header = FrameHeader {
            kind: FrameKind::from_raw(command & !COMPRESSED_FLAG),
            compressed: command & COMPRESSED_FLAG != 0,
            tick,
            size,
        };
        Ok(Frame {
            header,
            offset,
            payload_offset,
            payload,
        })
    }
}

/// Truncation inside a frame header is reported at the frame start.
fn truncated_at(err: DecodeError, frame_offset: usize) -> DecodeError {
    match err {
        DecodeError::Truncated {
            needed, available, ..
        } => DecodeError::Truncated {
            offset: frame_offset,
            needed,
            available,
        },
        DecodeError::InvalidVarint { .. } => DecodeError::InvalidVarint {
            offset: frame_offset,
        },
        other => other,
    }
}

impl<'a> Iterator for FrameReader<'a> {
    type Item = WireResult<Frame<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.buf.len() {
            return None;
        }
        match self.decode_next() {
            Ok(frame) => {
                if frame.header.kind == FrameKind::Stop {
                    self.done = true;
                }
                Some(Ok(frame))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl std::iter::FusedIterator for FrameReader<'_> {}

/// Appends one encoded frame to `out`, snappy-compressing the payload when
/// `compress` is set.
///
/// # Errors
///
/// Returns [`EncodeError`] if the payload length doesn't fit in a `u32` or
/// compression fails.
pub fn encode_frame(
    kind: FrameKind,
    tick: u32,
    payload: &[u8],
    compress: bool,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    let mut command = kind.raw();
    let stored: Cow<'_, [u8]> = if compress {
        command |= COMPRESSED_FLAG;
        let packed = snap::raw::Encoder::new()
            .compress_vec(payload)
            .map_err(|e| EncodeError::Compression {
                reason: e.to_string(),
            })?;
        Cow::Owned(packed)
    } else {
        Cow::Borrowed(payload)
    };

    let mut writer = PayloadWriter::new();
    writer.write_varu32(command);
    writer.write_varu32(tick);
    writer.write_len_prefixed(&stored)?;
    out.extend_from_slice(&writer.finish());
    Ok(())
}
