//! Embedded message stream carried by packet frames.

use crate::error::{DecodeError, EncodeError, LimitKind, WireResult};
use crate::limits::Limits;
use crate::payload::{PayloadReader, PayloadWriter};

/// Message kinds this decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    NetTick,
    InstanceBaseline,
    PacketEntities,
    GameEventList,
    GameEvent,
    Unknown(u32),
}

impl MessageKind {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            4 => Self::NetTick,
            44 => Self::InstanceBaseline,
            55 => Self::PacketEntities,
            205 => Self::GameEventList,
            207 => Self::GameEvent,
            other => Self::Unknown(other),
        }
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        match self {
            Self::NetTick => 4,
            Self::InstanceBaseline => 44,
            Self::PacketEntities => 55,
            Self::GameEventList => 205,
            Self::GameEvent => 207,
            Self::Unknown(raw) => raw,
        }
    }
}

/// One message borrowed from a frame payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message<'a> {
    pub kind: MessageKind,
    /// Offset of the message's kind varint.
    pub offset: usize,
    /// Offset of the first body byte.
    pub body_offset: usize,
    pub body: &'a [u8],
}

/// Iterator over the messages of a packet payload.
///
/// Ends when the payload is exhausted; the first error is yielded once.
#[derive(Debug, Clone)]
pub struct MessageReader<'a> {
    reader: PayloadReader<'a>,
    max_message_bytes: usize,
    done: bool,
}

impl<'a> MessageReader<'a> {
    /// Creates a reader over `payload`, reporting offsets from `base_offset`.
    #[must_use]
    pub const fn new(payload: &'a [u8], base_offset: usize, limits: &Limits) -> Self {
        Self {
            reader: PayloadReader::new(payload, base_offset),
            max_message_bytes: limits.max_message_bytes,
            done: false,
        }
    }

    fn decode_next(&mut self) -> WireResult<Message<'a>> {
        let offset = self.reader.offset();
        let kind = MessageKind::from_raw(self.reader.read_varu32()?);
        let len = self.reader.read_varu32()? as usize;
        if len > self.max_message_bytes {
            return Err(DecodeError::LimitsExceeded {
                kind: LimitKind::MessageBytes,
                limit: self.max_message_bytes,
                actual: len,
                offset,
            });
        }
        let body_offset = self.reader.offset();
        let body = self.reader.read_bytes(len)?;
        Ok(Message {
            kind,
            offset,
            body_offset,
            body,
        })
    }
}

impl<'a> Iterator for MessageReader<'a> {
    type Item = WireResult<Message<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.reader.is_empty() {
            return None;
        }
        let result = self.decode_next();
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

impl std::iter::FusedIterator for MessageReader<'_> {}

/// Appends one encoded message to `out`.
///
/// # Errors
///
/// Returns [`EncodeError::LengthOverflow`] if the body is longer than `u32::MAX`.
pub fn encode_message(kind: MessageKind, body: &[u8], out: &mut Vec<u8>) -> Result<(), EncodeError> {
    let mut writer = PayloadWriter::new();
    writer.write_varu32(kind.raw());
    writer.write_len_prefixed(body)?;
    out.extend_from_slice(&writer.finish());
    Ok(())
}
