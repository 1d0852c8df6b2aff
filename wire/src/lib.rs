//! Framing for the demofile decoder.
//!
//! This crate handles the outer binary format: the envelope, top-level
//! frames, snappy decompression, and the message stream embedded in packet
//! frames. It does not know about entities or events, only the structure
//! that carries them.
//!
//! # Design Principles
//!
//! - **Forward-compatible** - Unknown frame and message kinds are surfaced as
//!   `Unknown` variants, never as errors, so callers can skip them.
//! - **Bounded decoding** - All length fields are validated against limits before use.
//! - **Zero-copy** - Frames and messages borrow from the input buffer.
//! - **No domain knowledge** - This crate handles framing, not game logic.
//!
//! See `WIRE_FORMAT.md` for the complete format description.

mod error;
mod frame;
mod header;
mod limits;
mod message;
mod payload;

pub use error::{DecodeError, EncodeError, LimitKind, WireResult};
pub use frame::{
    encode_frame, Frame, FrameHeader, FrameKind, FrameReader, COMPRESSED_FLAG, PREGAME_TICK,
};
pub use header::{decode_envelope, encode_envelope, Envelope, DEMO_MAGIC, ENVELOPE_SIZE};
pub use limits::Limits;
pub use message::{encode_message, Message, MessageKind, MessageReader};
pub use payload::{PayloadReader, PayloadWriter};
