//! Low-level demo assembly: frames, message streams and entity batches.

use std::collections::BTreeMap;

use codec::{
    encode_event, encode_header, encode_instance_baseline, CodecError, DemoHeader,
    EntityDataWriter, EntityIndex, PropValue,
};
use schema::{
    encode_class_info, encode_send_tables, ClassId, ClassTable, EventDescriptor,
    EventDescriptorTable, Serializer,
};
use wire::{
    encode_envelope, encode_frame, encode_message, Envelope, FrameKind, MessageKind, PayloadWriter,
};

use crate::error::FixtureResult;

/// Appends frames to an in-memory demo.
#[derive(Debug, Clone)]
pub struct DemoBuilder {
    buf: Vec<u8>,
    compress: bool,
    frames: usize,
}

impl Default for DemoBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoBuilder {
    /// Starts a demo with the standard envelope.
    #[must_use]
    pub fn new() -> Self {
        let mut buf = Vec::new();
        encode_envelope(&Envelope::default(), &mut buf);
        Self {
            buf,
            compress: false,
            frames: 0,
        }
    }

    /// Snappy-compress payloads of frames written from now on.
    #[must_use]
    pub const fn compressed(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Writes one raw frame.
    pub fn frame(&mut self, kind: FrameKind, tick: u32, payload: &[u8]) -> FixtureResult<()> {
        // Empty payloads stay uncompressed so truncation offsets are easy to predict.
        let compress = self.compress && !payload.is_empty();
        encode_frame(kind, tick, payload, compress, &mut self.buf)?;
        self.frames += 1;
        Ok(())
    }

    pub fn header(&mut self, header: &DemoHeader) -> FixtureResult<()> {
        let payload = encode_header(header)?;
        self.frame(FrameKind::FileHeader, wire::PREGAME_TICK, &payload)
    }

    pub fn send_tables(&mut self, serializers: &[Serializer]) -> FixtureResult<()> {
        let payload = encode_send_tables(serializers)?;
        self.frame(FrameKind::SendTables, wire::PREGAME_TICK, &payload)
    }

    pub fn class_info(&mut self, bindings: &[(ClassId, &str)]) -> FixtureResult<()> {
        let payload = encode_class_info(bindings)?;
        self.frame(FrameKind::ClassInfo, wire::PREGAME_TICK, &payload)
    }

    /// Writes a message-stream frame; empty packets are still written.
    pub fn packet(&mut self, kind: FrameKind, tick: u32, packet: &Packet) -> FixtureResult<()> {
        self.frame(kind, tick, &packet.payload)
    }

    pub fn stop(&mut self, tick: u32) -> FixtureResult<()> {
        self.frame(FrameKind::Stop, tick, &[])
    }

    /// Frames written so far.
    #[must_use]
    pub const fn frames(&self) -> usize {
        self.frames
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Message stream of one packet frame.
#[derive(Debug, Clone, Default)]
pub struct Packet {
    payload: Vec<u8>,
    messages: usize,
}

impl Packet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(&mut self, kind: MessageKind, body: &[u8]) -> FixtureResult<&mut Self> {
        encode_message(kind, body, &mut self.payload)?;
        self.messages += 1;
        Ok(self)
    }

    pub fn net_tick(&mut self, tick: u32) -> FixtureResult<&mut Self> {
        let mut body = PayloadWriter::new();
        body.write_varu32(tick);
        self.message(MessageKind::NetTick, &body.finish())
    }

    pub fn event_list(&mut self, events: &EventDescriptorTable) -> FixtureResult<&mut Self> {
        let body = events.encode()?;
        self.message(MessageKind::GameEventList, &body)
    }

    pub fn baseline(
        &mut self,
        classes: &ClassTable,
        class_id: ClassId,
        changes: &[(usize, PropValue)],
    ) -> FixtureResult<&mut Self> {
        let class = class_of(classes, class_id)?;
        let body = encode_instance_baseline(class, changes)?;
        self.message(MessageKind::InstanceBaseline, &body)
    }

    pub fn entities(&mut self, batch: EntityBatch<'_>, is_delta: bool) -> FixtureResult<&mut Self> {
        let body = batch.encode(is_delta)?;
        self.message(MessageKind::PacketEntities, &body)
    }

    pub fn event(
        &mut self,
        descriptor: &EventDescriptor,
        values: &[PropValue],
    ) -> FixtureResult<&mut Self> {
        let body = encode_event(descriptor, values)?;
        self.message(MessageKind::GameEvent, &body)
    }

    #[must_use]
    pub const fn messages(&self) -> usize {
        self.messages
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages == 0
    }
}

#[derive(Debug, Clone)]
enum EntityOp {
    Create {
        class_id: ClassId,
        serial: u32,
        changes: Vec<(usize, PropValue)>,
    },
    Update {
        class_id: ClassId,
        changes: Vec<(usize, PropValue)>,
    },
    Delete,
}

/// Entity operations of one `PacketEntities` message, at most one per slot.
///
/// Operations are written in ascending slot order regardless of the order
/// they were added in.
#[derive(Debug, Clone)]
pub struct EntityBatch<'c> {
    classes: &'c ClassTable,
    ops: BTreeMap<u32, EntityOp>,
}

impl<'c> EntityBatch<'c> {
    #[must_use]
    pub const fn new(classes: &'c ClassTable) -> Self {
        Self {
            classes,
            ops: BTreeMap::new(),
        }
    }

    /// Creates an entity, replacing any earlier operation on the slot.
    pub fn create(
        &mut self,
        index: u32,
        class_id: ClassId,
        serial: u32,
        changes: Vec<(usize, PropValue)>,
    ) -> &mut Self {
        self.ops.insert(
            index,
            EntityOp::Create {
                class_id,
                serial,
                changes,
            },
        );
        self
    }

    /// Sets one property, merging with an earlier create or update of the slot.
    pub fn set(
        &mut self,
        index: u32,
        class_id: ClassId,
        prop: usize,
        value: PropValue,
    ) -> &mut Self {
        let op = self.ops.entry(index).or_insert_with(|| EntityOp::Update {
            class_id,
            changes: Vec::new(),
        });
        if let EntityOp::Create { changes, .. } | EntityOp::Update { changes, .. } = op {
            match changes.iter_mut().find(|(i, _)| *i == prop) {
                Some(slot) => slot.1 = value,
                None => changes.push((prop, value)),
            }
        }
        self
    }

    pub fn delete(&mut self, index: u32) -> &mut Self {
        self.ops.insert(index, EntityOp::Delete);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Encodes the batch as a `PacketEntities` body.
    pub fn encode(self, is_delta: bool) -> FixtureResult<Vec<u8>> {
        let class_id_bits = self.classes.class_id_bits();
        let mut writer = EntityDataWriter::new();
        for (index, op) in self.ops {
            let index = EntityIndex::new(index);
            match op {
                EntityOp::Create {
                    class_id,
                    serial,
                    changes,
                } => {
                    let class = class_of(self.classes, class_id)?;
                    writer.create(index, class, class_id_bits, serial, &changes)?;
                }
                EntityOp::Update { class_id, changes } => {
                    let class = class_of(self.classes, class_id)?;
                    writer.update(index, class, &changes)?;
                }
                EntityOp::Delete => writer.delete(index)?,
            }
        }
        Ok(writer.finish(is_delta)?)
    }
}

fn class_of(classes: &ClassTable, class_id: ClassId) -> FixtureResult<&schema::EntityClass> {
    classes
        .get(class_id)
        .ok_or(CodecError::UnknownClass {
            class_id,
            offset: 0,
        })
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{self, pawn, PAWN};
    use wire::{FrameReader, Limits, MessageReader};

    #[test]
    fn batch_writes_slots_in_ascending_order() {
        let classes = catalog::class_table();
        let mut batch = EntityBatch::new(&classes);
        batch
            .set(9, PAWN, pawn::HEALTH, PropValue::UInt(50))
            .create(3, PAWN, 1, vec![(pawn::HEALTH, PropValue::UInt(100))])
            .set(3, PAWN, pawn::HEALTH, PropValue::UInt(90))
            .delete(7);
        assert_eq!(batch.len(), 3);
        assert!(batch.encode(true).is_ok());
    }

    #[test]
    fn unknown_class_is_an_error() {
        let classes = catalog::class_table();
        let mut batch = EntityBatch::new(&classes);
        batch.set(1, 99, 0, PropValue::Bool(true));
        assert!(batch.encode(true).is_err());
    }

    #[test]
    fn frames_and_messages_read_back() {
        let mut packet = Packet::new();
        packet
            .net_tick(300)
            .unwrap()
            .event_list(&catalog::event_descriptors())
            .unwrap();
        assert_eq!(packet.messages(), 2);

        let mut demo = DemoBuilder::new().compressed(true);
        demo.header(&DemoHeader::default()).unwrap();
        demo.packet(FrameKind::SignonPacket, wire::PREGAME_TICK, &packet)
            .unwrap();
        demo.stop(0).unwrap();
        assert_eq!(demo.frames(), 3);

        let bytes = demo.finish();
        let limits = Limits::default();
        let frames: Vec<_> = FrameReader::new(&bytes, limits.clone())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames[1].header.compressed);
        let payload = frames[1].decompressed(&limits).unwrap();
        let kinds: Vec<_> = MessageReader::new(&payload, 0, &limits)
            .map(|m| m.unwrap().kind)
            .collect();
        assert_eq!(kinds, vec![MessageKind::NetTick, MessageKind::GameEventList]);
    }
}
