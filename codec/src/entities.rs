//! Entity table: applies `PacketEntities` create/update/destroy entries.
//!
//! Every slot is either absent or holds one active [`Entity`]. A destroy
//! returns the slot to absent; a later create at the same index starts a new
//! lifetime with a fresh [`Generation`].

use bitstream::BitWriter;
use schema::{ClassId, ClassTable, EntityClass};
use wire::{EncodeError, PayloadReader, PayloadWriter};

use crate::baseline::{BaselineStore, InstanceBaseline};
use crate::error::{CodecError, CodecResult, LimitKind};
use crate::limits::CodecLimits;
use crate::reader::DataReader;
use crate::scratch::CodecScratch;
use crate::types::{EntityHandle, EntityIndex, Generation};
use crate::value::{decode_prop, encode_prop, skip_prop, PropValue};

/// Bits used for the serial number of a created entity.
pub const SERIAL_BITS: u8 = 17;

/// Decides which properties of a class are materialized.
///
/// Properties that are not wanted are skipped by their encoded width.
pub trait PropInterest {
    fn wants(&self, class_id: ClassId, prop_index: usize) -> bool;
}

/// Materializes every property.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllProps;

impl PropInterest for AllProps {
    fn wants(&self, _class_id: ClassId, _prop_index: usize) -> bool {
        true
    }
}

/// Lifecycle change produced while applying entity data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityChange {
    Created {
        index: EntityIndex,
        generation: Generation,
        class_id: ClassId,
    },
    Deleted {
        index: EntityIndex,
        generation: Generation,
        class_id: ClassId,
    },
}

/// One live entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub index: EntityIndex,
    pub generation: Generation,
    pub serial: u32,
    pub class_id: ClassId,
    values: Vec<Option<PropValue>>,
}

impl Entity {
    fn new(
        index: EntityIndex,
        generation: Generation,
        serial: u32,
        class_id: ClassId,
        prop_count: usize,
    ) -> Self {
        Self {
            index,
            generation,
            serial,
            class_id,
            values: vec![None; prop_count],
        }
    }

    /// Current value of a property, `None` until it has been received.
    #[must_use]
    pub fn value(&self, prop_index: usize) -> Option<&PropValue> {
        self.values.get(prop_index).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn values(&self) -> &[Option<PropValue>] {
        &self.values
    }

    /// Handle that other entities use to refer to this one.
    #[must_use]
    pub const fn handle(&self) -> EntityHandle {
        EntityHandle::for_index(self.index, self.serial)
    }
}

#[derive(Debug, Clone, Default)]
enum Slot {
    #[default]
    Absent,
    Active(Entity),
}

/// A decoded `PacketEntities` message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketEntities<'a> {
    pub updated_entries: u32,
    /// `false` for a full snapshot, which replaces every active entity.
    pub is_delta: bool,
    pub data: &'a [u8],
    /// Absolute offset of `data` in the file.
    pub data_offset: usize,
}

impl<'a> PacketEntities<'a> {
    pub fn decode(body: &'a [u8], body_offset: usize) -> CodecResult<Self> {
        let mut reader = PayloadReader::new(body, body_offset);
        let updated_entries = reader.read_varu32()?;
        let is_delta = reader.read_u8()? != 0;
        let len = reader.read_varu32()? as usize;
        let data_offset = reader.offset();
        let data = reader.read_bytes(len)?;
        Ok(Self {
            updated_entries,
            is_delta,
            data,
            data_offset,
        })
    }
}

/// Live entity state for one parse session.
#[derive(Debug, Default)]
pub struct EntityTable {
    slots: Vec<Slot>,
    baselines: BaselineStore,
    scratch: CodecScratch,
    next_generation: u32,
    active: usize,
    limits: CodecLimits,
}

impl EntityTable {
    #[must_use]
    pub fn new(limits: CodecLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn limits(&self) -> &CodecLimits {
        &self.limits
    }

    /// Records the baseline for a class.
    pub fn set_baseline(&mut self, baseline: &InstanceBaseline<'_>) {
        self.baselines.insert(baseline);
    }

    #[must_use]
    pub const fn baselines(&self) -> &BaselineStore {
        &self.baselines
    }

    /// Applies one `PacketEntities` message, appending lifecycle changes to
    /// `changes` in the order they happened.
    pub fn apply<I: PropInterest + ?Sized>(
        &mut self,
        classes: &ClassTable,
        packet: &PacketEntities<'_>,
        interest: &I,
        changes: &mut Vec<EntityChange>,
    ) -> CodecResult<()> {
        // Slots a full snapshot lists; every other active slot goes away after it.
        let mut listed = if packet.is_delta {
            Vec::new()
        } else {
            log::trace!("full entity snapshot over {} entities", self.active);
            vec![false; self.slots.len()]
        };
        let mut reader = DataReader::new(packet.data, packet.data_offset);
        let mut index: i64 = -1;
        for _ in 0..packet.updated_entries {
            let entry_offset = reader.offset();
            index += 1 + i64::from(reader.read_ubitvar()?);
            let slot = self.check_index(index, entry_offset)?;
            if let Some(seen) = listed.get_mut(slot) {
                *seen = true;
            }
            if reader.read_bit()? {
                // Delete flag; leaving and deleting are handled alike.
                reader.read_bit()?;
                self.destroy(slot, changes);
            } else if reader.read_bit()? {
                let full = !packet.is_delta;
                self.create(slot, full, classes, &mut reader, interest, changes)?;
            } else {
                self.update(slot, classes, &mut reader, interest, entry_offset)?;
            }
        }
        for (slot, seen) in listed.into_iter().enumerate() {
            if !seen {
                self.destroy(slot, changes);
            }
        }
        Ok(())
    }

    fn check_index(&self, index: i64, offset: usize) -> CodecResult<usize> {
        let too_many = |actual: usize| CodecError::LimitsExceeded {
            kind: LimitKind::Entities,
            limit: self.limits.max_entities,
            actual,
            offset,
        };
        let slot = usize::try_from(index).map_err(|_| too_many(usize::MAX))?;
        if slot >= self.limits.max_entities || u32::try_from(slot).is_err() {
            return Err(too_many(slot.saturating_add(1)));
        }
        Ok(slot)
    }

    /// Creates the entity in `slot`. In a full snapshot, a create that
    /// repeats the live entity's class and serial updates it in place.
    fn create<I: PropInterest + ?Sized>(
        &mut self,
        slot: usize,
        full: bool,
        classes: &ClassTable,
        reader: &mut DataReader<'_>,
        interest: &I,
        changes: &mut Vec<EntityChange>,
    ) -> CodecResult<()> {
        let class_offset = reader.offset();
        let class_id = reader.read_bits(classes.class_id_bits())? as ClassId;
        let serial = reader.read_bits(SERIAL_BITS)? as u32;
        reader.skip_varu32()?;
        let class = classes.get(class_id).ok_or(CodecError::UnknownClass {
            class_id,
            offset: class_offset,
        })?;

        if full {
            if let Some(Slot::Active(entity)) = self.slots.get_mut(slot) {
                if entity.class_id == class_id && entity.serial == serial {
                    return read_field_update(
                        reader,
                        class,
                        entity,
                        interest,
                        &self.limits,
                        &mut self.scratch,
                    );
                }
            }
        }

        self.destroy(slot, changes);
        self.next_generation = self.next_generation.wrapping_add(1);
        let generation = Generation::new(self.next_generation);
        let index = EntityIndex::new(slot as u32);
        let mut entity = Entity::new(index, generation, serial, class_id, class.prop_count());

        if let Some(mut baseline) = self.baselines.reader(class_id) {
            read_field_update(
                &mut baseline,
                class,
                &mut entity,
                interest,
                &self.limits,
                &mut self.scratch,
            )?;
        }
        read_field_update(
            reader,
            class,
            &mut entity,
            interest,
            &self.limits,
            &mut self.scratch,
        )?;

        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, Slot::default);
        }
        self.slots[slot] = Slot::Active(entity);
        self.active += 1;
        changes.push(EntityChange::Created {
            index,
            generation,
            class_id,
        });
        Ok(())
    }

    fn update<I: PropInterest + ?Sized>(
        &mut self,
        slot: usize,
        classes: &ClassTable,
        reader: &mut DataReader<'_>,
        interest: &I,
        entry_offset: usize,
    ) -> CodecResult<()> {
        let Some(Slot::Active(entity)) = self.slots.get_mut(slot) else {
            return Err(CodecError::EntityNotFound {
                index: slot as u32,
                offset: entry_offset,
            });
        };
        let class = classes
            .get(entity.class_id)
            .ok_or(CodecError::UnknownClass {
                class_id: entity.class_id,
                offset: entry_offset,
            })?;
        read_field_update(
            reader,
            class,
            entity,
            interest,
            &self.limits,
            &mut self.scratch,
        )
    }

    fn destroy(&mut self, slot: usize, changes: &mut Vec<EntityChange>) {
        let Some(entry) = self.slots.get_mut(slot) else {
            return;
        };
        if let Slot::Active(entity) = std::mem::take(entry) {
            self.active -= 1;
            changes.push(EntityChange::Deleted {
                index: entity.index,
                generation: entity.generation,
                class_id: entity.class_id,
            });
        }
    }

    /// Destroys every active entity. Baselines are kept.
    pub fn clear(&mut self, changes: &mut Vec<EntityChange>) {
        for slot in 0..self.slots.len() {
            self.destroy(slot, changes);
        }
    }

    #[must_use]
    pub fn get(&self, index: EntityIndex) -> Option<&Entity> {
        match self.slots.get(index.raw() as usize) {
            Some(Slot::Active(entity)) => Some(entity),
            _ => None,
        }
    }

    /// Resolves a handle-typed value to the entity in its slot.
    #[must_use]
    pub fn by_handle(&self, handle: EntityHandle) -> Option<&Entity> {
        handle.index().and_then(|index| self.get(index))
    }

    /// Active entities in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Active(entity) => Some(entity),
            Slot::Absent => None,
        })
    }

    /// Number of active entities.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.active
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.active == 0
    }
}

fn read_field_update<I: PropInterest + ?Sized>(
    reader: &mut DataReader<'_>,
    class: &EntityClass,
    entity: &mut Entity,
    interest: &I,
    limits: &CodecLimits,
    scratch: &mut CodecScratch,
) -> CodecResult<()> {
    let prop_count = class.prop_count();
    let changed = scratch.changed_mut();
    let mut previous: i64 = -1;
    while reader.read_bit()? {
        let offset = reader.offset();
        let next = previous + 1 + i64::from(reader.read_ubitvar()?);
        let index = usize::try_from(next).unwrap_or(usize::MAX);
        if index >= prop_count {
            return Err(CodecError::InvalidPropertyIndex {
                class_id: class.id,
                index,
                prop_count,
                offset,
            });
        }
        if changed.len() >= limits.max_changed_props {
            return Err(CodecError::LimitsExceeded {
                kind: LimitKind::ChangedProps,
                limit: limits.max_changed_props,
                actual: changed.len() + 1,
                offset,
            });
        }
        changed.push(index);
        previous = next;
    }

    if entity.values.len() < prop_count {
        entity.values.resize(prop_count, None);
    }
    for &index in changed.iter() {
        let ty = &class.props()[index].ty;
        if interest.wants(class.id, index) {
            entity.values[index] = Some(decode_prop(ty, reader, limits.max_string_bytes)?);
        } else {
            skip_prop(ty, reader, limits.max_string_bytes)?;
        }
    }
    Ok(())
}

/// Writes a field update for `changes`, which may be in any order.
pub fn write_field_update(
    writer: &mut BitWriter,
    class: &EntityClass,
    changes: &[(usize, PropValue)],
) -> CodecResult<()> {
    let mut sorted: Vec<&(usize, PropValue)> = changes.iter().collect();
    sorted.sort_by_key(|(index, _)| *index);
    sorted.dedup_by_key(|(index, _)| *index);

    let mut previous: i64 = -1;
    for (index, _) in &sorted {
        if *index >= class.prop_count() {
            return Err(CodecError::InvalidPropertyIndex {
                class_id: class.id,
                index: *index,
                prop_count: class.prop_count(),
                offset: 0,
            });
        }
        let delta = *index as i64 - previous - 1;
        writer.write_bit(true);
        writer.write_ubitvar(delta as u32);
        previous = *index as i64;
    }
    writer.write_bit(false);
    for (index, value) in sorted {
        encode_prop(&class.props()[*index].ty, value, writer)?;
    }
    Ok(())
}

/// Builds the bit-packed entity data of one `PacketEntities` message.
///
/// Entries must be written in ascending index order.
#[derive(Debug, Default)]
pub struct EntityDataWriter {
    bits: BitWriter,
    last: Option<u32>,
    entries: u32,
}

impl EntityDataWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn write_index(&mut self, index: EntityIndex) -> CodecResult<()> {
        let current = index.raw();
        let delta = match self.last {
            Some(previous) if current <= previous => {
                return Err(CodecError::InvalidEntityOrder { previous, current });
            }
            Some(previous) => current - previous - 1,
            None => current,
        };
        self.bits.write_ubitvar(delta);
        self.last = Some(current);
        self.entries += 1;
        Ok(())
    }

    /// Creates an entity of `class` in slot `index`.
    pub fn create(
        &mut self,
        index: EntityIndex,
        class: &EntityClass,
        class_id_bits: u8,
        serial: u32,
        changes: &[(usize, PropValue)],
    ) -> CodecResult<()> {
        self.write_index(index)?;
        self.bits.write_bit(false);
        self.bits.write_bit(true);
        self.bits
            .write_bits(u64::from(class.id), class_id_bits)
            .map_err(|error| CodecError::Bitstream { error, offset: 0 })?;
        self.bits
            .write_bits(u64::from(serial), SERIAL_BITS)
            .map_err(|error| CodecError::Bitstream { error, offset: 0 })?;
        self.bits.write_bit_varu32(0);
        write_field_update(&mut self.bits, class, changes)
    }

    /// Updates properties of the entity in slot `index`.
    pub fn update(
        &mut self,
        index: EntityIndex,
        class: &EntityClass,
        changes: &[(usize, PropValue)],
    ) -> CodecResult<()> {
        self.write_index(index)?;
        self.bits.write_bit(false);
        self.bits.write_bit(false);
        write_field_update(&mut self.bits, class, changes)
    }

    /// Destroys the entity in slot `index`.
    pub fn delete(&mut self, index: EntityIndex) -> CodecResult<()> {
        self.write_index(index)?;
        self.bits.write_bit(true);
        self.bits.write_bit(true);
        Ok(())
    }

    #[must_use]
    pub const fn entries(&self) -> u32 {
        self.entries
    }

    /// Finishes the data and wraps it in a `PacketEntities` body.
    pub fn finish(self, is_delta: bool) -> Result<Vec<u8>, EncodeError> {
        let entries = self.entries;
        encode_packet_entities(entries, is_delta, &self.bits.finish())
    }
}

/// Encodes a `PacketEntities` message body.
pub fn encode_packet_entities(
    updated_entries: u32,
    is_delta: bool,
    data: &[u8],
) -> Result<Vec<u8>, EncodeError> {
    let mut writer = PayloadWriter::new();
    writer.write_varu32(updated_entries);
    writer.write_u8(u8::from(is_delta));
    writer.write_len_prefixed(data)?;
    Ok(writer.finish())
}

/// Encodes an `InstanceBaseline` message body for `class`.
pub fn encode_instance_baseline(
    class: &EntityClass,
    changes: &[(usize, PropValue)],
) -> CodecResult<Vec<u8>> {
    let mut bits = BitWriter::new();
    write_field_update(&mut bits, class, changes)?;
    let mut writer = PayloadWriter::new();
    writer.write_varu32(class.id);
    writer.write_bytes(&bits.finish());
    Ok(writer.finish())
}
