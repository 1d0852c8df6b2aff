//! Game event descriptors from `GameEventList` messages.

use std::collections::{BTreeSet, HashMap};

use wire::{EncodeError, PayloadReader, PayloadWriter};

use crate::class::{len_u32, read_count};
use crate::error::{SchemaLimitKind, SchemaResult};
use crate::limits::SchemaLimits;

/// Encoded type of one event key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKeyType {
    String,
    Float,
    Long,
    Short,
    Byte,
    Bool,
    UInt64,
    /// Entity handle of a player pawn.
    PlayerPawn,
    /// Entity index of a player controller.
    PlayerController,
    /// A type this decoder cannot size.
    Unknown(u8),
}

impl EventKeyType {
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::String,
            2 => Self::Float,
            3 => Self::Long,
            4 => Self::Short,
            5 => Self::Byte,
            6 => Self::Bool,
            7 => Self::UInt64,
            8 => Self::PlayerPawn,
            9 => Self::PlayerController,
            other => Self::Unknown(other),
        }
    }

    #[must_use]
    pub const fn raw(self) -> u8 {
        match self {
            Self::String => 1,
            Self::Float => 2,
            Self::Long => 3,
            Self::Short => 4,
            Self::Byte => 5,
            Self::Bool => 6,
            Self::UInt64 => 7,
            Self::PlayerPawn => 8,
            Self::PlayerController => 9,
            Self::Unknown(raw) => raw,
        }
    }

    /// Returns `true` if the key refers to a player.
    #[must_use]
    pub const fn is_player(self) -> bool {
        matches!(self, Self::PlayerPawn | Self::PlayerController)
    }
}

/// One declared key of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventKey {
    pub name: String,
    pub ty: EventKeyType,
}

impl EventKey {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: EventKeyType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Name and ordered key schema of one event id.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventDescriptor {
    pub id: u32,
    pub name: String,
    pub keys: Vec<EventKey>,
}

impl EventDescriptor {
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, keys: Vec<EventKey>) -> Self {
        Self {
            id,
            name: name.into(),
            keys,
        }
    }

    /// Returns `false` if any key has a type that cannot be decoded.
    #[must_use]
    pub fn is_decodable(&self) -> bool {
        !self
            .keys
            .iter()
            .any(|k| matches!(k.ty, EventKeyType::Unknown(_)))
    }
}

/// Event descriptors indexed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDescriptorTable {
    by_id: HashMap<u32, EventDescriptor>,
}

impl EventDescriptorTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a `GameEventList` body.
    pub fn decode(payload: &[u8], base_offset: usize, limits: &SchemaLimits) -> SchemaResult<Self> {
        let mut reader = PayloadReader::new(payload, base_offset);
        let count = read_count(
            &mut reader,
            SchemaLimitKind::EventDescriptors,
            limits.max_event_descriptors,
        )?;
        let mut table = Self::new();
        for _ in 0..count {
            let id = reader.read_varu32()?;
            let name = reader.read_string()?;
            let n_keys = read_count(&mut reader, SchemaLimitKind::EventKeys, limits.max_event_keys)?;
            let mut keys = Vec::with_capacity(n_keys);
            for _ in 0..n_keys {
                let ty = EventKeyType::from_raw(reader.read_u8()?);
                let key_name = reader.read_string()?;
                keys.push(EventKey { name: key_name, ty });
            }
            table.insert(EventDescriptor { id, name, keys });
        }
        Ok(table)
    }

    /// Encodes the table as a `GameEventList` body, in ascending id order.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut descriptors: Vec<_> = self.by_id.values().collect();
        descriptors.sort_by_key(|d| d.id);

        let mut writer = PayloadWriter::new();
        writer.write_varu32(len_u32(descriptors.len())?);
        for descriptor in descriptors {
            writer.write_varu32(descriptor.id);
            writer.write_string(&descriptor.name)?;
            writer.write_varu32(len_u32(descriptor.keys.len())?);
            for key in &descriptor.keys {
                writer.write_u8(key.ty.raw());
                writer.write_string(&key.name)?;
            }
        }
        Ok(writer.finish())
    }

    /// Inserts a descriptor, replacing any earlier one with the same id.
    pub fn insert(&mut self, descriptor: EventDescriptor) {
        self.by_id.insert(descriptor.id, descriptor);
    }

    /// Inserts every descriptor of `other`; later lists replace earlier ids.
    pub fn merge(&mut self, other: Self) {
        self.by_id.extend(other.by_id);
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<&EventDescriptor> {
        self.by_id.get(&id)
    }

    /// Returns `true` if any descriptor has this name.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.by_id.values().any(|d| d.name == name)
    }

    /// Declared event names, sorted and de-duplicated.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.by_id
            .values()
            .map(|d| d.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SchemaError;

    fn sample() -> EventDescriptorTable {
        let mut table = EventDescriptorTable::new();
        table.insert(EventDescriptor::new(
            7,
            "player_death",
            vec![
                EventKey::new("userid", EventKeyType::PlayerController),
                EventKey::new("attacker", EventKeyType::PlayerController),
                EventKey::new("weapon", EventKeyType::String),
                EventKey::new("headshot", EventKeyType::Bool),
            ],
        ));
        table.insert(EventDescriptor::new(
            2,
            "round_end",
            vec![EventKey::new("winner", EventKeyType::Byte)],
        ));
        table
    }

    #[test]
    fn table_roundtrip() {
        let table = sample();
        let bytes = table.encode().unwrap();
        let decoded =
            EventDescriptorTable::decode(&bytes, 0, &SchemaLimits::for_testing()).unwrap();
        assert_eq!(decoded, table);
    }

    #[test]
    fn names_sorted() {
        assert_eq!(sample().names(), vec!["player_death", "round_end"]);
        assert!(sample().contains_name("round_end"));
        assert!(!sample().contains_name("bomb_planted"));
    }

    #[test]
    fn unknown_key_type_marks_undecodable() {
        let descriptor = EventDescriptor::new(
            1,
            "future_event",
            vec![EventKey::new("blob", EventKeyType::from_raw(42))],
        );
        assert!(!descriptor.is_decodable());
        assert!(sample().get(7).unwrap().is_decodable());
    }

    #[test]
    fn key_type_raw_roundtrip() {
        for raw in 0..=12u8 {
            assert_eq!(EventKeyType::from_raw(raw).raw(), raw);
        }
        assert!(EventKeyType::PlayerPawn.is_player());
        assert!(!EventKeyType::Long.is_player());
    }

    #[test]
    fn key_limit_enforced() {
        let bytes = sample().encode().unwrap();
        let limits = SchemaLimits {
            max_event_keys: 2,
            ..SchemaLimits::for_testing()
        };
        let err = EventDescriptorTable::decode(&bytes, 0, &limits).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::LimitsExceeded {
                kind: SchemaLimitKind::EventKeys,
                ..
            }
        ));
    }
}
