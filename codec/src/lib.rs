//! Entity state, property values and game events for demofile.
//!
//! This crate sits on top of `wire` (framing) and `schema` (class and event
//! tables) and turns message bodies into state:
//!
//! - [`decode_header`] reads the `FileHeader` metadata.
//! - [`EntityTable`] applies `PacketEntities` create/update/destroy entries,
//!   decoding only the properties a [`PropInterest`] asks for.
//! - [`decode_event`] decodes a `GameEvent` body against its descriptor.
//!
//! Every decode has a matching encoder so synthetic demos can be built.
//!
//! # Design Principles
//!
//! - **Skip what is not wanted** - Unwanted properties and events are
//!   stepped over by their encoded width, never materialized.
//! - **Explicit slot state** - Entity slots are absent or active, and every
//!   create gets a new generation.
//! - **Offsets on every failure** - Errors carry the absolute file offset.

mod baseline;
mod entities;
mod error;
mod events;
mod header;
mod limits;
mod reader;
mod scratch;
mod types;
mod value;

pub use baseline::{BaselineStore, InstanceBaseline};
pub use entities::{
    encode_instance_baseline, encode_packet_entities, write_field_update, AllProps, Entity,
    EntityChange, EntityDataWriter, EntityTable, PacketEntities, PropInterest, SERIAL_BITS,
};
pub use error::{CodecError, CodecResult, LimitKind};
pub use events::{decode_event, encode_event, peek_event_id};
pub use header::{decode_header, encode_header, DemoHeader, SUPPORTED_HEADER_VERSIONS};
pub use limits::CodecLimits;
pub use reader::DataReader;
pub use scratch::CodecScratch;
pub use types::{EntityHandle, EntityIndex, Generation, Tick};
pub use value::{decode_prop, encode_prop, skip_prop, PropValue};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = Tick::new(0);
        let _ = EntityIndex::new(0);
        let _ = Generation::new(0);
        let _ = EntityHandle::from_raw(EntityHandle::NULL);
        let _ = CodecLimits::default();
        let _ = EntityTable::new(CodecLimits::for_testing());
        let _ = CodecScratch::new();
        let _ = AllProps;

        let _: CodecResult<()> = Ok(());
    }

    #[test]
    fn prop_value_display() {
        assert_eq!(PropValue::UInt(7).to_string(), "7");
        assert_eq!(PropValue::Vector([1.0, 2.0, 3.0]).to_string(), "[1, 2, 3]");
        assert_eq!(PropValue::String("de_dust2".into()).to_string(), "de_dust2");
    }

    #[test]
    fn empty_table() {
        let table = EntityTable::new(CodecLimits::default());
        assert!(table.is_empty());
        assert_eq!(table.iter().count(), 0);
    }
}
