//! Class and event schemas for the demofile decoder.
//!
//! This crate defines how a demo describes its own data:
//! - Property type descriptors and their wire tags
//! - Serializers (`SendTables`) and class bindings (`ClassInfo`)
//! - Game event descriptors (`GameEventList`)
//!
//! # Design Principles
//!
//! - **Schemas come from the file** - Nothing is hard-coded; every class and
//!   event layout is read from the demo being parsed.
//! - **Session scoped** - Tables live for one parse and are never shared.
//! - **Unknown is data** - Unknown event key types are kept as
//!   [`EventKeyType::Unknown`] so whole descriptors can be skipped later.

mod class;
mod error;
mod event;
mod limits;
mod prop;

pub use class::{
    class_id_bits, decode_class_info, decode_send_tables, encode_class_info, encode_send_tables,
    ClassId, ClassTable, EntityClass, Serializer,
};
pub use error::{SchemaError, SchemaLimitKind, SchemaResult};
pub use event::{EventDescriptor, EventDescriptorTable, EventKey, EventKeyType};
pub use limits::SchemaLimits;
pub use prop::{PropDef, PropType, QuantizedFloat};
