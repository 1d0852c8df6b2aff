//! Entity classes: serializers from `SendTables`, ids from `ClassInfo`.

use std::collections::{BTreeMap, HashMap};

use wire::{EncodeError, PayloadReader, PayloadWriter};

use crate::error::{SchemaError, SchemaLimitKind, SchemaResult};
use crate::limits::SchemaLimits;
use crate::prop::{PropDef, PropType};

/// Numeric class id as carried by entity creates.
pub type ClassId = u32;

/// A named property layout, declared by `SendTables`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Serializer {
    pub name: String,
    pub props: Vec<PropDef>,
}

impl Serializer {
    #[must_use]
    pub fn new(name: impl Into<String>, props: Vec<PropDef>) -> Self {
        Self {
            name: name.into(),
            props,
        }
    }
}

/// An entity class bound to its property layout.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityClass {
    pub id: ClassId,
    pub name: String,
    props: Vec<PropDef>,
    by_name: HashMap<String, usize>,
}

impl EntityClass {
    #[must_use]
    pub fn new(id: ClassId, name: impl Into<String>, props: Vec<PropDef>) -> Self {
        let by_name = props
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();
        Self {
            id,
            name: name.into(),
            props,
            by_name,
        }
    }

    #[must_use]
    pub fn props(&self) -> &[PropDef] {
        &self.props
    }

    #[must_use]
    pub fn prop_count(&self) -> usize {
        self.props.len()
    }

    #[must_use]
    pub fn prop(&self, index: usize) -> Option<&PropDef> {
        self.props.get(index)
    }

    /// Returns the property index for `name`.
    #[must_use]
    pub fn find_prop(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }
}

/// Every class known to the current parse session.
///
/// Serializers and class bindings may arrive in either order; binding a
/// class whose serializer is unknown yields a class with no properties.
#[derive(Debug, Clone)]
pub struct ClassTable {
    serializers: HashMap<String, Vec<PropDef>>,
    classes: BTreeMap<ClassId, EntityClass>,
    class_id_bits: u8,
}

impl Default for ClassTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            serializers: HashMap::new(),
            classes: BTreeMap::new(),
            class_id_bits: 1,
        }
    }

    /// Registers serializers; a later serializer with the same name replaces
    /// the earlier one.
    pub fn add_serializers(&mut self, serializers: Vec<Serializer>) {
        for serializer in serializers {
            self.serializers.insert(serializer.name, serializer.props);
        }
    }

    /// Binds class ids to serializers by network name.
    ///
    /// Returns the names of classes that had no serializer.
    pub fn bind_classes(&mut self, bindings: Vec<(ClassId, String)>) -> Vec<String> {
        let mut missing = Vec::new();
        for (id, name) in bindings {
            let props = if let Some(props) = self.serializers.get(&name) {
                props.clone()
            } else {
                missing.push(name.clone());
                Vec::new()
            };
            self.classes.insert(id, EntityClass::new(id, name, props));
        }
        self.class_id_bits = self
            .classes
            .keys()
            .next_back()
            .map_or(1, |max| class_id_bits(*max));
        missing
    }

    #[must_use]
    pub fn get(&self, id: ClassId) -> Option<&EntityClass> {
        self.classes.get(&id)
    }

    /// Iterates classes in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityClass> {
        self.classes.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Bit width of class ids in entity creates.
    #[must_use]
    pub const fn class_id_bits(&self) -> u8 {
        self.class_id_bits
    }

    /// Returns `true` once any serializer or class has been registered.
    #[must_use]
    pub fn has_schema(&self) -> bool {
        !self.serializers.is_empty() || !self.classes.is_empty()
    }
}

/// Number of bits needed to represent `max_id` (at least one).
#[must_use]
pub const fn class_id_bits(max_id: ClassId) -> u8 {
    let bits = u32::BITS - max_id.leading_zeros();
    if bits == 0 {
        1
    } else {
        bits as u8
    }
}

/// Decodes a `SendTables` payload.
pub fn decode_send_tables(
    payload: &[u8],
    base_offset: usize,
    limits: &SchemaLimits,
) -> SchemaResult<Vec<Serializer>> {
    let mut reader = PayloadReader::new(payload, base_offset);
    let count = read_count(&mut reader, SchemaLimitKind::Classes, limits.max_classes)?;
    let mut serializers = Vec::with_capacity(count.min(256));
    for _ in 0..count {
        let name = reader.read_string()?;
        let n_props = read_count(
            &mut reader,
            SchemaLimitKind::PropsPerClass,
            limits.max_props_per_class,
        )?;
        let mut props = Vec::with_capacity(n_props.min(256));
        for _ in 0..n_props {
            let prop_name = reader.read_string()?;
            let ty = PropType::decode(&mut reader)?;
            props.push(PropDef::new(prop_name, ty));
        }
        serializers.push(Serializer { name, props });
    }
    Ok(serializers)
}

/// Encodes a `SendTables` payload.
pub fn encode_send_tables(serializers: &[Serializer]) -> Result<Vec<u8>, EncodeError> {
    let mut writer = PayloadWriter::new();
    writer.write_varu32(len_u32(serializers.len())?);
    for serializer in serializers {
        writer.write_string(&serializer.name)?;
        writer.write_varu32(len_u32(serializer.props.len())?);
        for prop in &serializer.props {
            writer.write_string(&prop.name)?;
            prop.ty.encode(&mut writer);
        }
    }
    Ok(writer.finish())
}

/// Decodes a `ClassInfo` payload into `(class id, network name)` pairs.
pub fn decode_class_info(
    payload: &[u8],
    base_offset: usize,
    limits: &SchemaLimits,
) -> SchemaResult<Vec<(ClassId, String)>> {
    let mut reader = PayloadReader::new(payload, base_offset);
    let count = read_count(&mut reader, SchemaLimitKind::Classes, limits.max_classes)?;
    let mut bindings = Vec::with_capacity(count.min(256));
    for _ in 0..count {
        let id = reader.read_varu32()?;
        let name = reader.read_string()?;
        bindings.push((id, name));
    }
    Ok(bindings)
}

/// Encodes a `ClassInfo` payload.
pub fn encode_class_info(bindings: &[(ClassId, &str)]) -> Result<Vec<u8>, EncodeError> {
    let mut writer = PayloadWriter::new();
    writer.write_varu32(len_u32(bindings.len())?);
    for (id, name) in bindings {
        writer.write_varu32(*id);
        writer.write_string(name)?;
    }
    Ok(writer.finish())
}

pub(crate) fn read_count(
    reader: &mut PayloadReader<'_>,
    kind: SchemaLimitKind,
    limit: usize,
) -> SchemaResult<usize> {
    let offset = reader.offset();
    let count = reader.read_varu32()? as usize;
    if count > limit {
        return Err(SchemaError::LimitsExceeded {
            kind,
            limit,
            actual: count,
            offset,
        });
    }
    Ok(count)
}

pub(crate) fn len_u32(len: usize) -> Result<u32, EncodeError> {
    u32::try_from(len).map_err(|_| EncodeError::LengthOverflow { length: len })
}
