//! Limits for codec-level decoding.

use schema::SchemaLimits;

/// Codec-specific limits enforced while decoding schemas, entities and events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecLimits {
    /// Maximum entity slot index plus one.
    pub max_entities: usize,
    /// Maximum number of classes or serializers in one table.
    pub max_classes: usize,
    /// Maximum number of properties in one class.
    pub max_props_per_class: usize,
    /// Maximum number of changed properties in one field update.
    pub max_changed_props: usize,
    /// Maximum length of one string value.
    pub max_string_bytes: usize,
    /// Maximum number of event descriptors in one list.
    pub max_event_descriptors: usize,
    /// Maximum number of keys per event descriptor.
    pub max_event_keys: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_entities: 16_384,
            max_classes: 4096,
            max_props_per_class: 8192,
            max_changed_props: 8192,
            max_string_bytes: 64 * 1024,
            max_event_descriptors: 4096,
            max_event_keys: 256,
        }
    }
}

impl CodecLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_entities: 256,
            max_classes: 64,
            max_props_per_class: 64,
            max_changed_props: 64,
            max_string_bytes: 256,
            max_event_descriptors: 64,
            max_event_keys: 16,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_entities: usize::MAX,
            max_classes: usize::MAX,
            max_props_per_class: usize::MAX,
            max_changed_props: usize::MAX,
            max_string_bytes: usize::MAX,
            max_event_descriptors: usize::MAX,
            max_event_keys: usize::MAX,
        }
    }

    /// The subset of limits that applies to schema payloads.
    #[must_use]
    pub const fn schema(&self) -> SchemaLimits {
        SchemaLimits {
            max_classes: self.max_classes,
            max_props_per_class: self.max_props_per_class,
            max_event_descriptors: self.max_event_descriptors,
            max_event_keys: self.max_event_keys,
        }
    }
}
