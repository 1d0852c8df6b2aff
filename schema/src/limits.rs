//! Bounds applied while decoding schema payloads.

/// Limits for class tables and event descriptor lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaLimits {
    /// Maximum number of serializers or classes in one table.
    pub max_classes: usize,
    /// Maximum number of properties in one serializer.
    pub max_props_per_class: usize,
    /// Maximum number of event descriptors in one list.
    pub max_event_descriptors: usize,
    /// Maximum number of keys in one event descriptor.
    pub max_event_keys: usize,
}

impl Default for SchemaLimits {
    fn default() -> Self {
        Self {
            max_classes: 4096,
            max_props_per_class: 8192,
            max_event_descriptors: 4096,
            max_event_keys: 256,
        }
    }
}

impl SchemaLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_classes: 64,
            max_props_per_class: 64,
            max_event_descriptors: 64,
            max_event_keys: 16,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_classes: usize::MAX,
            max_props_per_class: usize::MAX,
            max_event_descriptors: usize::MAX,
            max_event_keys: usize::MAX,
        }
    }
}
