//! Per-class instance baselines.

use std::collections::HashMap;

use schema::ClassId;
use wire::PayloadReader;

use crate::error::CodecResult;
use crate::reader::DataReader;

/// A decoded `InstanceBaseline` message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceBaseline<'a> {
    pub class_id: ClassId,
    /// Bit-packed field update applied to every new entity of the class.
    pub data: &'a [u8],
    /// Absolute offset of `data` in the file.
    pub data_offset: usize,
}

impl<'a> InstanceBaseline<'a> {
    /// Splits an `InstanceBaseline` body into its class id and field update.
    pub fn decode(body: &'a [u8], body_offset: usize) -> CodecResult<Self> {
        let mut reader = PayloadReader::new(body, body_offset);
        let class_id = reader.read_varu32()?;
        let data_offset = reader.offset();
        let data = reader.read_rest();
        Ok(Self {
            class_id,
            data,
            data_offset,
        })
    }
}

#[derive(Debug, Clone)]
struct Entry {
    data: Vec<u8>,
    offset: usize,
}

/// Latest baseline per class.
///
/// A later baseline for the same class replaces the earlier one.
#[derive(Debug, Default)]
pub struct BaselineStore {
    entries: HashMap<ClassId, Entry>,
}

impl BaselineStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a copy of the baseline's field update.
    pub fn insert(&mut self, baseline: &InstanceBaseline<'_>) {
        self.entries.insert(
            baseline.class_id,
            Entry {
                data: baseline.data.to_vec(),
                offset: baseline.data_offset,
            },
        );
    }

    /// Returns a reader over the stored field update for `class_id`.
    #[must_use]
    pub fn reader(&self, class_id: ClassId) -> Option<DataReader<'_>> {
        self.entries
            .get(&class_id)
            .map(|entry| DataReader::new(&entry.data, entry.offset))
    }

    #[must_use]
    pub fn contains(&self, class_id: ClassId) -> bool {
        self.entries.contains_key(&class_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wire::PayloadWriter;

    fn body(class_id: u32, data: &[u8]) -> Vec<u8> {
        let mut writer = PayloadWriter::new();
        writer.write_varu32(class_id);
        writer.write_bytes(data);
        writer.finish()
    }

    #[test]
    fn decode_splits_class_and_data() {
        let bytes = body(300, &[0xAA, 0xBB]);
        let baseline = InstanceBaseline::decode(&bytes, 100).unwrap();
        assert_eq!(baseline.class_id, 300);
        assert_eq!(baseline.data, &[0xAA, 0xBB]);
        assert_eq!(baseline.data_offset, 102);
    }

    #[test]
    fn later_baseline_replaces_earlier() {
        let first = body(3, &[0x01]);
        let second = body(3, &[0x02, 0x03]);
        let mut store = BaselineStore::new();
        store.insert(&InstanceBaseline::decode(&first, 0).unwrap());
        store.insert(&InstanceBaseline::decode(&second, 50).unwrap());
        assert_eq!(store.len(), 1);
        let reader = store.reader(3).unwrap();
        assert_eq!(reader.offset(), 51);
        assert_eq!(reader.bits_remaining(), 16);
    }

    #[test]
    fn missing_class_has_no_reader() {
        let store = BaselineStore::new();
        assert!(store.reader(1).is_none());
        assert!(!store.contains(1));
        assert!(store.is_empty());
    }
}
