//! `FileHeader` payload: format version plus key/value metadata.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use wire::{EncodeError, PayloadReader, PayloadWriter};

use crate::error::{CodecError, CodecResult};

/// Header format versions this decoder understands.
pub const SUPPORTED_HEADER_VERSIONS: RangeInclusive<u32> = 1..=1;

/// Decoded demo header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemoHeader {
    pub version: u32,
    /// Metadata such as map name, server name and tick rate.
    pub entries: BTreeMap<String, String>,
}

impl DemoHeader {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

/// Decodes a `FileHeader` payload.
///
/// Duplicate keys keep the last value.
pub fn decode_header(payload: &[u8], base_offset: usize) -> CodecResult<DemoHeader> {
    let mut reader = PayloadReader::new(payload, base_offset);
    let version_offset = reader.offset();
    let version = reader.read_varu32()?;
    if !SUPPORTED_HEADER_VERSIONS.contains(&version) {
        return Err(CodecError::UnsupportedFormatVersion {
            found: version,
            offset: version_offset,
        });
    }
    let count = reader.read_varu32()?;
    let mut entries = BTreeMap::new();
    for _ in 0..count {
        let key = reader.read_string()?;
        let value = reader.read_string()?;
        entries.insert(key, value);
    }
    Ok(DemoHeader { version, entries })
}

/// Encodes a `FileHeader` payload.
pub fn encode_header(header: &DemoHeader) -> Result<Vec<u8>, EncodeError> {
    let mut writer = PayloadWriter::new();
    writer.write_varu32(header.version);
    let count = u32::try_from(header.entries.len()).map_err(|_| EncodeError::LengthOverflow {
        length: header.entries.len(),
    })?;
    writer.write_varu32(count);
    for (key, value) in &header.entries {
        writer.write_string(key)?;
        writer.write_string(value)?;
    }
    Ok(writer.finish())
}
