//! `GameEvent` message bodies.

use schema::{EventDescriptor, EventKeyType};
use wire::{PayloadReader, PayloadWriter};

use crate::error::{CodecError, CodecResult, LimitKind};
use crate::value::PropValue;

/// Reads only the event id, leaving the values undecoded.
pub fn peek_event_id(body: &[u8], body_offset: usize) -> CodecResult<u32> {
    let mut reader = PayloadReader::new(body, body_offset);
    Ok(reader.read_varu32()?)
}

/// Decodes the values of one event, one per descriptor key in order.
///
/// The descriptor must be decodable; a key of unknown type is rejected.
pub fn decode_event(
    descriptor: &EventDescriptor,
    body: &[u8],
    body_offset: usize,
    max_string_bytes: usize,
) -> CodecResult<Vec<PropValue>> {
    let mut reader = PayloadReader::new(body, body_offset);
    reader.read_varu32()?;
    let mut values = Vec::with_capacity(descriptor.keys.len());
    for key in &descriptor.keys {
        let value = match key.ty {
            EventKeyType::String => {
                let offset = reader.offset();
                let len = reader.read_varu32()? as usize;
                if len > max_string_bytes {
                    return Err(CodecError::LimitsExceeded {
                        kind: LimitKind::StringBytes,
                        limit: max_string_bytes,
                        actual: len,
                        offset,
                    });
                }
                PropValue::String(String::from_utf8_lossy(reader.read_bytes(len)?).into_owned())
            }
            EventKeyType::Float => PropValue::Float(reader.read_f32()?),
            EventKeyType::Long => PropValue::SInt(i64::from(reader.read_vars32()?)),
            EventKeyType::Short => PropValue::SInt(i64::from(reader.read_i16()?)),
            EventKeyType::Byte => PropValue::UInt(u64::from(reader.read_u8()?)),
            EventKeyType::Bool => PropValue::Bool(reader.read_u8()? != 0),
            EventKeyType::UInt64 => PropValue::UInt(reader.read_u64()?),
            EventKeyType::PlayerPawn => PropValue::Handle(reader.read_varu32()?),
            EventKeyType::PlayerController => PropValue::UInt(u64::from(reader.read_varu32()?)),
            EventKeyType::Unknown(_) => {
                return Err(CodecError::ValueMismatch {
                    expected: "known event key type",
                    found: "unknown",
                })
            }
        };
        values.push(value);
    }
    Ok(values)
}

/// Encodes one event occurrence for `descriptor`.
pub fn encode_event(descriptor: &EventDescriptor, values: &[PropValue]) -> CodecResult<Vec<u8>> {
    if values.len() != descriptor.keys.len() {
        return Err(CodecError::ValueMismatch {
            expected: "one value per event key",
            found: "wrong value count",
        });
    }
    let mut writer = PayloadWriter::new();
    writer.write_varu32(descriptor.id);
    for (key, value) in descriptor.keys.iter().zip(values) {
        match (key.ty, value) {
            (EventKeyType::String, PropValue::String(s)) => {
                writer
                    .write_string(s)
                    .map_err(|_| mismatch("string", value))?;
            }
            (EventKeyType::Float, PropValue::Float(v)) => writer.write_f32(*v),
            (EventKeyType::Long, PropValue::SInt(v)) => {
                let v = i32::try_from(*v).map_err(|_| mismatch("long", value))?;
                writer.write_vars32(v);
            }
            (EventKeyType::Short, PropValue::SInt(v)) => {
                let v = i16::try_from(*v).map_err(|_| mismatch("short", value))?;
                writer.write_i16(v);
            }
            (EventKeyType::Byte, PropValue::UInt(v)) => {
                let v = u8::try_from(*v).map_err(|_| mismatch("byte", value))?;
                writer.write_u8(v);
            }
            (EventKeyType::Bool, PropValue::Bool(v)) => writer.write_u8(u8::from(*v)),
            (EventKeyType::UInt64, PropValue::UInt(v)) => writer.write_u64(*v),
            (EventKeyType::PlayerPawn, PropValue::Handle(v)) => writer.write_varu32(*v),
            (EventKeyType::PlayerController, PropValue::UInt(v)) => {
                let v = u32::try_from(*v).map_err(|_| mismatch("player controller", value))?;
                writer.write_varu32(v);
            }
            (ty, _) => return Err(mismatch(key_type_name(ty), value)),
        }
    }
    Ok(writer.finish())
}

fn mismatch(expected: &'static str, value: &PropValue) -> CodecError {
    CodecError::ValueMismatch {
        expected,
        found: value.kind_name(),
    }
}

const fn key_type_name(ty: EventKeyType) -> &'static str {
    match ty {
        EventKeyType::String => "string",
        EventKeyType::Float => "float",
        EventKeyType::Long => "long",
        EventKeyType::Short => "short",
        EventKeyType::Byte => "byte",
        EventKeyType::Bool => "bool",
        EventKeyType::UInt64 => "uint64",
        EventKeyType::PlayerPawn => "player pawn",
        EventKeyType::PlayerController => "player controller",
        EventKeyType::Unknown(_) => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::EventKey;

    fn player_death() -> EventDescriptor {
        EventDescriptor::new(
            7,
            "player_death",
            vec![
                EventKey::new("userid", EventKeyType::PlayerController),
                EventKey::new("attacker", EventKeyType::PlayerPawn),
                EventKey::new("weapon", EventKeyType::String),
                EventKey::new("headshot", EventKeyType::Bool),
                EventKey::new("dmg_health", EventKeyType::Short),
                EventKey::new("hitgroup", EventKeyType::Byte),
                EventKey::new("distance", EventKeyType::Float),
                EventKey::new("penetrated", EventKeyType::Long),
                EventKey::new("xuid", EventKeyType::UInt64),
            ],
        )
    }

    fn values() -> Vec<PropValue> {
        vec![
            PropValue::UInt(3),
            PropValue::Handle(0x4005),
            PropValue::String("ak47".into()),
            PropValue::Bool(true),
            PropValue::SInt(-100),
            PropValue::UInt(1),
            PropValue::Float(12.5),
            PropValue::SInt(2),
            PropValue::UInt(76_561_198_000_000_000),
        ]
    }

    #[test]
    fn event_values_follow_key_order() {
        let body = encode_event(&player_death(), &values()).unwrap();
        assert_eq!(peek_event_id(&body, 0).unwrap(), 7);
        let decoded = decode_event(&player_death(), &body, 0, 64).unwrap();
        assert_eq!(decoded, values());
    }

    #[test]
    fn truncated_event_reports_offset() {
        let body = encode_event(&player_death(), &values()).unwrap();
        let err = decode_event(&player_death(), &body[..body.len() - 2], 1000, 64).unwrap_err();
        assert!(err.is_truncation());
        assert!(err.offset() >= 1000);
    }

    #[test]
    fn long_strings_hit_the_limit() {
        let body = encode_event(&player_death(), &values()).unwrap();
        let err = decode_event(&player_death(), &body, 0, 2).unwrap_err();
        assert!(matches!(
            err,
            CodecError::LimitsExceeded {
                kind: LimitKind::StringBytes,
                actual: 4,
                ..
            }
        ));
    }

    #[test]
    fn mismatched_value_is_rejected() {
        let descriptor = EventDescriptor::new(
            1,
            "round_end",
            vec![EventKey::new("winner", EventKeyType::Byte)],
        );
        let err = encode_event(&descriptor, &[PropValue::UInt(300)]).unwrap_err();
        assert!(matches!(err, CodecError::ValueMismatch { .. }));
        assert!(encode_event(&descriptor, &[]).is_err());
    }

    #[test]
    fn unknown_key_type_is_not_decodable() {
        let descriptor = EventDescriptor::new(
            2,
            "mystery",
            vec![EventKey::new("blob", EventKeyType::Unknown(42))],
        );
        assert!(!descriptor.is_decodable());
        let err = decode_event(&descriptor, &[2, 0], 0, 64).unwrap_err();
        assert!(matches!(err, CodecError::ValueMismatch { .. }));
    }
}
