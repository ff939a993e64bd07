//! Event blob layout: `[u16 name length][name][u8 arg count][arg payload]`.
//!
//! The argument payload is produced by an [`ArgSerializer`] and is opaque to
//! this module.

use crate::error::{Result, StateError};
use crate::serialization::{ArgSerializer, ArgValue};
use crate::stream::{ByteWriter, MAX_PREFIXED_LEN};

/// Name length prefix plus the argument count byte.
pub const EVENT_HEADER_LEN: usize = 3;

pub const MAX_EVENT_ARGS: usize = u8::MAX as usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub args: Vec<ArgValue>,
}

impl Event {
    pub fn new(name: impl Into<String>, args: Vec<ArgValue>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    pub fn encode(&self, serializer: &ArgSerializer) -> Result<Vec<u8>> {
        encode_event(serializer, &self.name, &self.args)
    }
}

/// Builds a fresh event blob.
pub fn encode_event(serializer: &ArgSerializer, name: &str, args: &[ArgValue]) -> Result<Vec<u8>> {
    if args.len() > MAX_EVENT_ARGS {
        return Err(StateError::EventArgsOverflow { count: args.len() });
    }
    if name.len() > MAX_PREFIXED_LEN {
        return Err(StateError::BlobTooLarge {
            len: name.len(),
            max: MAX_PREFIXED_LEN,
        });
    }

    let payload = serializer.serialize(args)?;

    let mut writer = ByteWriter::with_capacity(name.len() + EVENT_HEADER_LEN + payload.len());
    writer.write_str(name)?;
    writer.write_u8(args.len() as u8);
    writer.write_raw(&payload);

    Ok(writer.finish().to_vec())
}

pub fn decode_event(serializer: &ArgSerializer, blob: &[u8]) -> Result<Event> {
    if blob.is_empty() {
        return Err(StateError::EventsNil);
    }
    if blob.len() < 2 {
        return Err(StateError::EventsError(format!(
            "blob of {} bytes cannot hold a name length",
            blob.len()
        )));
    }

    let name_len = u16::from_le_bytes([blob[0], blob[1]]) as usize;
    let args_start = name_len + EVENT_HEADER_LEN;
    if blob.len() < args_start {
        return Err(StateError::EventsError(format!(
            "name length {} needs {} bytes, blob has {}",
            name_len,
            args_start,
            blob.len()
        )));
    }

    let name = std::str::from_utf8(&blob[2..2 + name_len])
        .map_err(|e| StateError::EventsError(format!("event name is not utf-8: {}", e)))?
        .to_string();
    let declared = blob[args_start - 1] as usize;

    let args = serializer.deserialize(&blob[args_start..])?;
    if args.len() != declared {
        log::warn!(
            "event '{}' declares {} arguments but carries {}",
            name,
            declared,
            args.len()
        );
    }

    Ok(Event { name, args })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_roundtrip() {
        let serializer = ArgSerializer::default();
        let blob = encode_event(&serializer, "spawn", &[ArgValue::from(1), ArgValue::from("npc")]).unwrap();

        let event = decode_event(&serializer, &blob).unwrap();
        assert_eq!(event.name, "spawn");
        assert_eq!(event.args, vec![ArgValue::Int(1), ArgValue::Str("npc".to_string())]);
    }

    #[test]
    fn test_header_layout() {
        let serializer = ArgSerializer::default();
        let args = [ArgValue::from(1), ArgValue::from("npc")];
        let blob = encode_event(&serializer, "spawn", &args).unwrap();

        assert_eq!(&blob[..2], &[5, 0]);
        assert_eq!(&blob[2..7], b"spawn");
        assert_eq!(blob[7], 2);
        assert_eq!(&blob[5 + EVENT_HEADER_LEN..], &serializer.serialize(&args).unwrap()[..]);
    }

    #[test]
    fn test_argument_offset_is_name_plus_header() {
        // Hand-built blob: the payload must be read from name_len + 3.
        let serializer = ArgSerializer::bincode();
        let payload = serializer.serialize(&[ArgValue::from(42u64)]).unwrap();

        let mut blob = vec![3, 0, b'h', b'i', b't', 1];
        blob.extend_from_slice(&payload);

        let event = decode_event(&serializer, &blob).unwrap();
        assert_eq!(event.name, "hit");
        assert_eq!(event.args, vec![ArgValue::UInt(42)]);
    }

    #[test]
    fn test_empty_blob_is_nil() {
        let err = decode_event(&ArgSerializer::default(), &[]).unwrap_err();
        assert!(matches!(err, StateError::EventsNil));
    }

    #[test]
    fn test_truncated_blob() {
        let serializer = ArgSerializer::default();

        // Declares a 10-byte name but only carries 4 bytes after the prefix.
        let err = decode_event(&serializer, &[10, 0, b'a', b'b', b'c', b'd']).unwrap_err();
        assert!(matches!(err, StateError::EventsError(_)));

        let err = decode_event(&serializer, &[1]).unwrap_err();
        assert!(matches!(err, StateError::EventsError(_)));

        // Exactly name + 2-byte prefix, missing the count byte.
        let err = decode_event(&serializer, &[2, 0, b'o', b'k']).unwrap_err();
        assert!(matches!(err, StateError::EventsError(_)));
    }

    #[test]
    fn test_no_arguments() {
        let serializer = ArgSerializer::default();
        let blob = Event::new("despawn", vec![]).encode(&serializer).unwrap();

        assert_eq!(blob[2 + 7], 0);
        let event = decode_event(&serializer, &blob).unwrap();
        assert_eq!(event, Event::new("despawn", vec![]));
    }

    #[test]
    fn test_argument_count_overflow() {
        let args = vec![ArgValue::Nil; 256];
        let err = encode_event(&ArgSerializer::default(), "burst", &args).unwrap_err();
        assert!(matches!(err, StateError::EventArgsOverflow { count: 256 }));

        let args = vec![ArgValue::Nil; 255];
        assert!(encode_event(&ArgSerializer::default(), "burst", &args).is_ok());
    }
}
