//! # Serialization Formats
//!
//! Format selection for structured (`Struct`) payloads and for any other serde
//! type the crate puts on the wire.
//!
//! ## Formats
//! - **Bincode**: compact and fast, but not self-describing. Used for packet
//!   headers and raw images; cannot round-trip `serde_json::Value`.
//! - **JSON**: human-readable, default for structured payloads
//! - **MessagePack**: compact self-describing binary
//!
//! A format byte prefix ([`MultiFormat::serialize_with_header`]) lets the
//! reader detect the encoding without out-of-band configuration.

use crate::error::{PacketError, Result};
use serde::{Deserialize, Serialize};

/// Supported serialization formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializationFormat {
    /// Binary compact format (fastest, not self-describing)
    Bincode,
    /// Human-readable JSON format (default for structured payloads)
    #[default]
    Json,
    /// Compact self-describing binary format
    #[serde(rename = "msgpack")]
    MessagePack,
}

impl SerializationFormat {
    /// Get the format identifier byte for wire protocol
    pub fn format_byte(self) -> u8 {
        match self {
            SerializationFormat::Bincode => 0x01,
            SerializationFormat::Json => 0x02,
            SerializationFormat::MessagePack => 0x03,
        }
    }

    /// Detect format from identifier byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(SerializationFormat::Bincode),
            0x02 => Some(SerializationFormat::Json),
            0x03 => Some(SerializationFormat::MessagePack),
            _ => None,
        }
    }

    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            SerializationFormat::Bincode => "bincode",
            SerializationFormat::Json => "json",
            SerializationFormat::MessagePack => "msgpack",
        }
    }

    /// Whether values can be decoded without knowing their Rust type
    pub fn is_self_describing(self) -> bool {
        !matches!(self, SerializationFormat::Bincode)
    }
}

/// Trait for types that support multiple serialization formats
pub trait MultiFormat: Serialize + for<'de> Deserialize<'de> + Sized {
    /// Serialize to bytes using the specified format
    fn serialize_format(&self, format: SerializationFormat) -> Result<Vec<u8>> {
        match format {
            SerializationFormat::Bincode => {
                bincode::serialize(self).map_err(|e| PacketError::SerializeError(e.to_string()))
            }
            SerializationFormat::Json => {
                serde_json::to_vec(self).map_err(|e| PacketError::SerializeError(e.to_string()))
            }
            SerializationFormat::MessagePack => {
                rmp_serde::to_vec(self).map_err(|e| PacketError::SerializeError(e.to_string()))
            }
        }
    }

    /// Serialize to bytes with format header
    fn serialize_with_header(&self, format: SerializationFormat) -> Result<Vec<u8>> {
        let mut data = vec![format.format_byte()];
        let mut payload = self.serialize_format(format)?;
        data.append(&mut payload);
        Ok(data)
    }

    /// Deserialize from bytes using the specified format
    fn deserialize_format(data: &[u8], format: SerializationFormat) -> Result<Self> {
        match format {
            SerializationFormat::Bincode => bincode::deserialize(data)
                .map_err(|e| PacketError::DeserializeError(e.to_string())),
            SerializationFormat::Json => serde_json::from_slice(data)
                .map_err(|e| PacketError::DeserializeError(e.to_string())),
            SerializationFormat::MessagePack => rmp_serde::from_slice(data)
                .map_err(|e| PacketError::DeserializeError(e.to_string())),
        }
    }

    /// Deserialize from bytes with format header
    fn deserialize_with_header(data: &[u8]) -> Result<(Self, SerializationFormat)> {
        let (&first, rest) = data
            .split_first()
            .ok_or_else(|| PacketError::DeserializeError("Empty data".to_string()))?;

        let format = SerializationFormat::from_byte(first).ok_or_else(|| {
            PacketError::DeserializeError(format!("Unknown format byte: {first}"))
        })?;

        let value = Self::deserialize_format(rest, format)?;
        Ok((value, format))
    }
}

impl MultiFormat for serde_json::Value {}

impl MultiFormat for crate::core::payload::RawImage {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    #[allow(clippy::expect_used)]
    fn test_format_byte_roundtrip() {
        for format in &[
            SerializationFormat::Bincode,
            SerializationFormat::Json,
            SerializationFormat::MessagePack,
        ] {
            let byte = format.format_byte();
            let recovered = SerializationFormat::from_byte(byte).expect("valid format byte");
            assert_eq!(*format, recovered);
        }
        assert_eq!(SerializationFormat::from_byte(0xFF), None);
    }

    #[test]
    fn test_default_format_is_self_describing() {
        assert_eq!(SerializationFormat::default(), SerializationFormat::Json);
        assert!(SerializationFormat::default().is_self_describing());
        assert!(!SerializationFormat::Bincode.is_self_describing());
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_struct_value_with_header() {
        let value = json!({"camera": "lobby-2", "objects": [{"label": "person", "score": 0.91}]});
        for format in [SerializationFormat::Json, SerializationFormat::MessagePack] {
            let bytes = value.serialize_with_header(format).expect("serialize");
            assert_eq!(bytes[0], format.format_byte());
            let (recovered, detected) =
                serde_json::Value::deserialize_with_header(&bytes).expect("deserialize");
            assert_eq!(recovered, value);
            assert_eq!(detected, format);
        }
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_messagepack_smaller_than_json() {
        let value = json!({"frame": 1024, "labels": ["car", "truck", "bus"]});
        let json_size = value
            .serialize_format(SerializationFormat::Json)
            .expect("json")
            .len();
        let msgpack_size = value
            .serialize_format(SerializationFormat::MessagePack)
            .expect("msgpack")
            .len();
        assert!(msgpack_size < json_size);
    }

    #[test]
    fn test_empty_and_unknown_header() {
        assert!(serde_json::Value::deserialize_with_header(&[]).is_err());
        assert!(serde_json::Value::deserialize_with_header(&[0x7F, b'1']).is_err());
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_format_names_parse_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: SerializationFormat,
        }
        let w: Wrapper = toml::from_str("format = \"msgpack\"").expect("parse");
        assert_eq!(w.format, SerializationFormat::MessagePack);
        assert_eq!(w.format.name(), "msgpack");
    }
}
