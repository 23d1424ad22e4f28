//! # Serializer Boundary
//!
//! The narrow boundary between the packet factory and the code that turns a
//! payload into packet bytes. [`PacketSerializer`] is a single pure function
//! from a [`Payload`] to a [`SerializedPayload`]; every failure is an explicit
//! [`Status`] value that the factory propagates unchanged.
//!
//! [`DefaultSerializer`] covers all payload kinds:
//!
//! | Kind       | Encoding                                  | Descriptor   |
//! |------------|-------------------------------------------|--------------|
//! | `Text`     | UTF-8 bytes                               | none         |
//! | `Binary`   | bytes as-is                               | none         |
//! | `Struct`   | `[format byte][json or msgpack value]`    | format name  |
//! | `RawImage` | bincode-encoded image                     | pixel format |

use crate::config::MAX_PAYLOAD_SIZE;
use crate::core::payload::{Payload, PayloadKind, RawImage};
use crate::core::serialization::{MultiFormat, SerializationFormat};
use crate::error::{constants, PacketError, Result, Status};
use bytes::Bytes;

/// Output of a [`PacketSerializer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedPayload {
    pub kind: PayloadKind,
    pub type_descriptor: Option<String>,
    pub bytes: Bytes,
}

/// Converts payloads into packet bytes
pub trait PacketSerializer: Send + Sync {
    fn serialize(&self, payload: &Payload) -> std::result::Result<SerializedPayload, Status>;
}

/// Built-in serializer for every [`PayloadKind`]
#[derive(Debug, Clone)]
pub struct DefaultSerializer {
    max_payload_size: usize,
    struct_format: SerializationFormat,
}

impl Default for DefaultSerializer {
    fn default() -> Self {
        Self::new(MAX_PAYLOAD_SIZE, SerializationFormat::default())
    }
}

impl DefaultSerializer {
    pub fn new(max_payload_size: usize, struct_format: SerializationFormat) -> Self {
        Self {
            max_payload_size,
            struct_format,
        }
    }

    fn check_size(&self, len: usize) -> std::result::Result<(), Status> {
        if len > self.max_payload_size {
            return Err(Status::resource_exhausted(format!(
                "{}: {len} bytes (limit {})",
                constants::ERR_PAYLOAD_TOO_LARGE,
                self.max_payload_size
            )));
        }
        Ok(())
    }
}

impl PacketSerializer for DefaultSerializer {
    fn serialize(&self, payload: &Payload) -> std::result::Result<SerializedPayload, Status> {
        let (bytes, type_descriptor) = match payload {
            Payload::Text(text) => {
                self.check_size(text.len())?;
                (Bytes::copy_from_slice(text.as_bytes()), None)
            }
            Payload::Binary(data) => {
                self.check_size(data.len())?;
                (Bytes::copy_from_slice(data), None)
            }
            Payload::Struct(value) => {
                if !self.struct_format.is_self_describing() {
                    return Err(Status::invalid_argument(constants::ERR_BINCODE_STRUCT));
                }
                let encoded = value
                    .serialize_with_header(self.struct_format)
                    .map_err(|e| Status::internal(e.to_string()))?;
                self.check_size(encoded.len())?;
                (
                    Bytes::from(encoded),
                    Some(self.struct_format.name().to_string()),
                )
            }
            Payload::RawImage(image) => {
                if !image.is_consistent() {
                    return Err(Status::invalid_argument(format!(
                        "{}: {}x{} {} with {} bytes",
                        constants::ERR_IMAGE_DIMENSIONS,
                        image.width,
                        image.height,
                        image.format.name(),
                        image.data.len()
                    )));
                }
                // Refuse before encoding so an oversize frame is never copied.
                self.check_size(image.data.len())?;
                let encoded = image
                    .serialize_format(SerializationFormat::Bincode)
                    .map_err(|e| Status::internal(e.to_string()))?;
                self.check_size(encoded.len())?;
                (
                    Bytes::from(encoded),
                    Some(image.format.name().to_string()),
                )
            }
        };

        Ok(SerializedPayload {
            kind: payload.kind(),
            type_descriptor,
            bytes,
        })
    }
}

/// Decode packet bytes back into a payload of the given kind
pub fn deserialize_payload(kind: PayloadKind, bytes: &[u8]) -> Result<Payload> {
    match kind {
        PayloadKind::Text => std::str::from_utf8(bytes)
            .map(|s| Payload::Text(s.to_string()))
            .map_err(|e| PacketError::DeserializeError(e.to_string())),
        PayloadKind::Binary => Ok(Payload::Binary(bytes.to_vec())),
        PayloadKind::Struct => {
            let (value, _) = serde_json::Value::deserialize_with_header(bytes)?;
            Ok(Payload::Struct(value))
        }
        PayloadKind::RawImage => {
            let image = RawImage::deserialize_format(bytes, SerializationFormat::Bincode)?;
            if !image.is_consistent() {
                return Err(PacketError::DeserializeError(
                    constants::ERR_IMAGE_DIMENSIONS.to_string(),
                ));
            }
            Ok(Payload::RawImage(image))
        }
    }
}
