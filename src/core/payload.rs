//! # Payloads
//!
//! The set of in-memory values a packet can carry.
//!
//! [`Payload`] is the typed entry point: every supported kind has a `From`
//! conversion, so unsupported types are rejected at compile time. For callers
//! holding a value of unknown type, [`Payload::from_any`] performs the same
//! mapping at runtime and fails with [`PacketError::UnsupportedPayloadType`].

use crate::error::{PacketError, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::any::{type_name, Any};
use std::fmt;

/// Discriminant of a [`Payload`], carried in every packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayloadKind {
    Text,
    Binary,
    Struct,
    RawImage,
}

impl PayloadKind {
    /// Stable type class name written into packet metadata
    pub fn type_class(self) -> &'static str {
        match self {
            PayloadKind::Text => "string",
            PayloadKind::Binary => "bytes",
            PayloadKind::Struct => "struct",
            PayloadKind::RawImage => "raw-image",
        }
    }

    /// Inverse of [`PayloadKind::type_class`]
    pub fn from_type_class(class: &str) -> Option<Self> {
        match class {
            "string" => Some(PayloadKind::Text),
            "bytes" => Some(PayloadKind::Binary),
            "struct" => Some(PayloadKind::Struct),
            "raw-image" => Some(PayloadKind::RawImage),
            _ => None,
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_class())
    }
}

/// Pixel layout of a [`RawImage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    Gray8,
    Rgb24,
    Rgba32,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb24 => 3,
            PixelFormat::Rgba32 => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PixelFormat::Gray8 => "gray8",
            PixelFormat::Rgb24 => "rgb24",
            PixelFormat::Rgba32 => "rgba32",
        }
    }
}

/// A decoded video frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl RawImage {
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format,
            data,
        }
    }

    /// Number of data bytes implied by the dimensions and pixel format.
    /// `None` if the product overflows `usize`.
    pub fn expected_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.format.bytes_per_pixel())
    }

    /// True when `data` holds exactly one frame
    pub fn is_consistent(&self) -> bool {
        self.expected_len() == Some(self.data.len())
    }
}

/// A value a packet can carry
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// UTF-8 text
    Text(String),
    /// Opaque bytes
    Binary(Vec<u8>),
    /// Self-describing structured value
    Struct(serde_json::Value),
    /// Decoded video frame
    RawImage(RawImage),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Text(_) => PayloadKind::Text,
            Payload::Binary(_) => PayloadKind::Binary,
            Payload::Struct(_) => PayloadKind::Struct,
            Payload::RawImage(_) => PayloadKind::RawImage,
        }
    }

    /// Map a value of arbitrary type onto a payload.
    ///
    /// Accepts `String`, `&'static str`, `Vec<u8>`, `Bytes`, `serde_json::Value`,
    /// [`RawImage`] and [`Payload`]. Anything else is a type error naming the
    /// rejected type; no coercion is attempted (an `i32` is not turned into text).
    pub fn from_any<T: Any>(value: &T) -> Result<Self> {
        let value = value as &dyn Any;

        if let Some(s) = value.downcast_ref::<String>() {
            return Ok(Payload::Text(s.clone()));
        }
        if let Some(s) = value.downcast_ref::<&'static str>() {
            return Ok(Payload::Text((*s).to_string()));
        }
        if let Some(b) = value.downcast_ref::<Vec<u8>>() {
            return Ok(Payload::Binary(b.clone()));
        }
        if let Some(b) = value.downcast_ref::<Bytes>() {
            return Ok(Payload::Binary(b.to_vec()));
        }
        if let Some(v) = value.downcast_ref::<serde_json::Value>() {
            return Ok(Payload::Struct(v.clone()));
        }
        if let Some(img) = value.downcast_ref::<RawImage>() {
            return Ok(Payload::RawImage(img.clone()));
        }
        if let Some(p) = value.downcast_ref::<Payload>() {
            return Ok(p.clone());
        }

        Err(PacketError::UnsupportedPayloadType {
            type_name: type_name::<T>().to_string(),
        })
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Binary(value)
    }
}

impl From<&[u8]> for Payload {
    fn from(value: &[u8]) -> Self {
        Payload::Binary(value.to_vec())
    }
}

impl From<Bytes> for Payload {
    fn from(value: Bytes) -> Self {
        Payload::Binary(value.to_vec())
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Payload::Struct(value)
    }
}

impl From<RawImage> for Payload {
    fn from(value: RawImage) -> Self {
        Payload::RawImage(value)
    }
}
