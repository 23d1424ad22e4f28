//! # Packet
//!
//! An immutable packet: a typed header plus the serialized payload bytes.
//!
//! ## Wire Format
//! ```text
//! [Magic "VAPK"(4)] [Version(1)] [Flags(1)] [HeaderLen(4, BE)] [PayloadLen(4, BE)] [Header(N)] [Payload(M)]
//! ```
//!
//! - The header is the bincode encoding of [`PacketHeader`], at most `MAX_HEADER_SIZE`.
//! - `PayloadLen` is the on-wire length (after compression), at most the
//!   decoder's payload limit.
//! - Flags: bit 0 = LZ4, bit 1 = Zstd. At most one bit may be set.
//!
//! Packets built in memory always hold the uncompressed payload; compression
//! exists only on the wire.

use crate::config::{MAGIC_BYTES, MAX_HEADER_SIZE, MAX_PAYLOAD_SIZE, PACKET_VERSION};
use crate::core::payload::{Payload, PayloadKind, RawImage};
use crate::core::serialization::{MultiFormat, SerializationFormat};
use crate::core::serializer::deserialize_payload;
use crate::error::{constants, PacketError, Result};
use crate::utils::compression::{compress_if_beneficial, decompress_with_limit, CompressionKind};
use bincode::Options;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Length of the fixed frame prefix
pub const FIXED_HEADER_LEN: usize = 14;

const FLAG_LZ4: u8 = 0b0000_0001;
const FLAG_ZSTD: u8 = 0b0000_0010;

/// Type metadata carried in front of every payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketHeader {
    pub kind: PayloadKind,
    pub type_descriptor: Option<String>,
    /// Unix epoch milliseconds, 0 when not stamped
    pub capture_time_ms: u64,
    pub series: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl PacketHeader {
    pub fn new(kind: PayloadKind) -> Self {
        Self {
            kind,
            type_descriptor: None,
            capture_time_ms: 0,
            series: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn type_class(&self) -> &'static str {
        self.kind.type_class()
    }

    /// Fail if the encoded header would not fit in a frame
    pub(crate) fn check_size(&self) -> Result<()> {
        let len = bincode::serialized_size(self)? as usize;
        if len > MAX_HEADER_SIZE {
            return Err(PacketError::SerializeError(format!(
                "{}: {len} bytes",
                constants::ERR_HEADER_TOO_LARGE
            )));
        }
        Ok(())
    }

    fn encode(&self) -> Result<Vec<u8>> {
        self.check_size()?;
        self.serialize_format(SerializationFormat::Bincode)
    }

    /// Decode a header that must span `data` exactly
    fn decode(data: &[u8]) -> Result<Self> {
        bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .reject_trailing_bytes()
            .with_limit(MAX_HEADER_SIZE as u64)
            .deserialize(data)
            .map_err(|_| PacketError::InvalidHeader)
    }
}

impl MultiFormat for PacketHeader {}

/// Options applied when writing a packet to the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireOptions {
    /// Compression algorithm, `None` to always send uncompressed
    pub compression: Option<CompressionKind>,
    /// Payloads smaller than this are never compressed
    pub compression_threshold_bytes: usize,
    /// Largest on-wire payload accepted on encode and decode
    pub max_payload_size: usize,
}

impl Default for WireOptions {
    fn default() -> Self {
        Self {
            compression: None,
            compression_threshold_bytes: 512,
            max_payload_size: MAX_PAYLOAD_SIZE,
        }
    }
}

/// Fixed-prefix fields of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FramePrefix {
    pub compression: Option<CompressionKind>,
    pub header_len: usize,
    pub payload_len: usize,
}

impl FramePrefix {
    pub fn frame_len(&self) -> usize {
        FIXED_HEADER_LEN + self.header_len + self.payload_len
    }

    /// Parse and validate the fixed prefix. `Ok(None)` if fewer than
    /// `FIXED_HEADER_LEN` bytes are available.
    pub fn parse(buf: &[u8], max_payload_size: usize) -> Result<Option<Self>> {
        if buf.len() < FIXED_HEADER_LEN {
            return Ok(None);
        }

        if buf[0..4] != MAGIC_BYTES {
            return Err(PacketError::InvalidHeader);
        }

        let version = buf[4];
        if version != PACKET_VERSION {
            return Err(PacketError::UnsupportedVersion(version));
        }

        let compression = match buf[5] {
            0 => None,
            FLAG_LZ4 => Some(CompressionKind::Lz4),
            FLAG_ZSTD => Some(CompressionKind::Zstd),
            _ => return Err(PacketError::InvalidHeader),
        };

        let header_len = u32::from_be_bytes([buf[6], buf[7], buf[8], buf[9]]) as usize;
        if header_len == 0 || header_len > MAX_HEADER_SIZE {
            return Err(PacketError::InvalidHeader);
        }

        let payload_len = u32::from_be_bytes([buf[10], buf[11], buf[12], buf[13]]) as usize;
        if payload_len > max_payload_size {
            return Err(PacketError::OversizedPacket(payload_len));
        }

        Ok(Some(Self {
            compression,
            header_len,
            payload_len,
        }))
    }
}

/// A typed, immutable packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    version: u8,
    header: PacketHeader,
    payload: Bytes,
}

impl Packet {
    pub(crate) fn new(header: PacketHeader, payload: Bytes) -> Self {
        Self {
            version: PACKET_VERSION,
            header,
            payload,
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn header(&self) -> &PacketHeader {
        &self.header
    }

    pub fn kind(&self) -> PayloadKind {
        self.header.kind
    }

    /// Serialized (uncompressed) payload bytes
    pub fn raw_payload(&self) -> &Bytes {
        &self.payload
    }

    /// Decode the payload back into its in-memory form
    pub fn payload(&self) -> Result<Payload> {
        deserialize_payload(self.kind(), &self.payload)
    }

    /// Borrow a `Text` payload
    pub fn as_text(&self) -> Result<&str> {
        self.expect_kind(PayloadKind::Text)?;
        std::str::from_utf8(&self.payload).map_err(|e| PacketError::DeserializeError(e.to_string()))
    }

    /// Borrow a `Binary` payload
    pub fn as_binary(&self) -> Result<&[u8]> {
        self.expect_kind(PayloadKind::Binary)?;
        Ok(&self.payload)
    }

    /// Decode a `Struct` payload
    pub fn as_struct(&self) -> Result<serde_json::Value> {
        self.expect_kind(PayloadKind::Struct)?;
        let (value, _) = serde_json::Value::deserialize_with_header(&self.payload)?;
        Ok(value)
    }

    /// Decode a `RawImage` payload
    pub fn as_raw_image(&self) -> Result<RawImage> {
        self.expect_kind(PayloadKind::RawImage)?;
        match self.payload()? {
            Payload::RawImage(image) => Ok(image),
            other => Err(PacketError::PayloadTypeMismatch {
                expected: PayloadKind::RawImage,
                actual: other.kind(),
            }),
        }
    }

    fn expect_kind(&self, expected: PayloadKind) -> Result<()> {
        if self.kind() == expected {
            Ok(())
        } else {
            Err(PacketError::PayloadTypeMismatch {
                expected,
                actual: self.kind(),
            })
        }
    }

    /// Encode without compression
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_bytes_with(&WireOptions::default())
    }

    /// Encode with the given wire options
    pub fn to_bytes_with(&self, options: &WireOptions) -> Result<Vec<u8>> {
        let frame = self.prepare(options)?;
        let mut buf = Vec::with_capacity(frame.len());
        frame.write(&mut buf);
        Ok(buf)
    }

    /// Append the encoded frame to `dst`. Returns whether the payload was compressed.
    pub fn encode_into(&self, options: &WireOptions, dst: &mut BytesMut) -> Result<bool> {
        let frame = self.prepare(options)?;
        dst.reserve(frame.len());
        frame.write(dst);
        Ok(frame.flags != 0)
    }

    fn prepare(&self, options: &WireOptions) -> Result<EncodedFrame<'_>> {
        let header = self.header.encode()?;

        let (flags, body) = match options.compression {
            Some(kind) => {
                match compress_if_beneficial(
                    &self.payload,
                    kind,
                    options.compression_threshold_bytes,
                )? {
                    Some(bytes) => {
                        let flag = match kind {
                            CompressionKind::Lz4 => FLAG_LZ4,
                            CompressionKind::Zstd => FLAG_ZSTD,
                        };
                        (flag, Cow::Owned(bytes))
                    }
                    None => (0, Cow::Borrowed(&self.payload[..])),
                }
            }
            None => (0, Cow::Borrowed(&self.payload[..])),
        };

        if body.len() > options.max_payload_size {
            return Err(PacketError::OversizedPacket(body.len()));
        }

        Ok(EncodedFrame {
            version: self.version,
            flags,
            header,
            body,
        })
    }

    /// Decode a complete frame
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_frame(Bytes::copy_from_slice(data), MAX_PAYLOAD_SIZE)
    }

    /// Decode a complete frame, slicing the payload out of `frame` when it is
    /// not compressed. `max_payload_size` bounds both the on-wire and the
    /// decompressed payload.
    pub fn from_frame(frame: Bytes, max_payload_size: usize) -> Result<Self> {
        let prefix =
            FramePrefix::parse(&frame, max_payload_size)?.ok_or(PacketError::InvalidHeader)?;

        if frame.len() != prefix.frame_len() {
            return Err(PacketError::InvalidHeader);
        }

        let header_end = FIXED_HEADER_LEN + prefix.header_len;
        let header = PacketHeader::decode(&frame[FIXED_HEADER_LEN..header_end])?;

        let body = frame.slice(header_end..);
        let payload = match prefix.compression {
            Some(kind) => Bytes::from(decompress_with_limit(&body, kind, max_payload_size)?),
            None => body,
        };

        Ok(Self {
            version: frame[4],
            header,
            payload,
        })
    }
}

/// A frame ready to be written
struct EncodedFrame<'a> {
    version: u8,
    flags: u8,
    header: Vec<u8>,
    body: Cow<'a, [u8]>,
}

impl EncodedFrame<'_> {
    fn len(&self) -> usize {
        FIXED_HEADER_LEN + self.header.len() + self.body.len()
    }

    fn write<B: BufMut>(&self, dst: &mut B) {
        dst.put_slice(&MAGIC_BYTES);
        dst.put_u8(self.version);
        dst.put_u8(self.flags);
        dst.put_u32(self.header.len() as u32);
        dst.put_u32(self.body.len() as u32);
        dst.put_slice(&self.header);
        dst.put_slice(&self.body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::payload::PixelFormat;

    fn text_packet(text: &str) -> Packet {
        Packet::new(
            PacketHeader::new(PayloadKind::Text),
            Bytes::copy_from_slice(text.as_bytes()),
        )
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_text_roundtrip() {
        let packet = text_packet("Hello, World!");
        let bytes = packet.to_bytes().unwrap();
        assert_eq!(&bytes[0..4], b"VAPK");
        let decoded = Packet::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, packet);
        assert_eq!(decoded.as_text().unwrap(), "Hello, World!");
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_header_fields_survive_wire() {
        let mut header = PacketHeader::new(PayloadKind::Binary);
        header.series = Some("dock-door-3".to_string());
        header.capture_time_ms = 1_700_000_000_123;
        header
            .metadata
            .insert("codec".to_string(), "h264".to_string());
        let packet = Packet::new(header.clone(), Bytes::from_static(&[0, 0, 0, 1, 0x67]));

        let decoded = Packet::from_bytes(&packet.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.header(), &header);
        assert_eq!(decoded.as_binary().unwrap(), &[0, 0, 0, 1, 0x67]);
    }

    #[test]
    fn test_wrong_accessor_is_type_mismatch() {
        let packet = text_packet("not bytes");
        match packet.as_binary() {
            Err(PacketError::PayloadTypeMismatch { expected, actual }) => {
                assert_eq!(expected, PayloadKind::Binary);
                assert_eq!(actual, PayloadKind::Text);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(packet.as_raw_image().is_err());
        assert!(packet.as_struct().is_err());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_compressed_roundtrip_sets_flag() {
        let packet = Packet::new(
            PacketHeader::new(PayloadKind::Binary),
            Bytes::from(vec![0u8; 8192]),
        );
        for kind in [CompressionKind::Lz4, CompressionKind::Zstd] {
            let options = WireOptions {
                compression: Some(kind),
                ..WireOptions::default()
            };
            let bytes = packet.to_bytes_with(&options).unwrap();
            assert_ne!(bytes[5], 0);
            assert!(bytes.len() < 8192);
            assert_eq!(Packet::from_bytes(&bytes).unwrap(), packet);
        }
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_raw_image_accessor() {
        let image = RawImage::new(2, 2, PixelFormat::Gray8, vec![1, 2, 3, 4]);
        let bytes = image
            .serialize_format(SerializationFormat::Bincode)
            .unwrap();
        let packet = Packet::new(PacketHeader::new(PayloadKind::RawImage), Bytes::from(bytes));
        assert_eq!(packet.as_raw_image().unwrap(), image);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_trailing_bytes_rejected() {
        let mut bytes = text_packet("x").to_bytes().unwrap();
        bytes.push(0);
        assert!(matches!(
            Packet::from_bytes(&bytes),
            Err(PacketError::InvalidHeader)
        ));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_padded_header_rejected() {
        let bytes = text_packet("x").to_bytes().unwrap();
        let header_len = u32::from_be_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
        let header_end = FIXED_HEADER_LEN + header_len;

        // Same header followed by one byte of padding inside the declared length.
        let mut padded = bytes[..header_end].to_vec();
        padded[6..10].copy_from_slice(&(header_len as u32 + 1).to_be_bytes());
        padded.push(0);
        padded.extend_from_slice(&bytes[header_end..]);

        assert!(matches!(
            Packet::from_bytes(&padded),
            Err(PacketError::InvalidHeader)
        ));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_to_bytes_allocates_exact_frame() {
        let packet = text_packet("exact");
        let bytes = packet.to_bytes().unwrap();
        assert_eq!(bytes.capacity(), bytes.len());

        let mut buf = BytesMut::new();
        assert!(!packet.encode_into(&WireOptions::default(), &mut buf).unwrap());
        assert_eq!(&buf[..], &bytes[..]);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_unbounded_payload_limit() {
        let packet = Packet::new(
            PacketHeader::new(PayloadKind::Binary),
            Bytes::from(vec![0u8; 4096]),
        );
        let options = WireOptions {
            compression: Some(CompressionKind::Zstd),
            max_payload_size: usize::MAX,
            ..WireOptions::default()
        };
        let bytes = packet.to_bytes_with(&options).unwrap();
        let decoded = Packet::from_frame(Bytes::from(bytes), usize::MAX).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_unknown_flags_rejected() {
        let mut bytes = text_packet("x").to_bytes().unwrap();
        bytes[5] = FLAG_LZ4 | FLAG_ZSTD;
        assert!(matches!(
            Packet::from_bytes(&bytes),
            Err(PacketError::InvalidHeader)
        ));
    }

    #[test]
    fn test_encode_respects_payload_limit() {
        let packet = Packet::new(PacketHeader::new(PayloadKind::Binary), Bytes::from(vec![7u8; 64]));
        let options = WireOptions {
            max_payload_size: 32,
            ..WireOptions::default()
        };
        assert!(matches!(
            packet.to_bytes_with(&options),
            Err(PacketError::OversizedPacket(64))
        ));
    }

    #[test]
    fn test_prefix_needs_fixed_len() {
        assert_eq!(FramePrefix::parse(b"VAPK", MAX_PAYLOAD_SIZE).ok(), Some(None));
    }
}
