//! # Error Types
//!
//! Error handling for packet construction, wire decoding and configuration.
//!
//! Two failure families matter to callers of the factory:
//! - **Type errors**: the payload value has no serialization mapping
//!   ([`PacketError::UnsupportedPayloadType`]). Never recovered automatically.
//! - **Status errors**: the serializer rejected a supported payload
//!   ([`PacketError::Status`]). The [`Status`] is carried verbatim so the caller
//!   can decide on recovery.
//!
//! Everything else covers wire decoding (bad magic, truncated frames, oversize
//! payloads), compression and configuration.
//!
//! ## Example Usage
//! ```rust
//! use stream_packet::error::{PacketError, StatusCode};
//! use stream_packet::make_packet;
//! use tracing::{error, info};
//!
//! match make_packet(&"frame-0001") {
//!     Ok(packet) => info!(kind = %packet.kind(), "Built packet"),
//!     Err(PacketError::Status(status)) if status.code() == StatusCode::ResourceExhausted => {
//!         error!(%status, "Payload too large for the serializer");
//!     }
//!     Err(e) => error!(error = %e, "Failed to build packet"),
//! }
//! ```

use crate::core::payload::PayloadKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Wire validation errors
    pub const ERR_INVALID_HEADER: &str = "Invalid packet header";
    pub const ERR_OVERSIZED_PACKET: &str = "Packet exceeds maximum size";
    pub const ERR_HEADER_TOO_LARGE: &str = "Packet header exceeds maximum size";

    /// Serializer errors
    pub const ERR_PAYLOAD_TOO_LARGE: &str = "Serialized payload exceeds maximum size";
    pub const ERR_IMAGE_DIMENSIONS: &str = "Raw image data does not match its dimensions";
    pub const ERR_BINCODE_STRUCT: &str =
        "Bincode cannot encode self-describing struct payloads; use json or msgpack";

    /// Compression errors
    pub const ERR_COMPRESSION_FAILED: &str = "Compression failed";
    pub const ERR_DECOMPRESSION_FAILED: &str = "Decompression failed";

    /// Clock errors
    pub const ERR_SYSTEM_TIME: &str = "System time error: time went backwards";
}

/// Canonical status codes reported by a [`crate::PacketSerializer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    /// The payload is malformed for its declared kind
    InvalidArgument,
    /// The payload exceeds a resource limit of the serializer
    ResourceExhausted,
    /// The serializer is not in a state to accept the payload
    FailedPrecondition,
    /// The serializer failed for reasons opaque to the caller
    Internal,
    /// The serializer does not implement the payload kind
    Unimplemented,
}

impl StatusCode {
    /// Numeric code, matching the canonical RPC status numbering
    pub fn as_i32(self) -> i32 {
        match self {
            StatusCode::InvalidArgument => 3,
            StatusCode::ResourceExhausted => 8,
            StatusCode::FailedPrecondition => 9,
            StatusCode::Unimplemented => 12,
            StatusCode::Internal => 13,
        }
    }

    /// Upper-snake-case name used in log output
    pub fn name(self) -> &'static str {
        match self {
            StatusCode::InvalidArgument => "INVALID_ARGUMENT",
            StatusCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            StatusCode::FailedPrecondition => "FAILED_PRECONDITION",
            StatusCode::Internal => "INTERNAL",
            StatusCode::Unimplemented => "UNIMPLEMENTED",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error value returned across the serializer boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct Status {
    code: StatusCode,
    message: String,
}

impl Status {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(StatusCode::InvalidArgument, message)
    }

    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        Self::new(StatusCode::ResourceExhausted, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Internal, message)
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

// PacketError is the primary error type for all crate operations
#[derive(Error, Debug)]
pub enum PacketError {
    /// Transport failure surfaced through a framed stream, including EOF in
    /// the middle of a frame
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Deserialize error: {0}")]
    DeserializeError(String),

    #[error("Unsupported payload type: {type_name}")]
    UnsupportedPayloadType { type_name: String },

    #[error("Payload type mismatch: expected {expected}, found {actual}")]
    PayloadTypeMismatch {
        expected: PayloadKind,
        actual: PayloadKind,
    },

    #[error("Serializer status: {0}")]
    Status(#[from] Status),

    #[error("{}", constants::ERR_INVALID_HEADER)]
    InvalidHeader,

    #[error("Unsupported packet version: {0}")]
    UnsupportedVersion(u8),

    #[error("{}: {0} bytes", constants::ERR_OVERSIZED_PACKET)]
    OversizedPacket(usize),

    #[error("{}", constants::ERR_COMPRESSION_FAILED)]
    CompressionFailure,

    #[error("{}", constants::ERR_DECOMPRESSION_FAILED)]
    DecompressionFailure,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Clock error: {0}")]
    ClockError(String),
}

impl PacketError {
    /// True when the payload type has no serialization mapping
    pub fn is_type_error(&self) -> bool {
        matches!(self, PacketError::UnsupportedPayloadType { .. })
    }

    /// The serializer status, if this error came from the serializer
    pub fn status(&self) -> Option<&Status> {
        match self {
            PacketError::Status(status) => Some(status),
            _ => None,
        }
    }
}

/// Type alias for Results using PacketError
pub type Result<T> = std::result::Result<T, PacketError>;
