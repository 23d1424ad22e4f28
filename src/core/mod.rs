//! # Core Packet Components
//!
//! Payload model, serializer boundary, binary wire format and stream framing.
//!
//! ## Components
//! - **Payload**: tagged variant over the supported payload kinds
//! - **Serializer**: the boundary that turns a payload into packet bytes
//! - **Packet**: immutable packet with type metadata and read-back accessors
//! - **Codec**: Tokio codec for framing packets over byte streams
//! - **Serialization**: format selection for structured payloads
//!
//! ## Wire Format
//! ```text
//! [Magic(4)] [Version(1)] [Flags(1)] [HeaderLen(4)] [PayloadLen(4)] [Header(N)] [Payload(M)]
//! ```
//!
//! ## Limits
//! - Maximum payload size: 16MB (prevents memory exhaustion)
//! - Maximum header size: 64KB
//! - Length validation before allocation

pub mod codec;
pub mod packet;
pub mod payload;
pub mod serialization;
pub mod serializer;
