//! # stream-packet
//!
//! Typed packet construction for streaming media and analytics pipelines.
//!
//! The crate turns an in-process payload (text, bytes, a structured value or a
//! raw video frame) into an immutable [`Packet`] carrying type metadata, and
//! frames packets for whatever transport publishes them downstream.
//!
//! ## Modules
//! - [`factory`]: the packet factory and the [`make_packet`] entry point
//! - [`core`]: payload model, serializer boundary, wire format and stream codec
//! - [`config`]: TOML / environment configuration with validation
//! - [`error`]: error and status types
//! - [`utils`]: compression, logging, metrics and time helpers
//!
//! ## Example
//! ```rust
//! use stream_packet::make_packet;
//!
//! let packet = make_packet(&"Hello, World!").expect("text is a supported payload");
//! assert_eq!(packet.as_text().expect("text packet"), "Hello, World!");
//!
//! let err = make_packet(&42_i32).expect_err("integers are not supported");
//! assert!(err.is_type_error());
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod core;
pub mod error;
pub mod factory;
pub mod utils;

pub use crate::core::codec::PacketCodec;
pub use crate::core::packet::{Packet, PacketHeader, WireOptions};
pub use crate::core::payload::{Payload, PayloadKind, PixelFormat, RawImage};
pub use crate::core::serializer::{DefaultSerializer, PacketSerializer, SerializedPayload};
pub use crate::error::{PacketError, Result, Status, StatusCode};
pub use crate::factory::{make_packet, PacketFactory, PacketOptions};
