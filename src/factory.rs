//! # Packet Factory
//!
//! Builds [`Packet`]s from in-memory payloads.
//!
//! Construction is a single synchronous call with no side effects beyond the
//! returned allocation and relaxed metric counters, so a factory can be shared
//! freely across threads and tasks. Two failure paths exist and both reach the
//! caller:
//!
//! - an unsupported payload type fails with
//!   [`PacketError::UnsupportedPayloadType`];
//! - a serializer rejection fails with [`PacketError::Status`] carrying the
//!   serializer's [`crate::Status`] unchanged. Nothing is retried.
//!
//! ## Usage
//! ```rust
//! use stream_packet::{PacketFactory, PacketOptions};
//!
//! let factory = PacketFactory::default();
//! let packet = factory
//!     .build_with(
//!         "person entered zone 3",
//!         PacketOptions::default().with_series("lobby-cam").with_metadata("zone", "3"),
//!     )
//!     .expect("text payload");
//! assert_eq!(packet.header().series.as_deref(), Some("lobby-cam"));
//! ```

use crate::config::{FactoryConfig, MAX_SERIES_NAME_LEN};
use crate::core::packet::{Packet, PacketHeader};
use crate::core::payload::Payload;
use crate::core::serializer::{DefaultSerializer, PacketSerializer};
use crate::error::{PacketError, Result, Status};
use crate::utils::metrics::Metrics;
use crate::utils::time::now_millis;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, instrument, warn};

/// Per-call packet annotations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketOptions {
    /// Series name, overriding the factory default
    pub series: Option<String>,
    pub metadata: BTreeMap<String, String>,
    /// Explicit capture time, overriding the factory clock
    pub capture_time_ms: Option<u64>,
}

impl PacketOptions {
    pub fn with_series(mut self, series: impl Into<String>) -> Self {
        self.series = Some(series.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_capture_time(mut self, millis: u64) -> Self {
        self.capture_time_ms = Some(millis);
        self
    }
}

/// Builds packets through a [`PacketSerializer`]
#[derive(Debug, Clone)]
pub struct PacketFactory<S = DefaultSerializer> {
    config: FactoryConfig,
    serializer: S,
    metrics: Arc<Metrics>,
}

impl PacketFactory<DefaultSerializer> {
    pub fn new(config: FactoryConfig) -> Self {
        let serializer = DefaultSerializer::new(config.max_payload_size, config.struct_format);
        Self::with_serializer(config, serializer)
    }
}

impl Default for PacketFactory<DefaultSerializer> {
    fn default() -> Self {
        Self::new(FactoryConfig::default())
    }
}

impl<S: PacketSerializer> PacketFactory<S> {
    /// Factory delegating serialization to `serializer`
    pub fn with_serializer(config: FactoryConfig, serializer: S) -> Self {
        Self {
            config,
            serializer,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Share an existing metrics collector
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Build a packet from a value of any type.
    ///
    /// # Errors
    /// - `UnsupportedPayloadType` if `T` has no payload mapping
    /// - `Status` if the serializer rejects the payload
    pub fn make_packet<T: Any>(&self, value: &T) -> Result<Packet> {
        let payload = Payload::from_any(value).map_err(|e| {
            self.metrics.type_error();
            warn!(error = %e, "Rejected payload");
            e
        })?;
        self.build_payload(&payload, PacketOptions::default())
    }

    /// Build a packet from a typed payload
    pub fn build(&self, payload: impl Into<Payload>) -> Result<Packet> {
        self.build_payload(&payload.into(), PacketOptions::default())
    }

    /// Build a packet with per-call annotations
    pub fn build_with(&self, payload: impl Into<Payload>, options: PacketOptions) -> Result<Packet> {
        self.build_payload(&payload.into(), options)
    }

    #[instrument(skip_all, level = "debug", fields(kind = %payload.kind()))]
    fn build_payload(&self, payload: &Payload, options: PacketOptions) -> Result<Packet> {
        let serialized = self.serializer.serialize(payload).map_err(|status| {
            self.metrics.status_error();
            warn!(%status, "Serializer rejected payload");
            PacketError::Status(status)
        })?;

        if serialized.kind != payload.kind() {
            self.metrics.status_error();
            return Err(PacketError::Status(Status::internal(format!(
                "serializer reported {} for a {} payload",
                serialized.kind,
                payload.kind()
            ))));
        }

        let series = options.series.or_else(|| self.config.default_series.clone());
        if let Some(name) = series.as_deref() {
            if name.is_empty() || name.len() > MAX_SERIES_NAME_LEN {
                return Err(PacketError::Status(Status::invalid_argument(format!(
                    "series name must be 1..={MAX_SERIES_NAME_LEN} bytes, got {}",
                    name.len()
                ))));
            }
        }

        let capture_time_ms = match options.capture_time_ms {
            Some(millis) => millis,
            None if self.config.stamp_capture_time => now_millis()?,
            None => 0,
        };

        let header = PacketHeader {
            kind: serialized.kind,
            type_descriptor: serialized.type_descriptor,
            capture_time_ms,
            series,
            metadata: options.metadata,
        };
        header.check_size()?;

        let len = serialized.bytes.len();
        let packet = Packet::new(header, serialized.bytes);
        self.metrics.packet_built(len as u64);
        debug!(bytes = len, "Built packet");
        Ok(packet)
    }
}

static DEFAULT_FACTORY: OnceLock<PacketFactory> = OnceLock::new();

/// Process-wide factory with the default configuration
pub fn default_factory() -> &'static PacketFactory {
    DEFAULT_FACTORY.get_or_init(PacketFactory::default)
}

/// Build a packet from a value of any type using the default factory.
///
/// ```rust
/// let packet = stream_packet::make_packet(&String::from("Hello, World!")).unwrap();
/// assert_eq!(packet.as_text().unwrap(), "Hello, World!");
/// assert!(stream_packet::make_packet(&42_u64).is_err());
/// ```
pub fn make_packet<T: Any>(value: &T) -> Result<Packet> {
    default_factory().make_packet(value)
}
