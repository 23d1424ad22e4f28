//! Observability and Metrics
//!
//! Atomic counters for packet construction and wire encoding. Every
//! [`crate::PacketFactory`] owns a [`Metrics`] behind an `Arc`; codecs may
//! share the same instance.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Counters for packet operations
#[derive(Debug)]
pub struct Metrics {
    /// Packets successfully built
    pub packets_built: AtomicU64,
    /// Builds rejected because the payload type is unsupported
    pub type_errors: AtomicU64,
    /// Builds rejected by the serializer
    pub status_errors: AtomicU64,
    /// Payload bytes produced by the serializer
    pub bytes_serialized: AtomicU64,
    /// Packets written to the wire
    pub packets_encoded: AtomicU64,
    /// Packets read from the wire
    pub packets_decoded: AtomicU64,
    /// Frames rejected while decoding
    pub decode_errors: AtomicU64,
    /// Payloads considered for compression
    pub compression_total: AtomicU64,
    /// Payloads actually sent compressed
    pub compression_success: AtomicU64,
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            packets_built: AtomicU64::new(0),
            type_errors: AtomicU64::new(0),
            status_errors: AtomicU64::new(0),
            bytes_serialized: AtomicU64::new(0),
            packets_encoded: AtomicU64::new(0),
            packets_decoded: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            compression_total: AtomicU64::new(0),
            compression_success: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn packet_built(&self, byte_count: u64) {
        self.packets_built.fetch_add(1, Ordering::Relaxed);
        self.bytes_serialized.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn type_error(&self) {
        self.type_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn status_error(&self) {
        self.status_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn packet_encoded(&self) {
        self.packets_encoded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn packet_decoded(&self) {
        self.packets_decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a compression decision
    pub fn compression(&self, applied: bool) {
        self.compression_total.fetch_add(1, Ordering::Relaxed);
        if applied {
            self.compression_success.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            packets_built: self.packets_built.load(Ordering::Relaxed),
            type_errors: self.type_errors.load(Ordering::Relaxed),
            status_errors: self.status_errors.load(Ordering::Relaxed),
            bytes_serialized: self.bytes_serialized.load(Ordering::Relaxed),
            packets_encoded: self.packets_encoded.load(Ordering::Relaxed),
            packets_decoded: self.packets_decoded.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            compression_total: self.compression_total.load(Ordering::Relaxed),
            compression_success: self.compression_success.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let s = self.snapshot();
        info!(
            packets_built = s.packets_built,
            type_errors = s.type_errors,
            status_errors = s.status_errors,
            bytes_serialized = s.bytes_serialized,
            packets_encoded = s.packets_encoded,
            packets_decoded = s.packets_decoded,
            decode_errors = s.decode_errors,
            compression_total = s.compression_total,
            compression_success = s.compression_success,
            uptime_seconds = s.uptime_seconds,
            "Packet metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub packets_built: u64,
    pub type_errors: u64,
    pub status_errors: u64,
    pub bytes_serialized: u64,
    pub packets_encoded: u64,
    pub packets_decoded: u64,
    pub decode_errors: u64,
    pub compression_total: u64,
    pub compression_success: u64,
    pub uptime_seconds: u64,
}
