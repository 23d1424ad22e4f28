//! # Packet Codec
//!
//! Tokio codec framing [`Packet`]s over any byte stream.
//!
//! Decoding validates the fixed prefix as soon as it arrives, so an oversize
//! or foreign frame is rejected before its body is buffered. A complete frame
//! is split off the read buffer without copying; uncompressed payloads keep
//! pointing into that split.

use crate::core::packet::{FramePrefix, Packet, WireOptions};
use crate::error::{PacketError, Result};
use crate::utils::metrics::Metrics;
use bytes::BytesMut;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Decoder, Encoder, Framed};
use tracing::{trace, warn};

#[derive(Debug, Clone, Default)]
pub struct PacketCodec {
    options: WireOptions,
    metrics: Option<Arc<Metrics>>,
}

impl PacketCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec that encodes and limits frames according to `options`
    pub fn with_wire_options(options: WireOptions) -> Self {
        Self {
            options,
            metrics: None,
        }
    }

    /// Record encode/decode counters into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn options(&self) -> &WireOptions {
        &self.options
    }

    fn record<F: FnOnce(&Metrics)>(&self, f: F) {
        if let Some(metrics) = &self.metrics {
            f(metrics);
        }
    }

    fn decode_frame(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        let prefix = match FramePrefix::parse(&src[..], self.options.max_payload_size)? {
            Some(prefix) => prefix,
            None => return Ok(None),
        };

        let frame_len = prefix.frame_len();
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        let frame = src.split_to(frame_len).freeze();
        Packet::from_frame(frame, self.options.max_payload_size).map(Some)
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = PacketError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        match self.decode_frame(src) {
            Ok(Some(packet)) => {
                trace!(kind = %packet.kind(), bytes = packet.raw_payload().len(), "Decoded packet");
                self.record(Metrics::packet_decoded);
                Ok(Some(packet))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(error = %e, buffered = src.len(), "Rejected inbound frame");
                self.record(Metrics::decode_error);
                Err(e)
            }
        }
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = PacketError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<()> {
        let compressed = item.encode_into(&self.options, dst)?;
        self.record(|m| {
            m.packet_encoded();
            if self.options.compression.is_some() {
                m.compression(compressed);
            }
        });
        Ok(())
    }
}

/// Wrap a byte stream so it sends and receives packets
pub fn framed<T>(io: T, codec: PacketCodec) -> Framed<T, PacketCodec>
where
    T: AsyncRead + AsyncWrite,
{
    Framed::new(io, codec)
}
