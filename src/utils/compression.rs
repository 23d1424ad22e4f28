//! Payload compression for the wire format.
//!
//! Decompression is always bounded: the caller passes the largest output it is
//! willing to hold and anything claiming more is rejected before allocation.

use crate::config::MAX_PAYLOAD_SIZE;
use crate::error::{PacketError, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionKind {
    Lz4,
    Zstd,
}

impl CompressionKind {
    pub fn name(self) -> &'static str {
        match self {
            CompressionKind::Lz4 => "lz4",
            CompressionKind::Zstd => "zstd",
        }
    }
}

/// Zstd level used on encode
const ZSTD_LEVEL: i32 = 1;

/// Payloads under this size skip the entropy check and are always tried
const ENTROPY_SAMPLE_MIN: usize = 1024;

/// Bytes sampled for the entropy estimate
const ENTROPY_SAMPLE_LEN: usize = 512;

/// Minimum entropy threshold for compression (0.0-8.0 bits per byte)
const MIN_ENTROPY_THRESHOLD: f64 = 4.0;

/// Shannon entropy of `data` in bits per byte (0.0 uniform, 8.0 random)
fn calculate_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut freq = [0u32; 256];
    for &byte in data {
        freq[byte as usize] += 1;
    }

    let len = data.len() as f64;
    freq.iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Video frames that are already encoded (JPEG, H.264 NAL units) sit near
/// 8 bits/byte and are skipped.
fn worth_compressing(data: &[u8], threshold_bytes: usize) -> bool {
    if data.len() < threshold_bytes {
        return false;
    }
    if data.len() < ENTROPY_SAMPLE_MIN {
        return true;
    }
    let sample = &data[..data.len().min(ENTROPY_SAMPLE_LEN)];
    calculate_entropy(sample) < MIN_ENTROPY_THRESHOLD
}

/// Compresses data using the specified compression algorithm
///
/// # Errors
/// Returns `PacketError::CompressionFailure` if compression fails
pub fn compress(data: &[u8], kind: CompressionKind) -> Result<Vec<u8>> {
    match kind {
        CompressionKind::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
        CompressionKind::Zstd => {
            let mut out = Vec::new();
            zstd::stream::copy_encode(data, &mut out, ZSTD_LEVEL)
                .map_err(|_| PacketError::CompressionFailure)?;
            Ok(out)
        }
    }
}

/// Decompresses data with the default `MAX_PAYLOAD_SIZE` output limit
pub fn decompress(data: &[u8], kind: CompressionKind) -> Result<Vec<u8>> {
    decompress_with_limit(data, kind, MAX_PAYLOAD_SIZE)
}

/// Decompresses data, refusing to produce more than `limit` bytes
///
/// # Errors
/// Returns `PacketError::DecompressionFailure` if the input is malformed or
/// the output would exceed `limit`.
pub fn decompress_with_limit(data: &[u8], kind: CompressionKind, limit: usize) -> Result<Vec<u8>> {
    match kind {
        CompressionKind::Lz4 => {
            // lz4_flex prepends the decompressed size as 4 little-endian bytes.
            let claimed = data
                .get(..4)
                .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize)
                .ok_or(PacketError::DecompressionFailure)?;

            if claimed > limit {
                return Err(PacketError::DecompressionFailure);
            }

            let out = lz4_flex::decompress_size_prepended(data)
                .map_err(|_| PacketError::DecompressionFailure)?;

            if out.len() > limit {
                return Err(PacketError::DecompressionFailure);
            }
            Ok(out)
        }
        CompressionKind::Zstd => {
            let decoder =
                zstd::stream::Decoder::new(data).map_err(|_| PacketError::DecompressionFailure)?;

            // Read one byte past the limit so an oversize stream is detected.
            let mut out = Vec::new();
            decoder
                .take((limit as u64).saturating_add(1))
                .read_to_end(&mut out)
                .map_err(|_| PacketError::DecompressionFailure)?;

            if out.len() > limit {
                return Err(PacketError::DecompressionFailure);
            }
            Ok(out)
        }
    }
}

/// Compress `data` when it is large enough, low-entropy and actually shrinks.
///
/// Returns `None` when the data should be sent as-is.
pub fn compress_if_beneficial(
    data: &[u8],
    kind: CompressionKind,
    threshold_bytes: usize,
) -> Result<Option<Vec<u8>>> {
    if !worth_compressing(data, threshold_bytes) {
        return Ok(None);
    }
    let compressed = compress(data, kind)?;
    if compressed.len() < data.len() {
        Ok(Some(compressed))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_roundtrip_both_kinds() {
        let original = b"frame 0001: person 0.93, car 0.41, person 0.88, bicycle 0.12";
        for kind in [CompressionKind::Lz4, CompressionKind::Zstd] {
            let compressed = compress(original, kind).unwrap();
            let decompressed = decompress(&compressed, kind).unwrap();
            assert_eq!(original.as_slice(), decompressed.as_slice());
        }
    }

    #[test]
    fn test_lz4_oom_attack_prevention() {
        // Claims to decompress to 0xbbbb602b bytes
        let malicious_payload = vec![0x2b, 0x60, 0xbb, 0xbb];
        let result = decompress(&malicious_payload, CompressionKind::Lz4);
        assert!(result.is_err());
    }

    #[test]
    fn test_lz4_short_input_rejection() {
        let result = decompress(&[0x2b, 0x60], CompressionKind::Lz4);
        assert!(matches!(result, Err(PacketError::DecompressionFailure)));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_unbounded_limit_does_not_overflow() {
        let data = vec![3u8; 2048];
        for kind in [CompressionKind::Lz4, CompressionKind::Zstd] {
            let compressed = compress(&data, kind).unwrap();
            assert_eq!(
                decompress_with_limit(&compressed, kind, usize::MAX).unwrap(),
                data
            );
        }
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_limit_enforced_for_both_kinds() {
        let data = vec![0u8; 4096];
        for kind in [CompressionKind::Lz4, CompressionKind::Zstd] {
            let compressed = compress(&data, kind).unwrap();
            assert!(decompress_with_limit(&compressed, kind, 4095).is_err());
            assert_eq!(
                decompress_with_limit(&compressed, kind, 4096).unwrap().len(),
                4096
            );
        }
    }

    #[test]
    fn test_malformed_compressed_data() {
        let malformed = vec![0x10, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff];
        assert!(decompress(&malformed, CompressionKind::Lz4).is_err());
        assert!(decompress(&malformed, CompressionKind::Zstd).is_err());
    }

    #[test]
    fn test_entropy_calculation() {
        assert!(calculate_entropy(&[0u8; 100]) < 0.1);

        let spread: Vec<u8> = (0..=255).cycle().take(1000).collect();
        assert!(calculate_entropy(&spread) > 7.0);

        assert!(calculate_entropy(&[0, 1, 0, 1, 0, 1, 0, 1]) < 2.0);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_below_threshold_not_compressed() {
        assert!(compress_if_beneficial(b"tiny", CompressionKind::Lz4, 512)
            .unwrap()
            .is_none());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_low_entropy_compressed() {
        let data = vec![0u8; 2048];
        let out = compress_if_beneficial(&data, CompressionKind::Lz4, 512)
            .unwrap()
            .unwrap();
        assert!(out.len() < data.len());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_high_entropy_skipped() {
        let data: Vec<u8> = (0..=255).cycle().take(2048).collect();
        assert!(compress_if_beneficial(&data, CompressionKind::Zstd, 512)
            .unwrap()
            .is_none());
    }
}
