#![no_main]

use libfuzzer_sys::fuzz_target;
use stream_packet::utils::compression::{
    compress, compress_if_beneficial, decompress, decompress_with_limit, CompressionKind,
};

fuzz_target!(|data: &[u8]| {
    for kind in [CompressionKind::Lz4, CompressionKind::Zstd] {
        if let Ok(compressed) = compress(data, kind) {
            if let Ok(restored) = decompress(&compressed, kind) {
                assert_eq!(restored, data);
            }
        }

        // Malformed input must fail cleanly and never exceed the limit
        if let Ok(out) = decompress_with_limit(data, kind, 4096) {
            assert!(out.len() <= 4096);
        }

        let _ = compress_if_beneficial(data, kind, 64);
    }
});
