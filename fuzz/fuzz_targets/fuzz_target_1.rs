#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use stream_packet::{Packet, PacketCodec};
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    if let Ok(packet) = Packet::from_bytes(data) {
        // Accepted frames must read back and re-encode
        let _ = packet.payload();
        let _ = packet.to_bytes();
    }

    let mut codec = PacketCodec::new();
    let mut buf = BytesMut::from(data);
    while let Ok(Some(_)) = codec.decode(&mut buf) {}
});
