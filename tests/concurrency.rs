//! Concurrent packet construction must not interfere across call sites.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use bytes::BytesMut;
use std::sync::Arc;
use stream_packet::{make_packet, PacketCodec, PacketFactory};
use tokio_util::codec::{Decoder, Encoder};

#[test]
fn concurrent_make_packet_threads() {
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            std::thread::spawn(move || {
                for i in 0..2_000 {
                    let text = format!("worker-{worker}-item-{i}");
                    let packet = make_packet(&text).expect("text packet");
                    assert_eq!(packet.as_text().unwrap(), text);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_shared_factory_tasks() {
    use tokio::task::JoinSet;

    let factory = Arc::new(PacketFactory::default());
    let payload_sizes = [0usize, 64, 512, 4096, 65536];

    let mut tasks = JoinSet::new();
    for &size in &payload_sizes {
        let factory = Arc::clone(&factory);
        tasks.spawn(async move {
            let mut codec = PacketCodec::new();
            let mut buf = BytesMut::new();
            for i in 0..500usize {
                let payload = vec![((i + size) & 0xFF) as u8; size];
                let packet = factory.build(payload.clone()).unwrap();
                codec.encode(packet, &mut buf).unwrap();
                let decoded = codec.decode(&mut buf).unwrap().expect("complete frame");
                assert_eq!(decoded.as_binary().unwrap(), payload.as_slice());
                assert!(buf.is_empty());
            }
        });
    }

    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    let snapshot = factory.metrics().snapshot();
    assert_eq!(snapshot.packets_built, 500 * payload_sizes.len() as u64);
    assert_eq!(snapshot.type_errors, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_type_errors_do_not_leak_into_valid_calls() {
    use tokio::task::JoinSet;

    let factory = Arc::new(PacketFactory::default());
    let mut tasks = JoinSet::new();
    for i in 0..64u32 {
        let factory = Arc::clone(&factory);
        tasks.spawn(async move {
            if i % 2 == 0 {
                assert!(factory.make_packet(&i).unwrap_err().is_type_error());
            } else {
                let text = format!("odd-{i}");
                let packet = factory.make_packet(&text).unwrap();
                assert_eq!(packet.as_text().unwrap(), text);
            }
        });
    }
    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    let snapshot = factory.metrics().snapshot();
    assert_eq!(snapshot.type_errors, 32);
    assert_eq!(snapshot.packets_built, 32);
}
