//! # Channel Client Benchmarks
//!
//! | Group | What is measured |
//! |-------|------------------|
//! | codec | bincode vs JSON encode and decode by payload size |
//! | frame | length-prefix framing |
//! | dispatch | inbound event routed to a registered handler |
//!
//! ```bash
//! cargo bench -p channel-tests --bench codec_benchmarks -- codec
//! ```

use channel_client::codec::encode_frame;
use channel_client::test_utils::{ManualScheduler, RecordingTransport};
use channel_client::{
    BincodeCodec, ChannelName, ClientBuilder, ClientConfig, Codec, HandlerResult, JsonCodec,
    Payload, WireMessage,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

const PAYLOAD_SIZES: [usize; 4] = [16, 256, 4096, 65536];

fn publish(size: usize) -> WireMessage {
    WireMessage::Publish {
        channels: vec![ChannelName::new("bench.events"), ChannelName::new("bench.audit")],
        data: Payload::new(vec![b'x'; size]),
    }
}

fn bench_codecs(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let codecs: [(&str, Box<dyn Codec>); 2] =
        [("bincode", Box::new(BincodeCodec)), ("json", Box::new(JsonCodec))];

    for size in PAYLOAD_SIZES {
        let message = publish(size);
        group.throughput(Throughput::Bytes(size as u64));

        for (name, codec) in &codecs {
            let encoded = codec.encode(&message).unwrap();

            group.bench_with_input(
                BenchmarkId::new(format!("{name}_encode"), size),
                &message,
                |b, message| b.iter(|| black_box(codec.encode(message).unwrap())),
            );
            group.bench_with_input(
                BenchmarkId::new(format!("{name}_decode"), size),
                &encoded,
                |b, encoded| b.iter(|| black_box(codec.decode(encoded).unwrap())),
            );
        }
    }
    group.finish();
}

fn bench_framing(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");
    for size in PAYLOAD_SIZES {
        let body = vec![0u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("encode_frame", size), &body, |b, body| {
            b.iter(|| black_box(encode_frame(body).unwrap()))
        });
    }
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let mut client = ClientBuilder::new(ClientConfig::default())
        .codec(BincodeCodec)
        .build(RecordingTransport::managed(), ManualScheduler::new());
    let mut delivered = 0u64;
    client
        .on("bench.events", move |payload: Payload| -> HandlerResult {
            delivered += payload.len() as u64;
            black_box(delivered);
            Ok(())
        })
        .unwrap();
    let connection = client.transport().last_connection().unwrap();
    client.on_remote_connect(connection);

    let inbound = BincodeCodec
        .encode(&WireMessage::Event {
            channel: ChannelName::new("bench.events"),
            data: Payload::new(vec![b'x'; 256]),
        })
        .unwrap();

    c.bench_function("dispatch/event_to_handler", |b| {
        b.iter(|| client.on_remote_message(connection, black_box(&inbound)).unwrap())
    });
}

criterion_group!(
    name = client_benches;
    config = Criterion::default()
        .sample_size(100)
        .measurement_time(Duration::from_secs(5));
    targets = bench_codecs, bench_framing, bench_dispatch
);

criterion_main!(client_benches);
