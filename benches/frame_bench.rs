//! Performance benchmarks for identifier frame extraction.
//!
//! Measures how quickly the extractor finds a card frame in reader output
//! of varying noise levels and chunk sizes.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench frame_bench
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use medispense_rfid::{FrameExtractor, FrameFormat};
use std::hint::black_box;

/// Reader output: boot noise followed by one text frame.
fn reader_stream(noise_len: usize) -> Vec<u8> {
    let mut stream: Vec<u8> = b"rfid reader v1.2 ready\r\n"
        .iter()
        .copied()
        .cycle()
        .take(noise_len)
        .collect();
    stream.extend_from_slice(b"ID: a1b2c3d4\r\n");
    stream
}

/// Benchmark extraction with the whole stream in one read.
fn bench_single_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_single_read");

    for noise_len in [0usize, 256, 4096] {
        let stream = reader_stream(noise_len);
        group.throughput(Throughput::Bytes(stream.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(noise_len),
            &stream,
            |b, stream| {
                b.iter(|| {
                    let mut extractor = FrameExtractor::new(FrameFormat::text());
                    black_box(extractor.feed(black_box(stream)))
                });
            },
        );
    }

    group.finish();
}

/// Benchmark extraction with the stream split into small reads.
fn bench_chunked_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_chunked_reads");
    let stream = reader_stream(1024);

    for chunk in [1usize, 8, 64] {
        group.throughput(Throughput::Bytes(stream.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &chunk, |b, &chunk| {
            b.iter(|| {
                let mut extractor = FrameExtractor::new(FrameFormat::text());
                let mut found = None;
                for piece in stream.chunks(chunk) {
                    if let Some(id) = extractor.feed(piece) {
                        found = Some(id);
                        break;
                    }
                }
                black_box(found)
            });
        });
    }

    group.finish();
}

/// Benchmark binary controller frames.
fn bench_binary_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_binary");
    group.throughput(Throughput::Elements(1));

    group.bench_function("pid_frame", |b| {
        b.iter(|| {
            let mut extractor = FrameExtractor::new(FrameFormat::binary());
            black_box(extractor.feed(black_box(b"\x00\x01PID:\xE2\xFA\x42\x06")))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_single_read, bench_chunked_reads, bench_binary_frame);
criterion_main!(benches);
