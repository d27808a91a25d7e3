//! Input decoding benchmark: bytes per second through the decoder.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use treadmill::ansi::{decode_sgr, Escape};
use treadmill::terminal::InputBuffer;
use treadmill::{Attr, Input};

fn typed_text(len: usize) -> Vec<u8> {
    "the quick brown fox jumps over the lazy dög ▶ "
        .bytes()
        .cycle()
        .take(len)
        .collect()
}

fn mixed_input(events: usize) -> Vec<u8> {
    let samples = [
        Input::Rune('a'),
        Input::key(Escape::Csi(b'A')),
        Input::Escape(Escape::Csi(b'M'), b"<0;12;7".to_vec()),
        Input::key(Escape::Ss3(b'P')),
        Input::Rune('é'),
        Input::key(Escape::Control(0x0D)),
        Input::Escape(Escape::Osc, b"0;title".to_vec()),
    ];
    let mut out = Vec::new();
    for input in samples.iter().cycle().take(events) {
        input.encode(&mut out);
    }
    out
}

fn decode_all(bytes: &[u8]) -> usize {
    let mut buffer = InputBuffer::with_capacity(bytes.len().max(1));
    buffer.push(bytes);
    let mut count = 0;
    while buffer.decode().is_some() {
        count += 1;
    }
    count
}

fn decode_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_text");
    for len in [64, 1024, 4096] {
        let bytes = typed_text(len);
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &bytes, |b, bytes| {
            b.iter(|| decode_all(black_box(bytes)));
        });
    }
    group.finish();
}

fn decode_mixed(c: &mut Criterion) {
    let bytes = mixed_input(700);
    let mut group = c.benchmark_group("decode_mixed");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("700_events", |b| {
        b.iter(|| decode_all(black_box(&bytes)));
    });
    group.finish();
}

fn decode_sgr_params(c: &mut Criterion) {
    c.bench_function("decode_sgr_extended", |b| {
        b.iter(|| decode_sgr(black_box(b"0;1;4;38;2;255;128;0;48;5;236"), Attr::DEFAULT));
    });
}

criterion_group!(benches, decode_text, decode_mixed, decode_sgr_params);
criterion_main!(benches);
