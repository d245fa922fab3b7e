//! Benchmarks for raw varint decoding throughput.

use bytes::Bytes;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use protoscope::leb128::LebCodec;
use protoscope::wire::decode_key;

fn encode_varint(mut v: u64, buf: &mut Vec<u8>) {
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            buf.push(byte);
            break;
        }
        buf.push(byte | 0x80);
    }
}

fn bench_decode_u64(c: &mut Criterion) {
    let mut group = c.benchmark_group("leb128_decode_u64");

    for value in [1u64, 127, 16384, u64::MAX] {
        let mut buf = Vec::new();
        encode_varint(value, &mut buf);
        buf.resize(16, 0);

        group.throughput(Throughput::Bytes(1));
        group.bench_with_input(BenchmarkId::new("decode_leb128", value), &buf, |b, data| {
            b.iter(|| {
                // SAFETY: buffer is padded to 16 bytes.
                let result = unsafe { u64::decode_leb128(data) }.unwrap();
                std::hint::black_box(result)
            })
        });

        group.bench_with_input(
            BenchmarkId::new("prost_decode_varint", value),
            &buf,
            |b, data| {
                b.iter(|| {
                    let mut slice = &data[..];
                    let result = prost::encoding::decode_varint(&mut slice).unwrap();
                    std::hint::black_box(result)
                })
            },
        );
    }

    group.finish();
}

fn bench_decode_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_key");

    for tag in [1u32, 16, 1 << 20] {
        let mut buf = Vec::new();
        encode_varint(u64::from(tag << 3), &mut buf);
        let bytes = Bytes::from(buf);

        group.bench_with_input(BenchmarkId::new("decode_key", tag), &bytes, |b, data| {
            b.iter(|| {
                let key = decode_key(&mut data.clone()).unwrap();
                std::hint::black_box(key)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decode_u64, bench_decode_key);
criterion_main!(benches);
