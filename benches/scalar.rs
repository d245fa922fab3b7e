//! Benchmarks for decoding a full message and projecting its scalar fields.

use bytes::Bytes;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use protoscope::message::{decode, SortPolicy};
use protoscope::scalar;

mod prost_types {
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Person {
        #[prost(string, tag = "1")]
        pub name: String,
        #[prost(int32, tag = "2")]
        pub id: i32,
        #[prost(string, tag = "3")]
        pub email: String,
    }
}

fn build_encoded_person() -> Bytes {
    use prost::Message as _;

    let person = prost_types::Person {
        name: "Alice Johnson".to_string(),
        id: 12345,
        email: "alice.johnson@example.com".to_string(),
    };
    Bytes::from(person.encode_to_vec())
}

fn bench_decode_and_project(c: &mut Criterion) {
    let encoded = build_encoded_person();
    let mut group = c.benchmark_group("decode_and_project");
    group.throughput(Throughput::Bytes(encoded.len() as u64));

    group.bench_with_input(
        BenchmarkId::new("protoscope", "as_encoded"),
        &encoded,
        |b, data| {
            b.iter(|| {
                let msg = decode(data.clone(), SortPolicy::AsEncoded).unwrap();
                let name = scalar::string(msg.get_singular(1).unwrap()).unwrap();
                let id = scalar::int32(msg.get_singular(2).unwrap()).unwrap();
                let email = scalar::string(msg.get_singular(3).unwrap()).unwrap();
                std::hint::black_box((name, id, email))
            })
        },
    );

    group.bench_with_input(
        BenchmarkId::new("prost", "baseline"),
        &encoded,
        |b, data| {
            b.iter(|| {
                use prost::Message as _;
                let person = prost_types::Person::decode(&data[..]).unwrap();
                std::hint::black_box(person)
            })
        },
    );

    group.finish();
}

criterion_group!(benches, bench_decode_and_project);
criterion_main!(benches);
