//! Value codec benchmarks
//!
//! - Decoding run documents with nested config and ndarrays
//! - Encoding decoded values back to extended JSON
//! - Parsing printed list literals
//! - Scanning event logs for one tag

use std::fmt::Write as _;
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use labbook::codec::{decode, encode, parse_json, parse_literal};
use labbook::summary::{scalar_triples, write_events, Event, Measurement, TfEventReader};
use serde_json::json;

/// Run document with `width` config entries of mixed shapes
#[allow(clippy::cast_precision_loss)]
fn create_document(width: usize) -> serde_json::Value {
    let mut config = serde_json::Map::new();
    for i in 0..width {
        let value = match i % 4 {
            0 => json!({"py/tuple": [i, i + 1]}),
            1 => json!({
                "py/object": "numpy.ndarray",
                "values": [[i as f64, 0.5], [1.5, 2.5]],
                "dtype": "float32"
            }),
            2 => json!(format!("[{i}, {}, {}]", i * 2, i * 3)),
            _ => json!({"$numberDouble": "NaN"}),
        };
        config.insert(format!("param_{i}"), value);
    }
    json!({"_id": 1, "status": "COMPLETED", "config": config})
}

/// Printed numpy array with `n` floats
#[allow(clippy::cast_precision_loss)]
fn create_literal(n: usize) -> String {
    let mut text = String::from("[");
    for i in 0..n {
        let _ = write!(text, "{}. ", i as f64);
    }
    text.push(']');
    text
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_document");

    for width in [10, 100, 1_000] {
        let document = create_document(width);
        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::from_parameter(width), &document, |b, doc| {
            b.iter(|| black_box(decode(doc).unwrap()));
        });
    }

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_document");

    for width in [10, 100, 1_000] {
        let value = decode(&create_document(width)).unwrap();
        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::from_parameter(width), &value, |b, value| {
            b.iter(|| black_box(encode(value)));
        });
    }

    group.finish();
}

fn bench_parse_text(c: &mut Criterion) {
    let text = serde_json::to_string(&create_document(100)).unwrap();
    c.bench_function("parse_json_with_sentinels", |b| {
        b.iter(|| black_box(parse_json(&text).unwrap()));
    });
}

fn bench_parse_literal(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_literal");

    for n in [16, 256, 4_096] {
        let text = create_literal(n);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &text, |b, text| {
            b.iter(|| black_box(parse_literal(text).unwrap()));
        });
    }

    group.finish();
}

#[allow(clippy::cast_precision_loss)]
fn bench_scalar_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalar_scan");

    for steps in [100, 10_000] {
        let events: Vec<Event> = (0..steps)
            .map(|step| {
                Event::new(
                    step,
                    step as f64,
                    vec![
                        Measurement::new("loss", 1.0 / (step + 1) as f64),
                        Measurement::new("acc", 0.5),
                    ],
                )
            })
            .collect();
        let file = tempfile::NamedTempFile::new().unwrap();
        write_events(file.as_file(), &events).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(steps), file.path(), |b, path| {
            let reader = TfEventReader::new();
            b.iter(|| {
                let loss = scalar_triples(&reader, path)
                    .unwrap()
                    .filter_map(Result::ok)
                    .filter(|t| t.tag == "loss")
                    .count();
                black_box(loss);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_decode,
    bench_encode,
    bench_parse_text,
    bench_parse_literal,
    bench_scalar_scan
);
criterion_main!(benches);
