use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use hessian_rs::{decode, encode, Value};
use rand::Rng;

fn sample_value(len: usize) -> Value {
    let mut rng = rand::thread_rng();
    let items = (0..len)
        .map(|i| match i % 4 {
            0 => Value::Int(rng.gen_range(-1000..1000)),
            1 => Value::String(format!("field-{i}")),
            2 => Value::Bool(i % 2 == 0),
            _ => Value::Double(rng.gen_range(-1.0..1.0)),
        })
        .collect();
    Value::list(items)
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for len in [8usize, 64, 512] {
        let value = sample_value(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &value, |b, value| {
            b.iter(|| encode(value).unwrap());
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for len in [8usize, 64, 512] {
        let bytes = encode(&sample_value(len)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(len), &bytes, |b, bytes| {
            b.iter(|| decode(bytes).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
