use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::prelude::*;

fn criterion_benchmark(c: &mut Criterion) {
    let mut data = vec![0u8; 256 * 1024];
    thread_rng().fill(&mut data[64 * 1024..128 * 1024]); // mixed: runs, noise, runs

    let uncompressed_data: &[u8] = data.as_slice();
    let compressed_data = tamp::compress(uncompressed_data);

    c.bench_function("compress 256k mixed", |b| {
        b.iter(|| tamp::compress(black_box(uncompressed_data)))
    });

    let mut group = c.benchmark_group("decompress");
    group.bench_with_input("256k mixed", &compressed_data.as_slice(), |b, c| {
        b.iter(|| tamp::decompress(c).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
