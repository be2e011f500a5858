use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use wikicheck::embeddings::ProjectionMatrix;

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("generate_384_to_128", |b| {
        b.iter(|| ProjectionMatrix::generate(black_box(384), black_box(128), black_box(0)))
    });

    let matrix = ProjectionMatrix::generate(384, 128, 0).expect("can generate matrix");
    let vector: Vec<f32> = (0..384).map(|i| (i as f32 * 0.37).sin()).collect();
    c.bench_function("project_384_to_128", |b| {
        b.iter(|| matrix.project(black_box(&vector)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
