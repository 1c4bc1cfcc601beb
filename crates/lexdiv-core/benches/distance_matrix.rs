use std::io::Write;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion, SamplingMode};
use lexdiv_core::embedding::EmbeddingIndex;
use lexdiv_core::graph::TypeGraph;
use lexdiv_core::matrix::DistanceRowEngine;
use lexdiv_core::FpMode;
use rand::prelude::*;

fn write_random_w2v(path: &std::path::Path, num_vectors: usize, num_dimensions: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut f = std::fs::File::create(path).unwrap();
    writeln!(f, "{num_vectors} {num_dimensions}").unwrap();
    for i in 0..num_vectors {
        write!(f, "tok{i} ").unwrap();
        for _ in 0..num_dimensions {
            let v: f32 = rng.gen_range(-1.0..1.0);
            f.write_all(&v.to_le_bytes()).unwrap();
        }
        f.write_all(b"\n").unwrap();
    }
}

fn build_fixture(num_vectors: usize, num_dimensions: usize) -> (tempfile::TempDir, EmbeddingIndex, TypeGraph) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.w2v");
    write_random_w2v(&path, num_vectors, num_dimensions, 7);

    let embeddings = EmbeddingIndex::load_word2vec_binary(&path).unwrap();
    let graph = TypeGraph::new();
    for i in 0..num_vectors {
        graph.observe(&embeddings, &format!("tok{i}"));
    }
    graph.compute_relative_proportions();
    (dir, embeddings, graph)
}

fn full_matrix(c: &mut Criterion) {
    let num_dimensions = 128;
    let mut group = c.benchmark_group("distance_matrix/full_matrix");
    group
        .sample_size(10)
        .measurement_time(Duration::from_secs(20))
        .sampling_mode(SamplingMode::Flat);

    for node_count in [64usize, 256, 1024] {
        let (_dir, embeddings, graph) = build_fixture(node_count, num_dimensions);
        let engine = DistanceRowEngine::new(&graph, &embeddings);
        group.bench_function(format!("n={node_count}"), |b| {
            b.iter(|| black_box(engine.compute_full_matrix(FpMode::Fp32, num_cpus::get()).unwrap()))
        });
    }
    group.finish();
}

fn single_row(c: &mut Criterion) {
    let node_count = 1024;
    let num_dimensions = 128;
    let (_dir, embeddings, graph) = build_fixture(node_count, num_dimensions);
    let engine = DistanceRowEngine::new(&graph, &embeddings);
    let nodes = graph.snapshot();
    let mut out = vec![0.0f32; node_count];

    let mut group = c.benchmark_group("distance_matrix/single_row");
    group.bench_function("compute_row", |b| {
        b.iter(|| {
            engine.compute_row(&nodes, 0, &mut out);
            black_box(&out);
        })
    });
    group.finish();
}

criterion_group!(benches, full_matrix, single_row);
criterion_main!(benches);
