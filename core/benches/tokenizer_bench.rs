use criterion::{criterion_group, criterion_main, Criterion};
use docscope_core::kmeans;
use docscope_core::tokenizer::tokenize;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn sample_text() -> String {
    let words = ["index", "query", "cluster", "vector", "centroid", "term", "document", "corpus"];
    let mut rng = StdRng::seed_from_u64(1);
    (0..5_000).map(|_| words[rng.random_range(0..words.len())]).collect::<Vec<_>>().join(" ")
}

fn bench_tokenize(c: &mut Criterion) {
    let text = sample_text();
    c.bench_function("tokenize_5k_words", |b| b.iter(|| tokenize(&text)));
}

fn bench_kmeans(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    let points: Vec<Vec<f64>> = (0..100).map(|_| (0..300).map(|_| rng.random::<f64>()).collect()).collect();
    c.bench_function("kmeans_100x300_k5", |b| {
        b.iter(|| kmeans::cluster(&points, 5, &mut StdRng::seed_from_u64(3)))
    });
}

criterion_group!(benches, bench_tokenize, bench_kmeans);
criterion_main!(benches);
