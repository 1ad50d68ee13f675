//! Fixed-size chunking throughput.

use criterion::{criterion_group, criterion_main, Criterion};

use rfp_orchestrator::chunking::{Chunker, FixedChunker};

fn make_text(paragraphs: usize) -> String {
    "Clausula contractual relevante sobre plazos de entrega y penalidades. \n"
        .repeat(paragraphs)
}

fn bench_chunk_small_document(c: &mut Criterion) {
    let chunker = FixedChunker::new();
    let text = make_text(50);

    c.bench_function("chunk_small_document", |b| {
        b.iter(|| chunker.chunk(1, &text, None).unwrap());
    });
}

fn bench_chunk_large_document(c: &mut Criterion) {
    let chunker = FixedChunker::new();
    let text = make_text(2_000);

    c.bench_function("chunk_large_document", |b| {
        b.iter(|| chunker.chunk(1, &text, None).unwrap());
    });
}

criterion_group!(benches, bench_chunk_small_document, bench_chunk_large_document);
criterion_main!(benches);
