use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use tfidx::{DiskIndex, DiskIndexConfig, InvertedIndex, MemoryIndex};

const DOCS: u32 = 2_000;
const TERMS_PER_DOC: u32 = 50;

fn term(i: u32) -> String {
    format!("t{}", i % 5_000)
}

fn bench_memory_ingest(c: &mut Criterion) {
    c.bench_function("memory_ingest", |b| {
        b.iter(|| {
            let mut idx = MemoryIndex::new();
            for doc in 1..=DOCS {
                for t in 0..TERMS_PER_DOC {
                    idx.index(&term(doc * 7 + t * 13), doc, t % 4 + 1).unwrap();
                }
            }
            idx
        })
    });
}

fn bench_disk_spill(c: &mut Criterion) {
    c.bench_function("disk_ingest_spill_every_10k", |b| {
        b.iter_batched(
            || tempfile::tempdir().unwrap(),
            |dir| {
                let config = DiskIndexConfig { buffer_capacity: 10_000, ..Default::default() };
                let mut idx = DiskIndex::create(dir.path(), config).unwrap();
                for doc in 1..=DOCS {
                    for t in 0..TERMS_PER_DOC {
                        idx.index(&term(doc * 7 + t * 13), doc, t % 4 + 1).unwrap();
                    }
                }
                idx.finalize().unwrap();
            },
            BatchSize::PerIteration,
        )
    });
}

criterion_group!(benches, bench_memory_ingest, bench_disk_spill);
criterion_main!(benches);
