use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::num::NonZeroUsize;
use syncratio::{BlockIndex, MatchScanner, analyze_default};

fn generate_test_data(size: usize) -> (Vec<u8>, Vec<u8>) {
    let mut original = Vec::with_capacity(size);

    let mut seed: u64 = 0xDEAD_BEEF;
    for _ in 0..size {
        seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        original.push((seed >> 56) as u8);
    }

    let mut modified = original.clone();

    if size > 1000 {
        for i in (0..size).step_by(2000) {
            modified[i] = modified[i].wrapping_add(1);
        }

        let insert_pos = size / 2;
        let insert_data: Vec<u8> = (0u8..100).map(|i| i.wrapping_mul(7)).collect();
        modified.splice(insert_pos..insert_pos, insert_data);

        let delete_start = size * 3 / 4;
        let delete_end = (delete_start + 50).min(modified.len());
        if delete_start < modified.len() {
            modified.drain(delete_start..delete_end);
        }
    }

    (original, modified)
}

fn benchmark_index_build(c: &mut Criterion) {
    let sizes = vec![10_000, 100_000, 1_000_000];
    let block_size = NonZeroUsize::new(1024).unwrap();
    let mut group = c.benchmark_group("index_build");

    for size in sizes {
        let (original, _) = generate_test_data(size);
        group.bench_with_input(BenchmarkId::new("blake3", size), &size, |b, _| {
            b.iter(|| BlockIndex::build(&original, block_size));
        });
    }

    group.finish();
}

fn benchmark_scan(c: &mut Criterion) {
    let sizes = vec![10_000, 100_000, 1_000_000];
    let block_size = NonZeroUsize::new(1024).unwrap();
    let mut group = c.benchmark_group("scan");

    for size in sizes {
        let (original, modified) = generate_test_data(size);
        let index = BlockIndex::build(&original, block_size);
        let scanner = MatchScanner::new(&index);

        group.bench_with_input(BenchmarkId::new("similar", size), &size, |b, _| {
            b.iter(|| scanner.scan(&modified));
        });
    }

    group.finish();
}

fn benchmark_default_sizes(c: &mut Criterion) {
    let (original, modified) = generate_test_data(1_000_000);
    c.bench_function("analyze_default_1mb", |b| {
        b.iter(|| analyze_default(&original, &modified));
    });
}

criterion_group!(
    benches,
    benchmark_index_build,
    benchmark_scan,
    benchmark_default_sizes,
);

criterion_main!(benches);
