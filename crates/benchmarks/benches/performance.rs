use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

use schemashare_benchmarks::{
    datasets::generate_payloads,
    harness::{get_all, runtime, save_all, EmbeddedStack, ManagedStack},
};

// Existing records before the measured save; the embedded image is rewritten in full.
const PRELOAD_SIZES: [usize; 3] = [100, 1_000, 5_000];

fn bench_save(c: &mut Criterion) {
    let rt = runtime();
    let sample = generate_payloads(1, 99);

    let mut group = c.benchmark_group("save_embedded");
    for &size in &PRELOAD_SIZES {
        let preload = generate_payloads(size, size as u64);
        group.bench_with_input(BenchmarkId::new("preloaded", size), &preload, |b, preload| {
            b.iter_batched(
                || EmbeddedStack::preloaded(preload),
                |stack| {
                    let ids = rt.block_on(save_all(&stack.storage, &sample));
                    black_box(ids);
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();

    let mut managed_group = c.benchmark_group("save_managed_ephemeral");
    for &size in &PRELOAD_SIZES {
        let preload = generate_payloads(size, size as u64 + 1);
        managed_group.bench_with_input(BenchmarkId::new("preloaded", size), &preload, |b, preload| {
            b.iter_batched(
                || {
                    let stack = ManagedStack::new();
                    rt.block_on(save_all(&stack.storage, preload));
                    stack
                },
                |stack| {
                    let ids = rt.block_on(save_all(&stack.storage, &sample));
                    black_box(ids);
                },
                BatchSize::LargeInput,
            );
        });
    }
    managed_group.finish();
}

fn bench_get(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("get_embedded");
    for &size in &PRELOAD_SIZES {
        let stack = EmbeddedStack::preloaded(&generate_payloads(size, size as u64 + 7));
        let ids = rt.block_on(save_all(&stack.storage, &generate_payloads(10, 3)));
        group.bench_with_input(BenchmarkId::from_parameter(size), &ids, |b, ids| {
            b.iter(|| black_box(rt.block_on(get_all(&stack.storage, ids))));
        });
    }
    group.finish();
}

fn benches(c: &mut Criterion) {
    bench_save(c);
    bench_get(c);
}

criterion_group!(schemashare_benches, benches);
criterion_main!(schemashare_benches);
