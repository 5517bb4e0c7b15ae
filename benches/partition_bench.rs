//! Benchmarks for candidate partitioning and ranking.
//!
//! Benchmarks cover:
//! - Round-robin partitioning across worker counts
//! - Flattening many resources
//! - Ranking freeze candidates with the per-resource cap

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use flexible_freeze::core::{
    flatten, partition, Candidate, CandidateMap, FreezeThresholds, ItemName, Policy, Urgency,
};

// ============================================================================
// Fixtures
// ============================================================================

fn build_candidates(resources: usize, per_resource: usize) -> CandidateMap {
    (0..resources)
        .map(|r| {
            let items: Vec<ItemName> = (0..per_resource)
                .map(|i| ItemName::new("public", format!("t{i}")))
                .collect();
            (format!("db{r}"), items)
        })
        .collect()
}

fn build_ranked(size: u64) -> Vec<Candidate> {
    (0..size)
        .map(|i| Candidate {
            name: ItemName::new("public", format!("t{i}")),
            urgency: Urgency::FreezeAge(i64::try_from((i * 7_919) % 100_003).unwrap_or(0)),
        })
        .collect()
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_partition(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition");
    let candidates = build_candidates(20, 500);
    group.throughput(Throughput::Elements(10_000));

    for workers in [1_usize, 4, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &workers| {
            b.iter(|| black_box(partition(&candidates, workers)));
        });
    }
    group.finish();
}

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");

    for resources in [10_usize, 100, 1_000] {
        let candidates = build_candidates(resources, 50);
        group.throughput(Throughput::Elements((resources * 50) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(resources), &candidates, |b, candidates| {
            b.iter(|| black_box(flatten(candidates)));
        });
    }
    group.finish();
}

fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_freeze");
    let policy = Policy::Freeze(FreezeThresholds::default());

    for size in [100_u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut candidates = build_ranked(size);
                policy.rank(&mut candidates);
                black_box(candidates);
            });
        });
    }
    group.finish();
}

criterion_group!(partition_benches, bench_partition, bench_flatten);
criterion_group!(policy_benches, bench_rank);

criterion_main!(partition_benches, policy_benches);
