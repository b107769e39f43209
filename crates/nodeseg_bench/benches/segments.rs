//! Segment write and read benchmarks.

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use nodeseg_bench::utils::{generate_changesets, generate_nodes, write_nodes};
use nodeseg_codec::Node;
use nodeseg_core::{
    MultiChangesetIterator, NodeIterator, SegmentWriter, SequencedIterator, WriterConfig,
};
use tempfile::tempdir;

/// Benchmark compacting nodes into segments.
fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_write");
    group.sample_size(10);

    for count in [1_000usize, 10_000] {
        let nodes = generate_nodes("bank", count, 1000);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &nodes, |b, nodes| {
            b.iter_batched(
                || (tempdir().unwrap(), nodes.clone()),
                |(dir, nodes)| {
                    let config = WriterConfig::new(dir.path()).max_file_size(1024 * 1024);
                    let stats = SegmentWriter::new(config).compact(nodes).unwrap();
                    black_box(stats);
                },
                BatchSize::PerIteration,
            );
        });
    }

    group.finish();
}

/// Benchmark streaming nodes back out of a segment directory.
fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_read");
    group.sample_size(10);

    for count in [1_000usize, 10_000] {
        let dir = tempdir().unwrap();
        write_nodes(dir.path(), generate_nodes("bank", count, 1000));

        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(BenchmarkId::from_parameter(count), |b| {
            b.iter(|| {
                let mut iter = SequencedIterator::<Node>::open(dir.path()).unwrap();
                while iter.valid() {
                    black_box(iter.current());
                    iter.advance().unwrap();
                }
            });
        });
    }

    group.finish();
}

/// Benchmark merging changesets across stores.
fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("changeset_merge");
    group.sample_size(10);

    for stores in [2usize, 8] {
        let root = tempdir().unwrap();
        for i in 0..stores {
            let store = format!("store{i:02}");
            write_nodes(&root.path().join(&store), generate_changesets(&store, 500, 4));
        }

        group.throughput(Throughput::Elements((stores * 500 * 4) as u64));
        group.bench_function(BenchmarkId::from_parameter(stores), |b| {
            b.iter(|| {
                let mut merged = MultiChangesetIterator::open(root.path()).unwrap();
                while let Some(changeset) = merged.pop().unwrap() {
                    black_box(changeset);
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_write, bench_read, bench_merge);

criterion_main!(benches);
