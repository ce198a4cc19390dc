//! Criterion micro-benchmarks for lineage navigation: paths, ranges,
//! and history browsing.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bramble_bench::linear_tree;
use bramble_tree::{NodeRange, Path};

/// Benchmark: resolve the root-to-tip path of a 4096-deep lineage.
fn bench_path_to_node(c: &mut Criterion) {
    let (tree, tip) = linear_tree(4096);
    c.bench_function("path_to_node_4k", |b| {
        b.iter(|| {
            let path = Path::to_node(&tree, black_box(tip)).unwrap();
            black_box(path.len());
        });
    });
}

/// Benchmark: walk the same lineage chunk by chunk.
///
/// On an unbranched tree this collapses to a pair of chunks, so the
/// walk cost is dominated by bound resolution rather than node count.
fn bench_blockwise_walk(c: &mut Criterion) {
    let (tree, tip) = linear_tree(4096);
    let path = Path::to_node(&tree, tip).unwrap();
    c.bench_function("path_blockwise_4k", |b| {
        b.iter(|| {
            let chunks = path.iter_blockwise(&tree, None, None).unwrap();
            black_box(chunks.count());
        });
    });
}

/// Benchmark: dissolve a node-bounded range into block bounds.
fn bench_range_dissolved(c: &mut Criterion) {
    let (tree, tip) = linear_tree(4096);
    let path = Path::to_node(&tree, tip).unwrap();
    let range = NodeRange::new(path.root(), tip);
    c.bench_function("range_dissolved_4k", |b| {
        b.iter(|| black_box(range.dissolved(&tree).unwrap()));
    });
}

/// Benchmark: materialize a 4096-entry history browser from a path.
fn bench_browse(c: &mut Criterion) {
    let (tree, tip) = linear_tree(4096);
    let path = Path::to_node(&tree, tip).unwrap();
    c.bench_function("browse_4k", |b| {
        b.iter(|| {
            let browser = tree.browse(&path).unwrap();
            black_box(browser.len());
        });
    });
}

criterion_group!(
    benches,
    bench_path_to_node,
    bench_blockwise_walk,
    bench_range_dissolved,
    bench_browse
);
criterion_main!(benches);
