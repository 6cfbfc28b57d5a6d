use centered_interval_tree::{Interval, IntervalTree, IteratorDirection};
use criterion::{criterion_group, criterion_main, Bencher, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;

struct IntervalGenerator {
    rng: StdRng,
    limit: i64,
}
impl IntervalGenerator {
    fn new() -> Self {
        const LIMIT: i64 = 100_000;
        Self {
            rng: StdRng::from_seed([0; 32]),
            limit: LIMIT,
        }
    }

    fn next(&mut self) -> Interval<u32> {
        let start = self.rng.gen_range(0..=self.limit - 1);
        let end = self.rng.gen_range(start + 1..=(start + 500).min(self.limit));
        Interval::new(start, end, Some(self.rng.gen()))
    }
}

fn intervals(count: usize) -> Vec<Interval<u32>> {
    let mut gen = IntervalGenerator::new();
    std::iter::repeat_with(|| gen.next()).take(count).collect()
}

// build helper fn
fn interval_tree_build(count: usize, bench: &mut Bencher) {
    let intervals = intervals(count);
    bench.iter(|| {
        let tree = IntervalTree::from_intervals(intervals.clone());
        black_box(tree.built_size());
    });
}

// stab helper fn
fn interval_tree_stab(count: usize, bench: &mut Bencher) {
    let tree = IntervalTree::from_intervals(intervals(count));
    let mut time = 0;
    bench.iter(|| {
        time = (time + 7919) % 100_000;
        black_box(tree.stab(time).len());
    });
}

// overlap helper fn
fn interval_tree_overlap(count: usize, bench: &mut Bencher) {
    let tree = IntervalTree::from_intervals(intervals(count));
    let mut start = 0;
    bench.iter(|| {
        start = (start + 7919) % 100_000;
        black_box(tree.overlap(start, start + 1000).len());
    });
}

// iterate helper fn
fn interval_tree_iterate(count: usize, direction: IteratorDirection, bench: &mut Bencher) {
    let tree = IntervalTree::from_intervals(intervals(count));
    bench.iter(|| {
        black_box(tree.cursor(50_000, direction).count());
    });
}

fn bench_interval_tree_build(c: &mut Criterion) {
    c.bench_function("bench_interval_tree_build_100", |b| {
        interval_tree_build(100, b)
    });
    c.bench_function("bench_interval_tree_build_1000", |b| {
        interval_tree_build(1000, b)
    });
    c.bench_function("bench_interval_tree_build_10,000", |b| {
        interval_tree_build(10_000, b)
    });
}

fn bench_interval_tree_stab(c: &mut Criterion) {
    c.bench_function("bench_interval_tree_stab_1000", |b| {
        interval_tree_stab(1000, b)
    });
    c.bench_function("bench_interval_tree_stab_100,000", |b| {
        interval_tree_stab(100_000, b)
    });
}

fn bench_interval_tree_overlap(c: &mut Criterion) {
    c.bench_function("bench_interval_tree_overlap_1000", |b| {
        interval_tree_overlap(1000, b)
    });
    c.bench_function("bench_interval_tree_overlap_100,000", |b| {
        interval_tree_overlap(100_000, b)
    });
}

fn bench_interval_tree_iterate(c: &mut Criterion) {
    c.bench_function("bench_interval_tree_iterate_forward_10,000", |b| {
        interval_tree_iterate(10_000, IteratorDirection::Forward, b)
    });
    c.bench_function("bench_interval_tree_iterate_backward_10,000", |b| {
        interval_tree_iterate(10_000, IteratorDirection::Backward, b)
    });
}

criterion_group!(
    benches,
    bench_interval_tree_build,
    bench_interval_tree_stab,
    bench_interval_tree_overlap,
    bench_interval_tree_iterate
);
criterion_main!(benches);
