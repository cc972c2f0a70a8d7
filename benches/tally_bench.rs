//! Performance benchmarks for the tally path.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use bookvote::domain::{ballot_titles, BookTitle};
use bookvote::tally::{compute_counts, percentage};

/// A synthetic ledger with a 3:1 split between the two options.
fn create_ledger(count: usize) -> Vec<BookTitle> {
    (0..count)
        .map(|i| {
            if i % 4 == 3 {
                BookTitle::from("Brave New World")
            } else {
                BookTitle::from("1984")
            }
        })
        .collect()
}

/// Benchmark per-option counting over growing ledgers
fn bench_compute_counts(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_counts");
    let options = ballot_titles();

    for count in [10, 100, 1_000, 10_000].iter() {
        let ledger = create_ledger(*count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("ledger", count), &ledger, |b, ledger| {
            b.iter(|| {
                black_box(compute_counts(&options, ledger.iter()));
            });
        });
    }

    group.finish();
}

/// Benchmark the rounding helper in isolation
fn bench_percentage(c: &mut Criterion) {
    c.bench_function("percentage", |b| {
        b.iter(|| {
            for count in 0..100u64 {
                black_box(percentage(black_box(count), black_box(100)));
            }
        });
    });
}

criterion_group!(benches, bench_compute_counts, bench_percentage);
criterion_main!(benches);
