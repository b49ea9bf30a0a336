//! Coverage Merge Benchmarks
//!
//! Benchmarks for range tree construction and multi-sample merging.
//!
//! Run with: `cargo bench --bench merge_ops`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fundir::{
    merge_process_covs, FunctionCov, ProcessCov, RangeCov, RangeTree, ScriptCov,
};

/// Deterministic nested range list: one root, `segments` disjoint children,
/// every other child carrying a nested grandchild. `salt` varies the counts
/// and boundaries so different samples do not align trivially.
fn synth_ranges(segments: u32, salt: u32) -> Vec<RangeCov> {
    let width = 16;
    let mut ranges = vec![RangeCov {
        start_offset: 0,
        end_offset: segments * width,
        count: u64::from(salt % 3 + 1),
    }];
    for i in 0..segments {
        let start = i * width + (salt + i) % 3;
        let end = i * width + width - 1 - (salt + i) % 2;
        ranges.push(RangeCov {
            start_offset: start,
            end_offset: end,
            count: u64::from((i * 7 + salt) % 5),
        });
        if i % 2 == 0 {
            ranges.push(RangeCov {
                start_offset: start + 3,
                end_offset: end - 3,
                count: u64::from((i * 11 + salt) % 4),
            });
        }
    }
    ranges
}

fn synth_process_cov(scripts: u32, functions: u32, salt: u32) -> ProcessCov {
    let result = (0..scripts)
        .map(|script| ScriptCov {
            script_id: script.to_string(),
            url: format!("/module_{script}.js"),
            functions: (0..functions)
                .map(|function| {
                    let span = 64 * 16;
                    let base = function * span;
                    let mut ranges = synth_ranges(64, salt + function);
                    for range in &mut ranges {
                        range.start_offset += base;
                        range.end_offset += base;
                    }
                    FunctionCov {
                        function_name: format!("fn_{function}"),
                        ranges,
                        is_block_coverage: true,
                    }
                })
                .collect(),
        })
        .collect();
    ProcessCov { result }
}

fn bench_from_sorted_ranges(c: &mut Criterion) {
    let mut group = c.benchmark_group("from_sorted_ranges");

    for segments in [16u32, 64, 256] {
        let ranges = synth_ranges(segments, 0);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_ranges", ranges.len())),
            &ranges,
            |bench, ranges| {
                bench.iter(|| {
                    let tree = RangeTree::from_sorted_ranges(black_box(ranges));
                    black_box(tree);
                });
            },
        );
    }

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for segments in [16u32, 64, 256] {
        let ranges = synth_ranges(segments, 0);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_segments", segments)),
            &ranges,
            |bench, ranges| {
                bench.iter(|| {
                    if let Some(mut tree) = RangeTree::from_sorted_ranges(ranges) {
                        tree.normalize();
                        black_box(tree.to_ranges());
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_merge_process_covs(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_process_covs");

    for samples in [2u32, 4, 8] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_samples", samples)),
            &samples,
            |bench, &samples| {
                bench.iter_batched(
                    || {
                        (0..samples)
                            .map(|salt| synth_process_cov(4, 8, salt))
                            .collect::<Vec<_>>()
                    },
                    |covs| black_box(merge_process_covs(covs)),
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_from_sorted_ranges,
    bench_normalize,
    bench_merge_process_covs
);
criterion_main!(benches);
