// benches/align_perf.rs
// Criterion benchmarks for the individual kernels and the full chain.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};

use ferrous_edit::core::alignment::banded::BandedAligner;
use ferrous_edit::core::alignment::no_indel::NoIndelAligner;
use ferrous_edit::core::alignment::seeding::{SeedStats, SeededAligner};
use ferrous_edit::core::alignment::single_indel::SingleIndelAligner;
use ferrous_edit::core::alignment::split_read::{SplitLayout, SplitReadAligner, SplitStats};
use ferrous_edit::{AlignRequest, AlignerConfig, AlignerFactory, Arm, ChainStats, Penalties, SeedParams};

const FLANK: usize = 16;

/// Reads with one substitution and, for every other read, a single-base
/// deletion from the template.
fn make_batch(len: usize, count: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut rng = StdRng::seed_from_u64(0xDEADBEEFCAFEBABE);
    (0..count)
        .map(|i| {
            let mut template: Vec<u8> = (0..len + 2 * FLANK).map(|_| rng.gen_range(1..=4u8)).collect();
            let mut read = template[FLANK..FLANK + len].to_vec();
            let pos = rng.gen_range(0..len);
            read[pos] = read[pos] % 4 + 1;
            if i % 2 == 1 {
                template.remove(FLANK + len / 2);
            }
            (read, template)
        })
        .collect()
}

fn bench_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernels");
    let penalties = Penalties::default();

    for (len, shift) in [(35usize, 4u32), (100, 7), (250, 10)] {
        let batch = make_batch(len, 64);
        group.throughput(Throughput::Elements(batch.len() as u64));

        let mut banded = BandedAligner::new(penalties);
        group.bench_function(format!("banded_len{len}_shift{shift}"), |b| {
            b.iter(|| {
                for (read, template) in &batch {
                    let req = AlignRequest::new(read, template, FLANK as i32).with_max_shift(shift);
                    black_box(banded.align(&req));
                }
            })
        });

        let no_indel = NoIndelAligner::new(penalties);
        group.bench_function(format!("noindel_len{len}_shift{shift}"), |b| {
            b.iter(|| {
                for (read, template) in &batch {
                    let req = AlignRequest::new(read, template, FLANK as i32).with_max_shift(shift);
                    black_box(no_indel.align(&req));
                }
            })
        });

        let mut single = SingleIndelAligner::affine(penalties);
        group.bench_function(format!("single_len{len}_shift{shift}"), |b| {
            b.iter(|| {
                for (read, template) in &batch {
                    let req = AlignRequest::new(read, template, FLANK as i32).with_max_shift(shift);
                    black_box(single.align(&req));
                }
            })
        });

        let mut seeded = SeededAligner::new(penalties, SeedParams::default());
        let mut stats = SeedStats::default();
        group.bench_function(format!("seeded_len{len}_shift{shift}"), |b| {
            b.iter(|| {
                for (read, template) in &batch {
                    let req = AlignRequest::new(read, template, FLANK as i32).with_max_shift(shift);
                    black_box(seeded.align(&req, &mut stats));
                }
            })
        });
    }
    group.finish();
}

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_read");
    let layout = SplitLayout::complete_genomics();
    let batch = make_batch(layout.read_len(), 64);
    let mut aligner = SplitReadAligner::new(Penalties::default(), layout, 1);
    let mut stats = SplitStats::default();
    group.throughput(Throughput::Elements(batch.len() as u64));
    for shift in [1u32, 2, 4] {
        group.bench_function(format!("cg_shift{shift}"), |b| {
            b.iter(|| {
                for (read, template) in &batch {
                    let req = AlignRequest::new(read, template, FLANK as i32)
                        .with_max_shift(shift)
                        .with_arm(Some(Arm::Left));
                    black_box(aligner.align(&req, &mut stats));
                }
            })
        });
    }
    group.finish();
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain");
    let factory = AlignerFactory::new(AlignerConfig::default()).unwrap();
    let batch = make_batch(100, 64);
    group.throughput(Throughput::Elements(batch.len() as u64));

    for (name, bound) in [("unbounded", i32::MAX), ("bound30", 30)] {
        group.bench_function(name, |b| {
            b.iter_batched(
                || (factory.chain(), ChainStats::new()),
                |(mut chain, mut stats)| {
                    for (read, template) in &batch {
                        let req = AlignRequest::new(read, template, FLANK as i32).with_max_score(bound);
                        black_box(chain.align(&req, false, &mut stats));
                    }
                    stats
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_kernels, bench_split, bench_chain);
criterion_main!(benches);
