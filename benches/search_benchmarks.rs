// benches/search_benchmarks.rs
// Criterion benchmarks for the striped kernels per engine and for a full
// cascaded search.

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};

use ferrous_search::compute::simd_abstraction::{SimdEngineType, get_simd_lane_counts};
use ferrous_search::config::SearchConfig;
use ferrous_search::core::alignment::kernel::Kernel;
use ferrous_search::core::alignment::profile::QueryProfiles;
use ferrous_search::core::alignment::striped::TierOutcome;
use ferrous_search::core::alignment::workspace::SearchWorkspace;
use ferrous_search::core::alphabet::Alphabet;
use ferrous_search::core::scoring::{GapCosts, ScoreMatrix};
use ferrous_search::core::sequence::{QuerySet, StrandMode};
use ferrous_search::pipelines::search::{InMemorySource, run_search};

fn random_protein(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| rng.gen_range(0..20u8)).collect()
}

fn make_database(count: usize, seed: u64) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let len = rng.gen_range(50..400);
            random_protein(&mut rng, len)
        })
        .collect()
}

fn bench_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("striped_kernel");
    let matrix = ScoreMatrix::blosum62();
    let gaps = GapCosts::new(11, 1).unwrap();
    let mut rng = StdRng::seed_from_u64(0xDEADBEEFCAFEBABE);
    let db = make_database(512, 7);
    let targets: Vec<&[u8]> = db.iter().map(|s| s.as_slice()).collect();
    let residues: u64 = db.iter().map(|s| s.len() as u64).sum();

    let engines = [
        SimdEngineType::Portable,
        SimdEngineType::Engine128,
        SimdEngineType::Engine256,
    ];

    for qlen in [64usize, 256] {
        let query = random_protein(&mut rng, qlen);
        let profiles = QueryProfiles::build(0, &query, &matrix).unwrap();
        // cell updates per batch
        group.throughput(Throughput::Elements(residues * qlen as u64));

        for engine in engines.iter().copied().filter(|e| e.is_available()) {
            let (lanes8, lanes16) = get_simd_lane_counts(engine);
            for (kernel, lanes) in [(Kernel::LocalByte, lanes8), (Kernel::LocalWord, lanes16)] {
                group.bench_function(format!("{kernel:?}_{engine}_x{lanes}_q{qlen}"), |b| {
                    let mut ws = SearchWorkspace::new();
                    let mut out = TierOutcome::default();
                    b.iter_batched(
                        || (),
                        |_| {
                            out.clear();
                            kernel
                                .run(engine, &profiles, &targets, &gaps, &mut ws, &mut out)
                                .unwrap();
                            black_box(out.scores.len())
                        },
                        BatchSize::SmallInput,
                    );
                });
            }
        }
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascaded_search");
    group.sample_size(10);
    let db = make_database(2000, 11);
    let mut rng = StdRng::seed_from_u64(3);
    let mut queries = QuerySet::new();
    queries.push("q", random_protein(&mut rng, 200), Alphabet::AminoAcid, StrandMode::Forward);

    for threads in [1usize, 4] {
        let config = SearchConfig::builder()
            .matrix(ScoreMatrix::blosum62())
            .gap_costs(11, 1)
            .top_k(20)
            .threads(threads)
            .build()
            .unwrap();
        group.bench_function(format!("blosum62_2000seqs_t{threads}"), |b| {
            b.iter_batched(
                || InMemorySource::from_residues(db.clone(), 256),
                |mut source| black_box(run_search(&queries, &mut source, &config).unwrap()),
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_kernels, bench_search);
criterion_main!(benches);
