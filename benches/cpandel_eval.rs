use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pandelfit::cpandel::PandelPsiEvaluator;

/// Draw `samples` points of the `(ksi, tres)` plane in the given ranges.
fn draw_points(
    rng: &mut StdRng,
    samples: usize,
    ksi: std::ops::Range<f64>,
    tres: std::ops::Range<f64>,
) -> Vec<(f64, f64)> {
    (0..samples)
        .map(|_| (rng.random_range(ksi.clone()), rng.random_range(tres.clone())))
        .collect()
}

/// Bulk of the physical hits: moderate distances, residuals within a few hundred ns.
fn bench_typical(c: &mut Criterion) {
    let evaluator = PandelPsiEvaluator::default();
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let samples = 10_000usize;

    c.bench_function("cpandel/typical", |b| {
        b.iter_batched(
            || draw_points(&mut rng, samples, 0.0..5.0, -30.0..300.0),
            |points| {
                for (ksi, tres) in points {
                    let c = evaluator.cpandel(black_box(ksi), black_box(tres)).unwrap();
                    black_box(c);
                }
            },
            BatchSize::LargeInput,
        )
    });
}

/// Far hits and late residuals, handled by the tail and saddle point approximations.
fn bench_tails(c: &mut Criterion) {
    let evaluator = PandelPsiEvaluator::default();
    let mut rng = StdRng::seed_from_u64(0xFACADE);
    let samples = 10_000usize;

    c.bench_function("cpandel/tails", |b| {
        b.iter_batched(
            || draw_points(&mut rng, samples, 5.0..50.0, -250.0..3500.0),
            |points| {
                for (ksi, tres) in points {
                    let c = evaluator.cpandel(black_box(ksi), black_box(tres)).unwrap();
                    black_box(c);
                }
            },
            BatchSize::LargeInput,
        )
    });
}

/// Clamped inputs, out of the tabulated rectangle.
fn bench_clamped(c: &mut Criterion) {
    let evaluator = PandelPsiEvaluator::new(Default::default(), Default::default(), 2.0);
    let mut rng = StdRng::seed_from_u64(0xBEEF);
    let samples = 10_000usize;

    c.bench_function("cpandel/clamped_psi", |b| {
        b.iter_batched(
            || draw_points(&mut rng, samples, 0.0..80.0, -1000.0..6000.0),
            |points| {
                for (ksi, tres) in points {
                    let score = evaluator.psi_at(black_box(ksi), black_box(tres)).unwrap();
                    black_box(score.psi);
                }
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_typical, bench_tails, bench_clamped
);
criterion_main!(benches);
