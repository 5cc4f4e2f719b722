use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use hifitime::{Epoch, Unit};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use pandelfit::chi2_fitter::Chi2Fitter;
use pandelfit::event::{DetectorKind, FirstGuessTrack, Hit, IceEvent, OpticalModule};
use pandelfit::fit_params::{FitParams, ObjectiveKind};
use pandelfit::geometry::{direction_from_angles, CherenkovGeometry, TrackParameters};

/// 5x5 strings 40 m apart; the two first columns are Amanda, the rest InIce.
fn detector() -> Vec<OpticalModule> {
    let mut modules = Vec::new();
    for ix in -2..=2 {
        for iy in -2..=2 {
            let kind = if ix < 0 {
                DetectorKind::Amanda
            } else {
                DetectorKind::InIce
            };
            for iz in -10..=10 {
                let pos = Vector3::new(40.0 * ix as f64, 40.0 * iy as f64, 15.0 * iz as f64);
                modules.push(OpticalModule::new(kind, pos));
            }
        }
    }
    modules
}

/// Event with a random track, its hits within 50 m and a perturbed first guess.
fn random_event(rng: &mut StdRng, modules: &[OpticalModule]) -> IceEvent {
    let epoch = Epoch::from_gregorian_utc_at_midnight(2008, 6, 1);
    let geometry = CherenkovGeometry::default();
    let jitter = Normal::new(0.0, 5.0).unwrap();

    let theta = rng.random_range(0.3..2.8);
    let phi = rng.random_range(0.0..std::f64::consts::TAU);
    let r0 = Vector3::new(
        rng.random_range(-20.0..20.0),
        rng.random_range(-20.0..20.0),
        rng.random_range(-30.0..30.0),
    );
    let truth = TrackParameters::new(r0, direction_from_angles(theta, phi), 2000.0);

    let mut event = IceEvent::new(epoch);
    let hits: Vec<_> = modules
        .iter()
        .filter(|m| truth.distance(&m.position) <= 50.0)
        .map(|m| {
            let tgeo = geometry.project(&truth, &m.position).tgeo;
            event.add_hit(Hit::new(*m, tgeo + jitter.sample(rng)))
        })
        .collect();

    let guess = FirstGuessTrack::new(
        1,
        "IceDwalkI",
        r0 + Vector3::new(2.0, -2.0, 1.0),
        epoch + (truth.t0 + 5.0) * Unit::Nanosecond,
        direction_from_angles(theta + 0.03, phi - 0.03),
    )
    .with_hits(hits);
    event.add_first_guess(guess);
    event
}

fn bench_fit(c: &mut Criterion, label: &str, objective: ObjectiveKind, seed: u64) {
    let modules = detector();
    let mut rng = StdRng::seed_from_u64(seed);
    let params = FitParams::builder().objective(objective).build().unwrap();
    let fitter = Chi2Fitter::new(params);

    c.bench_function(label, |b| {
        b.iter_batched(
            || random_event(&mut rng, &modules),
            |mut event| {
                let reports = fitter.process_event(black_box(&mut event)).unwrap();
                black_box(reports);
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_chi2_objective(c: &mut Criterion) {
    bench_fit(c, "fit/chi2_objective", ObjectiveKind::ChiSquare, 0xDEADBEEF);
}

fn bench_psi_objective(c: &mut Criterion) {
    bench_fit(c, "fit/psi_objective", ObjectiveKind::PandelPsi, 0xBADF00D);
}

/// Batch of events processed with the rayon pool.
fn bench_parallel_batch(c: &mut Criterion) {
    let modules = detector();
    let mut rng = StdRng::seed_from_u64(0xFEEDFACE);
    let fitter = Chi2Fitter::new(FitParams::default());

    c.bench_function("fit/parallel_batch_64", |b| {
        b.iter_batched(
            || {
                (0..64)
                    .map(|_| random_event(&mut rng, &modules))
                    .collect::<Vec<_>>()
            },
            |mut events| {
                let reports = fitter.process_events(black_box(&mut events));
                black_box(reports);
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = bench_chi2_objective, bench_psi_objective, bench_parallel_batch
);
criterion_main!(benches);
