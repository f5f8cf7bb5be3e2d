use std::f64::consts::PI;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::Luma;
use imagealign::{
    Accumulation, Affine, AlignAlgorithm, AlignImages, Aligner, ForwardAdditive,
    ForwardAdditiveConfig, IntensityImage, TerminationCriteria, Translation,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn make_fixture(width: u32, height: u32, shift: [f64; 2], seed: u64) -> IntensityImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let phase: [f64; 3] = std::array::from_fn(|_| rng.gen_range(0.0..PI));

    IntensityImage::from_fn(width, height, |x, y| {
        let x = x as f64 - shift[0];
        let y = y as f64 - shift[1];
        let v = 0.5
            + 0.2 * (x * 0.09 + phase[0]).sin() * (y * 0.07 + phase[1]).cos()
            + 0.15 * ((x + 0.6 * y) * 0.05 + phase[2]).sin();
        Luma([v as f32])
    })
}

fn fa(accumulation: Accumulation) -> ForwardAdditive {
    ForwardAdditive::new(ForwardAdditiveConfig {
        accumulation,
        ..ForwardAdditiveConfig::default()
    })
}

fn bench_normal_equations(c: &mut Criterion) {
    let template = make_fixture(640, 480, [0.0, 0.0], 3);
    let target = make_fixture(640, 480, [0.4, -0.3], 3);
    let images = AlignImages::new(template, target).expect("valid fixture");

    let translation = Translation::new(0.2, -0.1);
    let affine = Affine::new([0.001, 0.0, 0.0, -0.001, 0.2, -0.1]);

    for (name, accumulation) in [
        ("sequential", Accumulation::Sequential),
        ("parallel", Accumulation::Parallel),
    ] {
        let algorithm = fa(accumulation);

        c.bench_function(&format!("fa_step_translation_640x480_{name}"), |b| {
            b.iter(|| {
                let step = algorithm.compute_step(black_box(&images), black_box(&translation));
                black_box(step.map(|s| s.num_constraints))
            })
        });

        c.bench_function(&format!("fa_step_affine_640x480_{name}"), |b| {
            b.iter(|| {
                let step = algorithm.compute_step(black_box(&images), black_box(&affine));
                black_box(step.map(|s| s.num_constraints))
            })
        });
    }
}

fn bench_align(c: &mut Criterion) {
    let template = make_fixture(256, 256, [0.0, 0.0], 5);
    let target = make_fixture(256, 256, [0.7, 0.45], 5);
    let criteria = TerminationCriteria {
        max_iterations: 20,
        min_delta_norm: 1e-4,
    };

    c.bench_function("fa_align_translation_256x256", |b| {
        b.iter(|| {
            let mut aligner =
                Aligner::new(template.clone(), target.clone(), fa(Accumulation::Parallel))
                    .expect("valid fixture");
            let mut warp = Translation::identity();
            let outcome = aligner.align(&mut warp, black_box(&criteria));
            black_box((warp, outcome.map(|o| o.iterations)))
        })
    });
}

criterion_group!(hotpaths, bench_normal_equations, bench_align);
criterion_main!(hotpaths);
