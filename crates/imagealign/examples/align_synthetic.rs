use std::error::Error;
use std::f64::consts::PI;

use image::Luma;
use imagealign::{
    warp_image, Aligner, Bilinear, ForwardAdditive, IntensityImage, Similarity,
    TerminationCriteria,
};

fn texture(x: f64, y: f64) -> f32 {
    let v = 0.5
        + 0.25 * (2.0 * PI * x / 29.0).sin() * (2.0 * PI * y / 31.0).cos()
        + 0.15 * (2.0 * PI * (x - 0.4 * y) / 17.0).sin();
    v as f32
}

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    let size: u32 = match args.get(1) {
        Some(s) => s.parse()?,
        None => 160,
    };

    // Target is the template seen through a small similarity motion.
    let truth = Similarity::from_scale_rotation(1.01, 0.015, 1.2, -0.8);
    let template = IntensityImage::from_fn(size, size, |x, y| Luma([texture(x as f64, y as f64)]));
    let target = IntensityImage::from_fn(size, size, |x, y| {
        let k = 1.0 + truth.a;
        let det = k * k + truth.b * truth.b;
        let dx = x as f64 - truth.tx;
        let dy = y as f64 - truth.ty;
        Luma([texture((k * dx + truth.b * dy) / det, (-truth.b * dx + k * dy) / det)])
    });

    let mut aligner = Aligner::new(template, target, ForwardAdditive::default())?;
    let mut warp = Similarity::identity();
    let outcome = aligner.align(&mut warp, &TerminationCriteria::default())?;

    println!(
        "{} iterations (converged: {}), mse {:.3e}",
        outcome.iterations,
        outcome.converged,
        outcome.sum_squared_error / outcome.num_constraints.max(1) as f64
    );
    println!(
        "estimated: t=({:.4}, {:.4}) scale={:.5} rotation={:.5}",
        warp.tx,
        warp.ty,
        warp.scale(),
        warp.rotation()
    );
    println!(
        "truth:     t=({:.4}, {:.4}) scale={:.5} rotation={:.5}",
        truth.tx,
        truth.ty,
        truth.scale(),
        truth.rotation()
    );

    if let Some(out_path) = args.get(2) {
        let warped = warp_image(aligner.images().target(), size, size, &warp, &Bilinear, 0.0);
        imagealign::to_gray_u8(&warped).save(out_path)?;
        println!("Wrote {out_path}");
    }
    Ok(())
}
