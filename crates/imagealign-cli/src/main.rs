//! imagealign CLI: align a target image onto a template.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use imagealign::{
    Accumulation, AlignOutcome, Aligner, Bilinear, ForwardAdditive, ForwardAdditiveConfig,
    IntensityImage, TerminationCriteria, WarpKind,
};
use serde::Serialize;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "imagealign")]
#[command(about = "Estimate the warp aligning a target image to a template (Lucas-Kanade)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Align a target image to a template with forward-additive steps.
    Align(CliAlignArgs),

    /// List the available warp models.
    Warps,
}

#[derive(Debug, Clone, Args)]
struct CliAlignArgs {
    /// Template image (converted to 8-bit gray).
    #[arg(long)]
    template: PathBuf,

    /// Target image (converted to 8-bit gray).
    #[arg(long)]
    target: PathBuf,

    /// Output JSON report.
    #[arg(long)]
    out: PathBuf,

    /// Warp model to estimate.
    #[arg(long, value_enum, default_value_t = WarpArg::Translation)]
    warp: WarpArg,

    /// Initial warp parameters; identity when omitted.
    #[arg(long, num_args = 1.., allow_negative_numbers = true)]
    init: Vec<f64>,

    /// Maximum number of steps.
    #[arg(long, default_value = "50")]
    max_iters: usize,

    /// Stop once the update norm falls below this value.
    #[arg(long, default_value = "1e-4")]
    min_delta: f64,

    /// Accumulate on a single thread.
    #[arg(long)]
    sequential: bool,

    /// Write the target resampled through the estimated warp.
    #[arg(long)]
    warped: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WarpArg {
    Translation,
    Euclidean,
    Similarity,
    Affine,
}

impl WarpArg {
    fn to_core(self) -> WarpKind {
        match self {
            Self::Translation => WarpKind::Translation,
            Self::Euclidean => WarpKind::Euclidean,
            Self::Similarity => WarpKind::Similarity,
            Self::Affine => WarpKind::Affine,
        }
    }
}

/// JSON document written by `align`.
#[derive(Debug, Serialize)]
struct AlignReport {
    warp: WarpKind,
    params: Vec<f64>,
    template_size: [u32; 2],
    target_size: [u32; 2],
    outcome: AlignOutcome,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Align(args) => run_align(&args),
        Commands::Warps => run_warps(),
    }
}

// ── warps ──────────────────────────────────────────────────────────────

fn run_warps() -> CliResult<()> {
    println!("available warp models");
    for kind in WarpKind::ALL {
        println!("  {:<12} {} parameters", kind, kind.num_params());
    }
    Ok(())
}

// ── align ──────────────────────────────────────────────────────────────

fn load_intensity(path: &Path) -> CliResult<IntensityImage> {
    tracing::info!("Loading image: {}", path.display());
    let img = image::open(path).map_err(|e| -> CliError {
        format!("Failed to open image {}: {}", path.display(), e).into()
    })?;
    Ok(imagealign::to_intensity(&img.to_luma8()))
}

fn run_align(args: &CliAlignArgs) -> CliResult<()> {
    let template = load_intensity(&args.template)?;
    let target = load_intensity(&args.target)?;
    let template_size = [template.width(), template.height()];
    let target_size = [target.width(), target.height()];
    tracing::info!(
        "Template {}x{}, target {}x{}",
        template_size[0],
        template_size[1],
        target_size[0],
        target_size[1]
    );

    let kind = args.warp.to_core();
    let mut warp = if args.init.is_empty() {
        kind.identity()
    } else {
        kind.with_params(&args.init)?
    };

    let config = ForwardAdditiveConfig {
        accumulation: if args.sequential {
            Accumulation::Sequential
        } else {
            Accumulation::Parallel
        },
        ..ForwardAdditiveConfig::default()
    };
    let criteria = TerminationCriteria {
        max_iterations: args.max_iters,
        min_delta_norm: args.min_delta,
    };

    let mut aligner = Aligner::new(template, target, ForwardAdditive::new(config))?;
    let outcome = aligner.align(&mut warp, &criteria)?;

    let params: Vec<f64> = warp.params().iter().copied().collect();
    tracing::info!("Estimated {} parameters: {:?}", kind, params);
    if !outcome.converged {
        tracing::warn!(
            "No convergence within {} iterations (last |delta|={:.3e})",
            outcome.iterations,
            outcome.last_delta_norm
        );
    }

    if let Some(path) = &args.warped {
        let warped = imagealign::warp_image(
            aligner.images().target(),
            template_size[0],
            template_size[1],
            &warp,
            &Bilinear,
            0.0,
        );
        imagealign::to_gray_u8(&warped).save(path)?;
        tracing::info!("Warped target written to {}", path.display());
    }

    let report = AlignReport {
        warp: kind,
        params,
        template_size,
        target_size,
        outcome,
    };
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&args.out, &json)?;
    tracing::info!("Results written to {}", args.out.display());

    Ok(())
}
