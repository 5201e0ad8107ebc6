//! Convert a contour-annotated imaging dataset into paired image/mask
//! training data.
//!
//! Reads the link table, processes every study it names, and prints a
//! per-study summary plus the list of quality-rejected annotations for
//! manual review. Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rinkaku_batch::{CancelToken, DatasetLayout, OutputDirs, RasterSliceDecoder, RunConfig, run};
use rinkaku_pipeline::QualityGateKind;
use rinkaku_pipeline::quality::DEFAULT_INTENSITY_THRESHOLD;

/// Convert contour-annotated imaging studies into paired image/mask
/// training data.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Dataset root containing the images directory, contours directory,
    /// and link file.
    root: PathBuf,

    /// Images directory, relative to the dataset root.
    #[arg(long, default_value = "dicoms")]
    images_dir: String,

    /// Contours directory, relative to the dataset root.
    #[arg(long, default_value = "contourfiles")]
    contours_dir: String,

    /// Link table CSV, relative to the dataset root.
    #[arg(long, default_value = "link.csv")]
    link_file: String,

    /// Extension of per-slice image files.
    #[arg(long, default_value = "png")]
    image_ext: String,

    /// Output root; images, inner masks, and outer masks land in parallel
    /// sub-directories.
    #[arg(short, long)]
    output: PathBuf,

    /// Quality-gate threshold on the normalized median intensity under
    /// the inner mask.
    #[arg(long, default_value_t = DEFAULT_INTENSITY_THRESHOLD)]
    intensity_threshold: f64,

    /// Disable the quality gate and accept every rasterized mask.
    #[arg(long)]
    no_gate: bool,

    /// Also write the full run report as JSON to this path.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let gate = if args.no_gate {
        QualityGateKind::AlwaysAccept
    } else {
        QualityGateKind::MedianIntensity {
            threshold: args.intensity_threshold,
        }
    };

    let config = RunConfig {
        layout: DatasetLayout {
            root: args.root.clone(),
            images_dir: args.images_dir,
            contours_dir: args.contours_dir,
            image_extension: args.image_ext,
        },
        link_file: args.root.join(args.link_file),
        output: OutputDirs::under(&args.output),
        gate,
    };

    let report = run(&config, &RasterSliceDecoder, &CancelToken::new())?;

    println!("study            emitted  skipped  rejected");
    for study in &report.studies {
        println!(
            "{:<16} {:>7}  {:>7}  {:>8}",
            study.image_set_id,
            study.emitted,
            study.skipped,
            study.rejected.len(),
        );
    }
    for failed in &report.failed_studies {
        println!("{:<16} FAILED: {}", failed.image_set_id, failed.reason);
    }
    println!(
        "total: {} emitted, {} skipped, {} rejected",
        report.emitted(),
        report.skipped(),
        report.rejected_paths().len(),
    );

    let rejected = report.rejected_paths();
    if !rejected.is_empty() {
        println!("\nrejected masks for manual review:");
        for path in rejected {
            println!("  {}", path.display());
        }
    }

    if let Some(path) = args.report {
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        println!("report written to {}", path.display());
    }

    Ok(())
}
