//! s2flood CLI - map newly flooded area from two Sentinel-2 acquisitions

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

use s2flood::core::ThresholdParams;
use s2flood::{run_flood_analysis, FloodAnalysisParams};

#[derive(Parser)]
#[command(name = "s2flood")]
#[command(author, version, about = "Before/after flood extent from Sentinel-2 water indices", long_about = None)]
struct Cli {
    /// Folder with the pre-flood band images
    before: PathBuf,
    /// Folder with the post-flood band images
    after: PathBuf,
    /// Folder where the flood raster and polygons are written
    output: PathBuf,
    /// Band image file extension
    #[arg(long, default_value = "jp2")]
    extension: String,
    /// Histogram bins for Otsu thresholding
    #[arg(long, default_value_t = 256)]
    bins: usize,
    /// Also write composites, indices, masks and the raw difference
    #[arg(long)]
    keep_intermediates: bool,
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let params = FloodAnalysisParams {
        extension: cli.extension,
        threshold: ThresholdParams { bins: cli.bins },
        keep_intermediates: cli.keep_intermediates,
        ..FloodAnalysisParams::default()
    };

    let start = Instant::now();
    let report = run_flood_analysis(&cli.before, &cli.after, &cli.output, &params)
        .context("Flood analysis failed")?;

    println!("Flooded cells:  {}", report.stats.flooded_cells);
    println!("Flooded area:   {:.1} map units²", report.stats.flooded_area);
    println!("Receded cells:  {}", report.stats.receded_cells);
    println!("Polygons:       {}", report.polygon_count);
    println!("Raster:         {}", report.raster_path.display());
    println!("Polygons file:  {}", report.polygon_path.display());
    println!("Report:         {}", report.report_path.display());
    println!("Done in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}
