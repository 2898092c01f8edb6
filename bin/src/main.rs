mod config;
mod processing;
mod stats;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use anyhow::{anyhow, bail, Context};
use clap::Parser;
use rayon::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use whiteout::export::PngCompression;
use whiteout::pipeline::RemovalMode;
use crate::config::Config;
use crate::processing::Processor;
use crate::stats::ProcessingStats;

#[derive(Parser)]
#[command(name = "whiteout")]
#[command(about = "Remove white photographic backdrops from logos and export transparent PNGs")]
#[command(version)]
struct Args {
    /// Input image path, or a directory for batch processing
    input: Option<PathBuf>,

    /// Full-size output PNG (output folder in batch mode)
    output: Option<PathBuf>,

    /// Bounded-size output PNG
    thumbnail: Option<PathBuf>,

    /// Configuration file path (.json or .toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Generate default configuration file and exit
    #[arg(long)]
    generate_config: bool,

    /// When to remove the background: auto, always or never
    #[arg(long)]
    mode: Option<RemovalMode>,

    /// Largest side of the thumbnail, in pixels
    #[arg(long)]
    thumbnail_size: Option<u32>,

    /// PNG compression: fast, default or best
    #[arg(long)]
    compression: Option<PngCompression>,

    /// Save a grayscale preview of the erased region
    #[arg(long)]
    save_mask: bool,

    /// Minimum channel value for a pixel to count as white (0-255)
    #[arg(long)]
    white_threshold: Option<u8>,

    /// Maximum RGB distance from pure white for background pixels
    #[arg(long)]
    max_distance: Option<f64>,

    /// Fraction of width/height treated as the vignette border
    #[arg(long)]
    edge_fraction: Option<f64>,

    /// Transparent neighbours (of 8) needed to erase a halo pixel
    #[arg(long)]
    neighbor_threshold: Option<u8>,

    /// Minimum brightness for halo cleanup (0-255)
    #[arg(long)]
    cleanup_brightness: Option<u8>,

    /// File patterns to include in batch processing (e.g., "*.png,*.jpg")
    #[arg(long)]
    include_patterns: Option<String>,

    /// File patterns to exclude from batch processing
    #[arg(long)]
    exclude_patterns: Option<String>,

    /// Number of parallel workers for batch processing
    #[arg(long)]
    workers: Option<usize>,

    /// Continue batch processing even if some files fail
    #[arg(long)]
    continue_on_error: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn split_patterns(patterns: &str) -> Vec<String> {
    patterns
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn matches_patterns(filename: &str, patterns: &[String]) -> bool {
    if patterns.is_empty() {
        return false;
    }

    let filename = filename.to_ascii_lowercase();
    patterns.iter().any(|pattern| {
        let pattern = pattern.to_ascii_lowercase();
        if pattern.contains('*') {
            // Simple glob matching
            let pattern = pattern.replace('*', "");
            if pattern.starts_with('.') {
                filename.ends_with(&pattern)
            } else {
                filename.contains(&pattern)
            }
        } else {
            filename == pattern
        }
    })
}

fn find_input_files(
    input_path: &Path,
    include_patterns: &[String],
    exclude_patterns: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(input_path)
        .with_context(|| format!("Failed to read directory {}", input_path.display()))?
    {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
            if matches_patterns(filename, include_patterns) && !matches_patterns(filename, exclude_patterns) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

fn apply_overrides(config: &mut Config, args: Args) {
    if let Some(input) = args.input {
        config.input.input = input;
    }
    if let Some(mode) = args.mode {
        config.input.mode = mode;
    }
    if args.output.is_some() {
        config.output.output = args.output;
    }
    if args.thumbnail.is_some() {
        config.output.thumbnail = args.thumbnail;
    }
    if let Some(thumbnail_size) = args.thumbnail_size {
        config.output.thumbnail_size = thumbnail_size;
    }
    if let Some(compression) = args.compression {
        config.output.compression = compression;
    }
    if args.save_mask {
        config.output.save_mask = true;
    }
    if let Some(white_threshold) = args.white_threshold {
        config.removal.white_threshold = white_threshold;
    }
    if let Some(max_distance) = args.max_distance {
        config.removal.max_distance = max_distance;
    }
    if let Some(edge_fraction) = args.edge_fraction {
        config.removal.edge_fraction = edge_fraction;
    }
    if let Some(neighbor_threshold) = args.neighbor_threshold {
        config.removal.neighbor_cleanup_threshold = neighbor_threshold;
    }
    if let Some(cleanup_brightness) = args.cleanup_brightness {
        config.removal.cleanup_brightness_floor = cleanup_brightness;
    }
    if let Some(include_patterns) = args.include_patterns {
        config.batch.include_patterns = split_patterns(&include_patterns);
    }
    if let Some(exclude_patterns) = args.exclude_patterns {
        config.batch.exclude_patterns.append(&mut split_patterns(&exclude_patterns));
    }
    if let Some(workers) = args.workers {
        config.batch.workers = workers;
    }
    if args.continue_on_error {
        config.batch.continue_on_error = true;
    }
    if args.verbose {
        config.verbose = true;
    }
}

fn run_single(processor: &Processor, input: &Path) -> anyhow::Result<()> {
    let job = processor.single_job(input);
    let outcome = processor.process(&job)?;

    match &outcome.report {
        Some(report) => println!(
            "Removed background from {} ({}x{}, {} pixels made transparent)",
            input.display(),
            outcome.width,
            outcome.height,
            report.removed()
        ),
        None => println!(
            "Copied {} without background removal ({}x{})",
            input.display(),
            outcome.width,
            outcome.height
        ),
    }
    println!("  -> {}", job.output.display());
    if let (Some(path), Some((width, height))) = (&job.thumbnail, outcome.thumbnail_dimensions) {
        println!("  -> {} ({}x{})", path.display(), width, height);
    }
    Ok(())
}

fn run_batch(processor: &Processor, config: &Config) -> anyhow::Result<()> {
    let mut exclude_patterns = config.batch.exclude_patterns.clone();
    exclude_patterns.push("*_mask*".to_string());

    let input_files = find_input_files(&config.input.input, &config.batch.include_patterns, &exclude_patterns)?;
    if input_files.is_empty() {
        bail!("No input files found matching the criteria in {}", config.input.input.display());
    }

    info!(count = input_files.len(), "Found input files");
    for file in &input_files {
        info!("  - {}", file.display());
    }

    let jobs = processor.batch_jobs(&input_files)?;

    let output_folder = processor.output_folder();
    fs::create_dir_all(&output_folder)
        .with_context(|| format!("Failed to create output directory {}", output_folder.display()))?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.batch.workers)
        .build()
        .context("Failed to build worker pool")?;

    let stats = Mutex::new(ProcessingStats::new(input_files.len()));
    let continue_on_error = config.batch.continue_on_error;

    let result = pool.install(|| {
        jobs.par_iter().try_for_each(|job| {
            let outcome = processor.process(job);

            let mut stats = stats.lock().unwrap_or_else(PoisonError::into_inner);
            match outcome {
                Ok(outcome) => {
                    stats.record(&outcome);
                    info!(input = %job.input.display(), output = %job.output.display(), "Processed");
                }
                Err(e) => {
                    stats.failed += 1;
                    if e.is_input() {
                        error!("Skipping unreadable input {}: {}", job.input.display(), e);
                    } else {
                        error!("Failed to process {}: {}", job.input.display(), e);
                    }
                    if !continue_on_error {
                        return Err(anyhow!(e));
                    }
                }
            }
            if config.verbose {
                stats.print_progress();
            }
            Ok(())
        })
    });

    stats.into_inner().unwrap_or_else(PoisonError::into_inner).print_summary();
    result
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.generate_config {
        let config_path = args.config.unwrap_or_else(|| PathBuf::from("whiteout.toml"));
        Config::save_default(&config_path)?;
        return Ok(());
    }

    let mut config = match &args.config {
        Some(config_path) => Config::load(config_path)?,
        None => Config::default(),
    };
    if args.input.is_none() && args.config.is_none() {
        bail!("No input given. Usage: whiteout <INPUT> [OUTPUT] [THUMBNAIL]");
    }
    apply_overrides(&mut config, args);

    let filter = if config.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let input = config.input.input.clone();
    if !input.exists() {
        bail!("Input path does not exist: {}", input.display());
    }

    let processor = Processor::new(config.clone())?;

    if input.is_dir() {
        run_batch(&processor, &config)
    } else {
        run_single(&processor, &input)
    }
}
