//! # CLI Module
//!
//! Flag-driven pipeline front end.
//!
//! ## Usage
//! ```bash
//! # Full pipeline: detect, convert, classify, organize, archive, cleanup
//! photo-sort --all --model-command "python detect.py" --image-dir ~/Photos
//!
//! # Individual stages compose
//! photo-sort --detect --model-command "python detect.py"
//! photo-sort --classify --organize --operation copy
//! ```
//!
//! Each stage checks its prerequisites before running and exits with
//! status 1, naming the missing stage, if an input file is absent.

use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use photo_sorter::core::archive::archive_directories;
use photo_sorter::core::cache::FileCache;
use photo_sorter::core::classifier::{classify, ProcessedReport};
use photo_sorter::core::cleanup::remove_path;
use photo_sorter::core::detector::{CommandModel, Detector};
use photo_sorter::core::organize::{create_class_folders, organize, OperationMode};
use photo_sorter::core::reconcile::reconcile;
use photo_sorter::core::scanner::{scan_images, ScanConfig};
use photo_sorter::core::state::PersistedState;
use photo_sorter::error::StateError;
use photo_sorter::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};

/// Photo Sorter - batch object detection, content-addressed
#[derive(Parser, Debug)]
#[command(name = "photo-sort")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input folder containing images
    #[arg(long, default_value = "img")]
    image_dir: PathBuf,

    /// Directory for intermediate and final results
    #[arg(long, default_value = "results")]
    results_dir: PathBuf,

    /// Path of the output zip archive
    #[arg(long, default_value = "data.zip")]
    archive_path: PathBuf,

    /// What to do with classified files
    #[arg(long, value_enum, default_value_t = Operation::Move)]
    operation: Operation,

    /// External detection command; invoked per image, must print JSON
    /// detections on stdout. Quote arguments containing spaces; no other
    /// shell syntax is interpreted
    #[arg(long)]
    model_command: Option<String>,

    /// Seed for classification tie-breaking (reproducible runs)
    #[arg(long)]
    seed: Option<u64>,

    /// Run detection over the image folder
    #[arg(long)]
    detect: bool,

    /// Export the binary detection state as JSON
    #[arg(long)]
    convert: bool,

    /// Classify each hash and write processed.json
    #[arg(long)]
    classify: bool,

    /// Move/copy files into per-classification folders
    #[arg(long)]
    organize: bool,

    /// Zip the image and results directories
    #[arg(long)]
    archive: bool,

    /// Delete the results directory afterwards
    #[arg(long)]
    cleanup: bool,

    /// Run all stages in sequence
    #[arg(long)]
    all: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Operation {
    /// Move files into classification folders
    Move,
    /// Copy files, keeping the originals in place
    Copy,
}

impl From<Operation> for OperationMode {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Move => OperationMode::Move,
            Operation::Copy => OperationMode::Copy,
        }
    }
}

/// Resolved file layout under the results directory
struct Layout {
    cache_file: PathBuf,
    state_file: PathBuf,
    json_file: PathBuf,
    processed_file: PathBuf,
    classified_dir: PathBuf,
}

impl Layout {
    fn new(results_dir: &Path) -> Self {
        Self {
            cache_file: results_dir.join("detection_cache.bin"),
            state_file: results_dir.join("detections.bin"),
            json_file: results_dir.join("detections.json"),
            processed_file: results_dir.join("processed.json"),
            classified_dir: results_dir.join("processed_images"),
        }
    }
}

/// Run the CLI
pub fn run() -> Result<()> {
    let mut cli = Cli::parse();

    if cli.all {
        cli.detect = true;
        cli.convert = true;
        cli.classify = true;
        cli.organize = true;
        cli.archive = true;
        cli.cleanup = true;
    }

    let any_stage = cli.detect || cli.convert || cli.classify || cli.organize || cli.archive || cli.cleanup;
    if !any_stage {
        eprintln!(
            "{} no stage selected; pass --all or one of --detect/--convert/--classify/--organize/--archive/--cleanup",
            style("Nothing to do:").yellow().bold()
        );
        return Ok(());
    }

    let layout = Layout::new(&cli.results_dir);

    if cli.detect {
        run_detect(&cli, &layout)?;
    }
    if cli.convert {
        run_convert(&layout)?;
    }
    if cli.classify {
        run_classify(&cli, &layout)?;
    }
    if cli.organize {
        run_organize(&cli, &layout)?;
    }
    if cli.archive {
        run_archive(&cli)?;
    }
    if cli.cleanup {
        run_cleanup(&cli);
    }

    Ok(())
}

/// Exit with status 1 if a stage's input file is missing
fn require_file(path: &Path, produced_by: &'static str) {
    if !path.exists() {
        let error = StateError::MissingInput {
            path: path.to_path_buf(),
            stage: produced_by,
        };
        eprintln!("{} {}", style("Error:").red().bold(), error);
        std::process::exit(1);
    }
}

fn run_detect(cli: &Cli, layout: &Layout) -> Result<()> {
    println!("{}", style("Processing images...").bold());

    let Some(command) = cli.model_command.as_deref() else {
        eprintln!(
            "{} --detect needs --model-command to invoke the detection model",
            style("Error:").red().bold()
        );
        std::process::exit(1);
    };

    std::fs::create_dir_all(&cli.results_dir).map_err(|source| StateError::WriteFailed {
        path: cli.results_dir.clone(),
        source,
    })?;

    let images = scan_images(&cli.image_dir, &ScanConfig::default())?;
    let mut state = PersistedState::load(&layout.state_file);
    let outcome = reconcile(&mut state, &images)?;

    let model = CommandModel::from_command_line(command)?;
    let cache = FileCache::new(&layout.cache_file);
    let detector = Detector::new(Box::new(model), Box::new(cache));

    let progress = ProgressBar::new(outcome.pending.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("█▓░"),
    );

    let summary = detector.detect_batch(&mut state, &outcome.pending, |done, _total, path| {
        progress.set_position(done as u64);
        progress.set_message(
            path.file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .into_owned(),
        );
    })?;
    progress.finish_and_clear();

    state.save(&layout.state_file)?;

    println!(
        "  {} images scanned, {} unique hashes tracked",
        images.len(),
        state.len()
    );
    println!(
        "  {} new ({} detected, {} failed), {} renamed/moved, {} copies",
        outcome.pending.len(),
        summary.processed,
        summary.failed,
        outcome.renamed,
        outcome.copied
    );
    if outcome.pending.is_empty() {
        println!("  {}", style("all files already processed").green());
    }
    Ok(())
}

fn run_convert(layout: &Layout) -> Result<()> {
    println!("{}", style("Exporting detection state as JSON...").bold());
    require_file(&layout.state_file, "detect");

    let state = PersistedState::load(&layout.state_file);
    state.export_json(&layout.json_file)?;
    println!(
        "  wrote {} ({} hashes)",
        layout.json_file.display(),
        state.len()
    );
    Ok(())
}

fn run_classify(cli: &Cli, layout: &Layout) -> Result<()> {
    println!("{}", style("Classifying detections...").bold());
    require_file(&layout.state_file, "detect");

    let state = PersistedState::load(&layout.state_file);
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let report = classify(&state, &mut rng);
    report.save_json(&layout.processed_file)?;

    let folders = create_class_folders(
        report.metadata.folder_names.iter().cloned(),
        &layout.classified_dir,
    );

    println!(
        "  {} hashes classified into {} classes, {} folders ready",
        report.results.len(),
        report.metadata.folder_names.len(),
        folders.len()
    );
    if !report.metadata.duplicates.is_empty() {
        println!(
            "  {} {} hashes flagged as stale-state duplicates",
            style("warning:").yellow(),
            report.metadata.duplicates.len()
        );
    }
    Ok(())
}

fn run_organize(cli: &Cli, layout: &Layout) -> Result<()> {
    let mode: OperationMode = cli.operation.into();
    println!(
        "{}",
        style(format!("{:?} files by classification...", mode)).bold()
    );
    require_file(&layout.processed_file, "classify");

    let report = ProcessedReport::load_json(&layout.processed_file)?;
    let summary = organize(&report, &layout.classified_dir, mode);

    for (classification, files) in &summary.transferred {
        println!("  {}: {} files", classification, files.len());
    }
    println!(
        "  {} transferred, {} missing sources skipped, {} errors",
        summary.files_transferred(),
        summary.skipped,
        summary.errors.len()
    );
    Ok(())
}

fn run_archive(cli: &Cli) -> Result<()> {
    println!("{}", style("Zipping processed files...").bold());
    if !cli.image_dir.exists() && !cli.results_dir.exists() {
        eprintln!(
            "{} nothing to zip; run the detect stage first",
            style("Error:").red().bold()
        );
        std::process::exit(1);
    }

    let entries = archive_directories(
        &[cli.image_dir.clone(), cli.results_dir.clone()],
        &cli.archive_path,
    )?;
    println!(
        "  {} entries archived into {}",
        entries,
        cli.archive_path.display()
    );
    Ok(())
}

fn run_cleanup(cli: &Cli) {
    println!("{}", style("Deleting results directory...").bold());
    if remove_path(&cli.results_dir) {
        println!("  {} deleted", cli.results_dir.display());
    } else {
        println!("  nothing deleted");
    }
}
