use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::ProgressBar;
use ostraca::archaeologist::{Archaeologist, ExcavatorConfig};
use ostraca::models::ExcavationResult;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "ostraca")]
#[command(about = "Excavate structured schema data from contaminated text dumps")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Excavate artifacts from one or more input files
    Excavate(ExcavateArgs),
}

#[derive(Args)]
struct ExcavateArgs {
    /// Input files to excavate
    #[arg(short, long, required = true, num_args = 1..)]
    input: Vec<PathBuf>,

    /// Output directory for artifact JSON and the summary CSV
    #[arg(short, long)]
    output: PathBuf,

    /// Maximum content size in bytes before truncation
    #[arg(long, default_value_t = ostraca::config::DEFAULT_MAX_CONTENT_SIZE)]
    max_size: usize,

    /// Extraction timeout in seconds
    #[arg(long, default_value_t = ostraca::config::DEFAULT_EXTRACTION_TIMEOUT_SECS)]
    timeout: u64,

    /// Minimum classifier confidence
    #[arg(long, default_value_t = ostraca::config::DEFAULT_MIN_CONFIDENCE)]
    min_confidence: f64,

    /// Source hint recorded on every artifact (e.g. "log_file")
    #[arg(long)]
    source_hint: Option<String>,
}

fn run_excavate(args: ExcavateArgs) -> Result<()> {
    fs::create_dir_all(&args.output).with_context(|| {
        format!("Failed to create output directory: {}", args.output.display())
    })?;

    let config = ExcavatorConfig {
        max_content_size: args.max_size,
        extraction_timeout: Duration::from_secs(args.timeout),
        min_confidence: args.min_confidence,
    };

    info!(files = args.input.len(), "starting excavation");
    let pb = ProgressBar::new(args.input.len() as u64);

    // one archaeologist per file keeps per-call work independent; the
    // library call itself stays single-threaded
    let results: Vec<Result<(PathBuf, ExcavationResult)>> = args
        .input
        .par_iter()
        .map(|path| {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file: {}", path.display()))?;

            let archaeologist = Archaeologist::new(config.clone());
            let result = archaeologist.excavate(&content, args.source_hint.as_deref());

            write_artifacts(&args.output, path, &result)?;
            pb.inc(1);
            Ok((path.clone(), result))
        })
        .collect();

    pb.finish_and_clear();

    let mut summary = csv::Writer::from_path(args.output.join("artifacts.csv"))
        .context("Failed to create summary CSV")?;
    summary.write_record([
        "file",
        "content_type",
        "confidence",
        "quality_score",
        "is_valid",
        "start_offset",
        "end_offset",
        "extraction_method",
        "contamination",
    ])?;

    let mut files_ok = 0usize;
    let mut total_artifacts = 0usize;
    let mut valid_artifacts = 0usize;
    let mut failures = Vec::new();

    for outcome in results {
        match outcome {
            Ok((path, result)) => {
                files_ok += 1;
                total_artifacts += result.artifacts.len();
                valid_artifacts += result.valid_artifacts().len();

                for artifact in &result.artifacts {
                    let contamination = artifact
                        .extraction_context
                        .contamination_types
                        .iter()
                        .map(|c| c.as_str())
                        .collect::<Vec<_>>()
                        .join("|");
                    summary.write_record([
                        path.display().to_string(),
                        artifact.content_type.as_str().to_string(),
                        artifact.confidence.as_str().to_string(),
                        format!("{:.3}", artifact.quality_score()),
                        artifact.is_valid.to_string(),
                        artifact.extraction_context.start_offset.to_string(),
                        artifact.extraction_context.end_offset.to_string(),
                        artifact.extraction_context.extraction_method.clone(),
                        contamination,
                    ])?;
                }
            }
            Err(e) => failures.push(e),
        }
    }
    summary.flush()?;

    println!();
    println!("=== Summary ===");
    println!("Files processed:    {}", files_ok);
    println!("Artifacts found:    {}", total_artifacts);
    println!("Valid artifacts:    {}", valid_artifacts);
    println!("Failed files:       {}", failures.len());

    for failure in &failures {
        error!("{:#}", failure);
    }
    if !failures.is_empty() {
        anyhow::bail!("{} input file(s) failed", failures.len());
    }

    Ok(())
}

/// Write one `<stem>.artifacts.json` per input file using the plain
/// nested-mapping record shape.
fn write_artifacts(output_dir: &Path, input: &Path, result: &ExcavationResult) -> Result<()> {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string());

    let records: Vec<serde_json::Value> =
        result.artifacts.iter().map(|a| a.to_record()).collect();
    let report = serde_json::json!({
        "source": input.display().to_string(),
        "total_content_size": result.total_content_size,
        "processing_time_ms": result.processing_time_ms,
        "extraction_stats": result.extraction_stats,
        "artifacts": records,
    });

    let path = output_dir.join(format!("{}.artifacts.json", stem));
    let file = fs::File::create(&path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    serde_json::to_writer_pretty(file, &report)
        .with_context(|| format!("Failed to write artifacts: {}", path.display()))?;

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Excavate(args) => run_excavate(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
