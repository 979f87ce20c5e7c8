//! Batch processing command for many analysis documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use claimx_core::{DocumentResult, FieldExtractionOrchestrator};

use super::process::{read_document, write_row};
use super::{build_orchestrator, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern or directory of analysis documents
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also write a per-file status CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    result: Option<DocumentResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files = find_documents(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let output_dir = args.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&output_dir)?;

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let extraction_config = config.clone();
    let orchestrator = Arc::new(
        tokio::task::spawn_blocking(move || build_orchestrator(&extraction_config)).await??,
    );

    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut handles = Vec::with_capacity(files.len());

    for path in files {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let orchestrator = Arc::clone(&orchestrator);
        let pb = overall_pb.clone();

        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let result = process_single_file(&path, &orchestrator, Instant::now());
            pb.inc(1);
            result
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await?);
    }

    overall_pb.finish_with_message("Complete");

    // The fallback's blocking HTTP client must not be dropped on the runtime.
    tokio::task::spawn_blocking(move || drop(orchestrator)).await?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let results_path = output_dir.join(format!("results_{}.csv", timestamp));
    write_results(&results_path, &results, &config.output_columns())?;
    println!(
        "{} Results written to {}",
        style("✓").green(),
        results_path.display()
    );

    if args.summary {
        let summary_path = output_dir.join(format!("summary_{}.csv", timestamp));
        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let successful = results.iter().filter(|r| r.result.is_some()).count();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Expand a glob pattern, or list the JSON documents of a directory.
fn find_documents(input: &str) -> anyhow::Result<Vec<PathBuf>> {
    let pattern = if Path::new(input).is_dir() {
        Path::new(input).join("*.json").to_string_lossy().into_owned()
    } else {
        input.to_string()
    };

    let mut files: Vec<PathBuf> = glob(&pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json"))
        })
        .collect();
    files.sort();

    Ok(files)
}

fn process_single_file(
    path: &Path,
    orchestrator: &FieldExtractionOrchestrator,
    file_start: Instant,
) -> ProcessResult {
    let outcome = read_document(path)
        .and_then(|document| Ok(orchestrator.extract_document(&document)?));
    let processing_time_ms = file_start.elapsed().as_millis() as u64;

    match outcome {
        Ok(result) => {
            debug!("Processed {} in {}ms", path.display(), processing_time_ms);
            ProcessResult {
                path: path.to_path_buf(),
                result: Some(result),
                error: None,
                processing_time_ms,
            }
        }
        Err(e) => {
            warn!("Failed to process {}: {}", path.display(), e);
            ProcessResult {
                path: path.to_path_buf(),
                result: None,
                error: Some(e.to_string()),
                processing_time_ms,
            }
        }
    }
}

fn write_results(path: &Path, results: &[ProcessResult], columns: &[String]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(columns)?;
    for result in results.iter().filter_map(|r| r.result.as_ref()) {
        write_row(&mut wtr, result, columns)?;
    }

    wtr.flush()?;
    Ok(())
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "values",
        "warnings",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(document) = &result.result {
            wtr.write_record([
                filename,
                "success",
                &document.record.len().to_string(),
                &document.warnings.join("; "),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
