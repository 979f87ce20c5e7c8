//! Process command - extract fields from a single analysis document.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use claimx_core::models::config::ClaimxConfig;
use claimx_core::{Document, DocumentResult};

use super::{build_orchestrator, load_config};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Analysis document (JSON)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Report consistency issues in the extracted values
    #[arg(long)]
    validate: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let document = read_document(&args.input)?;
    info!("Processing file: {}", args.input.display());

    // The LLM client is blocking, so it is built, used and dropped off the runtime.
    let extraction_config = config.clone();
    let result = tokio::task::spawn_blocking(move || -> anyhow::Result<DocumentResult> {
        let orchestrator = build_orchestrator(&extraction_config)?;
        Ok(orchestrator.extract_document(&document)?)
    })
    .await??;

    if args.validate && !result.warnings.is_empty() {
        eprintln!("{}", style("Validation issues:").yellow());
        for warning in &result.warnings {
            eprintln!("  - {}", warning);
        }
    }

    let output = format_result(&result, &config, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Read an analysis document, rejecting anything that is not JSON.
pub fn read_document(path: &Path) -> anyhow::Result<Document> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if extension != "json" {
        anyhow::bail!("Unsupported file format: {}", extension);
    }

    let content = fs::read_to_string(path)?;
    let document = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid analysis document {}: {}", path.display(), e))?;

    Ok(document)
}

fn format_result(
    result: &DocumentResult,
    config: &ClaimxConfig,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
            "fileName": result.file_name,
            "values": result.record,
            "warnings": result.warnings,
            "processingTimeMs": result.processing_time_ms,
        }))?),
        OutputFormat::Csv => format_csv(result, config),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

/// Write one results row under the configured column layout.
pub fn write_row<W: std::io::Write>(
    wtr: &mut csv::Writer<W>,
    result: &DocumentResult,
    columns: &[String],
) -> anyhow::Result<()> {
    let mut row = vec![result.file_name.clone()];
    row.extend(result.record.row_values(&columns[1..]));
    wtr.write_record(&row)?;
    Ok(())
}

fn format_csv(result: &DocumentResult, config: &ClaimxConfig) -> anyhow::Result<String> {
    let columns = config.output_columns();
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(&columns)?;
    write_row(&mut wtr, result, &columns)?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &DocumentResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("File: {}\n", result.file_name));
    output.push_str(&format!("Values: {}\n", result.record.len()));
    output.push('\n');

    for (key, value) in result.record.iter() {
        output.push_str(&format!("  {:<18} {}\n", key, value));
    }

    if !result.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &result.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output
}
