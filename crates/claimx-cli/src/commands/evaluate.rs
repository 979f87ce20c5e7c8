//! Evaluate command - score a results CSV against ground truth.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use tracing::info;

use claimx_core::evaluate::evaluate;

/// Arguments for the evaluate command.
#[derive(Args)]
pub struct EvaluateArgs {
    /// Ground truth CSV (file name first, one column per field slot)
    #[arg(required = true)]
    ground_truth: PathBuf,

    /// Results CSV produced by `claimx batch`
    #[arg(required = true)]
    results: PathBuf,

    /// Output directory for the `<results>_eval.csv` report
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: EvaluateArgs) -> anyhow::Result<()> {
    for path in [&args.ground_truth, &args.results] {
        if !path.exists() {
            anyhow::bail!("Input file not found: {}", path.display());
        }
    }

    let (_, ground_truth) = read_table(&args.ground_truth)?;
    let (header, results) = read_table(&args.results)?;
    info!(
        "Evaluating {} result rows against {} labelled files",
        results.len(),
        ground_truth.len()
    );

    let report = evaluate(&header, &ground_truth, &results);

    let output_dir = args.output.clone().unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&output_dir)?;
    let stem = args
        .results
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("results");
    let output_path = output_dir.join(format!("{}_eval.csv", stem));

    let mut wtr = csv::Writer::from_path(&output_path)?;
    wtr.write_record(report.header())?;
    for record in report.records() {
        wtr.write_record(&record)?;
    }
    wtr.flush()?;

    let unlabelled = report.rows.iter().filter(|r| !r.labelled).count();
    if unlabelled > 0 {
        println!(
            "{} {} files have no ground truth row",
            style("⚠").yellow(),
            unlabelled
        );
    }

    println!("{:<20} {:>8}", "column", "accuracy");
    for (column, accuracy) in report.column_accuracy() {
        println!("{:<20} {:>7.1}%", column, accuracy * 100.0);
    }
    println!();
    println!(
        "{} Mean error sum per file: {:.3}",
        style("ℹ").blue(),
        report.mean_sum()
    );
    println!(
        "{} Report written to {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

/// Header and data rows of a CSV file; a UTF-8 BOM is tolerated.
fn read_table(path: &Path) -> anyhow::Result<(Vec<String>, Vec<Vec<String>>)> {
    let content = fs::read_to_string(path)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let header = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }

    Ok((header, rows))
}
