//! tagscrub CLI - strips HTML markup from exported workbooks

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tagscrub::{output_file_name, scrub_bytes, ScrubConfig, ScrubError, ScrubReport};

#[derive(Parser, Debug)]
#[command(name = "tagscrub")]
#[command(
    author,
    version,
    about = "Remove HTML tags and entities from the text columns of an .xlsx workbook"
)]
struct Cli {
    /// Input workbook (.xlsx)
    input: Option<PathBuf>,

    /// Output file (default: next to the input, with the suffix added)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file overriding the column rules and output suffix
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Suffix for the default output name
    #[arg(long)]
    suffix: Option<String>,

    /// Clean and report without writing anything
    #[arg(long)]
    dry_run: bool,

    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG wins
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = run(&cli)?;
    print_report(&outcome.report);
    match &outcome.written {
        Some(path) => eprintln!(
            "✓ Success! {} cells cleaned, saved to '{}'",
            outcome.report.cells_cleaned,
            path.display()
        ),
        None => eprintln!(
            "✓ {} cells would be cleaned (dry run, nothing written)",
            outcome.report.cells_cleaned
        ),
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// What a run did
struct Outcome {
    report: ScrubReport,
    /// `None` on a dry run
    written: Option<PathBuf>,
}

fn run(cli: &Cli) -> Result<Outcome> {
    let input = cli.input.as_deref().ok_or(ScrubError::NoFileSelected)?;
    let config = load_config(cli)?;

    let bytes =
        std::fs::read(input).with_context(|| format!("Failed to read '{}'", input.display()))?;
    log::info!("read {} bytes from '{}'", bytes.len(), input.display());

    let output = scrub_bytes(Some(&bytes), &config)
        .with_context(|| format!("Failed to clean '{}'", input.display()))?;

    if cli.dry_run {
        return Ok(Outcome {
            report: output.report,
            written: None,
        });
    }

    let path = match &cli.output {
        Some(path) => path.clone(),
        None => default_output_path(input, &config.output_suffix)?,
    };
    std::fs::write(&path, &output.bytes)
        .with_context(|| format!("Failed to write '{}'", path.display()))?;
    log::info!("wrote {} bytes to '{}'", output.bytes.len(), path.display());

    Ok(Outcome {
        report: output.report,
        written: Some(path),
    })
}

/// Defaults, then the config file, then `--suffix`
fn load_config(cli: &Cli) -> Result<ScrubConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config '{}'", path.display()))?;
            ScrubConfig::from_json_str(&json)
                .with_context(|| format!("Invalid config '{}'", path.display()))?
        }
        None => ScrubConfig::default(),
    };
    if let Some(suffix) = &cli.suffix {
        config.output_suffix = suffix.clone();
    }
    Ok(config)
}

fn default_output_path(input: &Path, suffix: &str) -> Result<PathBuf> {
    let name = input
        .file_name()
        .with_context(|| format!("'{}' has no file name", input.display()))?;
    Ok(input.with_file_name(output_file_name(&name.to_string_lossy(), suffix)))
}

fn print_report(report: &ScrubReport) {
    for sheet in &report.sheets {
        eprintln!(
            "  {}: {} cleaned, {} rows (application column {} [{}], text column {} [{}])",
            sheet.name,
            sheet.cells_cleaned,
            sheet.rows_visited,
            sheet.columns.application.index,
            sheet.columns.application.origin,
            sheet.columns.text.index,
            sheet.columns.text.origin,
        );
    }
}
