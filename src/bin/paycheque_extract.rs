//! CLI tool: extract payslip PDFs into per-section CSV files

use clap::builder::BoolishValueParser;
use clap::Parser;
use paycheque_extract::batch::{process_file, run_batch, BatchConfig};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "paycheque-extract")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract payslip fields from PDF into per-section CSV files", long_about = None)]
struct Cli {
    /// Extract this PDF only instead of every PDF in the input directory
    file: Option<PathBuf>,

    /// Directory scanned for payslip PDFs
    #[arg(long = "pdf-dir", env = "PDF_DIR_PATH", default_value = "pdfs")]
    pdf_dir: PathBuf,

    /// Root directory of the per-section CSV folders
    #[arg(long = "data-dir", env = "DATA_PATH", default_value = "data")]
    data_dir: PathBuf,

    /// Move processed PDFs into this directory
    #[arg(long = "archive-dir", env = "ARCHIVE_PATH")]
    archive_dir: Option<PathBuf>,

    /// Save a copy of each page with the computed field boxes drawn on it
    #[arg(long = "save-coordinates", env = "SAVE_COORDINATES", value_parser = BoolishValueParser::new())]
    save_coordinates: bool,

    /// Log filter (error, warn, info, debug, trace or a numeric level)
    #[arg(long = "log-level", env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// Accept the numeric levels of older config files as well as names
fn log_filter(level: &str) -> &str {
    match level.trim() {
        "10" => "debug",
        "20" => "info",
        "30" => "warn",
        "40" | "50" => "error",
        other => other,
    }
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(&cli.log_level)),
    )
    .target(env_logger::Target::Stderr)
    .init();

    let config = BatchConfig {
        pdf_dir: cli.pdf_dir,
        data_dir: cli.data_dir,
        archive_dir: cli.archive_dir,
        save_coordinates: cli.save_coordinates,
        ..BatchConfig::default()
    };

    if let Some(file) = cli.file {
        match process_file(&file, &config) {
            Ok(written) => {
                println!("Extracted: {}", file.display());
                for path in &written {
                    println!("  {}", path.display());
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    match run_batch(&config) {
        Ok(summary) => {
            println!("Payslip Extraction");
            println!("==================");
            println!("Processed: {}", summary.processed);
            println!("Failed: {}", summary.failed.len());
            println!("CSV files written: {}", summary.written.len());
            for (path, error) in &summary.failed {
                eprintln!("  {}: {}", path.display(), error);
            }
            if !summary.failed.is_empty() {
                process::exit(2);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
