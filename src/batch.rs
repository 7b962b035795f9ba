//! Batch driver over a directory of payslip PDFs
//!
//! Documents are independent, so each one is extracted on its own rayon
//! worker. A fatal error aborts only the document that raised it.

use crate::annotate;
use crate::extractor;
use crate::output;
use crate::page::PageIndex;
use crate::pipeline::{extract_record, Extraction};
use crate::PaychequeError;
use log::{info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Configuration for a batch run
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Directory scanned for `*.pdf` files
    pub pdf_dir: PathBuf,
    /// Root of the per-section CSV folders
    pub data_dir: PathBuf,
    /// Processed PDFs are moved here when set
    pub archive_dir: Option<PathBuf>,
    /// Save a copy of each page with every field box drawn on it
    pub save_coordinates: bool,
    /// Where annotated copies are written
    pub debug_dir: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            pdf_dir: PathBuf::from("pdfs"),
            data_dir: PathBuf::from("data"),
            archive_dir: None,
            save_coordinates: false,
            debug_dir: PathBuf::from("."),
        }
    }
}

/// What a batch run did
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Documents extracted and written
    pub processed: usize,
    /// Documents that failed, with the error that stopped them
    pub failed: Vec<(PathBuf, String)>,
    /// Every CSV file written
    pub written: Vec<PathBuf>,
}

/// Every `*.pdf` in `dir`, sorted descending by file name
pub fn collect_pdfs(dir: &Path) -> Result<Vec<PathBuf>, PaychequeError> {
    let mut pdfs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"));
        if path.is_file() && is_pdf {
            pdfs.push(path);
        }
    }
    pdfs.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    Ok(pdfs)
}

/// Extract one document and write its CSV files
pub fn process_file(path: &Path, config: &BatchConfig) -> Result<Vec<PathBuf>, PaychequeError> {
    info!("File selected for extraction: {}", path.display());

    let (doc, page_id) = extractor::load_first_page(path)?;
    let page = PageIndex::from_content(extractor::extract_page(&doc, page_id)?);
    let Extraction { layout, record } = extract_record(&page)?;

    if config.save_coordinates {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = config
            .debug_dir
            .join(format!("{}_{}", stem, annotate::debug_file_name()));
        annotate::save_annotated(path, &layout, &output)?;
    }

    for (section, check) in record.mismatches() {
        warn!(
            "{}: {} total mismatch (computed {}, printed {})",
            section, check.field, check.computed, check.printed
        );
    }

    let written = output::write_csv(&record, &config.data_dir)?;

    if let Some(archive) = &config.archive_dir {
        archive_file(path, archive)?;
    }

    Ok(written)
}

/// Move `path` into `archive_dir`, creating it if needed
pub fn archive_file(path: &Path, archive_dir: &Path) -> Result<PathBuf, PaychequeError> {
    std::fs::create_dir_all(archive_dir)?;
    let name = path.file_name().ok_or_else(|| {
        PaychequeError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("not a file: {}", path.display()),
        ))
    })?;
    let target = archive_dir.join(name);
    if std::fs::rename(path, &target).is_err() {
        // Rename fails across filesystems
        std::fs::copy(path, &target)?;
        std::fs::remove_file(path)?;
    }
    info!("Moved {} to {}", path.display(), target.display());
    Ok(target)
}

/// Process every PDF in `config.pdf_dir`
pub fn run_batch(config: &BatchConfig) -> Result<BatchSummary, PaychequeError> {
    let pdfs = collect_pdfs(&config.pdf_dir)?;
    if pdfs.is_empty() {
        warn!(
            "No PDF files found in {}. Confirm the correct directory is configured.",
            config.pdf_dir.display()
        );
        return Ok(BatchSummary::default());
    }
    info!("Processing {} PDF files", pdfs.len());

    let results: Vec<(PathBuf, Result<Vec<PathBuf>, PaychequeError>)> = pdfs
        .into_par_iter()
        .map(|path| {
            let result = process_file(&path, config);
            (path, result)
        })
        .collect();

    let mut summary = BatchSummary::default();
    for (path, result) in results {
        match result {
            Ok(mut written) => {
                summary.processed += 1;
                summary.written.append(&mut written);
            }
            Err(e) => {
                warn!("Failed to extract {}: {}", path.display(), e);
                summary.failed.push((path, e.to_string()));
            }
        }
    }

    info!(
        "Batch complete: {} processed, {} failed",
        summary.processed,
        summary.failed.len()
    );
    Ok(summary)
}
