//! Field extraction from fixed-layout PDF payslips using lopdf
//!
//! This crate provides:
//! - A searchable text index over the first page of a PDF (glyph boxes and
//!   vector drawings read straight from the content stream)
//! - Anchor-relative layout of every payslip section from printed labels
//! - Typed field extraction (dates, exact decimals, text) with totals checks
//! - CSV output, a debug overlay and a parallel batch driver

pub mod anchor;
pub mod annotate;
pub mod batch;
pub mod extractor;
pub mod fields;
pub mod geometry;
pub mod layout;
pub mod margins;
pub mod output;
pub mod page;
pub mod pipeline;
pub mod rows;
pub mod validate;

pub use anchor::{resolve, Label, TieBreak};
pub use batch::{run_batch, BatchConfig, BatchSummary};
pub use fields::{DataType, ExtractedValue, Field, FieldDescriptor, Section, Value};
pub use geometry::{Edge, Rect};
pub use layout::{build_layout, PageContext, PageLayout, SectionLayout};
pub use margins::{detect_margins, Margins};
pub use output::write_csv;
pub use page::PageIndex;
pub use pipeline::{extract_record, Extraction, PaychequeRecord, SectionData};
pub use validate::{validate, TotalCheck};

use std::path::Path;

/// Extract every section from the first page of a payslip PDF
pub fn process_paycheque<P: AsRef<Path>>(path: P) -> Result<Extraction, PaychequeError> {
    let page = PageIndex::open(path)?;
    extract_record(&page)
}

/// Extract every section from a payslip PDF held in memory
pub fn process_paycheque_mem(buffer: &[u8]) -> Result<Extraction, PaychequeError> {
    let page = PageIndex::open_mem(buffer)?;
    extract_record(&page)
}

#[derive(Debug, thiserror::Error)]
pub enum PaychequeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("PDF has no pages")]
    NoPages,
    #[error("Anchor not found: \"{label}\"")]
    AnchorNotFound { label: String },
    #[error("No vector drawings on the page; margins cannot be detected")]
    NoDrawingsFound,
    #[error("No rows found for delimiter \"{delimiter}\"")]
    NoRowsFound { delimiter: String },
    #[error("{field}: cannot parse \"{text}\" as MM/DD/YYYY")]
    DateParse { field: String, text: String },
    #[error("{field}: invalid number \"{text}\"")]
    InvalidNumber { field: String, text: String },
    #[error("Inverted rectangle for {context}: {rect}")]
    InvertedRect { context: String, rect: Rect },
    #[error("{field}: no value on the page")]
    MissingValue { field: String },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<lopdf::Error> for PaychequeError {
    fn from(e: lopdf::Error) -> Self {
        PaychequeError::Parse(e.to_string())
    }
}
