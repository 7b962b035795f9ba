//! CSV output: one file per section per payslip

use crate::fields::{Field, Section};
use crate::layout::template;
use crate::pipeline::PaychequeRecord;
use crate::PaychequeError;
use chrono::NaiveDate;
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Columns prefixed to every section except the pay cheque details
pub const IDENTIFIER_FIELDS: [Field; 4] = [
    Field::PayBeginDate,
    Field::PayEndDate,
    Field::AdviceNumber,
    Field::AdviceDate,
];

/// `<Section> - <begin> to <end>.csv`
pub fn file_name(section: Section, begin: NaiveDate, end: NaiveDate) -> String {
    format!(
        "{} - {} to {}.csv",
        section.name(),
        begin.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    )
}

/// Write one section of `record` as CSV, header first
pub fn write_section<W: Write>(
    writer: W,
    record: &PaychequeRecord,
    section: Section,
) -> Result<(), PaychequeError> {
    let mut csv = csv::Writer::from_writer(writer);

    let prefixed = section != Section::PaychequeDetails;
    let identifiers: Vec<String> = record
        .identifiers()
        .iter()
        .map(|v| v.value.to_string())
        .collect();

    let mut header: Vec<&str> = Vec::new();
    if prefixed {
        header.extend(IDENTIFIER_FIELDS.iter().map(Field::header));
    }
    header.extend(template(section).fields().iter().map(Field::header));
    csv.write_record(&header)?;

    if let Some(data) = record.section(section) {
        for row in &data.rows {
            let mut cells: Vec<String> = Vec::with_capacity(header.len());
            if prefixed {
                cells.extend(identifiers.iter().cloned());
            }
            cells.extend(row.iter().map(|v| v.value.to_string()));
            csv.write_record(&cells)?;
        }
    }

    csv.flush()?;
    Ok(())
}

/// Write every section of `record` under `data_dir/<Section>/`, replacing
/// existing files. Returns the written paths.
pub fn write_csv(record: &PaychequeRecord, data_dir: &Path) -> Result<Vec<PathBuf>, PaychequeError> {
    let begin = record
        .pay_begin_date()
        .ok_or_else(|| PaychequeError::MissingValue {
            field: Field::PayBeginDate.header().to_string(),
        })?;
    let end = record
        .pay_end_date()
        .ok_or_else(|| PaychequeError::MissingValue {
            field: Field::PayEndDate.header().to_string(),
        })?;

    info!("Saving data to {}", data_dir.display());

    let mut written = Vec::with_capacity(Section::ALL.len());
    for section in Section::ALL {
        let folder = data_dir.join(section.name());
        std::fs::create_dir_all(&folder)?;

        let path = folder.join(file_name(section, begin, end));
        let file = std::fs::File::create(&path)?;
        write_section(file, record, section)?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        let begin = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 14).unwrap();
        assert_eq!(
            file_name(Section::HoursAndEarnings, begin, end),
            "Hours and Earnings - 2024-01-01 to 2024-01-14.csv"
        );
    }

    #[test]
    fn test_empty_record_writes_prefixed_header() {
        let record = PaychequeRecord::default();
        let mut buf = Vec::new();
        write_section(&mut buf, &record, Section::NetPayDistribution).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "Pay Begin Date,Pay End Date,Advice Number,Advice Date,Advice Number Reference,Amount\n"
        );
    }

    #[test]
    fn test_write_csv_needs_pay_dates() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_csv(&PaychequeRecord::default(), dir.path()).unwrap_err();
        assert!(matches!(err, PaychequeError::MissingValue { field } if field == "Pay Begin Date"));
    }
}
