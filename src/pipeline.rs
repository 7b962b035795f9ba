//! End-to-end extraction for one payslip page
//!
//! Margins and section layouts are derived first, then every field box is
//! read and coerced, and repeating sections are checked against their
//! printed totals. Any fatal error aborts the page; no partial record is
//! produced.

use crate::fields::{self, ExtractedValue, Field, FieldDescriptor, Section, Value};
use crate::layout::{build_layout, PageContext, PageLayout, SectionLayout};
use crate::page::PageIndex;
use crate::validate::{validate_all, TotalCheck};
use crate::PaychequeError;
use chrono::NaiveDate;
use log::{debug, info};
use std::collections::BTreeMap;

/// Label text removed from the start of the message body
const MESSAGE_LABEL: &str = "MESSAGE:";

/// Extracted values of one section
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SectionData {
    /// One entry per row; single-instance sections have exactly one
    pub rows: Vec<Vec<ExtractedValue>>,
    /// Printed totals aligned with the row columns (repeating sections only)
    pub totals: Vec<Option<ExtractedValue>>,
    pub checks: Vec<TotalCheck>,
}

impl SectionData {
    /// Value of `field` in the first row
    pub fn value(&self, field: Field) -> Option<&Value> {
        self.rows
            .first()?
            .iter()
            .find(|v| v.field == field)
            .map(|v| &v.value)
    }

    /// True when every printed total matched its row sum
    pub fn totals_match(&self) -> bool {
        self.checks.iter().all(|c| c.matches)
    }
}

/// Every section extracted from one payslip
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PaychequeRecord {
    sections: BTreeMap<Section, SectionData>,
}

impl PaychequeRecord {
    pub fn section(&self, section: Section) -> Option<&SectionData> {
        self.sections.get(&section)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Section, &SectionData)> {
        self.sections.iter()
    }

    fn detail(&self, field: Field) -> Option<&Value> {
        self.section(Section::PaychequeDetails)?.value(field)
    }

    pub fn pay_begin_date(&self) -> Option<NaiveDate> {
        self.detail(Field::PayBeginDate)?.as_date()
    }

    pub fn pay_end_date(&self) -> Option<NaiveDate> {
        self.detail(Field::PayEndDate)?.as_date()
    }

    pub fn advice_number(&self) -> Option<&str> {
        self.detail(Field::AdviceNumber)?.as_text()
    }

    pub fn advice_date(&self) -> Option<NaiveDate> {
        self.detail(Field::AdviceDate)?.as_date()
    }

    /// The four pay cheque details that identify this record
    pub fn identifiers(&self) -> Vec<ExtractedValue> {
        self.section(Section::PaychequeDetails)
            .and_then(|data| data.rows.first())
            .cloned()
            .unwrap_or_default()
    }

    /// Every totals check that failed
    pub fn mismatches(&self) -> Vec<(Section, &TotalCheck)> {
        self.sections
            .iter()
            .flat_map(|(section, data)| {
                data.checks
                    .iter()
                    .filter(|c| !c.matches)
                    .map(move |c| (*section, c))
            })
            .collect()
    }
}

/// Layout and values extracted from one page
#[derive(Debug, Clone)]
pub struct Extraction {
    pub layout: PageLayout,
    pub record: PaychequeRecord,
}

/// Derive the layout of `page` and extract every section from it
pub fn extract_record(page: &PageIndex) -> Result<Extraction, PaychequeError> {
    let ctx = PageContext::new(page)?;
    let layout = build_layout(&ctx)?;
    let record = extract_layout(page, &layout)?;
    Ok(Extraction { layout, record })
}

/// Read every field of a computed layout
pub fn extract_layout(
    page: &PageIndex,
    layout: &PageLayout,
) -> Result<PaychequeRecord, PaychequeError> {
    info!("Extracting data from PDF");

    let mut sections = BTreeMap::new();
    for (section, section_layout) in layout.iter() {
        info!("  Extracting {}", section);
        let data = match section_layout {
            SectionLayout::Fields(descriptors) => {
                let mut row = extract_all(page, descriptors)?;
                if *section == Section::Message {
                    row.iter_mut().for_each(strip_message_label);
                }
                SectionData {
                    rows: vec![row],
                    ..SectionData::default()
                }
            }
            SectionLayout::Rows(group) => {
                let mut rows = Vec::with_capacity(group.rows.len());
                for (index, descriptors) in group.rows.iter().enumerate() {
                    debug!("    Extracting from row {}", index);
                    rows.push(extract_all(page, descriptors)?);
                }

                let totals = group
                    .totals
                    .iter()
                    .map(|total| total.as_ref().map(|d| fields::extract(page, d)).transpose())
                    .collect::<Result<Vec<_>, _>>()?;

                info!("    Validating {} data", section);
                let checks = validate_all(&rows, &totals);

                SectionData {
                    rows,
                    totals,
                    checks,
                }
            }
        };
        sections.insert(*section, data);
    }

    Ok(PaychequeRecord { sections })
}

fn extract_all(
    page: &PageIndex,
    descriptors: &[FieldDescriptor],
) -> Result<Vec<ExtractedValue>, PaychequeError> {
    descriptors
        .iter()
        .map(|d| fields::extract(page, d))
        .collect()
}

fn strip_message_label(value: &mut ExtractedValue) {
    if let Value::Text(text) = &mut value.value {
        *text = text.replace(MESSAGE_LABEL, "").trim().to_string();
        debug!("    Extracted value after second formatting: {}", text);
    }
}
