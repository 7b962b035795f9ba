//! Cross-checks between summed row values and printed totals

use crate::fields::{ExtractedValue, Field};
use log::{debug, warn};
use rust_decimal::Decimal;

/// Outcome of comparing one column's row sum against its printed total
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalCheck {
    pub field: Field,
    pub column: usize,
    pub computed: Decimal,
    pub printed: Decimal,
    pub matches: bool,
}

/// Sum the decimal values at `column_index` over `rows` and compare with the
/// printed total in the same column.
///
/// Returns `None` when the totals row carries nothing for that column.
/// Non-decimal cells count as zero.
pub fn validate(
    rows: &[Vec<ExtractedValue>],
    total: &[Option<ExtractedValue>],
    column_index: usize,
) -> Option<TotalCheck> {
    let printed = total.get(column_index)?.as_ref()?;
    let printed_value = printed.value.as_decimal()?;

    let computed: Decimal = rows
        .iter()
        .filter_map(|row| row.get(column_index))
        .filter_map(|cell| cell.value.as_decimal())
        .sum();

    let matches = computed == printed_value;
    if matches {
        debug!(
            "    {}: Calculated and extracted totals match ({})",
            printed.field, printed_value
        );
    } else {
        warn!(
            "    {}: Calculated total ({}) not equal to extracted total {}",
            printed.field, computed, printed_value
        );
    }

    Some(TotalCheck {
        field: printed.field,
        column: column_index,
        computed,
        printed: printed_value,
        matches,
    })
}

/// Validate every column that has a printed total
pub fn validate_all(
    rows: &[Vec<ExtractedValue>],
    total: &[Option<ExtractedValue>],
) -> Vec<TotalCheck> {
    (0..total.len())
        .filter_map(|column| validate(rows, total, column))
        .collect()
}
