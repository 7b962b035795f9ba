//! Row segmentation by delimiter glyphs

use crate::geometry::Rect;
use crate::page::PageIndex;
use crate::PaychequeError;

/// Find every occurrence of `delimiter` inside `region`, top-to-bottom.
///
/// Each returned box marks the vertical extent of one printed row. Callers
/// whose region reaches the totals line drop the last entry with
/// [`split_totals_row`].
pub fn segment_rows(
    page: &PageIndex,
    region: &Rect,
    delimiter: &str,
) -> Result<Vec<Rect>, PaychequeError> {
    let rows = page.search_for(delimiter, Some(region));
    if rows.is_empty() {
        return Err(PaychequeError::NoRowsFound {
            delimiter: delimiter.to_string(),
        });
    }
    Ok(rows)
}

/// Separate the totals-row occurrence (always the last) from the data rows
pub fn split_totals_row(mut rows: Vec<Rect>) -> (Vec<Rect>, Option<Rect>) {
    let totals = rows.pop();
    (rows, totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Glyph;

    fn amount(text: &str, x: f32, baseline: f32) -> Vec<Glyph> {
        text.chars()
            .enumerate()
            .map(|(i, c)| {
                let left = x + i as f32 * 4.0;
                Glyph::new(
                    c.to_string(),
                    Rect::new(left, baseline - 6.4, left + 4.0, baseline + 1.6),
                )
            })
            .collect()
    }

    fn column(values: &[&str]) -> PageIndex {
        let glyphs = values
            .iter()
            .enumerate()
            .flat_map(|(i, v)| amount(v, 100.0, 100.0 + i as f32 * 12.0))
            .collect();
        PageIndex::from_parts(Rect::new(0.0, 0.0, 612.0, 792.0), glyphs, vec![])
    }

    #[test]
    fn test_three_delimiters_make_two_rows_and_a_total() {
        let page = column(&["20.00", "30.25", "50.25"]);
        let region = Rect::new(90.0, 80.0, 200.0, 200.0);
        let rows = segment_rows(&page, &region, ".").unwrap();
        assert_eq!(rows.len(), 3);

        let (data, totals) = split_totals_row(rows.clone());
        assert_eq!(data.len(), 2);
        assert_eq!(totals, Some(rows[2]));
        assert!(data[0].top < data[1].top);
    }

    #[test]
    fn test_segmentation_is_repeatable() {
        let page = column(&["1.00", "2.00", "3.00", "6.00"]);
        let region = Rect::new(90.0, 80.0, 200.0, 200.0);
        let first = split_totals_row(segment_rows(&page, &region, ".").unwrap()).0;
        let second = split_totals_row(segment_rows(&page, &region, ".").unwrap()).0;
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_empty_region_is_no_rows_found() {
        let page = column(&["20.00"]);
        let region = Rect::new(300.0, 80.0, 400.0, 200.0);
        let err = segment_rows(&page, &region, ".").unwrap_err();
        assert!(matches!(err, PaychequeError::NoRowsFound { delimiter } if delimiter == "."));
    }
}
