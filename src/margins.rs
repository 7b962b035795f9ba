//! Page content margins from vector drawings

use crate::extractor::PathItem;
use crate::PaychequeError;
use log::info;

/// Left and right extent of the page's ruled content
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f32,
    pub right: f32,
}

impl Margins {
    pub fn span(&self) -> f32 {
        self.right - self.left
    }
}

/// Compute the minimum and maximum x over every line endpoint and rectangle
/// edge on the page.
pub fn detect_margins(drawings: &[PathItem]) -> Result<Margins, PaychequeError> {
    info!("Identify page margins");

    let xs = drawings.iter().flat_map(|item| match item {
        PathItem::Line { x0, x1, .. } => [*x0, *x1],
        PathItem::Rect(r) => [r.left, r.right],
    });

    let (left, right) = xs.fold(None, |acc: Option<(f32, f32)>, x| match acc {
        None => Some((x, x)),
        Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
    })
    .ok_or(PaychequeError::NoDrawingsFound)?;

    Ok(Margins { left, right })
}
