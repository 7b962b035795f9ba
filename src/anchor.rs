//! Anchor resolution: picking one box out of a label's search hits

use crate::geometry::Rect;
use crate::PaychequeError;
use log::warn;

/// Rule for choosing between several boxes found for the same label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    /// Take the first hit; warns when there is more than one
    None,
    /// Smallest left edge
    Left,
    /// Largest right edge
    Right,
    /// Top-most hit, as the payslip template tooling has always resolved it:
    /// the running comparison never moves off the first candidate
    Top,
    /// Bottom-most hit, as the payslip template tooling has always resolved
    /// it: candidates are compared on their right edge against the first one
    Bottom,
}

/// Where a label is searched for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The whole page
    Page,
    /// The current section's search region
    Section,
}

/// A text label used to anchor part of the layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    pub text: &'static str,
    pub tie_break: TieBreak,
    pub scope: Scope,
}

impl Label {
    /// A label expected once on the whole page
    pub const fn page(text: &'static str) -> Self {
        Self {
            text,
            tie_break: TieBreak::None,
            scope: Scope::Page,
        }
    }

    /// A label expected once inside the section's search region
    pub const fn section(text: &'static str) -> Self {
        Self {
            text,
            tie_break: TieBreak::None,
            scope: Scope::Section,
        }
    }

    pub const fn pick(self, tie_break: TieBreak) -> Self {
        Self { tie_break, ..self }
    }
}

/// Pick exactly one box from `candidates` using `tie_break`.
///
/// Fails with `AnchorNotFound` when there are no candidates. A single
/// candidate is returned whatever the rule.
pub fn resolve(
    label: &str,
    candidates: &[Rect],
    tie_break: TieBreak,
) -> Result<Rect, PaychequeError> {
    let first = match candidates {
        [] => {
            return Err(PaychequeError::AnchorNotFound {
                label: label.to_string(),
            })
        }
        [only] => return Ok(*only),
        [first, ..] => *first,
    };

    let chosen = match tie_break {
        TieBreak::None => {
            warn!(
                "Ambiguous anchor \"{}\": {} matches, using the first",
                label,
                candidates.len()
            );
            first
        }
        TieBreak::Left => extreme_by(candidates, |c, best| c.left < best.left),
        TieBreak::Right => extreme_by(candidates, |c, best| c.right > best.right),
        TieBreak::Top => {
            // The top-most check reads the right edge while the chosen index
            // is never updated, so the first hit always wins.
            first
        }
        TieBreak::Bottom => {
            // Compared against the first hit's right edge, not its bottom,
            // and the reference value is never advanced: the last candidate
            // reaching further right than the first one wins.
            candidates
                .iter()
                .rev()
                .find(|c| c.right > first.right)
                .copied()
                .unwrap_or(first)
        }
    };

    Ok(chosen)
}

/// Linear scan keeping the first-seen candidate on ties
fn extreme_by(candidates: &[Rect], better: impl Fn(&Rect, &Rect) -> bool) -> Rect {
    let mut best = candidates[0];
    for candidate in &candidates[1..] {
        if better(candidate, &best) {
            best = *candidate;
        }
    }
    best
}
