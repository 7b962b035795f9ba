//! Text search and rectangle reads over one extracted page
//!
//! The index answers the two questions the layout stage asks of a page:
//! where does a literal label appear, and what text lies inside a box.

use crate::extractor::{self, Glyph, PageContent, PathItem};
use crate::geometry::Rect;
use crate::PaychequeError;
use std::path::Path;

/// Gap (in font-size units) above which two glyphs are read as separate words
const WORD_GAP: f32 = 0.25;
/// Gap (in font-size units) above which two glyphs belong to different runs
const RUN_GAP: f32 = 3.0;
/// Baseline drift (in font-size units) tolerated within one line
const BASELINE_TOLERANCE: f32 = 0.5;

/// A searchable run of glyphs sharing a baseline
#[derive(Debug, Clone)]
pub struct TextRun {
    /// Characters with their boxes; synthesized word gaps carry no box
    pub chars: Vec<(char, Option<Rect>)>,
    pub baseline: f32,
    pub font_size: f32,
    right: f32,
}

impl TextRun {
    fn start(glyph: &Glyph) -> Self {
        let mut run = Self {
            chars: Vec::new(),
            baseline: glyph.baseline,
            font_size: glyph.font_size,
            right: glyph.bbox.left,
        };
        run.push(glyph);
        run
    }

    fn accepts(&self, glyph: &Glyph) -> bool {
        let size = self.font_size.max(glyph.font_size).max(1.0);
        let gap = glyph.bbox.left - self.right;
        (self.baseline - glyph.baseline).abs() < size * BASELINE_TOLERANCE
            && gap > -size
            && gap <= size * RUN_GAP
    }

    fn push(&mut self, glyph: &Glyph) {
        let size = self.font_size.max(glyph.font_size).max(1.0);
        let gap = glyph.bbox.left - self.right;
        let ends_with_space = self.chars.last().map_or(true, |(c, _)| c.is_whitespace());
        let starts_with_space = glyph.text.starts_with(char::is_whitespace);
        if gap > size * WORD_GAP && !ends_with_space && !starts_with_space {
            self.chars.push((' ', None));
        }
        for c in glyph.text.chars() {
            self.chars.push((c, Some(glyph.bbox)));
        }
        self.right = self.right.max(glyph.bbox.right);
    }

    pub fn text(&self) -> String {
        self.chars.iter().map(|(c, _)| *c).collect()
    }

    pub fn bbox(&self) -> Option<Rect> {
        self.chars
            .iter()
            .filter_map(|(_, r)| *r)
            .reduce(|a, b| a.union(&b))
    }

    /// Boxes of every non-overlapping, ASCII case-insensitive match of `needle`
    fn find(&self, needle: &[char]) -> Vec<Rect> {
        let mut found = Vec::new();
        if needle.is_empty() || needle.len() > self.chars.len() {
            return found;
        }
        let mut i = 0;
        while i + needle.len() <= self.chars.len() {
            let window = &self.chars[i..i + needle.len()];
            let matched = window
                .iter()
                .zip(needle)
                .all(|((c, _), n)| c.to_ascii_lowercase() == *n);
            if matched {
                if let Some(bbox) = window.iter().filter_map(|(_, r)| *r).reduce(|a, b| a.union(&b)) {
                    found.push(bbox);
                }
                i += needle.len();
            } else {
                i += 1;
            }
        }
        found
    }
}

/// A line of glyphs read back from a rectangle
#[derive(Debug, Clone)]
pub struct TextLine {
    pub glyphs: Vec<Glyph>,
    pub baseline: f32,
}

impl TextLine {
    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut prev_right: Option<f32> = None;
        for glyph in &self.glyphs {
            if let Some(right) = prev_right {
                let gap = glyph.bbox.left - right;
                if gap > glyph.font_size.max(1.0) * WORD_GAP
                    && !out.ends_with(char::is_whitespace)
                    && !glyph.text.starts_with(char::is_whitespace)
                {
                    out.push(' ');
                }
            }
            out.push_str(&glyph.text);
            prev_right = Some(glyph.bbox.right);
        }
        out
    }
}

/// Searchable index over one page's glyphs and drawings
#[derive(Debug, Clone)]
pub struct PageIndex {
    page_rect: Rect,
    glyphs: Vec<Glyph>,
    drawings: Vec<PathItem>,
}

impl PageIndex {
    /// Build an index from already positioned glyphs and drawings
    pub fn from_parts(page_rect: Rect, glyphs: Vec<Glyph>, drawings: Vec<PathItem>) -> Self {
        Self {
            page_rect,
            glyphs,
            drawings,
        }
    }

    pub fn from_content(content: PageContent) -> Self {
        Self::from_parts(content.page_rect, content.glyphs, content.drawings)
    }

    /// Index the first page of a PDF file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PaychequeError> {
        Ok(Self::from_content(extractor::extract_first_page(path)?))
    }

    /// Index the first page of a PDF held in memory
    pub fn open_mem(buffer: &[u8]) -> Result<Self, PaychequeError> {
        Ok(Self::from_content(extractor::extract_first_page_mem(buffer)?))
    }

    pub fn page_rect(&self) -> Rect {
        self.page_rect
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    pub fn drawings(&self) -> &[PathItem] {
        &self.drawings
    }

    /// Group glyphs (optionally only those inside `clip`) into searchable runs
    pub fn runs(&self, clip: Option<&Rect>) -> Vec<TextRun> {
        let mut runs: Vec<TextRun> = Vec::new();
        for glyph in self
            .glyphs
            .iter()
            .filter(|g| clip.map_or(true, |c| c.contains_center_of(&g.bbox)))
        {
            match runs.last_mut() {
                Some(run) if run.accepts(glyph) => run.push(glyph),
                _ => runs.push(TextRun::start(glyph)),
            }
        }
        runs
    }

    /// Bounding boxes of every occurrence of `needle`, top-to-bottom then
    /// left-to-right. Matching ignores ASCII case.
    pub fn search_for(&self, needle: &str, clip: Option<&Rect>) -> Vec<Rect> {
        let needle: Vec<char> = needle.chars().map(|c| c.to_ascii_lowercase()).collect();
        let mut hits: Vec<Rect> = self
            .runs(clip)
            .iter()
            .flat_map(|run| run.find(&needle))
            .collect();
        hits.sort_by(|a, b| {
            a.top
                .partial_cmp(&b.top)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.left.partial_cmp(&b.left).unwrap_or(std::cmp::Ordering::Equal))
        });
        hits
    }

    /// Text whose glyph centres fall inside `rect`, one line per baseline
    pub fn textbox(&self, rect: &Rect) -> String {
        let inside: Vec<Glyph> = self
            .glyphs
            .iter()
            .filter(|g| rect.contains_center_of(&g.bbox))
            .cloned()
            .collect();

        group_into_lines(inside)
            .iter()
            .map(TextLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Bottom edge of the lowest glyph on the page
    pub fn lowest_text_bottom(&self) -> Option<f32> {
        self.glyphs
            .iter()
            .map(|g| g.bbox.bottom)
            .reduce(f32::max)
    }
}

/// Group glyphs into lines.
///
/// Consecutive glyphs sharing a baseline merge into the most recent line, so
/// stream order is kept within a line; lines are then ordered top-to-bottom
/// and their glyphs left-to-right.
pub fn group_into_lines(glyphs: Vec<Glyph>) -> Vec<TextLine> {
    let mut lines: Vec<TextLine> = Vec::new();

    for glyph in glyphs {
        let tolerance = glyph.font_size.max(1.0) * BASELINE_TOLERANCE;
        match lines
            .iter_mut()
            .rev()
            .find(|line| (line.baseline - glyph.baseline).abs() < tolerance)
        {
            Some(line) => line.glyphs.push(glyph),
            None => {
                let baseline = glyph.baseline;
                lines.push(TextLine {
                    glyphs: vec![glyph],
                    baseline,
                });
            }
        }
    }

    for line in &mut lines {
        line.glyphs.sort_by(|a, b| {
            a.bbox
                .left
                .partial_cmp(&b.bbox.left)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
    lines.sort_by(|a, b| {
        a.baseline
            .partial_cmp(&b.baseline)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lay out `text` with a fixed 4-unit advance at font size 8
    fn word(text: &str, x: f32, baseline: f32) -> Vec<Glyph> {
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

    fn page(words: &[(&str, f32, f32)]) -> PageIndex {
        let glyphs = words
            .iter()
            .flat_map(|(t, x, y)| word(t, *x, *y))
            .collect();
        PageIndex::from_parts(Rect::new(0.0, 0.0, 612.0, 792.0), glyphs, vec![])
    }

    #[test]
    fn test_search_finds_label_box() {
        let idx = page(&[("Pay Begin Date:", 20.0, 40.0), ("01/01/2024", 90.0, 40.0)]);
        let hits = idx.search_for("Pay Begin Date:", None);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].left - 20.0).abs() < 1e-4);
        assert!((hits[0].right - 80.0).abs() < 1e-4);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let idx = page(&[("Supplemental:", 20.0, 40.0)]);
        assert_eq!(idx.search_for("supplemental", None).len(), 1);
    }

    #[test]
    fn test_search_respects_clip() {
        let idx = page(&[("Hours", 20.0, 40.0), ("Hours", 200.0, 40.0)]);
        let clip = Rect::new(100.0, 0.0, 300.0, 100.0);
        let hits = idx.search_for("Hours", Some(&clip));
        assert_eq!(hits.len(), 1);
        assert!((hits[0].left - 200.0).abs() < 1e-4);
    }

    #[test]
    fn test_search_orders_top_to_bottom() {
        let idx = page(&[("1.00", 20.0, 80.0), ("2.00", 20.0, 40.0)]);
        let hits = idx.search_for(".", None);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].top < hits[1].top);
    }

    #[test]
    fn test_words_separated_by_gap_get_space() {
        let idx = page(&[("TOTAL", 20.0, 40.0), ("GROSS", 44.0, 40.0)]);
        let runs = idx.runs(None);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text(), "TOTAL GROSS");
        assert_eq!(idx.search_for("TOTAL GROSS", None).len(), 1);
    }

    #[test]
    fn test_textbox_reads_lines() {
        let idx = page(&[
            ("Happy", 20.0, 40.0),
            ("holidays", 48.0, 40.0),
            ("Second", 20.0, 52.0),
            ("Outside", 400.0, 40.0),
        ]);
        let text = idx.textbox(&Rect::new(10.0, 30.0, 200.0, 60.0));
        assert_eq!(text, "Happy holidays\nSecond");
    }

    #[test]
    fn test_lowest_text_bottom() {
        let idx = page(&[("a", 0.0, 40.0), ("b", 0.0, 100.0)]);
        let lowest = idx.lowest_text_bottom().unwrap();
        assert!((lowest - 101.6).abs() < 1e-3);
        let empty = PageIndex::from_parts(Rect::new(0.0, 0.0, 1.0, 1.0), vec![], vec![]);
        assert_eq!(empty.lowest_text_bottom(), None);
    }
}
