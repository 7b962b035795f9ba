//! Positioned glyph and vector path extraction using lopdf
//!
//! This module interprets a page content stream and records every shown glyph
//! with its bounding box, plus every painted line and rectangle. Boxes are
//! converted to a top-left page origin so they can be compared directly with
//! the layout rectangles derived from them.

use crate::geometry::Rect;
use crate::PaychequeError;
use lopdf::{Dictionary, Document, Encoding, Object, ObjectId};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Fallback glyph width in thousandths of an em, used when a font carries no
/// width table (the standard 14 fonts usually don't).
const DEFAULT_GLYPH_WIDTH: f32 = 500.0;
const DEFAULT_ASCENT: f32 = 0.8;
const DEFAULT_DESCENT: f32 = -0.2;

/// A single shown glyph with position information
#[derive(Debug, Clone)]
pub struct Glyph {
    /// Decoded text of the glyph (usually one char, more for ligatures)
    pub text: String,
    /// Bounding box in page coordinates (top-left origin)
    pub bbox: Rect,
    /// Baseline y in page coordinates
    pub baseline: f32,
    /// Rendered font size
    pub font_size: f32,
}

impl Glyph {
    /// Build a glyph whose baseline sits at `bbox.bottom - 0.2 * font_size`
    pub fn new(text: impl Into<String>, bbox: Rect) -> Self {
        let font_size = bbox.height();
        Self {
            text: text.into(),
            bbox,
            baseline: bbox.bottom + DEFAULT_DESCENT * font_size,
            font_size,
        }
    }
}

/// A painted vector drawing primitive
#[derive(Debug, Clone, PartialEq)]
pub enum PathItem {
    /// Straight segment between two points
    Line { x0: f32, y0: f32, x1: f32, y1: f32 },
    /// Rectangle from an `re` operator
    Rect(Rect),
}

/// Everything the layout stage needs from one page
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Page bounds, always anchored at (0, 0)
    pub page_rect: Rect,
    pub glyphs: Vec<Glyph>,
    pub drawings: Vec<PathItem>,
}

/// Load a document and return it with the object id of its first page
pub fn load_first_page<P: AsRef<Path>>(path: P) -> Result<(Document, ObjectId), PaychequeError> {
    let doc = Document::load(path)?;
    let page_id = first_page_id(&doc)?;
    Ok((doc, page_id))
}

/// Load a document from memory and return it with its first page id
pub fn load_first_page_mem(buffer: &[u8]) -> Result<(Document, ObjectId), PaychequeError> {
    let doc = Document::load_mem(buffer)?;
    let page_id = first_page_id(&doc)?;
    Ok((doc, page_id))
}

fn first_page_id(doc: &Document) -> Result<ObjectId, PaychequeError> {
    doc.get_pages()
        .values()
        .next()
        .copied()
        .ok_or(PaychequeError::NoPages)
}

/// Extract glyphs and drawings from the first page of a PDF file
pub fn extract_first_page<P: AsRef<Path>>(path: P) -> Result<PageContent, PaychequeError> {
    let (doc, page_id) = load_first_page(path)?;
    extract_page(&doc, page_id)
}

/// Extract glyphs and drawings from the first page of a PDF buffer
pub fn extract_first_page_mem(buffer: &[u8]) -> Result<PageContent, PaychequeError> {
    let (doc, page_id) = load_first_page_mem(buffer)?;
    extract_page(&doc, page_id)
}

/// Multiply two 2D transformation matrices
/// Matrix format: [a, b, c, d, e, f] representing:
/// | a  b  0 |
/// | c  d  0 |
/// | e  f  1 |
fn multiply_matrices(m1: &[f32; 6], m2: &[f32; 6]) -> [f32; 6] {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn apply(m: &[f32; 6], x: f32, y: f32) -> (f32, f32) {
    (x * m[0] + y * m[2] + m[4], x * m[1] + y * m[3] + m[5])
}

/// Maps PDF user space (bottom-left origin) onto the top-left page frame
#[derive(Debug, Clone, Copy)]
struct PageFrame {
    x0: f32,
    y1: f32,
}

impl PageFrame {
    fn point(&self, x: f32, y: f32) -> (f32, f32) {
        (x - self.x0, self.y1 - y)
    }

    fn rect(&self, xa: f32, ya: f32, xb: f32, yb: f32) -> Rect {
        let (l, t) = self.point(xa.min(xb), ya.max(yb));
        let (r, b) = self.point(xa.max(xb), ya.min(yb));
        Rect::new(l, t, r, b)
    }
}

/// Text state parameters saved and restored with `q`/`Q`
#[derive(Debug, Clone)]
struct TextState {
    font: String,
    size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: String::new(),
            size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

/// Widths, code size and vertical metrics of one page font
struct FontMetrics<'a> {
    encoding: Option<Encoding<'a>>,
    two_byte: bool,
    first_char: u32,
    widths: Vec<f32>,
    cid_widths: HashMap<u32, f32>,
    default_width: f32,
    ascent: f32,
    descent: f32,
}

impl<'a> FontMetrics<'a> {
    fn fallback() -> Self {
        Self {
            encoding: None,
            two_byte: false,
            first_char: 0,
            widths: Vec::new(),
            cid_widths: HashMap::new(),
            default_width: DEFAULT_GLYPH_WIDTH,
            ascent: DEFAULT_ASCENT,
            descent: DEFAULT_DESCENT,
        }
    }

    fn load(doc: &'a Document, font: &'a Dictionary) -> Self {
        let mut metrics = Self::fallback();
        metrics.encoding = font.get_font_encoding(doc).ok();

        let is_type0 = font
            .get(b"Subtype")
            .and_then(|s| s.as_name())
            .map(|n| n == b"Type0")
            .unwrap_or(false);

        let descriptor_owner = if is_type0 {
            metrics.two_byte = true;
            let descendant = font
                .get(b"DescendantFonts")
                .ok()
                .map(|o| resolve(doc, o))
                .and_then(|o| o.as_array().ok())
                .and_then(|a| a.first())
                .map(|o| resolve(doc, o))
                .and_then(|o| o.as_dict().ok());

            if let Some(cid_font) = descendant {
                metrics.default_width = cid_font
                    .get(b"DW")
                    .ok()
                    .and_then(|o| get_number(resolve(doc, o)))
                    .unwrap_or(1000.0);
                if let Some(w) = cid_font
                    .get(b"W")
                    .ok()
                    .map(|o| resolve(doc, o))
                    .and_then(|o| o.as_array().ok())
                {
                    metrics.cid_widths = parse_cid_widths(doc, w);
                }
            }
            descendant
        } else {
            metrics.first_char = font
                .get(b"FirstChar")
                .ok()
                .and_then(|o| get_number(resolve(doc, o)))
                .map(|n| n as u32)
                .unwrap_or(0);
            if let Some(w) = font
                .get(b"Widths")
                .ok()
                .map(|o| resolve(doc, o))
                .and_then(|o| o.as_array().ok())
            {
                metrics.widths = w
                    .iter()
                    .map(|o| get_number(resolve(doc, o)).unwrap_or(0.0))
                    .collect();
            }
            Some(font)
        };

        let descriptor = descriptor_owner
            .and_then(|f| f.get(b"FontDescriptor").ok())
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok());
        if let Some(descriptor) = descriptor {
            let ascent = descriptor
                .get(b"Ascent")
                .ok()
                .and_then(|o| get_number(resolve(doc, o)));
            let descent = descriptor
                .get(b"Descent")
                .ok()
                .and_then(|o| get_number(resolve(doc, o)));
            if let (Some(a), Some(d)) = (ascent, descent) {
                if a > 0.0 && a > d {
                    metrics.ascent = a / 1000.0;
                    metrics.descent = d.min(0.0) / 1000.0;
                }
            }
        }

        metrics
    }

    /// Width of a character code in thousandths of an em
    fn width(&self, code: u32) -> f32 {
        if self.two_byte {
            return self
                .cid_widths
                .get(&code)
                .copied()
                .unwrap_or(self.default_width);
        }
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(self.default_width)
    }

    fn decode(&self, bytes: &[u8]) -> String {
        if let Some(encoding) = &self.encoding {
            if let Ok(text) = Document::decode_text(encoding, bytes) {
                return text;
            }
        }
        if self.two_byte && bytes.len() == 2 {
            let unit = u16::from_be_bytes([bytes[0], bytes[1]]);
            return String::from_utf16_lossy(&[unit]);
        }
        // Latin-1 fallback
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Parse a CID font `/W` array: `c [w1 w2 ...]` and `c_first c_last w` forms
fn parse_cid_widths(doc: &Document, w: &[Object]) -> HashMap<u32, f32> {
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < w.len() {
        let Some(start) = get_number(resolve(doc, &w[i])) else {
            break;
        };
        let start = start as u32;
        match w.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, value) in list.iter().enumerate() {
                    if let Some(width) = get_number(resolve(doc, value)) {
                        widths.insert(start + offset as u32, width);
                    }
                }
                i += 2;
            }
            Some(end) => {
                let end = get_number(end).map(|e| e as u32).unwrap_or(start);
                let width = w
                    .get(i + 2)
                    .and_then(|o| get_number(resolve(doc, o)))
                    .unwrap_or(DEFAULT_GLYPH_WIDTH);
                for code in start..=end {
                    widths.insert(code, width);
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

/// Follow a reference to its target, or return the object itself
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Read the page MediaBox, walking up `/Parent` for inherited values
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let mut current = doc.get_dictionary(page_id).ok();
    while let Some(dict) = current {
        if let Some(values) = dict
            .get(b"MediaBox")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_array().ok())
        {
            let nums: Vec<f32> = values
                .iter()
                .filter_map(|o| get_number(resolve(doc, o)))
                .collect();
            if nums.len() == 4 {
                return [
                    nums[0].min(nums[2]),
                    nums[1].min(nums[3]),
                    nums[0].max(nums[2]),
                    nums[1].max(nums[3]),
                ];
            }
        }
        current = dict
            .get(b"Parent")
            .ok()
            .and_then(|p| p.as_reference().ok())
            .and_then(|id| doc.get_dictionary(id).ok());
    }
    // US Letter
    [0.0, 0.0, 612.0, 792.0]
}

/// Interpret one page's content stream
pub fn extract_page(doc: &Document, page_id: ObjectId) -> Result<PageContent, PaychequeError> {
    use lopdf::content::Content;

    let [mx0, my0, mx1, my1] = media_box(doc, page_id);
    let frame = PageFrame { x0: mx0, y1: my1 };
    let page_rect = Rect::new(0.0, 0.0, mx1 - mx0, my1 - my0);

    let fonts: BTreeMap<Vec<u8>, &Dictionary> = doc.get_page_fonts(page_id).unwrap_or_default();
    let metrics: HashMap<Vec<u8>, FontMetrics> = fonts
        .iter()
        .map(|(name, dict)| (name.clone(), FontMetrics::load(doc, dict)))
        .collect();
    let fallback = FontMetrics::fallback();

    let content_data = doc
        .get_page_content(page_id)
        .map_err(|e| PaychequeError::Parse(e.to_string()))?;
    let content =
        Content::decode(&content_data).map_err(|e| PaychequeError::Parse(e.to_string()))?;

    let mut glyphs = Vec::new();
    let mut drawings = Vec::new();

    // Graphics state tracking
    let mut ctm = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut text_state = TextState::default();
    let mut state_stack: Vec<([f32; 6], TextState)> = Vec::new();

    // Text object state
    let mut text_matrix = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut line_matrix = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut in_text_block = false;

    // Path construction state
    let mut pending_path: Vec<PathItem> = Vec::new();
    let mut current_point = (0.0f32, 0.0f32);
    let mut subpath_start = (0.0f32, 0.0f32);

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => state_stack.push((ctm, text_state.clone())),
            "Q" => {
                if let Some((saved_ctm, saved_text)) = state_stack.pop() {
                    ctm = saved_ctm;
                    text_state = saved_text;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operand(operands) {
                    ctm = multiply_matrices(&m, &ctm);
                }
            }
            "BT" => {
                in_text_block = true;
                text_matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
                line_matrix = text_matrix;
            }
            "ET" => in_text_block = false,
            "Tf" => {
                if operands.len() >= 2 {
                    if let Ok(name) = operands[0].as_name() {
                        text_state.font = String::from_utf8_lossy(name).to_string();
                    }
                    if let Some(size) = get_number(&operands[1]) {
                        text_state.size = size;
                    }
                }
            }
            "Tc" => set_number(operands, &mut text_state.char_spacing),
            "Tw" => set_number(operands, &mut text_state.word_spacing),
            "TL" => set_number(operands, &mut text_state.leading),
            "Ts" => set_number(operands, &mut text_state.rise),
            "Tz" => {
                if let Some(scale) = operands.first().and_then(get_number) {
                    text_state.horizontal_scale = scale / 100.0;
                }
            }
            "Td" | "TD" => {
                if operands.len() >= 2 {
                    let tx = get_number(&operands[0]).unwrap_or(0.0);
                    let ty = get_number(&operands[1]).unwrap_or(0.0);
                    if op.operator == "TD" {
                        text_state.leading = -ty;
                    }
                    line_matrix = multiply_matrices(&[1.0, 0.0, 0.0, 1.0, tx, ty], &line_matrix);
                    text_matrix = line_matrix;
                }
            }
            "Tm" => {
                if let Some(m) = matrix_operand(operands) {
                    text_matrix = m;
                    line_matrix = m;
                }
            }
            "T*" => {
                next_line(&mut line_matrix, &text_state);
                text_matrix = line_matrix;
            }
            "Tj" | "'" | "\"" | "TJ" => {
                if op.operator == "'" || op.operator == "\"" {
                    if op.operator == "\"" && operands.len() >= 3 {
                        set_number(&operands[0..1], &mut text_state.word_spacing);
                        set_number(&operands[1..2], &mut text_state.char_spacing);
                    }
                    next_line(&mut line_matrix, &text_state);
                    text_matrix = line_matrix;
                }
                if !in_text_block {
                    continue;
                }
                let font = metrics
                    .get(text_state.font.as_bytes())
                    .unwrap_or(&fallback);
                let mut shower = GlyphShower {
                    font,
                    state: &text_state,
                    ctm: &ctm,
                    frame,
                    text_matrix: &mut text_matrix,
                    out: &mut glyphs,
                };
                match op.operator.as_str() {
                    "TJ" => {
                        if let Some(Ok(array)) = operands.first().map(|o| o.as_array()) {
                            for element in array {
                                match element {
                                    Object::String(bytes, _) => shower.show(bytes),
                                    other => {
                                        if let Some(adjust) = get_number(other) {
                                            shower.kern(adjust);
                                        }
                                    }
                                }
                            }
                        }
                    }
                    _ => {
                        if let Some(Object::String(bytes, _)) = operands.last() {
                            shower.show(bytes);
                        }
                    }
                }
            }
            "m" => {
                if let Some((x, y)) = point_operand(operands) {
                    current_point = apply(&ctm, x, y);
                    subpath_start = current_point;
                }
            }
            "l" => {
                if let Some((x, y)) = point_operand(operands) {
                    let end = apply(&ctm, x, y);
                    pending_path.push(line_item(frame, current_point, end));
                    current_point = end;
                }
            }
            "c" | "v" | "y" => {
                // Curves are not margin candidates; only track the end point
                if operands.len() >= 2 {
                    let n = operands.len();
                    if let (Some(x), Some(y)) =
                        (get_number(&operands[n - 2]), get_number(&operands[n - 1]))
                    {
                        current_point = apply(&ctm, x, y);
                    }
                }
            }
            "h" => current_point = subpath_start,
            "re" => {
                if operands.len() >= 4 {
                    let vals: Vec<f32> = operands.iter().take(4).filter_map(get_number).collect();
                    if vals.len() == 4 {
                        let (x, y, w, h) = (vals[0], vals[1], vals[2], vals[3]);
                        let corners = [
                            apply(&ctm, x, y),
                            apply(&ctm, x + w, y),
                            apply(&ctm, x, y + h),
                            apply(&ctm, x + w, y + h),
                        ];
                        let xs = corners.iter().map(|c| c.0);
                        let ys = corners.iter().map(|c| c.1);
                        let (xmin, xmax) = min_max(xs);
                        let (ymin, ymax) = min_max(ys);
                        pending_path.push(PathItem::Rect(frame.rect(xmin, ymin, xmax, ymax)));
                        current_point = apply(&ctm, x, y);
                        subpath_start = current_point;
                    }
                }
            }
            "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => {
                drawings.append(&mut pending_path);
            }
            "n" => pending_path.clear(),
            _ => {}
        }
    }

    Ok(PageContent {
        page_rect,
        glyphs,
        drawings,
    })
}

/// Emits glyph boxes for shown strings and advances the text matrix
struct GlyphShower<'s, 'a> {
    font: &'s FontMetrics<'a>,
    state: &'s TextState,
    ctm: &'s [f32; 6],
    frame: PageFrame,
    text_matrix: &'s mut [f32; 6],
    out: &'s mut Vec<Glyph>,
}

impl GlyphShower<'_, '_> {
    fn show(&mut self, bytes: &[u8]) {
        let code_len = if self.font.two_byte { 2 } else { 1 };
        for code_bytes in bytes.chunks(code_len) {
            let code = code_bytes
                .iter()
                .fold(0u32, |acc, &b| (acc << 8) | b as u32);
            let glyph_width = self.font.width(code) / 1000.0;
            let mut advance = glyph_width * self.state.size + self.state.char_spacing;
            if code_len == 1 && code == 32 {
                advance += self.state.word_spacing;
            }
            advance *= self.state.horizontal_scale;

            let text = self.font.decode(code_bytes);
            if !text.is_empty() {
                self.push_glyph(text, advance);
            }
            self.translate(advance);
        }
    }

    fn kern(&mut self, adjust: f32) {
        let tx = -adjust / 1000.0 * self.state.size * self.state.horizontal_scale;
        self.translate(tx);
    }

    fn translate(&mut self, tx: f32) {
        *self.text_matrix = multiply_matrices(&[1.0, 0.0, 0.0, 1.0, tx, 0.0], self.text_matrix);
    }

    fn push_glyph(&mut self, text: String, advance: f32) {
        let combined = multiply_matrices(self.text_matrix, self.ctm);
        let rise = self.state.rise;
        let (sx, sy) = apply(&combined, 0.0, rise);
        let (ex, _) = apply(&combined, advance, rise);
        let scale_y = (combined[2].powi(2) + combined[3].powi(2)).sqrt();
        let rendered_size = self.state.size * scale_y;

        let top = sy + self.font.ascent * rendered_size;
        let bottom = sy + self.font.descent * rendered_size;
        let bbox = self.frame.rect(sx, bottom, ex, top);
        let (_, baseline) = self.frame.point(sx, sy);

        self.out.push(Glyph {
            text,
            bbox,
            baseline,
            font_size: rendered_size,
        });
    }
}

fn line_item(frame: PageFrame, from: (f32, f32), to: (f32, f32)) -> PathItem {
    let (x0, y0) = frame.point(from.0, from.1);
    let (x1, y1) = frame.point(to.0, to.1);
    PathItem::Line { x0, y0, x1, y1 }
}

fn next_line(line_matrix: &mut [f32; 6], state: &TextState) {
    *line_matrix = multiply_matrices(&[1.0, 0.0, 0.0, 1.0, 0.0, -state.leading], line_matrix);
}

fn min_max(values: impl Iterator<Item = f32>) -> (f32, f32) {
    values.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn matrix_operand(operands: &[Object]) -> Option<[f32; 6]> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = [0.0f32; 6];
    for (i, operand) in operands.iter().take(6).enumerate() {
        m[i] = get_number(operand)?;
    }
    Some(m)
}

fn point_operand(operands: &[Object]) -> Option<(f32, f32)> {
    if operands.len() < 2 {
        return None;
    }
    Some((get_number(&operands[0])?, get_number(&operands[1])?))
}

fn set_number(operands: &[Object], target: &mut f32) {
    if let Some(value) = operands.first().and_then(get_number) {
        *target = value;
    }
}

/// Helper to get f32 from Object
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}
