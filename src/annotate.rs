//! Debug overlay: stroke every computed field box onto the page

use crate::extractor::{self, media_box};
use crate::geometry::Rect;
use crate::layout::PageLayout;
use crate::PaychequeError;
use log::info;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// `debug_<unix-seconds>.pdf`
pub fn debug_file_name() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("debug_{}.pdf", secs)
}

/// Append a content stream to `page_id` that strokes `rects` in red
pub fn draw_rects(doc: &mut Document, page_id: ObjectId, rects: &[Rect]) -> Result<(), PaychequeError> {
    let [x0, _, _, y1] = media_box(doc, page_id);

    let mut operations = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "RG",
            vec![Object::Real(1.0), Object::Real(0.0), Object::Real(0.0)],
        ),
        Operation::new("w", vec![Object::Real(0.5)]),
    ];
    for rect in rects {
        // Back to PDF space: origin bottom-left, y up
        operations.push(Operation::new(
            "re",
            vec![
                Object::Real(x0 + rect.left),
                Object::Real(y1 - rect.bottom),
                Object::Real(rect.width()),
                Object::Real(rect.height()),
            ],
        ));
        operations.push(Operation::new("S", vec![]));
    }
    operations.push(Operation::new("Q", vec![]));

    let content = Content { operations };
    doc.add_page_contents(page_id, content.encode()?)?;
    Ok(())
}

/// Reload `source`, draw every rectangle of `layout` on its first page and
/// save the copy to `output`
pub fn save_annotated<P: AsRef<Path>>(
    source: P,
    layout: &PageLayout,
    output: &Path,
) -> Result<PathBuf, PaychequeError> {
    let (mut doc, page_id) = extractor::load_first_page(source)?;
    let rects = layout.rects();
    draw_rects(&mut doc, page_id, &rects)?;
    doc.save(output)?;
    info!("Saved {} field boxes to {}", rects.len(), output.display());
    Ok(output.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{extract_page, PathItem};
    use lopdf::{dictionary, Stream};

    fn blank_page() -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        (doc, page_id)
    }

    #[test]
    fn test_debug_file_name() {
        let name = debug_file_name();
        assert!(name.starts_with("debug_"));
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn test_drawn_boxes_read_back_in_page_space() {
        let (mut doc, page_id) = blank_page();
        let boxes = [Rect::new(82.0, 35.6, 295.0, 39.6), Rect::new(20.0, 100.0, 200.0, 150.0)];
        draw_rects(&mut doc, page_id, &boxes).unwrap();

        let content = extract_page(&doc, page_id).unwrap();
        let drawn: Vec<Rect> = content
            .drawings
            .iter()
            .filter_map(|d| match d {
                PathItem::Rect(r) => Some(*r),
                _ => None,
            })
            .collect();
        assert_eq!(drawn.len(), 2);
        for (got, want) in drawn.iter().zip(&boxes) {
            assert!((got.left - want.left).abs() < 1e-3);
            assert!((got.top - want.top).abs() < 1e-3);
            assert!((got.right - want.right).abs() < 1e-3);
            assert!((got.bottom - want.bottom).abs() < 1e-3);
        }
    }
}
