use paycheque_extract::layout::{build_layout, PageContext};
use paycheque_extract::PageIndex;
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: debug_anchors <pdf_path> [label | --layout]");
        std::process::exit(1);
    }

    let page = PageIndex::open(&args[1]).expect("Failed to extract");
    let rect = page.page_rect();
    println!(
        "=== PAGE {:.1} x {:.1} ({} glyphs, {} drawings) ===",
        rect.width(),
        rect.height(),
        page.glyphs().len(),
        page.drawings().len()
    );

    match args.get(2).map(|s| s.as_str()) {
        None => {
            for run in page.runs(None) {
                if let Some(b) = run.bbox() {
                    println!(
                        "  x={:7.1} y={:7.1} r={:7.1} b={:7.1} fs={:5.1} text={:?}",
                        b.left,
                        b.top,
                        b.right,
                        b.bottom,
                        run.font_size,
                        run.text()
                    );
                }
            }
        }
        Some("--layout") => {
            let ctx = PageContext::new(&page).expect("Failed to detect margins");
            let m = ctx.margins();
            println!("margins: left={:.1} right={:.1}", m.left, m.right);
            let layout = build_layout(&ctx).expect("Failed to build layout");
            for (section, section_layout) in layout.iter() {
                println!("--- {} ---", section);
                for d in section_layout.descriptors() {
                    match d.rect {
                        Some(r) => println!("  {:<32} {}  {:?}", d.field.header(), r, page.textbox(&r)),
                        None => println!("  {:<32} (absent)", d.field.header()),
                    }
                }
            }
        }
        Some(label) => {
            let hits = page.search_for(label, None);
            println!("{:?}: {} matches", label, hits.len());
            for r in hits {
                println!("  {}", r);
            }
        }
    }
}
