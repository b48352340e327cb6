//! End-to-end scenarios for the narrative pipeline.
//!
//! Each test builds synthetic decoded pages (600x800pt, PDF bottom-left
//! coordinates) and checks the pipeline's externally visible behavior:
//! exclusions, reading order, captions, references, and watermark
//! handling.

use pdf_narrative::decode::{DecodedPage, DefaultTokenizer, MemoryDecoder, RawTextItem};
use pdf_narrative::{BlockKind, ExcludeReason, NarrativeAnalyzer, NarrativeIndex};

const PAGE_W: f64 = 600.0;
const PAGE_H: f64 = 800.0;

/// Build an item from normalized top-left coordinates.
fn item_at(text: &str, x0n: f64, y0n: f64, size: f64, width_n: f64) -> RawTextItem {
    RawTextItem {
        str: text.to_string(),
        transform: [size, 0.0, 0.0, size, x0n * PAGE_W, PAGE_H - y0n * PAGE_H - size],
        width: width_n * PAGE_W,
        height: size,
    }
}

fn page(items: Vec<RawTextItem>) -> DecodedPage {
    DecodedPage {
        width: PAGE_W,
        height: PAGE_H,
        items,
    }
}

/// A paragraph of `n` lines starting at normalized `y0`.
fn paragraph(text: &str, x0: f64, y0: f64, n: usize, width: f64) -> Vec<RawTextItem> {
    (0..n)
        .map(|i| item_at(text, x0, y0 + i as f64 * 0.0175, 10.0, width))
        .collect()
}

fn analyze(pages: Vec<DecodedPage>) -> NarrativeIndex {
    let mut decoder = MemoryDecoder::new(pages);
    NarrativeAnalyzer::new().analyze(&mut decoder, &DefaultTokenizer)
}

// =============================================================================
// SCENARIO 1: repeated header across pages
// =============================================================================

#[test]
fn test_repeated_header_excluded() {
    let pages: Vec<DecodedPage> = (0..3)
        .map(|_| {
            let mut items = vec![item_at("Journal Name · 2024", 0.10, 0.04, 10.0, 0.30)];
            items.extend(paragraph("body narrative text flows here", 0.10, 0.20, 5, 0.75));
            items.extend(paragraph("another paragraph of body text", 0.10, 0.40, 5, 0.75));
            page(items)
        })
        .collect();
    let index = analyze(pages);

    assert!(!index.full_text.contains("Journal Name"));
    assert!(index.full_text.contains("body narrative text"));
    let header_exclusions = index
        .exclusions
        .iter()
        .filter(|e| e.reason == ExcludeReason::HeaderFooter)
        .count();
    assert_eq!(header_exclusions, 3);
}

// =============================================================================
// SCENARIO 2: two-column reading order
// =============================================================================

#[test]
fn test_two_column_reading_order() {
    let mut items = Vec::new();
    for i in 0..12 {
        let y = 0.15 + i as f64 * 0.05;
        items.push(item_at("left column narrative line", 0.08, y, 10.0, 0.35));
        items.push(item_at("right column narrative line", 0.52, y, 10.0, 0.35));
    }
    let index = analyze(vec![page(items)]);

    assert_eq!(index.pages[0].columns.len(), 2);
    let boundary = index.pages[0].columns[0].x_end;
    assert!(boundary > 0.25 && boundary < 0.55, "boundary = {}", boundary);

    // All left-column tokens come before all right-column tokens.
    let first_right = index
        .token_meta
        .iter()
        .position(|m| m.column_index == 1)
        .expect("right column produced tokens");
    assert!(index.token_meta[..first_right]
        .iter()
        .all(|m| m.column_index == 0));
    assert!(index.token_meta[first_right..]
        .iter()
        .all(|m| m.column_index == 1));
}

// =============================================================================
// SCENARIO 3: figure internals and caption
// =============================================================================

#[test]
fn test_figure_block_and_caption() {
    let mut items = Vec::new();
    // Ten short scattered labels at 0.7x body font, drifting across the
    // column in small steps.
    let label_x0 = [0.10, 0.15, 0.21, 0.26, 0.32, 0.37, 0.43, 0.48, 0.42, 0.36];
    for (i, &x0) in label_x0.iter().enumerate() {
        items.push(item_at("lbl", x0, 0.20 + i as f64 * 0.016, 7.0, 0.06));
    }
    // Two-line caption directly below the labels.
    items.push(item_at("Figure one shows the measured", 0.10, 0.375, 10.0, 0.50));
    items.push(item_at("distribution over all trials", 0.10, 0.391, 10.0, 0.50));
    // Body text establishing the page's body font.
    items.extend(paragraph("body paragraph provides context", 0.10, 0.43, 12, 0.75));
    let index = analyze(vec![page(items)]);

    let figure_blocks: Vec<_> = index.pages[0]
        .blocks
        .iter()
        .filter(|b| b.kind == BlockKind::FigureInternal)
        .collect();
    assert_eq!(figure_blocks.len(), 1);
    assert!(!figure_blocks[0].included);
    assert_eq!(
        figure_blocks[0].exclude_reason,
        Some(ExcludeReason::FigureInternal)
    );

    let captions: Vec<_> = index.pages[0]
        .blocks
        .iter()
        .filter(|b| b.kind == BlockKind::FigureCaption)
        .collect();
    assert_eq!(captions.len(), 1);
    assert!(captions[0].included);
    assert!(captions[0].text.contains("Figure one"));

    assert!(!index.full_text.contains("lbl"));
    assert!(index.full_text.contains("Figure one shows"));
}

// =============================================================================
// SCENARIO 4: table internals and caption
// =============================================================================

#[test]
fn test_table_block_and_caption() {
    let mut items = Vec::new();
    items.extend(paragraph("body paragraph before the table", 0.10, 0.10, 8, 0.75));
    // One-line caption just above the table grid.
    items.push(item_at("Table one run summary", 0.10, 0.265, 10.0, 0.30));
    // Eight rows of four aligned cells.
    for row in 0..8 {
        let y = 0.2975 + row as f64 * 0.0175;
        let jitter = if row % 2 == 0 { 0.005 } else { -0.005 };
        for &cx in &[0.10, 0.30, 0.55, 0.80] {
            items.push(item_at("42", cx - 0.02 + jitter, y, 10.0, 0.04));
        }
    }
    let index = analyze(vec![page(items)]);

    let tables: Vec<_> = index.pages[0]
        .blocks
        .iter()
        .filter(|b| b.kind == BlockKind::TableInternal)
        .collect();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].exclude_reason, Some(ExcludeReason::TableInternal));

    let captions: Vec<_> = index.pages[0]
        .blocks
        .iter()
        .filter(|b| b.kind == BlockKind::TableCaption)
        .collect();
    assert_eq!(captions.len(), 1);
    assert!(captions[0].text.contains("Table one"));

    // Table cells contribute no tokens.
    assert!(!index.tokens.iter().any(|t| t == "42"));
}

// =============================================================================
// SCENARIO 5: scholarly article with references hard stop
// =============================================================================

/// A hanging-indent reference entry: short lead line, indented wider
/// continuation.
fn reference_entry(y0: f64) -> Vec<RawTextItem> {
    vec![
        item_at("Author name and initials year", 0.08, y0, 10.0, 0.50),
        item_at("title of the cited work and venue details", 0.13, y0 + 0.018, 10.0, 0.62),
    ]
}

fn scholarly_document() -> Vec<DecodedPage> {
    let mut pages = Vec::new();
    for _ in 0..6 {
        let mut items = Vec::new();
        for b in 0..3 {
            items.extend(paragraph(
                "body narrative paragraph with several words",
                0.08,
                0.15 + b as f64 * 0.20,
                3,
                0.75,
            ));
        }
        pages.push(page(items));
    }
    for p in 6..8 {
        let count = if p == 6 { 8 } else { 7 };
        let mut items = Vec::new();
        for i in 0..count {
            items.extend(reference_entry(0.10 + i as f64 * 0.05));
        }
        pages.push(page(items));
    }
    pages
}

#[test]
fn test_references_hard_stop() {
    let index = analyze(scholarly_document());

    assert!(index.is_likely_scholarly);
    // References start at the first entry on page 6: 18 body blocks precede.
    assert_eq!(index.references_start_block_global_index, Some(18));

    // Every block on pages 6 and 7 is excluded as references.
    for p in 6..8 {
        for block in &index.pages[p].blocks {
            assert!(!block.included);
            assert_eq!(block.exclude_reason, Some(ExcludeReason::ReferencesHardStop));
        }
    }

    // The hard-stop token index is the end of the included stream.
    assert_eq!(index.references_hard_stop_token_index, Some(index.tokens.len()));
    assert!(index
        .token_meta
        .iter()
        .all(|m| (m.page_index as usize) < 6));
    assert!(!index.full_text.contains("cited work"));
}

#[test]
fn test_reference_blocks_classified_as_list_items() {
    let index = analyze(scholarly_document());
    let list_items = index.pages[6]
        .blocks
        .iter()
        .filter(|b| b.kind == BlockKind::ListItem)
        .count();
    assert_eq!(list_items, 8);
}

// =============================================================================
// SCENARIO 6: rotated watermark
// =============================================================================

#[test]
fn test_rotated_watermark_excluded_and_stream_unchanged() {
    let body = |items: &mut Vec<RawTextItem>| {
        items.extend(paragraph("body text above the center", 0.10, 0.20, 5, 0.75));
        items.extend(paragraph("body text below the center", 0.10, 0.60, 5, 0.75));
    };

    let mut clean_items = Vec::new();
    body(&mut clean_items);

    let mut marked_items = Vec::new();
    body(&mut marked_items);
    let c = std::f64::consts::FRAC_PI_4.cos() * 24.0;
    marked_items.push(RawTextItem {
        str: "DRAFT".to_string(),
        transform: [c, c, -c, c, 0.3 * PAGE_W, 0.45 * PAGE_H],
        width: 0.40 * PAGE_W,
        height: 24.0,
    });

    let clean = analyze(vec![page(clean_items)]);
    let marked = analyze(vec![page(marked_items)]);

    assert!(marked
        .exclusions
        .iter()
        .any(|e| e.reason == ExcludeReason::RotatedOrWatermark));
    assert!(!marked.full_text.contains("DRAFT"));
    assert_eq!(clean.tokens, marked.tokens);
    assert_eq!(clean.full_text, marked.full_text);
}
