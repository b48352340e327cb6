//! Scholarly-layout constraints.
//!
//! Journal articles carry non-narrative matter that layout alone can
//! identify: title/author/affiliation stacks before the first body
//! paragraph, fine-print boilerplate pinned to the bottom edge,
//! acknowledgment fragments between the body and the bibliography, and the
//! bibliography itself. The bibliography is found purely structurally, as a
//! sustained run of hanging-indent or marker-led blocks in the document
//! tail; there is no keyword matching, so the detector behaves identically
//! across languages.

use lazy_static::lazy_static;
use regex::Regex;

use crate::layout::clustering::median;
use crate::layout::{Block, BlockKind, ExcludeReason, Page};

lazy_static! {
    /// Marker-only block: a bare bracketed or dotted number like `[12]`,
    /// `(3).`, `7.` standing alone as a block. Brackets must pair up; a
    /// stray half-bracketed fragment is not a marker.
    static ref MARKER_ONLY: Regex =
        Regex::new(r"^(?:\[\d{1,4}\]|\(\d{1,4}\)|\d{1,4})[.,:]?$").unwrap();
}

/// Outcome of the journal pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct JournalOutcome {
    /// Whether the document triggered scholarly handling
    pub is_likely_scholarly: bool,
    /// Global reading-order index of the first references block
    pub references_start_global: Option<usize>,
}

/// Apply journal constraints across the document.
///
/// `pages` must have their blocks in final reading order. Blocks are
/// mutated in place (exclusions only; kinds are preserved).
pub fn apply_journal_constraints(pages: &mut [Page]) -> JournalOutcome {
    let n_pages = pages.len();
    if n_pages < 2 {
        return JournalOutcome::default();
    }

    let multi_column_pages = pages.iter().filter(|p| p.columns.len() >= 2).count();
    let layout_scholarly =
        n_pages >= 4 && multi_column_pages as f64 / n_pages as f64 >= 0.25;

    // Locators into pages[a].blocks[b], in global reading order.
    let locators: Vec<(usize, usize)> = pages
        .iter()
        .enumerate()
        .flat_map(|(pi, p)| (0..p.blocks.len()).map(move |bi| (pi, bi)))
        .collect();

    let mut references_start = detect_references_run(pages, &locators, n_pages);
    if references_start.is_none() {
        references_start = final_page_fallback(pages, &locators);
    }

    if !(layout_scholarly || references_start.is_some()) {
        return JournalOutcome::default();
    }

    if let Some(start) = references_start {
        references_start = Some(absorb_leading_heading(pages, &locators, start));
    }

    // Front matter: everything before the first real body paragraph.
    let first_body = locators
        .iter()
        .enumerate()
        .find(|(_, &(pi, bi))| is_body_paragraph_like(&pages[pi].blocks[bi]))
        .map(|(g, _)| g);
    if let Some(first) = first_body {
        for g in 0..first {
            let (pi, bi) = locators[g];
            let b = &mut pages[pi].blocks[bi];
            if b.included {
                b.exclude(ExcludeReason::JournalFrontMatter);
            }
        }
    }

    // Small-font boilerplate pinned to the bottom edge.
    for page in pages.iter_mut() {
        let body_font = page.body_font_size;
        for b in &mut page.blocks {
            if b.included
                && !matches!(b.kind, BlockKind::FigureCaption | BlockKind::TableCaption)
                && b.bbox.y0 > 0.83
                && b.bbox.width() < 0.95
                && b.median_font_size() <= body_font * 0.82
            {
                b.exclude(ExcludeReason::MarginDecorative);
            }
        }
    }

    // Back matter: between the last body paragraph and the references.
    if let (Some(first), Some(refs)) = (first_body, references_start) {
        let last_body = (first..refs).rev().find(|&g| {
            let (pi, bi) = locators[g];
            is_body_paragraph_like(&pages[pi].blocks[bi])
        });
        if let Some(last) = last_body {
            for g in (last + 1)..refs {
                let (pi, bi) = locators[g];
                let b = &mut pages[pi].blocks[bi];
                if b.included {
                    b.exclude(ExcludeReason::JournalBackMatter);
                }
            }
        }
    }

    // References hard stop.
    if let Some(refs) = references_start {
        for &(pi, bi) in &locators[refs..] {
            let b = &mut pages[pi].blocks[bi];
            if b.included {
                b.exclude(ExcludeReason::ReferencesHardStop);
            }
        }
        log::debug!("references hard stop at global block {}", refs);
    }

    JournalOutcome {
        is_likely_scholarly: true,
        references_start_global: references_start,
    }
}

/// A block that reads like ordinary body flow.
fn is_body_paragraph_like(block: &Block) -> bool {
    block.included
        && matches!(block.kind, BlockKind::Paragraph | BlockKind::ListItem)
        && block.lines.len() >= 2
        && block.bbox.width() >= 0.55
}

/// Reference-likeness score of a block.
fn reference_score(block: &Block) -> f64 {
    if !block.included || !matches!(block.kind, BlockKind::Paragraph | BlockKind::ListItem) {
        return 0.0;
    }
    if block.lines.len() == 1 && MARKER_ONLY.is_match(block.text.trim()) {
        return 1.1;
    }

    let mut score = 0.0;
    if block.kind == BlockKind::ListItem {
        score += 0.6;
    }
    if block.lines.len() >= 2 {
        score += 0.4;
    }
    score += hanging_indent_score(block);
    if block.bbox.width() <= 0.97 {
        score += 0.2;
    }
    score
}

/// 0, 1 or 2 depending on how pronounced the hanging indent is.
fn hanging_indent_score(block: &Block) -> f64 {
    if block.lines.len() < 2 {
        return 0.0;
    }
    let first_x0 = block.lines[0].bbox.x0;
    let rest_x0 = median(&block.lines[1..].iter().map(|l| l.bbox.x0).collect::<Vec<_>>());
    let hanging = rest_x0 - first_x0;
    if hanging >= 0.035 {
        2.0
    } else if hanging >= 0.018 {
        1.0
    } else {
        0.0
    }
}

/// Scan the document tail for a sustained run of reference-like blocks.
///
/// The accumulator grows on reference-like blocks and resets on included
/// non-reference content; excluded blocks are neutral. The last sustained
/// run wins: references terminate a document, so a run followed by more
/// body text was a false positive (a long list in the middle of the body).
fn detect_references_run(
    pages: &[Page],
    locators: &[(usize, usize)],
    n_pages: usize,
) -> Option<usize> {
    let n = locators.len();
    if n == 0 {
        return None;
    }
    let tail_start = (n as f64 * 0.55).floor() as usize;
    let page_cut = n_pages as f64 * 0.6;
    let need = if n_pages >= 6 { 6.0 } else { 4.0 };

    let mut run = 0.0_f64;
    let mut run_start: Option<usize> = None;
    let mut detected: Option<usize> = None;

    for (g, &(pi, bi)) in locators.iter().enumerate() {
        if g < tail_start || (pi as f64) < page_cut {
            continue;
        }
        let block = &pages[pi].blocks[bi];
        if !block.included {
            continue;
        }
        let score = reference_score(block);
        if score >= 2.0 {
            run += 1.0;
            run_start.get_or_insert(g);
        } else if score >= 1.0 {
            run += 0.6;
            run_start.get_or_insert(g);
        } else {
            run = 0.0;
            run_start = None;
        }
        if run >= need {
            detected = run_start;
        }
    }
    detected
}

/// When no sustained run exists, a final page dominated by reference-like
/// blocks still hard-stops at its first block.
fn final_page_fallback(pages: &[Page], locators: &[(usize, usize)]) -> Option<usize> {
    let last_page = pages.len().checked_sub(1)?;
    let blocks = &pages[last_page].blocks;
    if blocks.len() < 6 {
        return None;
    }
    let reference_like = blocks
        .iter()
        .filter(|b| reference_score(b) >= 1.6)
        .count();
    if (reference_like as f64) < blocks.len() as f64 * 0.6 {
        return None;
    }
    locators.iter().position(|&(pi, _)| pi == last_page)
}

/// Pull the hard-stop start backward over a section heading that
/// immediately precedes the run on the same page.
fn absorb_leading_heading(
    pages: &[Page],
    locators: &[(usize, usize)],
    start: usize,
) -> usize {
    let (spi, sbi) = locators[start];
    let start_top = pages[spi].blocks[sbi].bbox.y0;
    for step in 1..=2usize {
        let Some(g) = start.checked_sub(step) else {
            break;
        };
        let (pi, bi) = locators[g];
        if pi != spi {
            break;
        }
        let b = &pages[pi].blocks[bi];
        if b.included
            && b.kind == BlockKind::Heading
            && b.lines.len() <= 2
            && b.bbox.width() < 0.5
            && start_top - b.bbox.y1 <= 0.05
        {
            return g;
        }
    }
    start
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::layout::{Column, Line};

    fn mk_line(x0: f64, y0: f64, width: f64) -> Line {
        Line {
            items: vec![],
            text: "line text".to_string(),
            bbox: Rect::new(x0, y0, x0 + width, y0 + 0.015),
            y_mid: y0 + 0.0075,
            font_size: 10.0,
            max_abs_rotation_rad: 0.0,
            rotated_fraction: 0.0,
            approx_cell_count: 1,
            cell_xs: vec![x0 + width / 2.0],
        }
    }

    fn body_block(page: usize, y0: f64) -> Block {
        let lines = vec![mk_line(0.08, y0, 0.8), mk_line(0.08, y0 + 0.02, 0.8), mk_line(0.08, y0 + 0.04, 0.6)];
        let mut b = Block::from_lines(page, 0, BlockKind::Paragraph, lines);
        b.confidence = 0.8;
        b
    }

    fn reference_block(page: usize, y0: f64) -> Block {
        // Hanging indent >= 0.035 and multi-line: score 0.4 + 2 + 0.2.
        let lines = vec![mk_line(0.08, y0, 0.7), mk_line(0.13, y0 + 0.02, 0.65)];
        let mut b = Block::from_lines(page, 0, BlockKind::ListItem, lines);
        b.confidence = 0.8;
        b
    }

    fn heading_block(page: usize, y0: f64, text: &str) -> Block {
        let mut line = mk_line(0.08, y0, 0.25);
        line.text = text.to_string();
        line.font_size = 14.0;
        let mut b = Block::from_lines(page, 0, BlockKind::Heading, vec![line]);
        b.confidence = 0.85;
        b
    }

    fn page_with(page_index: usize, blocks: Vec<Block>) -> Page {
        Page {
            page_index,
            page_width: 600.0,
            page_height: 800.0,
            body_font_size: 10.0,
            columns: vec![Column {
                column_index: 0,
                x_start: 0.0,
                x_end: 1.0,
                lines: vec![],
            }],
            blocks,
        }
    }

    /// Eight-page article with references filling the last two pages.
    fn scholarly_pages() -> Vec<Page> {
        let mut pages = Vec::new();
        for p in 0..6 {
            pages.push(page_with(
                p,
                (0..4).map(|i| body_block(p, 0.1 + i as f64 * 0.2)).collect(),
            ));
        }
        for p in 6..8 {
            let mut blocks = vec![];
            if p == 6 {
                blocks.push(heading_block(p, 0.08, "Section"));
            }
            for i in 0..8 {
                blocks.push(reference_block(p, 0.12 + i as f64 * 0.1));
            }
            pages.push(page_with(p, blocks));
        }
        pages
    }

    #[test]
    fn test_references_run_detected_and_hard_stopped() {
        let mut pages = scholarly_pages();
        let outcome = apply_journal_constraints(&mut pages);
        assert!(outcome.is_likely_scholarly);
        assert!(outcome.references_start_global.is_some());
        // Every reference block is excluded with the hard-stop reason.
        for p in 6..8 {
            for b in &pages[p].blocks {
                if b.kind == BlockKind::ListItem {
                    assert_eq!(b.exclude_reason, Some(ExcludeReason::ReferencesHardStop));
                }
            }
        }
        // Body pages before the references stay included.
        assert!(pages[2].blocks.iter().all(|b| b.included));
    }

    #[test]
    fn test_leading_heading_absorbed() {
        let mut pages = scholarly_pages();
        let outcome = apply_journal_constraints(&mut pages);
        let refs = outcome.references_start_global.unwrap();
        // The heading on page 6 sits right above the run and is absorbed.
        let heading_global: usize = pages[..6].iter().map(|p| p.blocks.len()).sum();
        assert_eq!(refs, heading_global);
        assert!(!pages[6].blocks[0].included);
    }

    #[test]
    fn test_non_scholarly_untouched() {
        let mut pages: Vec<Page> = (0..3)
            .map(|p| page_with(p, (0..4).map(|i| body_block(p, 0.1 + i as f64 * 0.2)).collect()))
            .collect();
        let outcome = apply_journal_constraints(&mut pages);
        assert!(!outcome.is_likely_scholarly);
        assert!(pages.iter().all(|p| p.blocks.iter().all(|b| b.included)));
    }

    #[test]
    fn test_front_matter_excluded() {
        let mut pages = scholarly_pages();
        // Prepend a title stack (short single-line blocks) to page 0.
        let mut front = vec![
            heading_block(0, 0.02, "A Grand Title"),
            heading_block(0, 0.05, "A. Author"),
        ];
        front.extend(pages[0].blocks.drain(..));
        pages[0].blocks = front;
        apply_journal_constraints(&mut pages);
        assert_eq!(
            pages[0].blocks[0].exclude_reason,
            Some(ExcludeReason::JournalFrontMatter)
        );
        assert_eq!(
            pages[0].blocks[1].exclude_reason,
            Some(ExcludeReason::JournalFrontMatter)
        );
        assert!(pages[0].blocks[2].included);
    }

    #[test]
    fn test_bottom_boilerplate_excluded() {
        let mut pages = scholarly_pages();
        let mut fine = body_block(1, 0.9);
        for l in &mut fine.lines {
            l.font_size = 7.0;
        }
        pages[1].blocks.push(fine);
        apply_journal_constraints(&mut pages);
        let last = pages[1].blocks.last().unwrap();
        assert_eq!(last.exclude_reason, Some(ExcludeReason::MarginDecorative));
    }

    #[test]
    fn test_marker_only_pattern() {
        assert!(MARKER_ONLY.is_match("[12]"));
        assert!(MARKER_ONLY.is_match("(3)."));
        assert!(MARKER_ONLY.is_match("7."));
        assert!(!MARKER_ONLY.is_match("see [12]"));
        assert!(!MARKER_ONLY.is_match("[12] Smith"));
        // Mismatched or unopened brackets are not markers.
        assert!(!MARKER_ONLY.is_match("[3)"));
        assert!(!MARKER_ONLY.is_match("(3]"));
        assert!(!MARKER_ONLY.is_match("3)"));
        assert!(!MARKER_ONLY.is_match("[3"));
    }

    #[test]
    fn test_two_page_document_needs_references() {
        // Two pages, no multi-column layout, no references: untouched.
        let mut pages: Vec<Page> = (0..2)
            .map(|p| page_with(p, (0..4).map(|i| body_block(p, 0.1 + i as f64 * 0.2)).collect()))
            .collect();
        let outcome = apply_journal_constraints(&mut pages);
        assert!(!outcome.is_likely_scholarly);
    }
}
