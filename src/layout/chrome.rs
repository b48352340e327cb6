//! Line-level exclusion of page chrome.
//!
//! Four independent detectors run before block segmentation:
//!
//! - repeated headers/footers, found by normalizing edge-band lines into
//!   repetition keys and counting them across pages;
//! - singleton edge chrome (a date line, a page number that appears once);
//! - margin decorations outside the column union;
//! - rotated lines and watermarks.
//!
//! Excluded lines are removed from their column and kept as single-line
//! pseudo-blocks for traceability; they get a real block index during
//! final re-indexing.

use std::collections::HashMap;

use crate::layout::clustering::median;
use crate::layout::{Block, BlockKind, Column, ExcludeReason, Line};
use crate::text::repetition_signature;

/// Edge bands considered for header/footer repetition.
const REPEAT_TOP_BAND: f64 = 0.12;
const REPEAT_BOTTOM_BAND: f64 = 0.88;

/// Tighter bands for singleton edge chrome.
const EDGE_TOP_BAND: f64 = 0.09;
const EDGE_BOTTOM_BAND: f64 = 0.91;

/// Confidence recorded on chrome pseudo-blocks.
const CHROME_CONFIDENCE: f64 = 0.95;

/// Per-page layout state between column inference and block segmentation.
#[derive(Debug, Clone)]
pub struct PageDraft {
    /// Zero-based page index
    pub page_index: usize,
    /// Page width in PDF points
    pub page_width: f64,
    /// Page height in PDF points
    pub page_height: f64,
    /// Median of positive item font sizes
    pub body_font_size: f64,
    /// Columns with their assigned lines
    pub columns: Vec<Column>,
}

/// Apply all line-level exclusions across the document.
///
/// Removes excluded lines from their columns in place and returns them as
/// excluded pseudo-blocks.
pub fn apply_line_exclusions(pages: &mut [PageDraft], rotation_cutoff_rad: f64) -> Vec<Block> {
    let repeated = repeated_chrome_keys(pages);
    let mut pseudo_blocks = Vec::new();

    for page in pages.iter_mut() {
        let body_left = body_left_estimate(&page.columns);
        let union = column_content_union(&page.columns);
        let body_font = page.body_font_size;
        let page_index = page.page_index;

        for col in &mut page.columns {
            let column_index = col.column_index;
            let mut kept = Vec::with_capacity(col.lines.len());
            for line in col.lines.drain(..) {
                match line_exclusion(
                    &line,
                    &repeated,
                    body_left,
                    union,
                    body_font,
                    rotation_cutoff_rad,
                ) {
                    Some(reason) => {
                        let kind = match reason {
                            ExcludeReason::HeaderFooter => BlockKind::HeaderFooter,
                            _ => BlockKind::MarginDecorative,
                        };
                        let mut block =
                            Block::from_lines(page_index, column_index, kind, vec![line]);
                        block.exclude(reason);
                        block.confidence = CHROME_CONFIDENCE;
                        pseudo_blocks.push(block);
                    },
                    None => kept.push(line),
                }
            }
            col.lines = kept;
        }
    }

    log::debug!("line exclusions: {} pseudo-blocks", pseudo_blocks.len());
    pseudo_blocks
}

/// Repetition key for an edge-band line, if it sits in an edge band.
fn repetition_key(line: &Line) -> Option<String> {
    let band = if line.y_mid < REPEAT_TOP_BAND {
        "top"
    } else if line.y_mid > REPEAT_BOTTOM_BAND {
        "bot"
    } else {
        return None;
    };
    let bucket = (line.bbox.x_mid() / 0.05).round() as i64;
    Some(format!("{}|{}|{}", band, bucket, repetition_signature(&line.text)))
}

/// Keys that appear on at least two distinct pages.
fn repeated_chrome_keys(pages: &[PageDraft]) -> HashMap<String, usize> {
    let mut pages_per_key: HashMap<String, Vec<usize>> = HashMap::new();
    for page in pages {
        for col in &page.columns {
            for line in &col.lines {
                if let Some(key) = repetition_key(line) {
                    let entry = pages_per_key.entry(key).or_default();
                    if entry.last() != Some(&page.page_index) {
                        entry.push(page.page_index);
                    }
                }
            }
        }
    }
    pages_per_key
        .into_iter()
        .filter(|(_, pages)| pages.len() >= 2)
        .map(|(key, pages)| (key, pages.len()))
        .collect()
}

/// Median left edge of mid-band wide lines, the page's body alignment.
fn body_left_estimate(columns: &[Column]) -> f64 {
    let x0s: Vec<f64> = columns
        .iter()
        .flat_map(|c| c.lines.iter())
        .filter(|l| l.y_mid > 0.15 && l.y_mid < 0.85 && l.bbox.width() >= 0.30)
        .map(|l| l.bbox.x0)
        .collect();
    median(&x0s)
}

/// Horizontal union of all column content ranges.
fn column_content_union(columns: &[Column]) -> (f64, f64) {
    let mut x0 = f64::INFINITY;
    let mut x1 = f64::NEG_INFINITY;
    for col in columns {
        if col.lines.is_empty() {
            continue;
        }
        let (cx0, cx1) = col.content_x_range();
        x0 = x0.min(cx0);
        x1 = x1.max(cx1);
    }
    if x0.is_finite() {
        (x0, x1)
    } else {
        (0.0, 1.0)
    }
}

/// Decide whether a line is page chrome, and why.
fn line_exclusion(
    line: &Line,
    repeated: &HashMap<String, usize>,
    body_left: f64,
    union: (f64, f64),
    body_font: f64,
    rotation_cutoff_rad: f64,
) -> Option<ExcludeReason> {
    // Repeated header/footer.
    if let Some(key) = repetition_key(line) {
        if repeated.contains_key(&key) {
            return Some(ExcludeReason::HeaderFooter);
        }
    }

    // Singleton edge chrome.
    let in_extreme_band = line.y_mid < EDGE_TOP_BAND || line.y_mid > EDGE_BOTTOM_BAND;
    if in_extreme_band {
        let narrow = line.bbox.width() < 0.55;
        let misaligned = (line.bbox.x0 - body_left).abs() > 0.035;
        if narrow && misaligned {
            return Some(ExcludeReason::MarginDecorative);
        }
        // Wide small-font lines hugging the bottom edge are boilerplate
        // even when aligned; narrow aligned lines stay narrative.
        if line.y_mid > EDGE_BOTTOM_BAND && !narrow && line.font_size <= body_font * 0.82 {
            return Some(ExcludeReason::MarginDecorative);
        }
    }

    // Margin decorations in the middle band.
    if line.y_mid > 0.08 && line.y_mid < 0.92 {
        let outside_union = line.bbox.x1 < union.0 - 0.03 || line.bbox.x0 > union.1 + 0.03;
        let near_edge = line.bbox.x0 < 0.05 || line.bbox.x1 > 0.95;
        let short = line.bbox.width() < 0.18;
        if outside_union || (near_edge && short) {
            return Some(ExcludeReason::MarginDecorative);
        }
    }

    // Rotated lines and watermarks.
    if line.max_abs_rotation_rad > rotation_cutoff_rad {
        return Some(ExcludeReason::RotatedOrWatermark);
    }

    None
}
