//! Hit testing and selection resolution.
//!
//! Maps on-screen geometry back to the token stream: a tapped point
//! resolves to the smallest included block containing it, a dragged
//! rectangle to a primary block plus span counts, and a selected word to a
//! concrete token index inside its block.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::layout::Block;
use crate::narrative::anchors::position_score;
use crate::narrative::NarrativeIndex;
use crate::text::token_key;

/// Vertical weight for the nearest-block fallback: points between lines
/// should resolve horizontally first.
const HIT_Y_WEIGHT: f64 = 2.0;

/// Where a selection happened, in block coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionContext {
    /// Page of the primary block
    pub page_index: usize,
    /// Column of the primary block
    pub column_index: usize,
    /// Index of the primary block within its column
    pub block_index: i32,
    /// Normalized x of the selection midpoint
    pub x_mid_n: f64,
    /// Normalized y of the selection midpoint
    pub y_mid_n: f64,
    /// The selection rectangle, when the selection was a drag
    pub rect: Option<Rect>,
    /// Number of distinct columns the selection touches
    pub span_columns: usize,
    /// Number of blocks the selection touches
    pub span_blocks: usize,
}

/// Find the included block under a point.
///
/// Prefers the smallest-area included block containing the point; when no
/// block contains it, falls back to the nearest block by
/// vertically-weighted distance.
pub fn hit_test_point(index: &NarrativeIndex, page_index: usize, x: f64, y: f64) -> Option<&Block> {
    let page = index.pages.get(page_index)?;
    let point = Point::new(x, y);

    let containing = page
        .blocks
        .iter()
        .filter(|b| b.included && b.bbox.contains_point(&point))
        .min_by(|a, b| {
            a.bbox
                .area()
                .partial_cmp(&b.bbox.area())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    if containing.is_some() {
        return containing;
    }

    page.blocks
        .iter()
        .filter(|b| b.included)
        .min_by(|a, b| {
            a.bbox
                .weighted_distance(&point, HIT_Y_WEIGHT)
                .partial_cmp(&b.bbox.weighted_distance(&point, HIT_Y_WEIGHT))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Build a selection context from a tapped point.
pub fn selection_from_point(
    index: &NarrativeIndex,
    page_index: usize,
    x: f64,
    y: f64,
) -> Option<SelectionContext> {
    let block = hit_test_point(index, page_index, x, y)?;
    Some(SelectionContext {
        page_index: block.page_index,
        column_index: block.column_index,
        block_index: block.block_index,
        x_mid_n: x,
        y_mid_n: y,
        rect: None,
        span_columns: 1,
        span_blocks: 1,
    })
}

/// Build a selection context from a dragged rectangle.
///
/// The primary block is the one containing the rectangle's midpoint, or
/// the earliest touched block in reading order. Span counts record how
/// many blocks and distinct columns the rectangle crosses.
pub fn selection_from_rect(
    index: &NarrativeIndex,
    page_index: usize,
    rect: Rect,
) -> Option<SelectionContext> {
    let page = index.pages.get(page_index)?;
    let touched: Vec<&Block> = page
        .blocks
        .iter()
        .filter(|b| b.included && b.bbox.intersects(&rect))
        .collect();
    if touched.is_empty() {
        return None;
    }

    let mid = rect.center();
    let primary = touched
        .iter()
        .find(|b| b.bbox.contains_point(&mid))
        .copied()
        .unwrap_or(touched[0]);

    let mut columns: Vec<usize> = touched.iter().map(|b| b.column_index).collect();
    columns.sort_unstable();
    columns.dedup();

    Some(SelectionContext {
        page_index: primary.page_index,
        column_index: primary.column_index,
        block_index: primary.block_index,
        x_mid_n: mid.x,
        y_mid_n: mid.y,
        rect: Some(rect),
        span_columns: columns.len(),
        span_blocks: touched.len(),
    })
}

/// Resolve selected text to a token index.
///
/// The first word of `text` is normalized to a key and looked up inside
/// the context block. Multiple matches tie-break by (a) the match nearest
/// the selection's relative vertical position within the block, then (b)
/// context scoring with the remaining selection words, then (c) the
/// earliest match. Without a resolvable context block, the first matching
/// token on the page wins.
pub fn resolve_selection_text(
    index: &NarrativeIndex,
    ctx: &SelectionContext,
    text: &str,
) -> Option<usize> {
    let mut words = text.split_whitespace();
    let key = token_key(words.next()?);
    if key.is_empty() {
        return None;
    }
    let context_keys: Vec<String> = words
        .map(token_key)
        .filter(|k| !k.is_empty())
        .take(4)
        .collect();

    let block = index
        .block(ctx.page_index, ctx.column_index, ctx.block_index)
        .filter(|b| b.included);
    if let Some(block) = block {
        if let Some(range) = block.token_range {
            let positions: Vec<usize> = block
                .token_keys
                .iter()
                .enumerate()
                .filter(|(_, k)| **k == key)
                .map(|(i, _)| i)
                .collect();

            if positions.len() == 1 {
                return Some(range.start + positions[0]);
            }
            if positions.len() > 1 {
                // (a) nearest to the selection's vertical fraction.
                let height = block.bbox.height();
                let frac = if height > 0.0 {
                    ((ctx.y_mid_n - block.bbox.y0) / height).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let n = block.token_keys.len();
                let target = (frac * (n.saturating_sub(1)) as f64).round() as usize;
                let best_dist = positions
                    .iter()
                    .map(|&p| p.abs_diff(target))
                    .min()
                    .unwrap_or(0);
                let nearest: Vec<usize> = positions
                    .iter()
                    .copied()
                    .filter(|&p| p.abs_diff(target) == best_dist)
                    .collect();
                if nearest.len() == 1 {
                    return Some(range.start + nearest[0]);
                }
                // (b) context scoring over the tied candidates.
                if !context_keys.is_empty() {
                    if let Some(best) = nearest.iter().copied().max_by(|&a, &b| {
                        position_score(&block.token_keys, a, &key, &context_keys)
                            .partial_cmp(&position_score(&block.token_keys, b, &key, &context_keys))
                            .unwrap_or(std::cmp::Ordering::Equal)
                    }) {
                        return Some(range.start + best);
                    }
                }
                // (c) earliest.
                if let Some(&first) = nearest.first() {
                    return Some(range.start + first);
                }
            }
        }
    }

    // No usable context block: first matching token on the page.
    index
        .token_meta
        .iter()
        .enumerate()
        .find(|(i, m)| m.page_index == ctx.page_index as i32 && token_key(&index.tokens[*i]) == key)
        .map(|(i, _)| i)
}
