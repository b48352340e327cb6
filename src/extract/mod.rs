//! Item extraction and normalization.
//!
//! Converts decoded glyph runs (PDF points, bottom-left origin, affine
//! transforms) into [`TextItem`]s in normalized top-left [0,1] coordinates.
//! This is the only stage that sees raw decoder output; everything
//! downstream works in normalized space.

use serde::{Deserialize, Serialize};

use crate::decode::{DecodedPage, RawTextItem};
use crate::geometry::{clamp_unit, Rect};
use crate::layout::clustering::median;

/// A single extracted glyph run in normalized coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextItem {
    /// Raw text of the run
    pub text: String,
    /// Zero-based page index
    pub page_index: usize,
    /// Geometric font size in PDF points
    pub font_size: f64,
    /// Rotation in radians, from atan2(b, a)
    pub rotation_rad: f64,
    /// Bounding box in normalized page coordinates
    pub bbox: Rect,
}

/// One page of normalized items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedPage {
    /// Zero-based page index
    pub page_index: usize,
    /// Page width in PDF points
    pub page_width: f64,
    /// Page height in PDF points
    pub page_height: f64,
    /// Median of positive item font sizes (12.0 when no items)
    pub body_font_size: f64,
    /// Items sorted by (y0 · 10⁴ + x0), stably
    pub items: Vec<TextItem>,
}

impl ExtractedPage {
    /// An empty page with the given index.
    ///
    /// Substituted when a page fails to decode so downstream indices stay
    /// stable.
    pub fn empty(page_index: usize) -> Self {
        Self {
            page_index,
            page_width: 0.0,
            page_height: 0.0,
            body_font_size: 12.0,
            items: Vec::new(),
        }
    }
}

/// Geometric font size of a run: the dominant scale of its transform.
fn font_size_of(transform: &[f64; 6]) -> f64 {
    let [a, b, c, d, _, _] = *transform;
    let row1 = (a * a + b * b).sqrt();
    let row2 = (c * c + d * d).sqrt();
    row1.max(row2).max(d.abs())
}

/// Coerce a non-finite value to zero.
fn finite(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Normalize one raw item into top-left [0,1] space.
///
/// PDF places the run at `(e, f)` with a bottom-left origin; the top edge in
/// normalized space is therefore `(pageH - (f + height)) / pageH`.
fn normalize_item(raw: &RawTextItem, page_index: usize, page_w: f64, page_h: f64) -> TextItem {
    let e = finite(raw.transform[4]);
    let f = finite(raw.transform[5]);
    let w = finite(raw.width).max(0.0);
    let h = finite(raw.height).max(0.0);

    let x0 = clamp_unit(e / page_w);
    let x1 = clamp_unit((e + w) / page_w);
    let y0 = clamp_unit((page_h - (f + h)) / page_h);
    let y1 = clamp_unit((page_h - f) / page_h);

    let mut transform = raw.transform;
    for v in &mut transform {
        *v = finite(*v);
    }

    TextItem {
        text: raw.str.clone(),
        page_index,
        font_size: finite(font_size_of(&transform)),
        rotation_rad: transform[1].atan2(transform[0]),
        bbox: Rect::new(x0, y0, x1, y1.max(y0)),
    }
}

/// Extract and normalize one decoded page.
///
/// Empty and whitespace-only runs are discarded. Items are stably sorted by
/// `y0 · 10⁴ + x0` so that identical inputs always produce the same item
/// order regardless of content-stream order.
pub fn extract_page(page_index: usize, decoded: &DecodedPage) -> ExtractedPage {
    let page_w = decoded.width;
    let page_h = decoded.height;
    if !page_w.is_finite() || !page_h.is_finite() || page_w <= 0.0 || page_h <= 0.0 {
        log::warn!("page {}: invalid viewport {}x{}, emitting empty page", page_index, page_w, page_h);
        return ExtractedPage::empty(page_index);
    }

    let mut items: Vec<TextItem> = decoded
        .items
        .iter()
        .filter(|raw| !raw.str.trim().is_empty())
        .map(|raw| normalize_item(raw, page_index, page_w, page_h))
        .collect();

    items.sort_by(|a, b| {
        let ka = a.bbox.y0 * 1e4 + a.bbox.x0;
        let kb = b.bbox.y0 * 1e4 + b.bbox.x0;
        ka.partial_cmp(&kb).unwrap_or(std::cmp::Ordering::Equal)
    });

    let positive_sizes: Vec<f64> = items.iter().map(|it| it.font_size).filter(|&s| s > 0.0).collect();
    let body_font_size = if positive_sizes.is_empty() {
        12.0
    } else {
        median(&positive_sizes)
    };

    log::debug!(
        "page {}: {} items, body font {:.2}pt",
        page_index,
        items.len(),
        body_font_size
    );

    ExtractedPage {
        page_index,
        page_width: page_w,
        page_height: page_h,
        body_font_size,
        items,
    }
}
