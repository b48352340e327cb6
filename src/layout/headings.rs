//! Heading level assignment by font-size banding.
//!
//! Heading fonts in a document fall into a handful of sizes. Collecting the
//! sizes of all included heading blocks, sorting them descending, and
//! merging near-equal neighbors yields the document's heading hierarchy;
//! each heading then takes the level of its closest band.

use crate::layout::{BlockKind, Page};

/// Neighboring sizes within this ratio share a band.
const BAND_MERGE_RATIO: f64 = 1.08;
/// At most six levels, matching H1..H6.
const MAX_BANDS: usize = 6;

/// Assign `heading_level` to every included heading block.
pub fn assign_heading_levels(pages: &mut [Page]) {
    let mut sizes: Vec<f64> = Vec::new();
    for page in pages.iter() {
        for block in &page.blocks {
            if block.included && block.kind == BlockKind::Heading {
                let size = block.median_font_size();
                if size > 0.0 {
                    sizes.push(size);
                }
            }
        }
    }
    if sizes.is_empty() {
        return;
    }

    let bands = build_bands(&sizes);
    log::debug!("heading bands: {:?}", bands);

    for page in pages.iter_mut() {
        for block in &mut page.blocks {
            if block.included && block.kind == BlockKind::Heading {
                let size = block.median_font_size();
                block.heading_level = Some(closest_band_level(&bands, size));
            }
        }
    }
}

/// Greedy merge of descending sizes into at most [`MAX_BANDS`] band
/// centers (band means, descending).
fn build_bands(sizes: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = sizes.to_vec();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let mut bands: Vec<Vec<f64>> = Vec::new();
    for &size in &sorted {
        let bands_len = bands.len();
        match bands.last_mut() {
            Some(band) if band[0] / size <= BAND_MERGE_RATIO || bands_len == MAX_BANDS => {
                band.push(size);
            },
            _ => bands.push(vec![size]),
        }
    }
    bands
        .iter()
        .map(|band| band.iter().sum::<f64>() / band.len() as f64)
        .collect()
}

/// Level (1-based) of the band whose center is nearest in log-ratio.
fn closest_band_level(bands: &[f64], size: f64) -> u8 {
    let mut best = 0usize;
    let mut best_dist = f64::INFINITY;
    for (i, &center) in bands.iter().enumerate() {
        let dist = (size / center).ln().abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    ((best + 1).min(6)) as u8
}
