//! Line formation from fragmented glyph runs.
//!
//! PDF decoders emit text in arbitrary-size runs: one run per word, per
//! glyph, or per kerning adjustment. This stage groups a page's items into
//! top-to-bottom lines by y-midpoint tolerance and rebuilds the visual text
//! of each line from horizontal gaps.

use crate::extract::ExtractedPage;
use crate::layout::clustering::{median, single_link_1d};
use crate::layout::Line;

/// Cutoff (fraction of page width) for intra-line cell clustering.
const CELL_CLUSTER_CUTOFF: f64 = 0.06;

/// Group a page's items into lines.
///
/// Placement is deterministic first-fit: each item joins the first existing
/// line whose running y-midpoint is within the tolerance, otherwise it
/// starts a new line. The tolerance scales with the page's body font size,
/// clamped so that extreme font sizes cannot collapse a page into one line
/// or shatter it into per-glyph lines.
///
/// Returned lines are sorted by (yMid, x0).
pub fn form_lines(page: &ExtractedPage, rotation_cutoff_rad: f64) -> Vec<Line> {
    if page.items.is_empty() {
        return Vec::new();
    }

    let y_tol = (page.body_font_size * 0.45 / page.page_height).clamp(0.001, 0.02);

    // Accumulate items into y-bands. Items are already in (y, x) order, so
    // first-fit is stable for identical inputs.
    struct Band {
        item_indices: Vec<usize>,
        y_mid_sum: f64,
    }
    let mut bands: Vec<Band> = Vec::new();
    for (idx, item) in page.items.iter().enumerate() {
        let item_y_mid = item.bbox.y_mid();
        let mut placed = false;
        for band in bands.iter_mut() {
            let band_y_mid = band.y_mid_sum / band.item_indices.len() as f64;
            if (band_y_mid - item_y_mid).abs() <= y_tol {
                band.item_indices.push(idx);
                band.y_mid_sum += item_y_mid;
                placed = true;
                break;
            }
        }
        if !placed {
            bands.push(Band {
                item_indices: vec![idx],
                y_mid_sum: item_y_mid,
            });
        }
    }

    let mut lines: Vec<Line> = bands
        .into_iter()
        .map(|band| build_line(page, &band.item_indices, rotation_cutoff_rad))
        .collect();

    lines.sort_by(|a, b| {
        (a.y_mid, a.bbox.x0)
            .partial_cmp(&(b.y_mid, b.bbox.x0))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    lines
}

/// Assemble one line from its member items.
fn build_line(page: &ExtractedPage, item_indices: &[usize], rotation_cutoff_rad: f64) -> Line {
    let mut items: Vec<_> = item_indices.iter().map(|&i| page.items[i].clone()).collect();
    items.sort_by(|a, b| {
        a.bbox
            .x0
            .partial_cmp(&b.bbox.x0)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Space insertion threshold in PDF points.
    let space_pts = (page.body_font_size * 0.33).clamp(1.5, 10.0);

    let mut text = String::new();
    let mut prev_x1: Option<f64> = None;
    for item in &items {
        if let Some(px1) = prev_x1 {
            let gap_pts = (item.bbox.x0 - px1) * page.page_width;
            if gap_pts > space_pts && !text.ends_with(' ') {
                text.push(' ');
            }
        }
        text.push_str(&item.text);
        prev_x1 = Some(item.bbox.x1.max(prev_x1.unwrap_or(f64::NEG_INFINITY)));
    }

    let bbox = items
        .iter()
        .map(|it| it.bbox)
        .reduce(|a, b| a.union(&b))
        .unwrap_or_else(crate::geometry::Rect::zero);

    let font_size = median(&items.iter().map(|it| it.font_size).collect::<Vec<_>>());
    let max_abs_rotation_rad = items
        .iter()
        .map(|it| it.rotation_rad.abs())
        .fold(0.0_f64, f64::max);
    let rotated = items
        .iter()
        .filter(|it| it.rotation_rad.abs() > rotation_cutoff_rad)
        .count();
    let rotated_fraction = rotated as f64 / items.len() as f64;

    let cell_xs = single_link_1d(
        &items.iter().map(|it| it.bbox.x_mid()).collect::<Vec<_>>(),
        CELL_CLUSTER_CUTOFF,
    );
    let approx_cell_count = cell_xs.len().max(1);

    Line {
        y_mid: bbox.y_mid(),
        text,
        bbox,
        font_size,
        max_abs_rotation_rad,
        rotated_fraction,
        approx_cell_count,
        cell_xs,
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::TextItem;
    use crate::geometry::Rect;
    use std::f64::consts::PI;

    fn item(text: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> TextItem {
        TextItem {
            text: text.to_string(),
            page_index: 0,
            font_size: 10.0,
            rotation_rad: 0.0,
            bbox: Rect::new(x0, y0, x1, y1),
        }
    }

    fn page(items: Vec<TextItem>) -> ExtractedPage {
        ExtractedPage {
            page_index: 0,
            page_width: 600.0,
            page_height: 800.0,
            body_font_size: 10.0,
            items,
        }
    }

    const CUTOFF: f64 = PI / 18.0;

    #[test]
    fn test_items_on_same_baseline_merge() {
        let p = page(vec![
            item("Hello", 0.10, 0.100, 0.20, 0.115),
            item("world", 0.21, 0.101, 0.30, 0.116),
        ]);
        let lines = form_lines(&p, CUTOFF);
        assert_eq!(lines.len(), 1);
        // 0.01 page widths = 6pt gap > space threshold (3.3pt)
        assert_eq!(lines[0].text, "Hello world");
    }

    #[test]
    fn test_tight_runs_concatenate_without_space() {
        let p = page(vec![
            item("frag", 0.10, 0.100, 0.15, 0.115),
            item("ment", 0.151, 0.100, 0.20, 0.115),
        ]);
        let lines = form_lines(&p, CUTOFF);
        assert_eq!(lines[0].text, "fragment");
    }

    #[test]
    fn test_separate_baselines_make_separate_lines() {
        let p = page(vec![
            item("first", 0.10, 0.100, 0.30, 0.115),
            item("second", 0.10, 0.150, 0.30, 0.165),
        ]);
        let lines = form_lines(&p, CUTOFF);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "first");
        assert_eq!(lines[1].text, "second");
    }

    #[test]
    fn test_lines_sorted_top_to_bottom() {
        let p = page(vec![
            item("low", 0.10, 0.500, 0.30, 0.515),
            item("high", 0.10, 0.100, 0.30, 0.115),
        ]);
        let lines = form_lines(&p, CUTOFF);
        assert_eq!(lines[0].text, "high");
        assert_eq!(lines[1].text, "low");
    }

    #[test]
    fn test_cell_clustering_counts_table_cells() {
        // Four items in two widely separated pairs: two cells.
        let p = page(vec![
            item("a", 0.10, 0.100, 0.12, 0.115),
            item("b", 0.13, 0.100, 0.15, 0.115),
            item("c", 0.60, 0.100, 0.62, 0.115),
            item("d", 0.63, 0.100, 0.65, 0.115),
        ]);
        let lines = form_lines(&p, CUTOFF);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].approx_cell_count, 2);
        assert_eq!(lines[0].cell_xs.len(), 2);
    }

    #[test]
    fn test_rotated_fraction() {
        let mut rotated = item("w", 0.40, 0.400, 0.60, 0.430);
        rotated.rotation_rad = PI / 4.0;
        let p = page(vec![item("n", 0.10, 0.400, 0.30, 0.415), rotated]);
        let lines = form_lines(&p, CUTOFF);
        assert_eq!(lines.len(), 1);
        assert!((lines[0].rotated_fraction - 0.5).abs() < 1e-9);
        assert!((lines[0].max_abs_rotation_rad - PI / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_page() {
        let p = page(vec![]);
        assert!(form_lines(&p, CUTOFF).is_empty());
    }

    #[test]
    fn test_line_font_size_is_median() {
        let mut a = item("a", 0.10, 0.100, 0.20, 0.115);
        a.font_size = 8.0;
        let mut b = item("b", 0.30, 0.100, 0.40, 0.115);
        b.font_size = 10.0;
        let mut c = item("c", 0.50, 0.100, 0.60, 0.115);
        c.font_size = 30.0;
        let p = page(vec![a, b, c]);
        let lines = form_lines(&p, CUTOFF);
        assert!((lines[0].font_size - 10.0).abs() < 1e-9);
    }
}
