//! Column inference from line geometry.
//!
//! Infers at most one vertical boundary (two columns) per page from the
//! distribution of line left edges. Two strategies run in order and the
//! first success wins:
//!
//! 1. a dominant gap in the left-edge distribution;
//! 2. a deterministic 1-D 2-means split as fallback.
//!
//! If neither applies the page is a single column spanning [0,1].
//! Three-column layouts degrade to one or two columns; block-level
//! figure/table exclusion absorbs the rest.

use crate::layout::clustering::two_means_1d;
use crate::layout::{Column, Line};

/// Minimum line width for a line to vote on column structure.
const BODY_LINE_MIN_WIDTH: f64 = 0.25;
/// Vertical band whose lines vote on column structure.
const BODY_BAND: (f64, f64) = (0.08, 0.92);

/// Gap strategy: required left-edge gap as a fraction of page width.
const GAP_MIN: f64 = 0.12;
/// Gap strategy: required lines on each side of the gap.
const GAP_MIN_SIDE: usize = 10;

/// 2-means strategy: required members per cluster.
const KMEANS_MIN_MEMBERS: usize = 12;
/// 2-means strategy: required center separation.
const KMEANS_MIN_SEPARATION: f64 = 0.18;
/// 2-means strategy: a real gap this wide between clusters moves the split
/// to the gap midpoint.
const KMEANS_TRUE_GAP: f64 = 0.05;

/// Infer columns for a page and assign every line to one.
///
/// Always returns at least one column. Lines are assigned by x-midpoint;
/// lines outside every assignment interval snap to the nearest column
/// center. Lines within each column come out sorted by (yMid, x0).
pub fn infer_columns(lines: Vec<Line>) -> Vec<Column> {
    let body_x0s: Vec<f64> = lines
        .iter()
        .filter(|l| {
            l.bbox.width() >= BODY_LINE_MIN_WIDTH
                && l.y_mid > BODY_BAND.0
                && l.y_mid < BODY_BAND.1
        })
        .map(|l| l.bbox.x0)
        .collect();

    let boundary = split_by_gap(&body_x0s).or_else(|| split_by_two_means(&body_x0s));

    let intervals: Vec<(f64, f64)> = match boundary {
        Some(b) => {
            log::debug!("column boundary at {:.3}", b);
            vec![(0.0, b), (b, 1.0)]
        },
        None => vec![(0.0, 1.0)],
    };

    let mut columns: Vec<Column> = intervals
        .iter()
        .enumerate()
        .map(|(i, &(x_start, x_end))| Column {
            column_index: i,
            x_start,
            x_end,
            lines: Vec::new(),
        })
        .collect();

    for line in lines {
        let x_mid = line.bbox.x_mid();
        let inside = columns
            .iter()
            .position(|c| x_mid >= c.x_start && x_mid < c.x_end)
            .or_else(|| {
                // x_mid == 1.0 lands past the half-open last interval.
                if x_mid >= columns[columns.len() - 1].x_start {
                    Some(columns.len() - 1)
                } else {
                    None
                }
            });
        let target = match inside {
            Some(i) => i,
            None => nearest_column_center(&columns, x_mid),
        };
        columns[target].lines.push(line);
    }

    for col in &mut columns {
        col.lines.sort_by(|a, b| {
            (a.y_mid, a.bbox.x0)
                .partial_cmp(&(b.y_mid, b.bbox.x0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    columns
}

/// Index of the column whose center is nearest to `x`.
fn nearest_column_center(columns: &[Column], x: f64) -> usize {
    let mut best = 0usize;
    let mut best_dist = f64::INFINITY;
    for (i, col) in columns.iter().enumerate() {
        let center = (col.x_start + col.x_end) / 2.0;
        let dist = (x - center).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

/// Strategy 1: largest gap in the sorted left-edge distribution.
fn split_by_gap(x0s: &[f64]) -> Option<f64> {
    if x0s.len() < GAP_MIN_SIDE * 2 {
        return None;
    }
    let mut sorted: Vec<f64> = x0s.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut best_gap = 0.0;
    let mut best_idx = 0usize;
    for i in 1..sorted.len() {
        let gap = sorted[i] - sorted[i - 1];
        if gap > best_gap {
            best_gap = gap;
            best_idx = i;
        }
    }

    let left = best_idx;
    let right = sorted.len() - best_idx;
    if best_gap >= GAP_MIN && left >= GAP_MIN_SIDE && right >= GAP_MIN_SIDE {
        let boundary = (sorted[best_idx - 1] + sorted[best_idx]) / 2.0;
        log::debug!(
            "left-edge gap split: gap={:.3}, sides={}/{}",
            best_gap,
            left,
            right
        );
        Some(boundary)
    } else {
        None
    }
}

/// Strategy 2: deterministic 1-D 2-means over left edges.
fn split_by_two_means(x0s: &[f64]) -> Option<f64> {
    let tm = two_means_1d(x0s)?;
    if tm.n1 < KMEANS_MIN_MEMBERS || tm.n2 < KMEANS_MIN_MEMBERS {
        return None;
    }
    if tm.c2 - tm.c1 < KMEANS_MIN_SEPARATION {
        return None;
    }
    let boundary = if tm.min2 - tm.max1 >= KMEANS_TRUE_GAP {
        (tm.max1 + tm.min2) / 2.0
    } else {
        (tm.c1 + tm.c2) / 2.0
    };
    log::debug!(
        "2-means split: c1={:.3} c2={:.3} n1={} n2={}",
        tm.c1,
        tm.c2,
        tm.n1,
        tm.n2
    );
    Some(boundary)
}
