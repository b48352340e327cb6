//! Block segmentation and structural classification.
//!
//! Within one column, consecutive lines are accumulated into blocks until a
//! layout discontinuity (gap, font jump, indent change) splits them. Each
//! block is then classified structurally, in a fixed order that puts the
//! exclusion classes first: table internals, figure internals and display
//! equations are decided before heading/list/paragraph, because a table row
//! can masquerade as a short centered line.
//!
//! Classification is purely geometric. Confidence scoring demotes blocks
//! whose layout evidence stays ambiguous.

use crate::layout::clustering::{median, percentile, single_link_1d};
use crate::layout::{Block, BlockKind, Column, ExcludeReason, Line};

/// Tolerance for "sits at the body left edge".
const AT_LEFT_TOL: f64 = 0.012;

/// Tight and loose cutoffs for table cell clustering.
const CELL_TIGHT: f64 = 0.04;
const CELL_LOOSE: f64 = 0.055;

/// Confidence below which an included block is demoted.
const DEMOTION_THRESHOLD: f64 = 0.60;

/// Fixed confidences for exclusion classes.
const EQUATION_CONFIDENCE: f64 = 0.80;
const EXCLUDED_CONFIDENCE: f64 = 0.95;

/// Layout statistics of one column, measured after line-level filtering.
#[derive(Debug, Clone)]
pub struct ColumnStats {
    /// Median positive inter-line gap, floored at 0.005
    pub median_line_gap: f64,
    /// Median left edge of body-font lines
    pub body_left_x: f64,
    /// Median line width
    pub body_width: f64,
    /// Median first-line paragraph indent (0 when not established)
    pub para_indent: f64,
    /// Content left edge of the column
    pub content_x0: f64,
    /// Content width of the column
    pub content_width: f64,
}

impl ColumnStats {
    /// Measure a column's layout statistics.
    pub fn measure(col: &Column, body_font_size: f64) -> Self {
        let lines = &col.lines;

        let mut gaps = Vec::new();
        for pair in lines.windows(2) {
            let gap = pair[1].bbox.y0 - pair[0].bbox.y1;
            if gap > 0.0 {
                gaps.push(gap);
            }
        }
        let median_line_gap = median(&gaps).max(0.005);

        let body_x0s: Vec<f64> = lines
            .iter()
            .filter(|l| {
                l.font_size >= body_font_size * 0.85 && l.font_size <= body_font_size * 1.15
            })
            .map(|l| l.bbox.x0)
            .collect();
        let body_left_x = if body_x0s.is_empty() {
            median(&lines.iter().map(|l| l.bbox.x0).collect::<Vec<_>>())
        } else {
            median(&body_x0s)
        };

        let body_width = median(&lines.iter().map(|l| l.bbox.width()).collect::<Vec<_>>());

        let indents: Vec<f64> = lines
            .iter()
            .map(|l| l.bbox.x0 - body_left_x)
            .filter(|&d| d > 0.012 && d < 0.10)
            .collect();
        let para_indent = if indents.len() >= 8 { median(&indents) } else { 0.0 };

        let (content_x0, content_x1) = col.content_x_range();

        Self {
            median_line_gap,
            body_left_x,
            body_width,
            para_indent,
            content_x0,
            content_width: (content_x1 - content_x0).max(1e-6),
        }
    }

    fn content_x_mid(&self) -> f64 {
        self.content_x0 + self.content_width / 2.0
    }

    fn centered_tol(&self) -> f64 {
        (self.content_width * 0.08).max(0.03)
    }
}

/// Segment a column's lines into classified blocks.
pub fn segment_column(
    page_index: usize,
    body_font_size: f64,
    col: &Column,
) -> Vec<Block> {
    if col.lines.is_empty() {
        return Vec::new();
    }
    let stats = ColumnStats::measure(col, body_font_size);

    let mut groups: Vec<Vec<Line>> = Vec::new();
    let mut current: Vec<Line> = Vec::new();
    for line in &col.lines {
        if let Some(prev) = current.last() {
            if should_split(prev, line, &stats, body_font_size) {
                groups.push(std::mem::take(&mut current));
            }
        }
        current.push(line.clone());
    }
    if !current.is_empty() {
        groups.push(current);
    }

    groups
        .into_iter()
        .map(|lines| classify_block(page_index, col.column_index, body_font_size, &stats, lines))
        .collect()
}

/// Decide whether `line` starts a new block after `prev`.
fn should_split(prev: &Line, line: &Line, stats: &ColumnStats, body_font_size: f64) -> bool {
    let gap = line.bbox.y0 - prev.bbox.y1;

    // Gap.
    if gap > (stats.median_line_gap * 1.25).max(0.010) {
        return true;
    }

    // Font jump.
    if (line.font_size - prev.font_size).abs() > (body_font_size * 0.22).max(0.8) {
        return true;
    }

    // First-line paragraph indent.
    if stats.para_indent > 0.0 {
        let indent = line.bbox.x0 - stats.body_left_x;
        let prev_at_left = (prev.bbox.x0 - stats.body_left_x).abs() <= AT_LEFT_TOL;
        if indent > (stats.para_indent * 0.6).max(0.018) && prev_at_left {
            return true;
        }
    }

    // Short last line followed by a fresh left-aligned line.
    let prev_short = prev.bbox.width() < (stats.body_width * 0.78).max(0.18);
    let line_at_left = (line.bbox.x0 - stats.body_left_x).abs() <= AT_LEFT_TOL;
    if prev_short && line_at_left && gap >= (stats.median_line_gap * 0.75).max(0.006) {
        return true;
    }

    // Indent shift.
    if (line.bbox.x0 - prev.bbox.x0).abs() > 0.06 {
        return true;
    }

    false
}

/// X-midpoints used for table cell clustering, falling back to the line's
/// precomputed cluster centers when items are unavailable.
fn cell_inputs(line: &Line) -> Vec<f64> {
    if line.items.is_empty() {
        line.cell_xs.clone()
    } else {
        line.item_x_mids()
    }
}

/// Classify one group of lines into a block.
fn classify_block(
    page_index: usize,
    column_index: usize,
    body_font_size: f64,
    stats: &ColumnStats,
    lines: Vec<Line>,
) -> Block {
    let heading = is_heading_like(&lines, body_font_size);
    let list = is_list_like(&lines);

    let kind;
    let mut exclude = None;
    if is_tabular(&lines) {
        kind = BlockKind::TableInternal;
        exclude = Some(ExcludeReason::TableInternal);
    } else if is_figure_internal(&lines, stats, body_font_size) {
        kind = BlockKind::FigureInternal;
        exclude = Some(ExcludeReason::FigureInternal);
    } else if !heading && !list && is_display_equation(&lines, stats, body_font_size) {
        kind = BlockKind::DisplayEquation;
        exclude = Some(ExcludeReason::DisplayEquation);
    } else if heading {
        kind = BlockKind::Heading;
    } else if list {
        kind = BlockKind::ListItem;
    } else {
        kind = BlockKind::Paragraph;
    }

    let mut block = Block::from_lines(page_index, column_index, kind, lines);
    match exclude {
        Some(reason) => {
            block.exclude(reason);
            block.confidence = if reason == ExcludeReason::DisplayEquation {
                EQUATION_CONFIDENCE
            } else {
                EXCLUDED_CONFIDENCE
            };
        },
        None => {
            block.confidence = score_confidence(&block, stats, body_font_size);
            if block.confidence < DEMOTION_THRESHOLD {
                log::debug!(
                    "demoting ambiguous block on page {} (confidence {:.2}): {:.40}",
                    page_index,
                    block.confidence,
                    block.text
                );
                block.kind = BlockKind::MarginDecorative;
                block.exclude(ExcludeReason::AmbiguousNonNarrative);
            }
        },
    }
    block
}

/// Table-internal test: strong multi-cell structure with cross-line
/// column alignment.
fn is_tabular(lines: &[Line]) -> bool {
    let n = lines.len();
    if n < 3 {
        return false;
    }

    let loose: Vec<Vec<f64>> = lines
        .iter()
        .map(|l| single_link_1d(&cell_inputs(l), CELL_LOOSE))
        .collect();
    let tight: Vec<Vec<f64>> = lines
        .iter()
        .map(|l| single_link_1d(&cell_inputs(l), CELL_TIGHT))
        .collect();

    // Variant A: at least half the lines show >= 3 loose cells, and the
    // cell positions agree across the leading lines.
    let loose_rows: Vec<&Vec<f64>> = loose.iter().filter(|c| c.len() >= 3).collect();
    let need_a = 3.max((n as f64 * 0.5).ceil() as usize);
    if loose_rows.len() >= need_a && aligned_rows(&loose_rows, 6, 0.05, 2) >= 2 {
        return true;
    }

    // Variant B: most lines show >= 2 tight cells whose first/last
    // positions repeat down the block.
    let tight_rows: Vec<&Vec<f64>> = tight.iter().filter(|c| c.len() >= 2).collect();
    let need_b = 4.max((n as f64 * 0.7).ceil() as usize);
    if tight_rows.len() >= need_b && first_last_aligned(&tight_rows, 8, 0.06) >= 2 {
        return true;
    }

    false
}

/// Count rows (among the first `limit`) with at least `min_shared` cell
/// centers matching the first row's centers within `tol`.
fn aligned_rows(rows: &[&Vec<f64>], limit: usize, tol: f64, min_shared: usize) -> usize {
    let Some(reference) = rows.first() else {
        return 0;
    };
    rows.iter()
        .take(limit)
        .filter(|row| {
            let shared = row
                .iter()
                .filter(|&&x| reference.iter().any(|&r| (x - r).abs() <= tol))
                .count();
            shared >= min_shared
        })
        .count()
}

/// Count rows (among the first `limit`) whose first and last cell centers
/// match the first row's within `tol`.
fn first_last_aligned(rows: &[&Vec<f64>], limit: usize, tol: f64) -> usize {
    let Some(reference) = rows.first() else {
        return 0;
    };
    let (rf, rl) = (reference[0], reference[reference.len() - 1]);
    rows.iter()
        .take(limit)
        .filter(|row| {
            (row[0] - rf).abs() <= tol && (row[row.len() - 1] - rl).abs() <= tol
        })
        .count()
}

/// Figure-internal test: many short scattered lines, little left
/// alignment, wide x-spread or small font.
fn is_figure_internal(lines: &[Line], stats: &ColumnStats, body_font_size: f64) -> bool {
    let n = lines.len();
    if n < 3 {
        return false;
    }

    let short_cutoff = (stats.content_width * 0.35).max(0.12);
    let short = lines.iter().filter(|l| l.bbox.width() < short_cutoff).count();
    if short < 3.max((n as f64 * 0.6).ceil() as usize) {
        return false;
    }

    let left_aligned = lines
        .iter()
        .filter(|l| (l.bbox.x0 - stats.content_x0).abs() <= 0.02)
        .count();
    if left_aligned * 2 >= n {
        return false;
    }

    let x0s: Vec<f64> = lines.iter().map(|l| l.bbox.x0).collect();
    let spread = percentile(&x0s, 90.0) - percentile(&x0s, 10.0);
    let font = median(&lines.iter().map(|l| l.font_size).collect::<Vec<_>>());
    spread >= 0.10 || font <= body_font_size * 0.82
}

/// Display-equation test: centered, narrower than the column, near body
/// font. Single-line blocks face a stricter width cap.
fn is_display_equation(lines: &[Line], stats: &ColumnStats, body_font_size: f64) -> bool {
    if lines.is_empty() {
        return false;
    }
    let col_mid = stats.content_x_mid();
    let tol = stats.centered_tol();
    let all_centered = lines.iter().all(|l| {
        (l.bbox.x_mid() - col_mid).abs() <= tol && l.bbox.width() <= stats.content_width * 0.72
    });
    if !all_centered {
        return false;
    }
    let font = median(&lines.iter().map(|l| l.font_size).collect::<Vec<_>>());
    if font < body_font_size * 0.88 {
        return false;
    }
    if lines.len() == 1 {
        let cap = (0.55 + (stats.median_line_gap * 0.8).min(0.06)) * stats.content_width;
        return lines[0].bbox.width() <= cap;
    }
    true
}

/// Heading predicate: noticeably larger font, not a full-width run of
/// body text, short.
fn is_heading_like(lines: &[Line], body_font_size: f64) -> bool {
    if lines.is_empty() || lines.len() > 4 || body_font_size <= 0.0 {
        return false;
    }
    let font = median(&lines.iter().map(|l| l.font_size).collect::<Vec<_>>());
    let ratio = font / body_font_size;
    if ratio < 1.12 {
        return false;
    }
    let width = lines
        .iter()
        .map(|l| l.bbox.width())
        .fold(0.0_f64, f64::max);
    width < 0.92 || ratio >= 1.28
}

/// List-item predicate: hanging indent with a shorter lead line.
fn is_list_like(lines: &[Line]) -> bool {
    if lines.len() < 2 {
        return false;
    }
    let first = &lines[0];
    let rest = &lines[1..];
    let rest_x0 = median(&rest.iter().map(|l| l.bbox.x0).collect::<Vec<_>>());
    let hanging = rest_x0 - first.bbox.x0;
    if hanging < 0.02 {
        return false;
    }
    let rest_width = median(&rest.iter().map(|l| l.bbox.width()).collect::<Vec<_>>());
    first.bbox.width() < rest_width
}

/// Additive layout-confidence score for an included block.
fn score_confidence(block: &Block, stats: &ColumnStats, body_font_size: f64) -> f64 {
    let mut score: f64 = match block.kind {
        BlockKind::Heading => 0.78,
        BlockKind::ListItem => 0.74,
        _ => 0.72,
    };

    let n = block.lines.len();
    let width = block.bbox.width();
    let font = block.median_font_size();
    let ratio = if body_font_size > 0.0 { font / body_font_size } else { 1.0 };

    if n >= 2 {
        score += 0.06;
    } else {
        score -= 0.08;
    }
    if width >= stats.body_width * 0.78 {
        score += 0.05;
    }
    if width < 0.30 {
        score -= 0.06;
    }
    if (block.bbox.x0 - stats.body_left_x).abs() <= AT_LEFT_TOL {
        score += 0.04;
    }
    if (0.9..=1.15).contains(&ratio) {
        score += 0.04;
    }
    if (block.bbox.x_mid() - stats.content_x_mid()).abs() <= stats.centered_tol()
        && width <= stats.content_width * 0.72
    {
        score -= 0.05;
    }

    if block.kind == BlockKind::Heading {
        if ratio >= 1.22 {
            score += 0.05;
        }
        if ratio >= 1.35 {
            score += 0.05;
        }
        if width >= 0.92 && ratio < 1.28 {
            score -= 0.12;
        }
    }

    score.clamp(0.0, 1.0)
}
