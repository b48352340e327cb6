//! Layout analysis for narrative extraction.
//!
//! This module holds the shared layout model (lines, columns, blocks) and
//! the pipeline stages that build it:
//! - line formation from fragmented glyph runs
//! - column inference per page
//! - line-level page chrome exclusions
//! - block segmentation and structural classification
//! - caption tagging, journal constraints, heading levels
//!
//! Every stage is deterministic and layout-only: no vocabulary lists, no
//! publisher templates, no language-specific matching.

use serde::{Deserialize, Serialize};

use crate::extract::TextItem;
use crate::geometry::Rect;

pub mod blocks;
pub mod captions;
pub mod chrome;
pub mod clustering;
pub mod columns;
pub mod headings;
pub mod journal;
pub mod lines;

/// A horizontal group of items sharing a y-midpoint band.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    /// Items ordered by left edge. Not serialized; later stages only need
    /// the precomputed per-line statistics.
    #[serde(skip)]
    pub items: Vec<TextItem>,
    /// Merged text with gap-derived spaces
    pub text: String,
    /// Bounding box over all items
    pub bbox: Rect,
    /// Vertical midpoint used for ordering
    pub y_mid: f64,
    /// Median of item font sizes
    pub font_size: f64,
    /// Maximum absolute item rotation
    pub max_abs_rotation_rad: f64,
    /// Fraction of items rotated beyond the cutoff
    pub rotated_fraction: f64,
    /// Number of intra-line x clusters (at least 1)
    pub approx_cell_count: usize,
    /// X-centers of the intra-line clusters, used for table detection
    pub cell_xs: Vec<f64>,
}

impl Line {
    /// X-midpoints of the member items (for table-cell re-clustering).
    pub fn item_x_mids(&self) -> Vec<f64> {
        self.items.iter().map(|it| it.bbox.x_mid()).collect()
    }
}

/// A vertical slab on a page with the lines assigned to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Index within the page, left to right
    pub column_index: usize,
    /// Left edge of the assignment interval
    pub x_start: f64,
    /// Right edge of the assignment interval
    pub x_end: f64,
    /// Lines assigned to this column, sorted by (yMid, x0)
    pub lines: Vec<Line>,
}

impl Column {
    /// Content x-range: the span actually occupied by this column's lines.
    ///
    /// The assignment intervals always tile [0,1], so tests against "the
    /// column" (margin decorations, centering) use the occupied span
    /// instead.
    pub fn content_x_range(&self) -> (f64, f64) {
        let mut x0 = f64::INFINITY;
        let mut x1 = f64::NEG_INFINITY;
        for line in &self.lines {
            x0 = x0.min(line.bbox.x0);
            x1 = x1.max(line.bbox.x1);
        }
        if x0.is_finite() && x1.is_finite() {
            (x0, x1)
        } else {
            (self.x_start, self.x_end)
        }
    }
}

/// Structural classification of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// Body paragraph
    Paragraph,
    /// Section heading
    Heading,
    /// List item with a hanging indent
    ListItem,
    /// Short narrative block adjacent to an excluded figure region
    FigureCaption,
    /// Short narrative block adjacent to an excluded table region
    TableCaption,
    /// Equation carried inline with body text (reserved; the structural
    /// classifier folds these into paragraphs)
    InlineEquation,
    /// Centered display equation (excluded)
    DisplayEquation,
    /// Figure labels, axis text, legend fragments (excluded)
    FigureInternal,
    /// Table body content (excluded)
    TableInternal,
    /// Repeated page header or footer (excluded)
    HeaderFooter,
    /// Margin decoration or ambiguous non-narrative content (excluded)
    MarginDecorative,
}

/// Why a block was excluded from the narrative.
///
/// The string forms are stable across versions; external consumers key on
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExcludeReason {
    /// Repeated page chrome
    #[serde(rename = "HEADER_FOOTER")]
    HeaderFooter,
    /// Margin decoration
    #[serde(rename = "MARGIN_DECORATIVE")]
    MarginDecorative,
    /// Rotated line or watermark
    #[serde(rename = "ROTATED_OR_WATERMARK")]
    RotatedOrWatermark,
    /// Centered display equation
    #[serde(rename = "DISPLAY_EQUATION")]
    DisplayEquation,
    /// Table body content
    #[serde(rename = "TABLE_INTERNAL")]
    TableInternal,
    /// Figure-internal text
    #[serde(rename = "FIGURE_INTERNAL")]
    FigureInternal,
    /// Scholarly front matter before the first body paragraph
    #[serde(rename = "JOURNAL_FRONT_MATTER")]
    JournalFrontMatter,
    /// Scholarly back matter between the body and the references
    #[serde(rename = "JOURNAL_BACK_MATTER")]
    JournalBackMatter,
    /// Everything from the references run onward
    #[serde(rename = "REFERENCES_HARD_STOP")]
    ReferencesHardStop,
    /// Demoted by low structural confidence
    #[serde(rename = "AMBIGUOUS_NON_NARRATIVE")]
    AmbiguousNonNarrative,
}

impl ExcludeReason {
    /// Stable string form of the reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExcludeReason::HeaderFooter => "HEADER_FOOTER",
            ExcludeReason::MarginDecorative => "MARGIN_DECORATIVE",
            ExcludeReason::RotatedOrWatermark => "ROTATED_OR_WATERMARK",
            ExcludeReason::DisplayEquation => "DISPLAY_EQUATION",
            ExcludeReason::TableInternal => "TABLE_INTERNAL",
            ExcludeReason::FigureInternal => "FIGURE_INTERNAL",
            ExcludeReason::JournalFrontMatter => "JOURNAL_FRONT_MATTER",
            ExcludeReason::JournalBackMatter => "JOURNAL_BACK_MATTER",
            ExcludeReason::ReferencesHardStop => "REFERENCES_HARD_STOP",
            ExcludeReason::AmbiguousNonNarrative => "AMBIGUOUS_NON_NARRATIVE",
        }
    }
}

impl std::fmt::Display for ExcludeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open range of token indices belonging to a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRange {
    /// First token index
    pub start: usize,
    /// One past the last token index
    pub end: usize,
}

impl TokenRange {
    /// Number of tokens in the range.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the range is empty.
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// A vertically contiguous group of lines within one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Page this block belongs to
    pub page_index: usize,
    /// Column this block belongs to
    pub column_index: usize,
    /// Index within the column, assigned top-to-bottom after all
    /// exclusions; -1 until re-indexing
    pub block_index: i32,
    /// Structural classification
    pub kind: BlockKind,
    /// Bounding box over member lines
    pub bbox: Rect,
    /// Concatenated line text
    pub text: String,
    /// Member lines
    pub lines: Vec<Line>,
    /// Whether the block contributes to the narrative
    pub included: bool,
    /// Exclusion reason when `included` is false
    pub exclude_reason: Option<ExcludeReason>,
    /// Classification confidence in [0,1]
    pub confidence: f64,
    /// Token indices owned by this block (set during flattening)
    pub token_range: Option<TokenRange>,
    /// Tokens owned by this block
    pub tokens: Vec<String>,
    /// Normalized token keys, parallel to `tokens`
    pub token_keys: Vec<String>,
    /// Heading level 1..6 for heading blocks
    pub heading_level: Option<u8>,
}

impl Block {
    /// Build an included block of the given kind over `lines`.
    pub fn from_lines(
        page_index: usize,
        column_index: usize,
        kind: BlockKind,
        lines: Vec<Line>,
    ) -> Self {
        let bbox = lines
            .iter()
            .map(|l| l.bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(Rect::zero);
        let text = lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join(" ");
        Self {
            page_index,
            column_index,
            block_index: -1,
            kind,
            bbox,
            text,
            lines,
            included: true,
            exclude_reason: None,
            confidence: 0.0,
            token_range: None,
            tokens: Vec::new(),
            token_keys: Vec::new(),
            heading_level: None,
        }
    }

    /// Mark this block excluded with the given reason.
    pub fn exclude(&mut self, reason: ExcludeReason) {
        self.included = false;
        self.exclude_reason = Some(reason);
    }

    /// Median font size over member lines.
    pub fn median_font_size(&self) -> f64 {
        clustering::median(&self.lines.iter().map(|l| l.font_size).collect::<Vec<_>>())
    }
}

/// One analyzed page: its columns and all of its blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Zero-based page index
    pub page_index: usize,
    /// Page width in PDF points
    pub page_width: f64,
    /// Page height in PDF points
    pub page_height: f64,
    /// Median of positive item font sizes
    pub body_font_size: f64,
    /// Columns inferred for this page (at least one)
    pub columns: Vec<Column>,
    /// All blocks, included and excluded, in reading order
    pub blocks: Vec<Block>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn mock_line(text: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> Line {
        Line {
            items: vec![],
            text: text.to_string(),
            bbox: Rect::new(x0, y0, x1, y1),
            y_mid: (y0 + y1) / 2.0,
            font_size: 10.0,
            max_abs_rotation_rad: 0.0,
            rotated_fraction: 0.0,
            approx_cell_count: 1,
            cell_xs: vec![(x0 + x1) / 2.0],
        }
    }

    #[test]
    fn test_block_from_lines_merges_geometry_and_text() {
        let block = Block::from_lines(
            0,
            0,
            BlockKind::Paragraph,
            vec![
                mock_line("first line", 0.1, 0.10, 0.9, 0.12),
                mock_line("second line", 0.1, 0.13, 0.7, 0.15),
            ],
        );
        assert_eq!(block.text, "first line second line");
        assert_eq!(block.bbox, Rect::new(0.1, 0.10, 0.9, 0.15));
        assert!(block.included);
        assert_eq!(block.block_index, -1);
    }

    #[test]
    fn test_exclude_sets_reason() {
        let mut block =
            Block::from_lines(0, 0, BlockKind::Paragraph, vec![mock_line("x", 0.0, 0.0, 0.1, 0.02)]);
        block.exclude(ExcludeReason::TableInternal);
        assert!(!block.included);
        assert_eq!(block.exclude_reason, Some(ExcludeReason::TableInternal));
    }

    #[test]
    fn test_exclude_reason_strings_are_stable() {
        assert_eq!(ExcludeReason::HeaderFooter.as_str(), "HEADER_FOOTER");
        assert_eq!(ExcludeReason::ReferencesHardStop.as_str(), "REFERENCES_HARD_STOP");
        assert_eq!(
            serde_json::to_string(&ExcludeReason::AmbiguousNonNarrative).unwrap(),
            "\"AMBIGUOUS_NON_NARRATIVE\""
        );
    }

    #[test]
    fn test_column_content_range_falls_back_to_interval() {
        let col = Column {
            column_index: 0,
            x_start: 0.0,
            x_end: 1.0,
            lines: vec![],
        };
        assert_eq!(col.content_x_range(), (0.0, 1.0));
    }
}
