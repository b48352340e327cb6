//! The narrative analysis pipeline.
//!
//! Orchestrates the full stage sequence over a document:
//!
//! ```text
//! decoder pages
//!     ↓  extract (normalize items)
//!     ↓  lines (y-band grouping)
//!     ↓  columns (per-page inference)
//!     ↓  chrome (line-level exclusions, cross-page)
//!     ↓  blocks (segmentation + classification)
//!     ↓  captions, journal, headings
//!     ↓  flatten (tokens + metadata)
//! NarrativeIndex
//! ```
//!
//! Pages are processed strictly in page order; a page that fails to decode
//! becomes an empty page with the same index, so decode failures never
//! shift downstream indices. There is no shared mutable state between
//! invocations, and identical inputs produce byte-identical output.

use crate::config::AnalysisConfig;
use crate::decode::{PageDecoder, Tokenizer};
use crate::extract::{extract_page, ExtractedPage};
use crate::layout::chrome::{apply_line_exclusions, PageDraft};
use crate::layout::{blocks, captions, headings, journal, lines};
use crate::layout::{Block, Page};
use crate::narrative::{assign_reading_order, flatten, NarrativeIndex};

/// The main entry point: runs the full pipeline over a decoder.
pub struct NarrativeAnalyzer {
    config: AnalysisConfig,
}

impl Default for NarrativeAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl NarrativeAnalyzer {
    /// Create an analyzer with default configuration.
    pub fn new() -> Self {
        Self::with_config(AnalysisConfig::default())
    }

    /// Create an analyzer with custom configuration.
    pub fn with_config(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Analyze a document into a narrative index.
    ///
    /// Never fails: zero pages produce an empty index and per-page decode
    /// errors produce empty pages.
    pub fn analyze<D: PageDecoder, T: Tokenizer>(
        &self,
        decoder: &mut D,
        tokenizer: &T,
    ) -> NarrativeIndex {
        let page_count = decoder.num_pages().min(self.config.max_pages);
        if page_count == 0 {
            return NarrativeIndex::empty();
        }

        // Extract pages sequentially; decode failures yield empty pages.
        let extracted: Vec<ExtractedPage> = (0..page_count)
            .map(|n| match decoder.decode_page(n) {
                Ok(decoded) => extract_page(n, &decoded),
                Err(err) => {
                    log::warn!("page {} failed to decode: {}", n, err);
                    ExtractedPage::empty(n)
                },
            })
            .collect();

        // Lines and columns, per page.
        let mut drafts: Vec<PageDraft> = extracted
            .iter()
            .map(|page| {
                let page_lines = lines::form_lines(page, self.config.rotation_cutoff_rad);
                PageDraft {
                    page_index: page.page_index,
                    page_width: page.page_width,
                    page_height: page.page_height,
                    body_font_size: page.body_font_size,
                    columns: crate::layout::columns::infer_columns(page_lines),
                }
            })
            .collect();

        // Line-level exclusions need the whole document for repetition
        // analysis.
        let pseudo_blocks = apply_line_exclusions(&mut drafts, self.config.rotation_cutoff_rad);

        // Segment and classify blocks per column, then attach the chrome
        // pseudo-blocks to their pages.
        let mut pages: Vec<Page> = drafts
            .into_iter()
            .map(|draft| {
                let mut page_blocks: Vec<Block> = Vec::new();
                for col in &draft.columns {
                    page_blocks.extend(blocks::segment_column(
                        draft.page_index,
                        draft.body_font_size,
                        col,
                    ));
                }
                Page {
                    page_index: draft.page_index,
                    page_width: draft.page_width,
                    page_height: draft.page_height,
                    body_font_size: draft.body_font_size,
                    columns: draft.columns,
                    blocks: page_blocks,
                }
            })
            .collect();
        for block in pseudo_blocks {
            pages[block.page_index].blocks.push(block);
        }

        // Reading order within each page, then caption tagging per column.
        for page in &mut pages {
            page.blocks.sort_by(|a, b| {
                (a.column_index, a.bbox.y0, a.bbox.x0)
                    .partial_cmp(&(b.column_index, b.bbox.y0, b.bbox.x0))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let mut start = 0;
            while start < page.blocks.len() {
                let col = page.blocks[start].column_index;
                let end = page.blocks[start..]
                    .iter()
                    .position(|b| b.column_index != col)
                    .map(|off| start + off)
                    .unwrap_or(page.blocks.len());
                captions::tag_captions(&mut page.blocks[start..end]);
                start = end;
            }
        }

        // Document-level passes.
        let journal_outcome = journal::apply_journal_constraints(&mut pages);
        headings::assign_heading_levels(&mut pages);

        // Final indices are assigned once, over the final block set.
        assign_reading_order(&mut pages);
        flatten(pages, journal_outcome, tokenizer)
    }
}
