//! Narrative index construction.
//!
//! Flattens the analyzed pages into the final consumer-facing index: one
//! narrative string, a token stream, and per-token block metadata that lets
//! a word-serial reader and a selection layer round-trip between tokens and
//! geometry.
//!
//! Ordering is the contract here: blocks are emitted page-ascending, then
//! column-ascending, then by (y0, x0, blockIndex) within the column, and
//! identical inputs always produce byte-identical output.

use serde::{Deserialize, Serialize};

use crate::decode::Tokenizer;
use crate::layout::journal::JournalOutcome;
use crate::layout::{Block, BlockKind, ExcludeReason, Page, TokenRange};
use crate::text::token_key;

pub mod anchors;
pub mod selection;

/// Block coordinates of one token; (-1,-1,-1) marks tokens that belong to
/// no block (separators, in practice none).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMeta {
    /// Page index, or -1
    pub page_index: i32,
    /// Column index, or -1
    pub column_index: i32,
    /// Block index within the column, or -1
    pub block_index: i32,
}

impl TokenMeta {
    /// Sentinel metadata for tokens outside any block.
    pub fn sentinel() -> Self {
        Self {
            page_index: -1,
            column_index: -1,
            block_index: -1,
        }
    }
}

/// One entry of the exclusion log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExclusionRecord {
    /// Page of the excluded block
    pub page_index: usize,
    /// Column of the excluded block
    pub column_index: usize,
    /// Block index within the column
    pub block_index: i32,
    /// Why it was excluded
    pub reason: ExcludeReason,
    /// First characters of the block text, for diagnostics
    pub text_preview: String,
}

/// Contiguous token range of one (page, column).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnTokenRange {
    /// Page index
    pub page_index: usize,
    /// Column index
    pub column_index: usize,
    /// Tokens emitted by this column
    pub range: TokenRange,
}

/// The narrative index: the pipeline's final product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeIndex {
    /// Analyzed pages with all blocks, included and excluded
    pub pages: Vec<Page>,
    /// Narrative text with `\n\n` between blocks
    pub full_text: String,
    /// Reader tokens in reading order
    pub tokens: Vec<String>,
    /// Block coordinates per token, parallel to `tokens`
    pub token_meta: Vec<TokenMeta>,
    /// Exclusion log in block emission order
    pub exclusions: Vec<ExclusionRecord>,
    /// Whether scholarly handling was triggered
    pub is_likely_scholarly: bool,
    /// Token cursor at the first references block, when detected
    pub references_hard_stop_token_index: Option<usize>,
    /// Global reading-order index of the first references block
    pub references_start_block_global_index: Option<usize>,
    /// Token ranges grouped by (page, column)
    pub column_token_ranges: Vec<ColumnTokenRange>,
}

impl NarrativeIndex {
    /// Number of pages in the index.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Look up a block by (page, column, block) coordinates.
    pub fn block(&self, page: usize, column: usize, block: i32) -> Option<&Block> {
        self.pages.get(page)?.blocks.iter().find(|b| {
            b.column_index == column && b.block_index == block
        })
    }

    /// The block owning token `ti`.
    pub fn block_at_token(&self, ti: usize) -> Option<&Block> {
        let meta = self.token_meta.get(ti)?;
        if meta.page_index < 0 {
            return None;
        }
        self.block(
            meta.page_index as usize,
            meta.column_index as usize,
            meta.block_index,
        )
    }

    /// An empty index (zero-page documents).
    pub fn empty() -> Self {
        Self {
            pages: Vec::new(),
            full_text: String::new(),
            tokens: Vec::new(),
            token_meta: Vec::new(),
            exclusions: Vec::new(),
            is_likely_scholarly: false,
            references_hard_stop_token_index: None,
            references_start_block_global_index: None,
            column_token_ranges: Vec::new(),
        }
    }
}

/// Sort each page's blocks into reading order and assign per-column block
/// indices.
///
/// Must run after every exclusion pass: the indices are the public
/// coordinates of the index, so they are assigned exactly once, over the
/// final block set.
pub fn assign_reading_order(pages: &mut [Page]) {
    for page in pages.iter_mut() {
        page.blocks.sort_by(|a, b| {
            (a.column_index, a.bbox.y0, a.bbox.x0)
                .partial_cmp(&(b.column_index, b.bbox.y0, b.bbox.x0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let mut counters: Vec<i32> = vec![0; page.columns.len().max(1)];
        for block in &mut page.blocks {
            let col = block.column_index.min(counters.len() - 1);
            block.block_index = counters[col];
            counters[col] += 1;
        }
    }
}

/// Flatten analyzed pages into the narrative index.
///
/// Blocks must already be in reading order with indices assigned
/// ([`assign_reading_order`]).
pub fn flatten<T: Tokenizer>(
    mut pages: Vec<Page>,
    journal: JournalOutcome,
    tokenizer: &T,
) -> NarrativeIndex {
    let mut full_text = String::new();
    let mut tokens: Vec<String> = Vec::new();
    let mut token_meta: Vec<TokenMeta> = Vec::new();
    let mut exclusions: Vec<ExclusionRecord> = Vec::new();
    let mut references_token_index: Option<usize> = None;

    for page in pages.iter_mut() {
        for block in &mut page.blocks {
            let cursor = tokens.len();

            if !block.included {
                if block.exclude_reason == Some(ExcludeReason::ReferencesHardStop)
                    && references_token_index.is_none()
                {
                    references_token_index = Some(cursor);
                }
                exclusions.push(ExclusionRecord {
                    page_index: block.page_index,
                    column_index: block.column_index,
                    block_index: block.block_index,
                    reason: block.exclude_reason.unwrap_or(ExcludeReason::AmbiguousNonNarrative),
                    text_preview: block.text.chars().take(80).collect(),
                });
                block.token_range = Some(TokenRange {
                    start: cursor,
                    end: cursor,
                });
                continue;
            }

            if block.text.trim().is_empty() {
                block.token_range = Some(TokenRange {
                    start: cursor,
                    end: cursor,
                });
                continue;
            }

            let segment = match block.kind {
                BlockKind::Heading => {
                    let level = block.heading_level.unwrap_or(3).clamp(1, 6);
                    format!("[H{}] {}", level, block.text)
                },
                _ => block.text.clone(),
            };

            if !full_text.is_empty() {
                full_text.push_str("\n\n");
            }
            full_text.push_str(&segment);

            let block_tokens = tokenizer.tokenize(&segment);
            let meta = TokenMeta {
                page_index: block.page_index as i32,
                column_index: block.column_index as i32,
                block_index: block.block_index,
            };
            for tok in &block_tokens {
                tokens.push(tok.clone());
                token_meta.push(meta);
            }

            block.token_range = Some(TokenRange {
                start: cursor,
                end: tokens.len(),
            });
            block.token_keys = block_tokens.iter().map(|t| token_key(t)).collect();
            block.tokens = block_tokens;
        }
    }

    let column_token_ranges = group_column_ranges(&token_meta);

    log::debug!(
        "flattened {} pages into {} tokens ({} exclusions)",
        pages.len(),
        tokens.len(),
        exclusions.len()
    );

    NarrativeIndex {
        pages,
        full_text,
        tokens,
        token_meta,
        exclusions,
        is_likely_scholarly: journal.is_likely_scholarly,
        references_hard_stop_token_index: references_token_index,
        references_start_block_global_index: journal.references_start_global,
        column_token_ranges,
    }
}

/// Group consecutive token metadata into per-(page, column) ranges.
fn group_column_ranges(token_meta: &[TokenMeta]) -> Vec<ColumnTokenRange> {
    let mut ranges: Vec<ColumnTokenRange> = Vec::new();
    for (i, meta) in token_meta.iter().enumerate() {
        if meta.page_index < 0 {
            continue;
        }
        match ranges.last_mut() {
            Some(last)
                if last.page_index == meta.page_index as usize
                    && last.column_index == meta.column_index as usize
                    && last.range.end == i =>
            {
                last.range.end = i + 1;
            },
            _ => ranges.push(ColumnTokenRange {
                page_index: meta.page_index as usize,
                column_index: meta.column_index as usize,
                range: TokenRange { start: i, end: i + 1 },
            }),
        }
    }
    ranges
}
