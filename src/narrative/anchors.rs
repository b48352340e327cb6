//! Stable anchors over the token stream.
//!
//! An anchor pins a reading position in a way that survives re-analysis of
//! the same document after minor re-flow: it records the (page, column)
//! coordinates, a quantized block signature, the token's normalized key,
//! and a few surrounding keys as context. Resolution scores candidate
//! blocks by signature similarity and candidate positions by key and
//! context agreement, and refuses to guess below a score floor.

use serde::{Deserialize, Serialize};

use crate::layout::Block;
use crate::narrative::NarrativeIndex;
use crate::text::{block_signature, common_prefix_len, token_key};

/// Offsets around the anchor token whose keys become context.
const CONTEXT_OFFSETS: [i64; 5] = [-2, -1, 1, 2, 3];
/// At most this many context keys are stored.
const CONTEXT_MAX: usize = 4;
/// Context keys are searched within this window on either side.
const CONTEXT_WINDOW: i64 = 4;
/// Minimum acceptable resolution score.
const RESOLVE_MIN_SCORE: f64 = 0.6;

/// A persistence-stable locator for one token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchor {
    /// Page the token was on
    pub page_index: usize,
    /// Column the token was in
    pub column_index: usize,
    /// Quantized block position plus normalized text prefix
    pub block_signature: String,
    /// Normalized key of the anchored token
    pub token_key: String,
    /// Non-empty keys around the token, nearest first
    pub context_keys: Vec<String>,
    /// The original token index, when known
    pub token_index: Option<usize>,
}

/// Create an anchor for token `ti`.
///
/// Returns `None` when `ti` does not belong to an included block.
pub fn create_anchor(index: &NarrativeIndex, ti: usize) -> Option<Anchor> {
    let block = index.block_at_token(ti)?;
    let range = block.token_range?;
    let local = ti.checked_sub(range.start)?;
    if local >= block.token_keys.len() {
        return None;
    }

    let key = if block.token_keys[local].is_empty() {
        token_key(&block.tokens[local])
    } else {
        block.token_keys[local].clone()
    };

    let mut context_keys = Vec::new();
    for off in CONTEXT_OFFSETS {
        if context_keys.len() >= CONTEXT_MAX {
            break;
        }
        let pos = local as i64 + off;
        if pos < 0 || pos as usize >= block.token_keys.len() {
            continue;
        }
        let ctx = &block.token_keys[pos as usize];
        if !ctx.is_empty() {
            context_keys.push(ctx.clone());
        }
    }

    Some(Anchor {
        page_index: block.page_index,
        column_index: block.column_index,
        block_signature: block_signature(block.bbox.x0, block.bbox.y0, &block.text),
        token_key: key,
        context_keys,
        token_index: Some(ti),
    })
}

/// Resolve an anchor back to a token index.
///
/// Restricts the search to included blocks on the anchor's page and
/// column, picks the block with the best signature agreement, then the
/// best-scoring position inside it. Returns `None` when nothing scores at
/// least the floor.
pub fn resolve_anchor(index: &NarrativeIndex, anchor: &Anchor) -> Option<usize> {
    let page = index.pages.get(anchor.page_index)?;

    let mut best_block: Option<&Block> = None;
    let mut best_sig = f64::NEG_INFINITY;
    for block in &page.blocks {
        if !block.included
            || block.column_index != anchor.column_index
            || block.token_range.is_none()
            || block.token_keys.is_empty()
        {
            continue;
        }
        let sig = block_signature(block.bbox.x0, block.bbox.y0, &block.text);
        let score = signature_score(&anchor.block_signature, &sig);
        if score > best_sig {
            best_sig = score;
            best_block = Some(block);
        }
    }
    let block = best_block?;
    let range = block.token_range?;

    // Ties between equally scored positions (repeated words with symmetric
    // context) break toward the anchor's original position.
    let origin_local = anchor
        .token_index
        .and_then(|ti| ti.checked_sub(range.start))
        .unwrap_or(0);
    let mut best_local: Option<usize> = None;
    let mut best_score = f64::NEG_INFINITY;
    for local in 0..block.token_keys.len() {
        let score = position_score(&block.token_keys, local, &anchor.token_key, &anchor.context_keys);
        let better = match best_local {
            None => true,
            Some(prev) => {
                score > best_score
                    || (score == best_score
                        && local.abs_diff(origin_local) < prev.abs_diff(origin_local))
            },
        };
        if better {
            best_score = score;
            best_local = Some(local);
        }
    }

    if best_score >= RESOLVE_MIN_SCORE {
        best_local.map(|l| range.start + l)
    } else {
        None
    }
}

/// Signature similarity: exact match is 1, otherwise prefix overlap.
fn signature_score(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 0.0;
    }
    common_prefix_len(a, b) as f64 / max_len as f64
}

/// Score one candidate position against the anchor's key and context.
pub(crate) fn position_score(
    keys: &[String],
    local: usize,
    token_key: &str,
    context_keys: &[String],
) -> f64 {
    let mut score = if keys[local] == token_key { 1.0 } else { 0.0 };
    for ctx in context_keys {
        let mut found = false;
        for off in 1..=CONTEXT_WINDOW {
            let before = local as i64 - off;
            let after = local as i64 + off;
            if before >= 0 && keys[before as usize] == *ctx {
                found = true;
                break;
            }
            if (after as usize) < keys.len() && keys[after as usize] == *ctx {
                found = true;
                break;
            }
        }
        score += if found { 0.25 } else { -0.05 };
    }
    score
}
