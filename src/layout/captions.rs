//! Caption tagging next to excluded figure and table regions.
//!
//! A short narrative block hugging an excluded figure or table region is
//! almost always its caption. Captions stay included; retyping them lets
//! the reader distinguish caption text from body flow.

use crate::layout::{Block, BlockKind};

/// Maximum vertical distance between a region and its caption.
const CAPTION_MAX_DISTANCE: f64 = 0.04;
/// Caption size limits.
const CAPTION_MAX_LINES: usize = 4;
const CAPTION_MAX_CHARS: usize = 300;

/// Retype caption candidates within one column's blocks.
///
/// `blocks` must belong to a single (page, column) and be sorted by
/// reading order. For each excluded figure/table region the nearest
/// qualifying included neighbor (above or below) is retyped.
pub fn tag_captions(blocks: &mut [Block]) {
    for i in 0..blocks.len() {
        let caption_kind = match blocks[i].kind {
            BlockKind::FigureInternal => BlockKind::FigureCaption,
            BlockKind::TableInternal => BlockKind::TableCaption,
            _ => continue,
        };

        let region = blocks[i].bbox;

        let prev = blocks[..i]
            .iter()
            .rposition(|b| b.included)
            .filter(|&j| qualifies(&blocks[j]))
            .map(|j| (j, (region.y0 - blocks[j].bbox.y1).max(0.0)));
        let next = blocks[i + 1..]
            .iter()
            .position(|b| b.included)
            .map(|off| i + 1 + off)
            .filter(|&j| qualifies(&blocks[j]))
            .map(|j| (j, (blocks[j].bbox.y0 - region.y1).max(0.0)));

        let chosen = match (prev, next) {
            (Some((pj, pd)), Some((nj, nd))) => {
                if pd <= nd {
                    Some((pj, pd))
                } else {
                    Some((nj, nd))
                }
            },
            (Some(p), None) => Some(p),
            (None, Some(n)) => Some(n),
            (None, None) => None,
        };

        if let Some((j, dist)) = chosen {
            if dist <= CAPTION_MAX_DISTANCE {
                blocks[j].kind = caption_kind;
            }
        }
    }
}

/// Caption candidates are short included blocks not already claimed by
/// another region.
fn qualifies(block: &Block) -> bool {
    block.included
        && !matches!(block.kind, BlockKind::FigureCaption | BlockKind::TableCaption)
        && !block.lines.is_empty()
        && block.lines.len() <= CAPTION_MAX_LINES
        && block.text.chars().count() <= CAPTION_MAX_CHARS
}
