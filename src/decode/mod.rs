//! Contracts for the external collaborators of the pipeline.
//!
//! The PDF decoder and the reader tokenizer are external systems; this
//! module defines the minimal trait seams the pipeline consumes, plus the
//! raw item model that decoders hand over.
//!
//! Coordinates in [`RawTextItem`] use the standard PDF convention: points
//! with a bottom-left origin, positions carried in the affine `transform`.
//! Normalization to top-left [0,1] space happens in [`crate::extract`].

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single glyph run as produced by a PDF text decoder.
///
/// `transform` is the standard 2-D affine matrix `[a, b, c, d, e, f]`:
/// `(a, b)` and `(c, d)` carry scale/rotation, `(e, f)` is the translation
/// (the run's position in PDF points, bottom-left origin).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTextItem {
    /// Raw text of the run
    pub str: String,
    /// Affine transform [a, b, c, d, e, f]
    pub transform: [f64; 6],
    /// Width of the run in PDF points
    pub width: f64,
    /// Height of the run in PDF points
    pub height: f64,
}

/// One decoded page: viewport dimensions and its glyph runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedPage {
    /// Page width in PDF points
    pub width: f64,
    /// Page height in PDF points
    pub height: f64,
    /// Glyph runs in content-stream order
    pub items: Vec<RawTextItem>,
}

/// The decoder contract consumed by the pipeline.
///
/// Page decoding is the only external I/O in the pipeline; pages are
/// requested strictly in page order. A failing [`PageDecoder::decode_page`]
/// is non-fatal: the pipeline substitutes an empty page with the same index.
pub trait PageDecoder {
    /// Total number of pages in the document.
    fn num_pages(&self) -> usize;

    /// Decode page `n` (zero-based) into its text items.
    fn decode_page(&mut self, n: usize) -> Result<DecodedPage>;
}

/// The tokenizer contract used to split narrative text into reader tokens.
///
/// Must be deterministic and insensitive to leading/trailing whitespace at
/// segment boundaries.
pub trait Tokenizer {
    /// Split `text` into tokens.
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Whitespace tokenizer used when no external tokenizer is supplied.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTokenizer;

impl Tokenizer for DefaultTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(|t| t.to_string()).collect()
    }
}

/// In-memory decoder over pre-decoded pages.
///
/// This is the workhorse for tests and for the JSON dump CLI: a document is
/// just a vector of [`DecodedPage`] values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryDecoder {
    /// The decoded pages, in page order
    pub pages: Vec<DecodedPage>,
}

impl MemoryDecoder {
    /// Create a decoder over the given pages.
    pub fn new(pages: Vec<DecodedPage>) -> Self {
        Self { pages }
    }
}

impl PageDecoder for MemoryDecoder {
    fn num_pages(&self) -> usize {
        self.pages.len()
    }

    fn decode_page(&mut self, n: usize) -> Result<DecodedPage> {
        self.pages
            .get(n)
            .cloned()
            .ok_or_else(|| crate::error::Error::Decode {
                page: n,
                reason: "page out of range".to_string(),
            })
    }
}
