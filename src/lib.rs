// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # PDF Narrative
//!
//! Deterministic PDF-to-narrative layout analysis. Given per-page text
//! items with geometry (position, size, rotation) from an external PDF
//! decoder, the pipeline produces a structurally filtered narrative: a flat
//! token stream annotated so that a word-serial reader and a
//! selection/anchor layer can navigate by page/column/block and round-trip
//! between tokens and geometry.
//!
//! ## Pipeline
//!
//! - **Extract** — normalize decoded glyph runs to top-left [0,1] space
//! - **Lines** — group items into lines by y-midpoint tolerance
//! - **Columns** — infer up to two columns per page from line left edges
//! - **Chrome** — exclude repeated headers/footers, edge chrome, margin
//!   decorations, rotated watermarks
//! - **Blocks** — segment lines into blocks; classify tables, figures,
//!   equations, headings, lists, paragraphs
//! - **Captions / Journal / Headings** — caption tagging, scholarly
//!   front/back matter and references hard stop, heading levels
//! - **Flatten** — narrative text, tokens, per-token block metadata
//! - **Anchors & selection** — stable anchors and point-to-token hit tests
//!
//! All classification is layout-only: no vocabulary lists, no publisher
//! templates, no language-specific matching, so the pipeline behaves
//! identically across languages and renderers.
//!
//! ## Quick start
//!
//! ```
//! use pdf_narrative::decode::{DecodedPage, DefaultTokenizer, MemoryDecoder, RawTextItem};
//! use pdf_narrative::pipeline::NarrativeAnalyzer;
//!
//! let page = DecodedPage {
//!     width: 600.0,
//!     height: 800.0,
//!     items: vec![RawTextItem {
//!         str: "Hello narrative world".to_string(),
//!         transform: [10.0, 0.0, 0.0, 10.0, 60.0, 400.0],
//!         width: 150.0,
//!         height: 10.0,
//!     }],
//! };
//! let mut decoder = MemoryDecoder::new(vec![page]);
//! let index = NarrativeAnalyzer::new().analyze(&mut decoder, &DefaultTokenizer);
//! assert_eq!(index.page_count(), 1);
//! assert!(index.full_text.contains("Hello"));
//! ```

pub mod config;
pub mod decode;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod layout;
pub mod narrative;
pub mod pipeline;
pub mod text;

// Re-export main types
pub use config::AnalysisConfig;
pub use error::{Error, Result};
pub use layout::{Block, BlockKind, Column, ExcludeReason, Line, Page, TokenRange};
pub use narrative::anchors::{create_anchor, resolve_anchor, Anchor};
pub use narrative::selection::{
    hit_test_point, resolve_selection_text, selection_from_point, selection_from_rect,
    SelectionContext,
};
pub use narrative::{ColumnTokenRange, ExclusionRecord, NarrativeIndex, TokenMeta};
pub use pipeline::NarrativeAnalyzer;
