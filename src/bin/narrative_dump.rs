//! Narrative index dumper
//!
//! Reads a JSON page dump (an array of decoded pages: viewport dimensions
//! plus text items with affine transforms), runs the full analysis
//! pipeline, and prints either a human-readable summary or the serialized
//! narrative index.
//!
//! Usage:
//!   narrative_dump <pages.json> [--json]

use std::env;
use std::fs;
use std::process;

use pdf_narrative::decode::{DecodedPage, DefaultTokenizer, MemoryDecoder};
use pdf_narrative::pipeline::NarrativeAnalyzer;
use pdf_narrative::Result;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <pages.json> [--json]", args[0]);
        process::exit(2);
    }
    let as_json = args.iter().any(|a| a == "--json");

    if let Err(err) = run(&args[1], as_json) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}

fn run(path: &str, as_json: bool) -> Result<()> {
    let raw = fs::read_to_string(path)?;
    let pages: Vec<DecodedPage> = serde_json::from_str(&raw)?;
    let mut decoder = MemoryDecoder::new(pages);

    let index = NarrativeAnalyzer::new().analyze(&mut decoder, &DefaultTokenizer);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&index)?);
        return Ok(());
    }

    println!("pages:     {}", index.page_count());
    println!("tokens:    {}", index.tokens.len());
    println!("scholarly: {}", index.is_likely_scholarly);
    if let Some(refs) = index.references_hard_stop_token_index {
        println!("references hard stop at token {}", refs);
    }
    println!();
    for record in &index.exclusions {
        println!(
            "excluded p{} c{} b{} [{}] {:.60}",
            record.page_index,
            record.column_index,
            record.block_index,
            record.reason,
            record.text_preview
        );
    }
    println!();
    println!("{}", index.full_text);
    Ok(())
}
