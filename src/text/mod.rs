//! Text normalization for repetition analysis and token anchoring.
//!
//! Two normalizations are shared across stages:
//!
//! - the *repetition signature* collapses a line to a form stable across
//!   pages (page numbers become `#`), used to detect repeated headers and
//!   footers and to fingerprint blocks for anchors;
//! - the *token key* trims a token down to its letter/digit core for
//!   position-independent matching.
//!
//! Both are Unicode-aware and language-independent.

/// Normalize text into a repetition signature.
///
/// Lowercases, collapses whitespace runs to single spaces, replaces digit
/// runs with `#`, and strips everything that is not a letter, digit, `#`,
/// or space. Page headers like "Journal of Examples · 14" and
/// "Journal of Examples · 15" normalize to the same signature.
///
/// # Examples
///
/// ```
/// use pdf_narrative::text::repetition_signature;
///
/// assert_eq!(repetition_signature("Page  12 of 30"), "page # of #");
/// assert_eq!(
///     repetition_signature("Journal · 2024"),
///     repetition_signature("Journal · 1999"),
/// );
/// ```
pub fn repetition_signature(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_digits = false;
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_numeric() {
            if !in_digits {
                out.push('#');
                in_digits = true;
            }
            in_space = false;
            continue;
        }
        in_digits = false;
        if ch.is_whitespace() {
            if !in_space && !out.is_empty() {
                out.push(' ');
                in_space = true;
            }
            continue;
        }
        in_space = false;
        if ch.is_alphabetic() {
            for lc in ch.to_lowercase() {
                out.push(lc);
            }
        }
        // Everything else (punctuation, symbols) is stripped.
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Normalize a token into its anchor key.
///
/// Trims leading and trailing non-letter/non-digit characters
/// (Unicode-aware) and lowercases the rest. Returns an empty string for
/// punctuation-only tokens.
///
/// # Examples
///
/// ```
/// use pdf_narrative::text::token_key;
///
/// assert_eq!(token_key("(Hello,"), "hello");
/// assert_eq!(token_key("WORLD!"), "world");
/// assert_eq!(token_key("--"), "");
/// assert_eq!(token_key("état."), "état");
/// ```
pub fn token_key(token: &str) -> String {
    let trimmed = token.trim_matches(|c: char| !c.is_alphanumeric());
    trimmed.to_lowercase()
}

/// Block signature used by anchors: a quantized position bucket plus a
/// prefix of the block text's repetition signature.
///
/// The format is `"{round(x0·100)}:{round(y0·100)}:{sig[..60]}"`.
pub fn block_signature(x0: f64, y0: f64, text: &str) -> String {
    let sig = repetition_signature(text);
    let prefix: String = sig.chars().take(60).collect();
    format!("{}:{}:{}", (x0 * 100.0).round() as i64, (y0 * 100.0).round() as i64, prefix)
}

/// Longest common prefix length of two strings, in characters.
pub fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_digit_runs_collapse() {
        assert_eq!(repetition_signature("vol 12, no 345"), "vol # no #");
    }

    #[test]
    fn test_signature_whitespace_collapse() {
        assert_eq!(repetition_signature("  a \t b  "), "a b");
    }

    #[test]
    fn test_signature_strips_punctuation() {
        assert_eq!(repetition_signature("Hello, World!"), "hello world");
    }

    #[test]
    fn test_signature_unicode() {
        assert_eq!(repetition_signature("Überschrift 3"), "überschrift #");
    }

    #[test]
    fn test_token_key_trims_and_lowercases() {
        assert_eq!(token_key("\u{201c}Quoted\u{201d}"), "quoted");
        assert_eq!(token_key("123"), "123");
        assert_eq!(token_key("…"), "");
    }

    #[test]
    fn test_token_key_keeps_interior_punctuation() {
        assert_eq!(token_key("don't"), "don't");
        assert_eq!(token_key("(e.g.)"), "e.g");
    }

    #[test]
    fn test_block_signature_format() {
        let sig = block_signature(0.124, 0.508, "Results 42");
        assert_eq!(sig, "12:51:results #");
    }

    #[test]
    fn test_block_signature_prefix_cap() {
        let long = "word ".repeat(40);
        let sig = block_signature(0.0, 0.0, &long);
        let text_part = sig.splitn(3, ':').nth(2).unwrap();
        assert_eq!(text_part.chars().count(), 60);
    }

    #[test]
    fn test_common_prefix_len() {
        assert_eq!(common_prefix_len("abcde", "abcxy"), 3);
        assert_eq!(common_prefix_len("", "abc"), 0);
        assert_eq!(common_prefix_len("same", "same"), 4);
    }
}
