//! Error types for the narrative analysis pipeline.
//!
//! Most failures in this crate are deliberately non-fatal: a page that fails
//! to decode is replaced by an empty page with the same index so that all
//! downstream indices stay stable, and an empty document produces an empty
//! index rather than an error.

/// Result type alias for narrative analysis operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during narrative analysis.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Page decode failure reported by the external decoder.
    ///
    /// The pipeline catches this per page and substitutes an empty page;
    /// it only surfaces through this type when a caller decodes pages
    /// directly.
    #[error("Failed to decode page {page}: {reason}")]
    Decode {
        /// Zero-based page index
        page: usize,
        /// Reason reported by the decoder
        reason: String,
    },

    /// Non-finite geometry received from the decoder.
    ///
    /// Normally coerced to zero and clamped rather than raised; present for
    /// callers that want strict validation.
    #[error("Invalid geometry on page {page}: {detail}")]
    InvalidGeometry {
        /// Zero-based page index
        page: usize,
        /// What was non-finite
        detail: String,
    },

    /// No decoder was supplied.
    #[error("No page decoder available")]
    MissingDecoder,

    /// IO error (JSON dump loading in the CLI).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_message() {
        let err = Error::Decode {
            page: 3,
            reason: "truncated stream".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("page 3"));
        assert!(msg.contains("truncated stream"));
    }

    #[test]
    fn test_invalid_geometry_message() {
        let err = Error::InvalidGeometry {
            page: 0,
            detail: "transform[4] is NaN".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("page 0"));
        assert!(msg.contains("NaN"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
