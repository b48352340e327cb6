//! Configuration for narrative analysis.

use std::f64::consts::PI;

/// Analysis configuration.
///
/// All layout thresholds other than the two below are fixed constants in
/// their stages so that identical inputs always produce byte-identical
/// output.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Maximum number of pages to analyze. Pages beyond this are ignored.
    pub max_pages: usize,

    /// Rotation cutoff in radians. Lines whose maximum absolute glyph
    /// rotation exceeds this are excluded as watermarks.
    pub rotation_cutoff_rad: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisConfig {
    /// Create a new configuration with defaults (200 pages, 10° cutoff).
    pub fn new() -> Self {
        Self {
            max_pages: 200,
            rotation_cutoff_rad: PI / 18.0,
        }
    }

    /// Set the maximum page count.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }
}
