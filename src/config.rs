//! Run configuration for one annotation pass.
//!
//! Built once by the CLI and handed to the engine by value; there is no
//! process-wide state.

/// Prefix attached to gene keys taken from region labels.
pub const DEFAULT_REGION_PREFIX: &str = "TCGA_";

/// Live window size above which a warning is logged (once per pass).
pub const DEFAULT_WINDOW_WARNING_THRESHOLD: usize = 100_000;

/// Settings that shape the engine's output and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotateConfig {
    /// Prefix for region-derived gene labels, e.g. `TCGA_` + `TCGA6K`.
    pub region_prefix: String,
    /// Warn when more records than this are live at once.
    pub window_warning_threshold: usize,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            region_prefix: DEFAULT_REGION_PREFIX.to_string(),
            window_warning_threshold: DEFAULT_WINDOW_WARNING_THRESHOLD,
        }
    }
}

impl AnnotateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.region_prefix = prefix.into();
        self
    }

    pub fn with_window_warning_threshold(mut self, threshold: usize) -> Self {
        self.window_warning_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnnotateConfig::default();
        assert_eq!(config.region_prefix, "TCGA_");
        assert_eq!(config.window_warning_threshold, 100_000);
    }

    #[test]
    fn test_builder() {
        let config = AnnotateConfig::new()
            .with_region_prefix("REGION_")
            .with_window_warning_threshold(10);
        assert_eq!(config.region_prefix, "REGION_");
        assert_eq!(config.window_warning_threshold, 10);
    }
}
