//! Record reader configuration.

/// Configuration for reading records from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Largest declared record size accepted from a source.
    ///
    /// A header claiming more than this is treated as corrupt instead of
    /// being allocated.
    pub max_record_size: usize,

    /// Whether reads return kind-specific views (`true`) or generic
    /// records (`false`).
    pub typed: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_record_size: 16 * 1024 * 1024, // 16 MB
            typed: true,
        }
    }
}

impl ReaderConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the largest accepted record size.
    #[must_use]
    pub const fn max_record_size(mut self, size: usize) -> Self {
        self.max_record_size = size;
        self
    }

    /// Sets whether reads return typed views.
    #[must_use]
    pub const fn typed(mut self, value: bool) -> Self {
        self.typed = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ReaderConfig::default();
        assert_eq!(config.max_record_size, 16 * 1024 * 1024);
        assert!(config.typed);
    }

    #[test]
    fn builder_pattern() {
        let config = ReaderConfig::new().max_record_size(1024).typed(false);
        assert_eq!(config.max_record_size, 1024);
        assert!(!config.typed);
    }
}
