//! Archive configuration.

/// Configuration for opening an archive.
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    /// Maximum map-nesting level at which fragment boundaries are
    /// introduced. Content deeper than this is stored as one opaque
    /// blob. Shallow levels get many small fragments for fast partial
    /// access; everything beyond the cutoff must be read whole.
    ///
    /// Only meaningful for fresh writes: append and read handles take
    /// the depth from the stored index.
    pub max_depth: usize,

    /// Whether to sync file metadata after every commit (safer but
    /// slower).
    pub sync_on_commit: bool,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            max_depth: 2,
            sync_on_commit: true,
        }
    }
}

impl ArchiveOptions {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fragmentation depth for fresh writes.
    #[must_use]
    pub const fn max_depth(mut self, value: usize) -> Self {
        self.max_depth = value;
        self
    }

    /// Sets whether to sync after every commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ArchiveOptions::default();
        assert_eq!(options.max_depth, 2);
        assert!(options.sync_on_commit);
    }

    #[test]
    fn builder() {
        let options = ArchiveOptions::new().max_depth(4).sync_on_commit(false);
        assert_eq!(options.max_depth, 4);
        assert!(!options.sync_on_commit);
    }
}
