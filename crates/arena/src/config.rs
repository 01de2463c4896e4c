//! Buffer manager configuration

/// Configuration for a buffer manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferConfig {
    /// Enable statistics tracking
    pub track_stats: bool,

    /// Fill pattern written over freshly allocated bytes
    pub alloc_pattern: Option<u8>,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            track_stats: cfg!(debug_assertions),
            alloc_pattern: None,
        }
    }
}

impl BufferConfig {
    /// Production configuration - no bookkeeping beyond the cursor
    pub fn production() -> Self {
        Self {
            track_stats: false,
            alloc_pattern: None,
        }
    }

    /// Debug configuration - statistics plus a recognizable fill pattern
    pub fn debug() -> Self {
        Self {
            track_stats: true,
            alloc_pattern: Some(0xCC),
        }
    }

    /// Toggle statistics tracking
    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.track_stats = enabled;
        self
    }

    /// Set or clear the fill pattern
    pub fn with_alloc_pattern(mut self, pattern: Option<u8>) -> Self {
        self.alloc_pattern = pattern;
        self
    }
}
