//! Standalone error types for nebula-arena
//!
//! Uses thiserror for clean, idiomatic Rust error definitions. An arena has a
//! single failure mode: the request does not fit into what is left of the
//! region.

use thiserror::Error;

// ============================================================================
// Main Error Types
// ============================================================================

/// Arena allocation errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// The request exceeds the bytes remaining in the region.
    ///
    /// Raised synchronously by the allocating call, which leaves the cursor
    /// untouched.
    #[error("Arena out of memory: requested {requested} bytes, available {available}")]
    OutOfMemory { requested: usize, available: usize },
}

impl MemoryError {
    /// Create out of memory error
    pub fn out_of_memory(requested: usize, available: usize) -> Self {
        Self::OutOfMemory {
            requested,
            available,
        }
    }

    /// Create out of memory error for a request whose byte size overflowed
    pub fn size_overflow(available: usize) -> Self {
        Self::out_of_memory(usize::MAX, available)
    }

    /// Check if this is an out of memory error
    #[must_use]
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }

    /// Bytes requested by the failed call
    #[must_use]
    pub fn requested(&self) -> usize {
        match self {
            Self::OutOfMemory { requested, .. } => *requested,
        }
    }

    /// Bytes that were still available when the call failed
    #[must_use]
    pub fn available(&self) -> usize {
        match self {
            Self::OutOfMemory { available, .. } => *available,
        }
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::OutOfMemory { .. } => "MEM:ARENA:EXHAUSTED",
        }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for arena operations
pub type MemoryResult<T> = core::result::Result<T, MemoryError>;

/// Allocation result alias used throughout the allocator API
pub type AllocResult<T> = MemoryResult<T>;

#[cfg(feature = "allocator-api2")]
impl From<MemoryError> for allocator_api2::alloc::AllocError {
    fn from(_: MemoryError) -> Self {
        Self
    }
}

// ============================================================================
// Tests
// ============================================================================
