//! Arena statistics tracking
//!
//! Counters are plain `Cell`s: a buffer manager is single-threaded, so there
//! is nothing to synchronize.

use core::cell::Cell;
use core::fmt;

/// Snapshot of arena statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Fixed size of the region in bytes
    pub capacity: usize,
    /// Bytes handed out so far, padding included
    pub high_watermark: usize,
    /// Number of successful allocations
    pub allocation_count: usize,
    /// Number of allocations rejected with `OutOfMemory`
    pub failed_allocations: usize,
    /// Bytes skipped to honor alignment
    pub padding_bytes: usize,
    /// Number of deallocate calls (all of them no-ops)
    pub deallocation_count: usize,
    /// Bytes released by callers but never reused
    pub abandoned_bytes: usize,
}

impl ArenaStats {
    /// Fraction of the region consumed (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 1.0;
        }
        self.high_watermark as f64 / self.capacity as f64
    }

    /// Calculate current allocation efficiency (0.0 to 1.0)
    /// Higher values indicate fewer failed allocations
    pub fn allocation_efficiency(&self) -> f64 {
        let total_attempts = self.allocation_count + self.failed_allocations;
        if total_attempts > 0 {
            self.allocation_count as f64 / total_attempts as f64
        } else {
            1.0
        }
    }

    /// Average payload size per allocation, padding excluded
    pub fn average_allocation_size(&self) -> Option<f64> {
        if self.allocation_count > 0 {
            let payload = self.high_watermark.saturating_sub(self.padding_bytes);
            Some(payload as f64 / self.allocation_count as f64)
        } else {
            None
        }
    }
}

impl fmt::Display for ArenaStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Arena Statistics:")?;
        writeln!(
            f,
            "  High watermark: {} / {} bytes",
            self.high_watermark, self.capacity
        )?;
        writeln!(f, "  Allocations: {}", self.allocation_count)?;
        writeln!(f, "  Failed allocations: {}", self.failed_allocations)?;
        writeln!(f, "  Padding: {} bytes", self.padding_bytes)?;
        writeln!(f, "  Deallocations: {}", self.deallocation_count)?;
        write!(f, "  Abandoned: {} bytes", self.abandoned_bytes)
    }
}

/// Types that expose arena statistics
pub trait StatisticsProvider {
    /// Current statistics snapshot
    fn statistics(&self) -> ArenaStats;

    /// Clear the counters; the allocation cursor is left alone
    fn reset_statistics(&self);

    /// Whether counters are being updated
    fn statistics_enabled(&self) -> bool;
}

/// Mutable counters owned by a buffer manager
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    allocation_count: Cell<usize>,
    failed_allocations: Cell<usize>,
    padding_bytes: Cell<usize>,
    deallocation_count: Cell<usize>,
    abandoned_bytes: Cell<usize>,
}

impl StatsCounters {
    pub(crate) fn record_allocation(&self, padding: usize) {
        bump(&self.allocation_count, 1);
        bump(&self.padding_bytes, padding);
    }

    pub(crate) fn record_failure(&self) {
        bump(&self.failed_allocations, 1);
    }

    pub(crate) fn record_deallocation(&self, bytes: usize) {
        bump(&self.deallocation_count, 1);
        bump(&self.abandoned_bytes, bytes);
    }

    pub(crate) fn snapshot(&self, capacity: usize, high_watermark: usize) -> ArenaStats {
        ArenaStats {
            capacity,
            high_watermark,
            allocation_count: self.allocation_count.get(),
            failed_allocations: self.failed_allocations.get(),
            padding_bytes: self.padding_bytes.get(),
            deallocation_count: self.deallocation_count.get(),
            abandoned_bytes: self.abandoned_bytes.get(),
        }
    }

    pub(crate) fn reset(&self) {
        self.allocation_count.set(0);
        self.failed_allocations.set(0);
        self.padding_bytes.set(0);
        self.deallocation_count.set(0);
        self.abandoned_bytes.set(0);
    }
}

#[inline]
fn bump(counter: &Cell<usize>, by: usize) {
    counter.set(counter.get().saturating_add(by));
}
