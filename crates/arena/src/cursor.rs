//! Monotonic cursor backing the buffer manager
//!
//! Single-threaded: the cursor lives in a `Cell`, so a manager can hand out
//! memory through a shared reference without any synchronization.

use core::cell::Cell;

use crate::utils::checked_align_up;

/// Placement of a successful bump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Bump {
    /// Offset of the block from the start of the region
    pub(crate) offset: usize,
    /// Bytes skipped to satisfy the alignment
    pub(crate) padding: usize,
}

/// Cell-based cursor that only moves forward
#[derive(Debug)]
pub(crate) struct Cursor {
    allocated: Cell<usize>,
    capacity: usize,
}

impl Cursor {
    pub(crate) const fn new(capacity: usize) -> Self {
        Self::starting_at(0, capacity)
    }

    pub(crate) const fn starting_at(allocated: usize, capacity: usize) -> Self {
        Self {
            allocated: Cell::new(allocated),
            capacity,
        }
    }

    #[inline]
    pub(crate) fn allocated(&self) -> usize {
        self.allocated.get()
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn available(&self) -> usize {
        self.capacity - self.allocated.get()
    }

    /// Reserves `size` bytes whose absolute address (`base + offset`) is a
    /// multiple of `align`.
    ///
    /// On failure the cursor is untouched and the error carries the bytes
    /// the request needed, padding included (`usize::MAX` on overflow).
    pub(crate) fn try_bump(&self, base: usize, size: usize, align: usize) -> Result<Bump, usize> {
        let current = self.allocated.get();
        let padding = base
            .checked_add(current)
            .and_then(|addr| Some(checked_align_up(addr, align)? - addr))
            .ok_or(usize::MAX)?;
        let needed = padding.saturating_add(size);

        match current.checked_add(needed) {
            Some(end) if end <= self.capacity => {
                self.allocated.set(end);
                Ok(Bump {
                    offset: current + padding,
                    padding,
                })
            }
            _ => Err(needed),
        }
    }

    /// Advances the cursor by `additional` bytes only if the block ending at
    /// `end_offset` is the most recent one.
    pub(crate) fn try_extend(&self, end_offset: usize, additional: usize) -> bool {
        let current = self.allocated.get();
        if current != end_offset {
            return false;
        }

        match current.checked_add(additional) {
            Some(end) if end <= self.capacity => {
                self.allocated.set(end);
                true
            }
            _ => false,
        }
    }
}
