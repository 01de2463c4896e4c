//! Buffer manager: the bump-pointer core of the arena
//!
//! # Safety
//!
//! The manager never owns its region. It either borrows it for `'buf`
//! (safe constructors) or trusts the caller's pointer/size pair
//! (`from_raw_parts`). Every handed-out block lies inside that region.
//!
//! ## Invariants
//!
//! - `0 <= allocated <= capacity` at all times
//! - The cursor only moves forward; nothing is ever returned to it
//! - Returned blocks are pairwise disjoint (bump discipline)
//! - A failed request leaves the cursor and the region untouched
//!
//! ## Thread Safety
//!
//! None. The cursor is a `Cell` and the type is `!Send`/`!Sync`; share it
//! within one thread through `&` or `Rc`.

use core::alloc::Layout;
use core::fmt;
use core::marker::PhantomData;
use core::mem::MaybeUninit;
use core::ptr::{self, NonNull};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

use crate::config::BufferConfig;
use crate::cursor::Cursor;
use crate::error::{AllocResult, MemoryError};
use crate::stats::{ArenaStats, StatisticsProvider, StatsCounters};
use crate::traits::MemoryUsage;

/// Fixed-capacity, high-watermark memory manager over a borrowed region
///
/// # Memory Layout
/// ```text
/// [region]----[block1]----[block2]----[cursor]--------[end]
///              <------ allocated ------><-- available -->
/// ```
///
/// # Examples
/// ```rust
/// use core::mem::MaybeUninit;
/// use nebula_arena::BufferManager;
///
/// let mut buffer = [MaybeUninit::<u32>::uninit(); 2];
/// let manager = BufferManager::from_elements(&mut buffer);
///
/// let first = manager.allocate(4)?;
/// let second = manager.allocate(4)?;
/// assert_eq!(second.as_ptr() as usize - first.as_ptr() as usize, 4);
/// assert!(manager.allocate(1).is_err());
/// # Ok::<(), nebula_arena::MemoryError>(())
/// ```
pub struct BufferManager<'buf> {
    region: NonNull<u8>,
    cursor: Cursor,
    config: BufferConfig,
    stats: StatsCounters,
    _region: PhantomData<&'buf mut [MaybeUninit<u8>]>,
}

impl<'buf> BufferManager<'buf> {
    /// Creates a manager over an uninitialized byte region
    pub fn new(region: &'buf mut [MaybeUninit<u8>]) -> Self {
        Self::with_config(region, BufferConfig::default())
    }

    /// Creates a manager over an uninitialized byte region with custom
    /// configuration
    pub fn with_config(region: &'buf mut [MaybeUninit<u8>], config: BufferConfig) -> Self {
        let capacity = region.len();
        let start = NonNull::from(region).cast::<u8>();
        // SAFETY: the exclusive borrow covers exactly `capacity` bytes for 'buf.
        unsafe { Self::from_raw_parts_with_config(start, capacity, config) }
    }

    /// Creates a manager over an element-typed region
    ///
    /// The region keeps the alignment of `T`, so requests for `T` never need
    /// padding. This is the usual way to carve an arena out of a stack array.
    pub fn from_elements<T>(region: &'buf mut [MaybeUninit<T>]) -> Self {
        let capacity = size_of_val(region);
        let start = NonNull::from(region).cast::<u8>();
        // SAFETY: the exclusive borrow covers size_of_val(region) bytes for 'buf.
        unsafe { Self::from_raw_parts_with_config(start, capacity, BufferConfig::default()) }
    }

    /// Creates a manager from a raw region
    ///
    /// # Safety
    /// - `region` must be valid for reads and writes of `capacity` bytes for
    ///   the whole of `'buf`
    /// - nothing else may access those bytes while the manager hands them out
    pub unsafe fn from_raw_parts(region: NonNull<u8>, capacity: usize) -> Self {
        // SAFETY: forwarded caller contract.
        unsafe { Self::from_raw_parts_with_config(region, capacity, BufferConfig::default()) }
    }

    /// Creates a manager from a raw region with custom configuration
    ///
    /// # Safety
    /// Same contract as [`BufferManager::from_raw_parts`].
    pub unsafe fn from_raw_parts_with_config(
        region: NonNull<u8>,
        capacity: usize,
        config: BufferConfig,
    ) -> Self {
        #[cfg(feature = "logging")]
        debug!(
            capacity,
            track_stats = config.track_stats,
            "buffer manager created"
        );

        Self {
            region,
            cursor: Cursor::new(capacity),
            config,
            stats: StatsCounters::default(),
            _region: PhantomData,
        }
    }

    /// Creates a manager with no region at all
    ///
    /// Every non-empty request fails immediately.
    pub fn empty() -> Self {
        Self {
            region: NonNull::dangling(),
            cursor: Cursor::new(0),
            config: BufferConfig::production(),
            stats: StatsCounters::default(),
            _region: PhantomData,
        }
    }

    /// Total size of the region in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cursor.capacity()
    }

    /// Bytes not yet handed out
    #[inline]
    pub fn available(&self) -> usize {
        self.cursor.available()
    }

    /// Bytes handed out so far (the high watermark)
    #[inline]
    pub fn allocated(&self) -> usize {
        self.cursor.allocated()
    }

    /// Start of the region
    #[inline]
    pub fn region(&self) -> NonNull<u8> {
        self.region
    }

    /// Whether `ptr` points into the region
    pub fn contains(&self, ptr: *const u8) -> bool {
        let start = self.region.as_ptr() as usize;
        let addr = ptr as usize;
        addr >= start && addr - start < self.capacity()
    }

    /// Active configuration
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Hands out the next `n` bytes
    ///
    /// The block starts exactly at the current cursor; no alignment padding
    /// is inserted.
    ///
    /// # Errors
    /// `OutOfMemory` when `n > available()`, with no state change.
    pub fn allocate(&self, n: usize) -> AllocResult<NonNull<u8>> {
        self.bump(n, 1)
    }

    /// Hands out a block satisfying `layout`
    ///
    /// The cursor is first rounded up to `layout.align()`; the skipped bytes
    /// are consumed along with the block.
    ///
    /// # Errors
    /// `OutOfMemory` when padding plus size does not fit, with no state
    /// change. The reported request includes the padding.
    pub fn allocate_layout(&self, layout: Layout) -> AllocResult<NonNull<u8>> {
        self.bump(layout.size(), layout.align())
    }

    fn bump(&self, size: usize, align: usize) -> AllocResult<NonNull<u8>> {
        let base = self.region.as_ptr() as usize;

        let bump = match self.cursor.try_bump(base, size, align) {
            Ok(bump) => bump,
            Err(needed) => {
                if self.config.track_stats {
                    self.stats.record_failure();
                }
                return Err(MemoryError::out_of_memory(needed, self.available()));
            }
        };

        // SAFETY: offset + size <= capacity, so the block stays in the region.
        let ptr = unsafe { self.region.add(bump.offset) };

        if let Some(pattern) = self.config.alloc_pattern {
            // SAFETY: the bump gave us exclusive ownership of these bytes.
            unsafe { ptr::write_bytes(ptr.as_ptr(), pattern, size) };
        }

        if self.config.track_stats {
            self.stats.record_allocation(bump.padding);
        }

        #[cfg(feature = "logging")]
        trace!(
            offset = bump.offset,
            size,
            padding = bump.padding,
            "arena allocation"
        );

        Ok(ptr)
    }

    /// Extends the most recent block in place
    ///
    /// Succeeds only when the block `[ptr, ptr + old_size)` ends at the
    /// cursor and the extra bytes fit.
    pub(crate) fn try_grow_in_place(
        &self,
        ptr: NonNull<u8>,
        old_size: usize,
        new_size: usize,
    ) -> bool {
        if new_size < old_size || !self.contains(ptr.as_ptr()) {
            return false;
        }

        let offset = ptr.as_ptr() as usize - self.region.as_ptr() as usize;
        let Some(end_offset) = offset.checked_add(old_size) else {
            return false;
        };

        if !self.cursor.try_extend(end_offset, new_size - old_size) {
            return false;
        }

        if let Some(pattern) = self.config.alloc_pattern {
            // SAFETY: the extension gave us exclusive ownership of the tail.
            unsafe {
                ptr::write_bytes(ptr.as_ptr().add(old_size), pattern, new_size - old_size);
            }
        }

        true
    }

    /// Records bytes that a caller has stopped using
    ///
    /// The cursor is not touched; the bytes stay consumed until the region
    /// itself is discarded.
    pub(crate) fn abandon(&self, bytes: usize) {
        if self.config.track_stats {
            self.stats.record_deallocation(bytes);
        }

        #[cfg(feature = "logging")]
        trace!(bytes, "deallocation ignored, bytes stay consumed");
    }

    /// Creates a second manager over the same region, starting at this
    /// manager's current cursor
    ///
    /// The copy has fresh statistics and moves independently from then on.
    ///
    /// # Safety
    /// Both managers may hand out the same bytes. The caller must ensure that
    /// at most one of them is used for allocation, or that blocks handed out
    /// by both are never live at the same time.
    pub unsafe fn snapshot(&self) -> Self {
        #[cfg(feature = "logging")]
        debug!(
            allocated = self.allocated(),
            capacity = self.capacity(),
            "buffer manager snapshot"
        );

        Self {
            region: self.region,
            cursor: Cursor::starting_at(self.allocated(), self.capacity()),
            config: self.config.clone(),
            stats: StatsCounters::default(),
            _region: PhantomData,
        }
    }
}

impl Default for BufferManager<'_> {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for BufferManager<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferManager")
            .field("region", &self.region)
            .field("capacity", &self.capacity())
            .field("allocated", &self.allocated())
            .field("config", &self.config)
            .finish()
    }
}

impl MemoryUsage for BufferManager<'_> {
    fn used_memory(&self) -> usize {
        self.allocated()
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.available())
    }

    fn total_memory(&self) -> Option<usize> {
        Some(self.capacity())
    }
}

impl StatisticsProvider for BufferManager<'_> {
    fn statistics(&self) -> ArenaStats {
        self.stats.snapshot(self.capacity(), self.allocated())
    }

    fn reset_statistics(&self) {
        self.stats.reset();
    }

    fn statistics_enabled(&self) -> bool {
        self.config.track_stats
    }
}
