//! Typed allocator adapter over a shared buffer manager
//!
//! A [`BufferAllocator`] is a cheap handle: cloning or rebinding it never
//! copies the manager, so every container built from one arena draws from
//! the same cursor.

use core::alloc::Layout;
use core::any::type_name;
use core::fmt;
use core::marker::PhantomData;
use core::mem::{MaybeUninit, size_of};
use core::ptr::{self, NonNull};
use std::rc::Rc;

#[cfg(feature = "logging")]
use tracing::trace;

use crate::config::BufferConfig;
use crate::error::{AllocResult, MemoryError};
use crate::manager::BufferManager;
use crate::stats::{ArenaStats, StatisticsProvider};
use crate::traits::{ContainerAllocator, MemoryUsage, SizeType};

/// Typed view over a [`BufferManager`]
///
/// # Examples
/// ```rust
/// use core::mem::MaybeUninit;
/// use nebula_arena::BufferAllocator;
///
/// let mut buffer = [MaybeUninit::<i32>::uninit(); 2];
/// let alloc = BufferAllocator::from_elements(&mut buffer);
/// assert_eq!(alloc.max_size(), 2);
///
/// let a = alloc.allocate(1)?;
/// let b = alloc.allocate(1)?;
/// assert_ne!(a, b);
/// assert!(alloc.allocate(1).is_err());
/// # Ok::<(), nebula_arena::MemoryError>(())
/// ```
pub struct BufferAllocator<'buf, E> {
    manager: Rc<BufferManager<'buf>>,
    _marker: PhantomData<fn() -> E>,
}

impl<'buf, E> BufferAllocator<'buf, E> {
    /// Creates an allocator with a private manager over `region`
    pub fn new(region: &'buf mut [MaybeUninit<u8>]) -> Self {
        Self::with_manager(Rc::new(BufferManager::new(region)))
    }

    /// Creates an allocator with a private, custom-configured manager
    pub fn with_config(region: &'buf mut [MaybeUninit<u8>], config: BufferConfig) -> Self {
        Self::with_manager(Rc::new(BufferManager::with_config(region, config)))
    }

    /// Creates an allocator over a region sized and aligned in units of `E`
    pub fn from_elements(region: &'buf mut [MaybeUninit<E>]) -> Self {
        Self::with_manager(Rc::new(BufferManager::from_elements(region)))
    }

    /// Creates an allocator from a raw region
    ///
    /// # Safety
    /// Same contract as [`BufferManager::from_raw_parts`].
    pub unsafe fn from_raw_parts(region: NonNull<u8>, capacity: usize) -> Self {
        // SAFETY: forwarded caller contract.
        Self::with_manager(Rc::new(unsafe { BufferManager::from_raw_parts(region, capacity) }))
    }

    /// Creates an allocator fronting an existing shared manager
    pub fn with_manager(manager: Rc<BufferManager<'buf>>) -> Self {
        Self {
            manager,
            _marker: PhantomData,
        }
    }

    /// The manager this handle draws from
    pub fn manager(&self) -> &Rc<BufferManager<'buf>> {
        &self.manager
    }

    /// Whether both handles draw from the same manager instance
    ///
    /// Unlike `==`, which is always `true`, this reports real identity.
    pub fn shares_manager_with<U>(&self, other: &BufferAllocator<'buf, U>) -> bool {
        Rc::ptr_eq(&self.manager, &other.manager)
    }

    /// Produces a handle for element type `U` over the same manager
    pub fn rebind<U>(&self) -> BufferAllocator<'buf, U> {
        BufferAllocator::rebind_from(self)
    }

    /// Produces a handle for `E` over the manager of `other`
    pub fn rebind_from<U>(other: &BufferAllocator<'buf, U>) -> Self {
        #[cfg(feature = "logging")]
        trace!(
            from = type_name::<U>(),
            to = type_name::<E>(),
            "rebinding buffer allocator"
        );

        Self::with_manager(Rc::clone(&other.manager))
    }

    /// Ceiling on the number of `E` the region could ever hold
    ///
    /// Derived from the capacity alone; earlier allocations are not
    /// subtracted.
    pub fn max_size(&self) -> SizeType {
        match size_of::<E>() {
            0 => usize::MAX,
            size => self.manager.capacity() / size,
        }
    }

    /// Reserves uninitialized storage for `n` elements
    ///
    /// # Errors
    /// `OutOfMemory` when `n * size_of::<E>()` (plus any alignment padding)
    /// exceeds what is left, or overflows.
    pub fn allocate(&self, n: SizeType) -> AllocResult<NonNull<E>> {
        if n == 0 || size_of::<E>() == 0 {
            return Ok(NonNull::dangling());
        }

        let layout = Layout::array::<E>(n)
            .map_err(|_| MemoryError::size_overflow(self.manager.available()))?;

        self.manager.allocate_layout(layout).map(NonNull::cast)
    }

    /// Releases storage for `n` elements, which for an arena means nothing:
    /// the bytes stay consumed and no destructor runs
    pub fn deallocate(&self, _ptr: NonNull<E>, n: SizeType) {
        self.manager.abandon(size_of::<E>().saturating_mul(n));
    }

    /// Clones `value` into the storage at `ptr`
    ///
    /// # Safety
    /// `ptr` must be valid for writes, aligned for `E`, and must not hold a
    /// live value.
    pub unsafe fn construct(&self, ptr: NonNull<E>, value: &E)
    where
        E: Clone,
    {
        // SAFETY: forwarded caller contract.
        unsafe { self.emplace(ptr, value.clone()) }
    }

    /// Moves `value` into the storage at `ptr`
    ///
    /// # Safety
    /// Same contract as [`BufferAllocator::construct`].
    pub unsafe fn emplace(&self, ptr: NonNull<E>, value: E) {
        // SAFETY: ptr is valid for writes and aligned (caller contract).
        unsafe { ptr.as_ptr().write(value) }
    }

    /// Drops the value at `ptr` in place; its storage stays consumed
    ///
    /// # Safety
    /// `ptr` must point to a live `E` that is not used afterwards.
    pub unsafe fn destroy(&self, ptr: NonNull<E>) {
        // SAFETY: ptr holds a live value (caller contract).
        unsafe { ptr::drop_in_place(ptr.as_ptr()) }
    }

    /// Address of a shared element
    pub fn address(&self, value: &E) -> *const E {
        value
    }

    /// Address of an exclusive element
    pub fn address_mut(&self, value: &mut E) -> NonNull<E> {
        NonNull::from(value)
    }
}

impl<E> Default for BufferAllocator<'_, E> {
    /// A private zero-capacity manager: valid, but every request fails
    fn default() -> Self {
        Self::with_manager(Rc::new(BufferManager::empty()))
    }
}

impl<E> Clone for BufferAllocator<'_, E> {
    /// Shares the manager; both handles observe the same cursor
    fn clone(&self) -> Self {
        Self::with_manager(Rc::clone(&self.manager))
    }
}

// Allocators are interchangeable as far as containers are concerned, so
// equality is unconditional. Use `shares_manager_with` for identity.
impl<'b, E, U> PartialEq<BufferAllocator<'b, U>> for BufferAllocator<'_, E> {
    fn eq(&self, _other: &BufferAllocator<'b, U>) -> bool {
        true
    }
}

impl<E> Eq for BufferAllocator<'_, E> {}

impl<E> fmt::Debug for BufferAllocator<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferAllocator")
            .field("element", &type_name::<E>())
            .field("capacity", &self.manager.capacity())
            .field("allocated", &self.manager.allocated())
            .field("handles", &Rc::strong_count(&self.manager))
            .finish()
    }
}

impl<'buf, E> ContainerAllocator for BufferAllocator<'buf, E> {
    type Value = E;
    type Rebind<U> = BufferAllocator<'buf, U>;

    fn rebind<U>(&self) -> Self::Rebind<U> {
        BufferAllocator::rebind_from(self)
    }

    fn max_size(&self) -> SizeType {
        Self::max_size(self)
    }

    fn allocate(&self, n: SizeType) -> AllocResult<NonNull<E>> {
        Self::allocate(self, n)
    }

    fn deallocate(&self, ptr: NonNull<E>, n: SizeType) {
        Self::deallocate(self, ptr, n);
    }

    unsafe fn construct(&self, ptr: NonNull<E>, value: E) {
        // SAFETY: forwarded caller contract.
        unsafe { self.emplace(ptr, value) }
    }

    unsafe fn destroy(&self, ptr: NonNull<E>) {
        // SAFETY: forwarded caller contract.
        unsafe { Self::destroy(self, ptr) }
    }
}

impl<E> MemoryUsage for BufferAllocator<'_, E> {
    fn used_memory(&self) -> usize {
        self.manager.used_memory()
    }

    fn available_memory(&self) -> Option<usize> {
        self.manager.available_memory()
    }

    fn total_memory(&self) -> Option<usize> {
        self.manager.total_memory()
    }
}

impl<E> StatisticsProvider for BufferAllocator<'_, E> {
    fn statistics(&self) -> ArenaStats {
        self.manager.statistics()
    }

    fn reset_statistics(&self) {
        self.manager.reset_statistics();
    }

    fn statistics_enabled(&self) -> bool {
        self.manager.statistics_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct DropCounter<'a>(&'a Cell<usize>);

    impl Drop for DropCounter<'_> {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_max_size_ignores_allocations() {
        let mut buffer = [MaybeUninit::<u32>::uninit(); 4];
        let alloc = BufferAllocator::<u32>::from_elements(&mut buffer);
        assert_eq!(alloc.max_size(), 4);

        alloc.allocate(3).unwrap();
        assert_eq!(alloc.max_size(), 4);
        assert_eq!(alloc.rebind::<u16>().max_size(), 8);
    }

    #[test]
    fn test_zero_sized_elements() {
        let alloc = BufferAllocator::<()>::default();
        assert_eq!(alloc.max_size(), usize::MAX);
        assert!(alloc.allocate(1_000).is_ok());
        assert_eq!(alloc.manager().allocated(), 0);
    }

    #[test]
    fn test_zero_count_does_not_touch_cursor() {
        let alloc = BufferAllocator::<u64>::default();
        let ptr = alloc.allocate(0).unwrap();
        assert_eq!(ptr, NonNull::dangling());
    }

    #[test]
    fn test_count_overflow_is_out_of_memory() {
        let mut buffer = [MaybeUninit::<u64>::uninit(); 1];
        let alloc = BufferAllocator::<u64>::from_elements(&mut buffer);

        let error = alloc.allocate(usize::MAX).unwrap_err();
        assert!(error.is_out_of_memory());
        assert_eq!(error.requested(), usize::MAX);
        assert_eq!(alloc.manager().allocated(), 0);
    }

    #[test]
    fn test_padding_is_part_of_reported_request() {
        let mut buffer = [MaybeUninit::<u64>::uninit(); 2];
        let start = NonNull::from(&mut buffer).cast::<u8>();
        let words = unsafe { BufferAllocator::<u64>::from_raw_parts(start, 12) };
        words.rebind::<u8>().allocate(1).unwrap();

        let error = words.allocate(1).unwrap_err();
        assert_eq!(error, MemoryError::out_of_memory(15, 11));
        assert!(error.requested() > error.available());
    }

    #[test]
    fn test_construct_and_destroy() {
        let drops = Cell::new(0);
        let mut buffer = [MaybeUninit::<u64>::uninit(); 4];
        let manager = Rc::new(BufferManager::from_elements(&mut buffer));
        let alloc = BufferAllocator::<DropCounter<'_>>::with_manager(Rc::clone(&manager));

        let ptr = alloc.allocate(2).unwrap();
        let before = manager.allocated();

        unsafe {
            alloc.emplace(ptr, DropCounter(&drops));
            ContainerAllocator::construct(&alloc, ptr.add(1), DropCounter(&drops));
        }
        assert_eq!(manager.allocated(), before);

        unsafe {
            alloc.destroy(ptr);
            ContainerAllocator::destroy(&alloc, ptr.add(1));
        }
        assert_eq!(drops.get(), 2);
        assert_eq!(manager.allocated(), before);
    }

    #[test]
    fn test_construct_clones() {
        let mut buffer = [MaybeUninit::<String>::uninit(); 1];
        let alloc = BufferAllocator::from_elements(&mut buffer);
        let original = String::from("arena");

        let ptr = alloc.allocate(1).unwrap();
        unsafe {
            alloc.construct(ptr, &original);
            assert_eq!(ptr.as_ref(), "arena");
            alloc.destroy(ptr);
        }
        assert_eq!(original, "arena");
    }

    #[test]
    fn test_deallocate_does_not_run_destructors() {
        let drops = Cell::new(0);
        let mut buffer = [MaybeUninit::<u64>::uninit(); 2];
        let manager = Rc::new(BufferManager::from_elements(&mut buffer));
        let alloc = BufferAllocator::<DropCounter<'_>>::with_manager(manager);

        let ptr = alloc.allocate(1).unwrap();
        unsafe { alloc.emplace(ptr, DropCounter(&drops)) };
        alloc.deallocate(ptr, 1);
        assert_eq!(drops.get(), 0);

        unsafe { alloc.destroy(ptr) };
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_address() {
        let alloc = BufferAllocator::<i32>::default();
        let mut value = 5;
        let expected: *const i32 = &value;

        assert_eq!(alloc.address(&value), expected);
        assert_eq!(alloc.address_mut(&mut value).as_ptr().cast_const(), expected);
    }

    #[test]
    fn test_debug_output() {
        let alloc = BufferAllocator::<u8>::default();
        let text = format!("{alloc:?}");
        assert!(text.contains("BufferAllocator"));
        assert!(text.contains("u8"));
    }
}
