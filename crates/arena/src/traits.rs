//! Allocator contracts consumed by containers
//!
//! - `ContainerAllocator`: the typed allocate/construct/destroy/rebind
//!   capability set a generic container is written against
//! - `MemoryUsage`: capacity reporting shared by managers and adapters

use core::ptr::NonNull;

use crate::error::AllocResult;

/// Unit for element counts
pub type SizeType = usize;

/// Unit for distances between elements
pub type DifferenceType = isize;

/// Mutable element pointer handed out by an allocator
pub type Pointer<A> = NonNull<<A as ContainerAllocator>::Value>;

/// Read-only element pointer
pub type ConstPointer<A> = *const <A as ContainerAllocator>::Value;

/// Typed allocator contract for generic containers
///
/// A container that needs storage for an unrelated internal type (list
/// nodes, hash buckets) rebinds its allocator instead of constructing a new
/// one, so every rebound handle keeps drawing from the same backing store.
///
/// # Examples
/// ```rust
/// use core::mem::{MaybeUninit, size_of};
/// use std::rc::Rc;
/// use nebula_arena::prelude::*;
///
/// fn push_node<A: ContainerAllocator<Value = u32>>(alloc: &A) -> AllocResult<()> {
///     let nodes = alloc.rebind::<(u32, usize)>();
///     let node = nodes.allocate(1)?;
///     unsafe { nodes.construct(node, (7, 0)) };
///     Ok(())
/// }
///
/// let mut buffer = [MaybeUninit::<u64>::uninit(); 4];
/// let manager = Rc::new(BufferManager::from_elements(&mut buffer));
/// let alloc = BufferAllocator::<u32>::with_manager(Rc::clone(&manager));
///
/// push_node(&alloc)?;
/// assert_eq!(manager.allocated(), size_of::<(u32, usize)>());
/// # Ok::<(), nebula_arena::MemoryError>(())
/// ```
pub trait ContainerAllocator: Clone {
    /// Element type this handle allocates for
    type Value;

    /// Same allocator family, different element type
    type Rebind<U>: ContainerAllocator<Value = U>;

    /// Produce a handle for element type `U` sharing this handle's storage
    fn rebind<U>(&self) -> Self::Rebind<U>;

    /// Upper bound on the number of elements a single request can ask for
    fn max_size(&self) -> SizeType;

    /// Reserve uninitialized storage for `n` elements
    fn allocate(&self, n: SizeType) -> AllocResult<Pointer<Self>>;

    /// Hand storage for `n` elements back to the allocator
    fn deallocate(&self, ptr: Pointer<Self>, n: SizeType);

    /// Move `value` into the storage at `ptr`
    ///
    /// # Safety
    /// `ptr` must be valid for writes and properly aligned, and must not hold
    /// a live value.
    unsafe fn construct(&self, ptr: Pointer<Self>, value: Self::Value);

    /// Run the destructor of the value at `ptr` without releasing its storage
    ///
    /// # Safety
    /// `ptr` must point to a live, initialized value that is not used again.
    unsafe fn destroy(&self, ptr: Pointer<Self>);

    /// Address of a shared element
    fn address(&self, value: &Self::Value) -> ConstPointer<Self> {
        value
    }

    /// Address of an exclusive element
    fn address_mut(&self, value: &mut Self::Value) -> Pointer<Self> {
        NonNull::from(value)
    }
}

/// Memory usage tracking trait
///
/// Implemented by managers and allocators that know their capacity.
pub trait MemoryUsage {
    /// Get currently used memory in bytes
    fn used_memory(&self) -> usize;

    /// Get available memory in bytes (if known)
    fn available_memory(&self) -> Option<usize>;

    /// Get total memory capacity in bytes (if known)
    fn total_memory(&self) -> Option<usize> {
        self.available_memory()
            .map(|available| self.used_memory() + available)
    }

    /// Returns memory usage as a percentage (0.0 to 100.0)
    ///
    /// Returns `None` if total memory is unknown. A zero-capacity region
    /// reports 100%, since it cannot serve any request.
    fn memory_usage_percent(&self) -> Option<f32> {
        self.total_memory().map(|total| {
            if total == 0 {
                100.0
            } else {
                (self.used_memory() as f32 / total as f32) * 100.0
            }
        })
    }

    /// Checks if memory usage is at or above the percentage threshold
    fn is_memory_pressure(&self, threshold_percent: f32) -> Option<bool> {
        self.memory_usage_percent()
            .map(|usage| usage >= threshold_percent)
    }
}

impl<T: MemoryUsage + ?Sized> MemoryUsage for &T {
    fn used_memory(&self) -> usize {
        (**self).used_memory()
    }

    fn available_memory(&self) -> Option<usize> {
        (**self).available_memory()
    }

    fn total_memory(&self) -> Option<usize> {
        (**self).total_memory()
    }
}
