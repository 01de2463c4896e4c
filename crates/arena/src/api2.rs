//! `allocator_api2::alloc::Allocator` support
//!
//! Lets the stable `allocator-api2` containers (its `Vec`, `hashbrown`'s
//! maps and sets) draw their storage from an arena. Frees are ignored; a
//! growing buffer that is still the most recent block is extended in place.

use core::alloc::Layout;
use core::ptr::{self, NonNull};

use allocator_api2::alloc::{AllocError, Allocator};

use crate::allocator::BufferAllocator;

fn dangling_for(layout: Layout) -> NonNull<[u8]> {
    // SAFETY: alignments are never zero.
    let ptr = unsafe { NonNull::new_unchecked(ptr::without_provenance_mut::<u8>(layout.align())) };
    NonNull::slice_from_raw_parts(ptr, 0)
}

fn is_aligned(ptr: NonNull<u8>, align: usize) -> bool {
    (ptr.as_ptr() as usize) % align == 0
}

// SAFETY: blocks come from the borrowed region and stay valid for as long as
// any clone of the allocator (and thus the manager) is alive. Clones share
// the manager, so memory from one handle is usable through all of them.
unsafe impl<E> Allocator for BufferAllocator<'_, E> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if layout.size() == 0 {
            return Ok(dangling_for(layout));
        }

        let ptr = self.manager().allocate_layout(layout)?;
        Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, layout: Layout) {
        self.manager().abandon(layout.size());
    }

    unsafe fn grow(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_layout: Layout,
    ) -> Result<NonNull<[u8]>, AllocError> {
        debug_assert!(new_layout.size() >= old_layout.size());

        let manager = self.manager();
        if old_layout.size() != 0
            && is_aligned(ptr, new_layout.align())
            && manager.try_grow_in_place(ptr, old_layout.size(), new_layout.size())
        {
            return Ok(NonNull::slice_from_raw_parts(ptr, new_layout.size()));
        }

        let new_ptr = Allocator::allocate(self, new_layout)?;
        // SAFETY: the old block is valid for old_layout.size() bytes (caller
        // contract) and the fresh block is disjoint from it.
        unsafe {
            ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.cast::<u8>().as_ptr(), old_layout.size());
        }
        manager.abandon(old_layout.size());

        Ok(new_ptr)
    }

    unsafe fn shrink(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_layout: Layout,
    ) -> Result<NonNull<[u8]>, AllocError> {
        debug_assert!(new_layout.size() <= old_layout.size());

        if is_aligned(ptr, new_layout.align()) {
            self.manager().abandon(old_layout.size() - new_layout.size());
            return Ok(NonNull::slice_from_raw_parts(ptr, new_layout.size()));
        }

        let new_ptr = Allocator::allocate(self, new_layout)?;
        // SAFETY: new_layout.size() <= old_layout.size() bytes are readable
        // from the old block; the fresh block is disjoint from it.
        unsafe {
            ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.cast::<u8>().as_ptr(), new_layout.size());
        }
        self.manager().abandon(old_layout.size());

        Ok(new_ptr)
    }
}
