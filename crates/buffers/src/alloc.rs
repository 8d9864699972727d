//! Pluggable allocation strategy for [`crate::GrowableBuffer`].

use std::alloc::{self, Layout};
use std::ptr::NonNull;

/// Allocation strategy a [`crate::GrowableBuffer`] delegates to.
///
/// All three operations for one buffer must go through the same allocator
/// instance for the lifetime of one encode call; mixing allocators within
/// one call is a caller error.
pub trait Allocator {
    /// Allocates `size` bytes. Returns `None` on exhaustion.
    fn allocate(&mut self, size: usize) -> Option<NonNull<u8>>;

    /// Resizes an allocation to `new_size` bytes, preserving its contents up
    /// to the smaller of the two sizes. Returns `None` on exhaustion, in
    /// which case the original allocation remains valid.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by [`Allocator::allocate`] or
    /// [`Allocator::reallocate`] on this instance with size `old_size`, and
    /// must not have been released.
    unsafe fn reallocate(
        &mut self,
        ptr: NonNull<u8>,
        old_size: usize,
        new_size: usize,
    ) -> Option<NonNull<u8>>;

    /// Releases an allocation.
    ///
    /// # Safety
    ///
    /// Same provenance rules as [`Allocator::reallocate`]; `ptr` must not be
    /// used afterwards.
    unsafe fn release(&mut self, ptr: NonNull<u8>, size: usize);
}

/// The ambient process allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct Heap;

impl Allocator for Heap {
    fn allocate(&mut self, size: usize) -> Option<NonNull<u8>> {
        let layout = Layout::from_size_align(size, 1).ok()?;
        NonNull::new(unsafe { alloc::alloc(layout) })
    }

    unsafe fn reallocate(
        &mut self,
        ptr: NonNull<u8>,
        old_size: usize,
        new_size: usize,
    ) -> Option<NonNull<u8>> {
        let layout = Layout::from_size_align(old_size, 1).ok()?;
        NonNull::new(alloc::realloc(ptr.as_ptr(), layout, new_size))
    }

    unsafe fn release(&mut self, ptr: NonNull<u8>, size: usize) {
        let layout = Layout::from_size_align_unchecked(size, 1);
        alloc::dealloc(ptr.as_ptr(), layout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_allocate_release() {
        let mut heap = Heap;
        let ptr = heap.allocate(16).expect("allocate");
        unsafe {
            ptr.as_ptr().write_bytes(0xab, 16);
            assert_eq!(*ptr.as_ptr(), 0xab);
            heap.release(ptr, 16);
        }
    }

    #[test]
    fn heap_reallocate_preserves_prefix() {
        let mut heap = Heap;
        let ptr = heap.allocate(4).expect("allocate");
        unsafe {
            for i in 0..4 {
                *ptr.as_ptr().add(i) = i as u8;
            }
            let grown = heap.reallocate(ptr, 4, 32).expect("reallocate");
            for i in 0..4 {
                assert_eq!(*grown.as_ptr().add(i), i as u8);
            }
            heap.release(grown, 32);
        }
    }
}
