//! Append-only output buffer with amortized-doubling growth.

use std::ptr::NonNull;
use std::slice;

use crate::{Allocator, BufferError, Heap};

/// Append-only byte sink used as the encoding output.
///
/// Tracks written length and spare capacity with the invariant
/// `len + free == capacity`. When an append outgrows the spare capacity the
/// storage is reallocated to twice the new length, giving amortized O(1)
/// appends; capacity never shrinks. There is no removal operation: headers
/// are always written before their payload, so single-pass encoding needs no
/// backpatching.
///
/// Storage is acquired through an [`Allocator`] strategy. With the default
/// ambient heap the buffer owns the storage and frees it on drop; with an
/// external collaborator (see [`GrowableBuffer::with_allocator`]) the
/// collaborator keeps ownership and the buffer never releases it.
pub struct GrowableBuffer<'a> {
    ptr: Option<NonNull<u8>>,
    len: usize,
    free: usize,
    storage: Storage<'a>,
}

enum Storage<'a> {
    Heap(Heap),
    External(&'a mut dyn Allocator),
}

impl GrowableBuffer<'static> {
    /// Creates an empty buffer backed by the ambient heap.
    pub fn new() -> Self {
        Self {
            ptr: None,
            len: 0,
            free: 0,
            storage: Storage::Heap(Heap),
        }
    }
}

impl Default for GrowableBuffer<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> GrowableBuffer<'a> {
    /// Creates an empty buffer whose storage is managed by `alloc`.
    ///
    /// Ownership of the storage stays with the collaborator: the buffer will
    /// not release it on drop. Retrieve the final allocation with
    /// [`GrowableBuffer::raw_parts`] before dropping the buffer.
    pub fn with_allocator(alloc: &'a mut dyn Allocator) -> Self {
        Self {
            ptr: None,
            len: 0,
            free: 0,
            storage: Storage::External(alloc),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Spare capacity in bytes.
    pub fn free(&self) -> usize {
        self.free
    }

    /// Total allocated capacity (`len + free`).
    pub fn capacity(&self) -> usize {
        self.len + self.free
    }

    /// The bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        match self.ptr {
            None => &[],
            Some(ptr) => unsafe { slice::from_raw_parts(ptr.as_ptr(), self.len) },
        }
    }

    /// Copies the written bytes into an owned vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    /// The underlying allocation as `(pointer, written length)`.
    ///
    /// The pointer is null while nothing has been written. Used to hand the
    /// storage of an externally-allocated buffer back to its collaborator.
    pub fn raw_parts(&self) -> (*mut u8, usize) {
        match self.ptr {
            None => (std::ptr::null_mut(), 0),
            Some(ptr) => (ptr.as_ptr(), self.len),
        }
    }

    /// Copies `bytes` to the end of the buffer, growing storage as needed.
    ///
    /// After every successful call the slice `[0, len)` is valid. Growth
    /// failure surfaces as [`BufferError::AllocationFailure`] and leaves the
    /// already-written bytes intact.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        let n = bytes.len();
        if n == 0 {
            return Ok(());
        }
        if self.free < n {
            let new_capacity = (self.len + n) * 2;
            self.grow(new_capacity)?;
        }
        // After the growth check free >= n >= 1, so storage exists.
        if let Some(ptr) = self.ptr {
            unsafe {
                ptr.as_ptr()
                    .add(self.len)
                    .copy_from_nonoverlapping(bytes.as_ptr(), n);
            }
            self.len += n;
            self.free -= n;
        }
        Ok(())
    }

    fn grow(&mut self, new_capacity: usize) -> Result<(), BufferError> {
        let old_capacity = self.len + self.free;
        let alloc: &mut dyn Allocator = match &mut self.storage {
            Storage::Heap(heap) => heap,
            Storage::External(alloc) => *alloc,
        };
        let grown = match self.ptr {
            None => alloc.allocate(new_capacity),
            Some(ptr) => unsafe { alloc.reallocate(ptr, old_capacity, new_capacity) },
        };
        match grown {
            Some(ptr) => {
                self.ptr = Some(ptr);
                self.free = new_capacity - self.len;
                Ok(())
            }
            None => Err(BufferError::AllocationFailure),
        }
    }
}

impl Drop for GrowableBuffer<'_> {
    fn drop(&mut self) {
        // External storage belongs to the collaborator.
        if let (Storage::Heap(heap), Some(ptr)) = (&mut self.storage, self.ptr) {
            let capacity = self.len + self.free;
            unsafe { heap.release(ptr, capacity) };
        }
    }
}
