//! Storage selection and heap blocks that clean up after failed construction.

use core::mem::{self, align_of, size_of};
use core::ptr::NonNull;

use alloc::alloc::{alloc, dealloc, handle_alloc_error, Layout};

use crate::sptr;

/// Whether a value of type `U` can live in the inline buffer of `Space`.
///
/// This is the only question asked when a payload is built. It is also asked
/// with `U` being the source space when an inline payload changes boxes, since
/// the relocation hook does not report the payload size up front.
pub(crate) const fn fits<U, Space>() -> bool {
    size_of::<U>() <= size_of::<Space>() && align_of::<U>() <= align_of::<Space>()
}

/// A heap block that has not been handed a payload yet.
///
/// Dropping it returns the memory to the allocator, so a panic or an error
/// between allocation and [`HeapBlock::commit`] cannot leak.
pub(crate) struct HeapBlock {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl HeapBlock {
    /// Allocates a block for `layout`.
    ///
    /// Zero-sized layouts get a dangling, well-aligned pointer and nothing is
    /// allocated, matching what `Box` does for zero-sized values.
    pub(crate) fn new(layout: Layout) -> HeapBlock {
        let ptr = if layout.size() == 0 {
            sptr::dangling_aligned(layout.align())
        } else {
            unsafe { alloc(layout) }
        };

        match NonNull::new(ptr) {
            Some(ptr) => HeapBlock { ptr, layout },
            None => handle_alloc_error(layout),
        }
    }

    pub(crate) fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Gives up ownership of the block; the payload now owns it.
    pub(crate) fn commit(self) -> NonNull<u8> {
        let ptr = self.ptr;
        mem::forget(self);
        ptr
    }
}

impl Drop for HeapBlock {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
        }
    }
}
