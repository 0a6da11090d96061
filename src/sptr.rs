//! Pointer helpers for moving a (possibly fat) pointer onto another address.
//!
//! Inline payloads move together with their box, so only the metadata half of
//! their pointer is stored and the address half is rebuilt on every access.

#[cfg(feature = "nightly")]
mod implementation {
    pub fn dangling_aligned(align: usize) -> *mut u8 {
        core::ptr::without_provenance_mut(align)
    }

    pub fn rebase<T: ?Sized>(addr: *const u8, meta: *const T) -> *const T {
        addr.with_metadata_of(meta)
    }

    pub fn rebase_mut<T: ?Sized>(addr: *mut u8, meta: *const T) -> *mut T {
        addr.with_metadata_of(meta)
    }
}

// Relies on the data address being the first word of every pointer, which
// `build.rs` checks for trait objects and slices on the host.
#[cfg(not(feature = "nightly"))]
#[allow(clippy::as_conversions)]
mod implementation {
    use core::ptr::addr_of_mut;

    pub fn dangling_aligned(align: usize) -> *mut u8 {
        align as _
    }

    pub fn rebase<T: ?Sized>(addr: *const u8, meta: *const T) -> *const T {
        rebase_mut(addr.cast_mut(), meta)
    }

    pub fn rebase_mut<T: ?Sized>(addr: *mut u8, mut meta: *const T) -> *mut T {
        let addr_word = addr_of_mut!(meta).cast::<usize>();
        unsafe { addr_word.write(addr as usize) }
        meta.cast_mut()
    }
}

pub use implementation::*;
