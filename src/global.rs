/*!
 * GlobalAlloc Adapter
 *
 * Routes `std::alloc::GlobalAlloc` calls through a heap instance: one
 * seam standing in for malloc/calloc/realloc/free wraps, `new`/`delete`
 * overrides, and container allocators. Pass-through only; every call
 * lands in `Heap::allocate` / `Heap::deallocate`.
 *
 * The arena itself is reserved up front from the system allocator, so this
 * type is meant for allocator-parameterized containers and tests, not for
 * installation as `#[global_allocator]`.
 */

use crate::heap::{Heap, ALIGNMENT};
use std::alloc::{GlobalAlloc, Layout};
use std::ptr;

/// `GlobalAlloc` over a [`Heap`].
pub struct HeapAlloc {
    heap: Heap,
}

impl HeapAlloc {
    pub fn new(heap: Heap) -> Self {
        Self { heap }
    }

    /// The wrapped heap handle.
    pub fn heap(&self) -> &Heap {
        &self.heap
    }
}

unsafe impl GlobalAlloc for HeapAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // The engine aligns every payload to 16; stricter layouts cannot
        // be honored and zero-size layouts still need a distinct pointer.
        if layout.align() > ALIGNMENT {
            return ptr::null_mut();
        }
        match self.heap.allocate(layout.size().max(1)) {
            Ok(addr) => self
                .heap
                .payload_ptr(addr)
                .map(|p| p.as_ptr())
                .unwrap_or(ptr::null_mut()),
            Err(err) => {
                log::debug!("HeapAlloc::alloc({} bytes) failed: {}", layout.size(), err);
                ptr::null_mut()
            }
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        if ptr.is_null() {
            return;
        }
        let result = match self.heap.offset_of(ptr) {
            Some(addr) => self.heap.deallocate(addr),
            None => Err(self.heap.note_foreign_pointer(ptr as usize)),
        };
        if let Err(err) = result {
            log::warn!("HeapAlloc::dealloc({:p}) rejected: {}", ptr, err);
        }
    }

    // calloc analogue. realloc keeps the inherited default: allocate,
    // copy min(old, new), deallocate.
    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = self.alloc(layout);
        if !ptr.is_null() {
            ptr::write_bytes(ptr, 0, layout.size());
        }
        ptr
    }
}
