/*!
 * C-Callable Wrapper
 *
 * Thin pass-through surface over one process-global heap instance, for
 * linking the engine under C firmware code. No allocation logic lives
 * here; errors become null returns or logged no-ops, which is all a C
 * caller can observe.
 */

use crate::heap::Heap;
use std::ffi::c_void;
use std::ptr;
use std::sync::OnceLock;

static GLOBAL_HEAP: OnceLock<Heap> = OnceLock::new();

/// The process-global heap backing the C surface, created on first use
/// with the default configuration.
pub fn global_heap() -> &'static Heap {
    GLOBAL_HEAP.get_or_init(Heap::new)
}

/// Allocate `size` bytes from the global heap. Returns null on failure.
#[no_mangle]
pub extern "C" fn firstfit_alloc(size: usize) -> *mut c_void {
    let heap = global_heap();
    match heap.allocate(size) {
        Ok(addr) => heap
            .payload_ptr(addr)
            .map(|p| p.as_ptr() as *mut c_void)
            .unwrap_or(ptr::null_mut()),
        Err(err) => {
            log::debug!("firstfit_alloc({}) failed: {}", size, err);
            ptr::null_mut()
        }
    }
}

/// Return a pointer obtained from [`firstfit_alloc`] to the global heap.
/// Null, foreign, and already-freed pointers are no-ops.
#[no_mangle]
pub extern "C" fn firstfit_free(ptr: *mut c_void) {
    if ptr.is_null() {
        return;
    }
    let heap = global_heap();
    let result = match heap.offset_of(ptr as *const u8) {
        Some(addr) => heap.deallocate(addr),
        None => Err(heap.note_foreign_pointer(ptr as usize)),
    };
    if let Err(err) = result {
        log::warn!("firstfit_free({:p}) rejected: {}", ptr, err);
    }
}

/// Coalesced free-byte total of the global heap.
#[no_mangle]
pub extern "C" fn firstfit_free_bytes() -> usize {
    global_heap().free_bytes_remaining()
}
