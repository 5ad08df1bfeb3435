/*!
 * firstfit
 * Fixed-arena first-fit heap engine for environments without an OS heap
 *
 * One fixed-capacity byte arena, an address-ordered free list with
 * splitting and exhaustive coalescing, free-byte and low-watermark
 * statistics, a pluggable lock serializing all traffic, and Full/Error
 * failure hooks. The core hands out arena offsets; the `ffi` and `global`
 * modules convert to raw pointers at the boundary.
 */

pub mod core;
pub mod ffi;
pub mod global;
pub mod heap;

// Re-exports
pub use crate::core::sync::RawSpinLock;
pub use crate::core::types::{Address, Size};
pub use crate::core::DEFAULT_HEAP_CAPACITY;
pub use crate::global::HeapAlloc;
pub use crate::heap::{
    Allocator, FreeRegion, Heap, HeapConfig, HeapError, HeapInfo, HeapResult, HeapStats,
    ALIGNMENT, HEADER_SIZE, MIN_BLOCK_SIZE,
};
