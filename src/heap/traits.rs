/*!
 * Heap Traits
 * Allocation and inspection abstractions
 */

use super::types::*;
use crate::core::types::{Address, Size};

/// Heap allocator interface
pub trait Allocator: Send + Sync {
    /// Allocate `size` payload bytes, returning the payload's arena offset.
    fn allocate(&self, size: Size) -> HeapResult<Address>;

    /// Return a previously allocated payload to the heap.
    fn deallocate(&self, addr: Address) -> HeapResult<()>;

    /// Check whether an offset refers to a live allocation in this arena.
    fn owns(&self, addr: Address) -> bool;

    /// Payload size of an allocated block, if `addr` is one.
    fn block_size(&self, addr: Address) -> Option<Size>;
}

/// Heap statistics provider
pub trait HeapInfo: Send + Sync {
    /// Full statistics snapshot.
    fn stats(&self) -> HeapStats;

    /// Current coalesced free total.
    fn free_bytes_remaining(&self) -> Size;

    /// Historical minimum of the free total.
    fn low_watermark(&self) -> Size;

    /// Address-ordered snapshot of the free list.
    fn free_regions(&self) -> Vec<FreeRegion>;
}
