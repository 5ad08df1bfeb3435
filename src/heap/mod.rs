/*!
 * Heap Engine
 *
 * Fixed-arena first-fit allocator with an address-ordered free list.
 *
 * ## Algorithm
 *
 * - **First-fit search**: the free list is walked in address order and the
 *   first block large enough wins.
 * - **Splitting**: a found block larger than needed is split; the
 *   remainder re-enters the free list.
 * - **Coalescing**: freed blocks merge with byte-adjacent neighbors on
 *   insert, so the list never holds two adjacent entries.
 *
 * ## Concurrency
 *
 * Every public call runs end-to-end under one lock; calls are totally
 * ordered by lock acquisition. The lock type is pluggable (any
 * `lock_api::RawMutex`) and defaults to the crate's busy-wait spin lock.
 * The lock is not reentrant: re-entering the same heap from a failure hook
 * deadlocks.
 *
 * ## Addressing
 *
 * The engine hands out arena *offsets*, not pointers. Offsets make the
 * ownership check on deallocate explicit and keep the core free of pointer
 * arithmetic; the `ffi` and `global` modules convert at the boundary.
 */

mod allocator;
mod free_list;
pub mod layout;
mod types;

pub mod traits;

pub use layout::{ALIGNMENT, HEADER_SIZE, MIN_BLOCK_SIZE};
pub use traits::{Allocator, HeapInfo};
pub use types::{FreeRegion, HeapConfig, HeapError, HeapResult, HeapStats, Hook};

use crate::core::sync::RawSpinLock;
use crate::core::types::{Address, Size};
use layout::{align_down, align_up, BlockHeader};
use lock_api::{Mutex, RawMutex};
use log::info;
use std::ptr::NonNull;
use std::sync::Arc;

/// Everything the lock protects: the arena bytes, the free-list head, and
/// the counters. One shared mutable resource, mutated only on the
/// lock-held call path.
pub(crate) struct HeapState {
    pub(crate) buf: Box<[u8]>,
    /// First aligned offset; start of the single initial free block.
    pub(crate) base: Address,
    /// Offset of the zero-size tail sentinel. Never merged, never returned.
    pub(crate) tail: Address,
    /// Head sentinel link: offset of the first free block (the tail when
    /// the list is empty).
    pub(crate) first_free: Address,
    pub(crate) usable: Size,
    pub(crate) free_bytes: Size,
    pub(crate) low_watermark: Size,
    pub(crate) allocated_blocks: usize,
    pub(crate) not_owned: u64,
    pub(crate) double_free: u64,
    pub(crate) on_full: Option<Hook>,
    pub(crate) on_error: Option<Hook>,
}

impl HeapState {
    /// Carve one aligned free block spanning the whole usable arena.
    fn init(config: HeapConfig) -> Self {
        let capacity = config.capacity;
        let buf: Box<[u8]> = vec![0u8; capacity].into_boxed_slice();
        let buf_addr = buf.as_ptr() as usize;

        // Align the base upward, place the tail sentinel at the highest
        // aligned offset that still leaves room for its header.
        let base = align_up(buf_addr) - buf_addr;
        assert!(
            capacity > base + MIN_BLOCK_SIZE + HEADER_SIZE + layout::ALIGNMENT,
            "arena capacity {} too small for one minimum block plus sentinels",
            capacity
        );
        let tail = align_down(buf_addr + capacity - HEADER_SIZE) - buf_addr;
        let usable = tail - base;

        let mut state = Self {
            buf,
            base,
            tail,
            first_free: base,
            usable,
            free_bytes: usable,
            low_watermark: usable,
            allocated_blocks: 0,
            not_owned: 0,
            double_free: 0,
            on_full: config.on_full,
            on_error: config.on_error,
        };

        state.write_header(
            tail,
            BlockHeader {
                size: 0,
                allocated: false,
                next: None,
            },
        );
        state.write_header(
            base,
            BlockHeader {
                size: usable,
                allocated: false,
                next: Some(tail),
            },
        );

        info!(
            "heap engine initialized: {} bytes capacity, {} usable, first-fit free list",
            capacity, usable
        );
        state
    }

    fn regions(&self) -> Vec<FreeRegion> {
        let mut out = Vec::new();
        let mut cursor = self.first_free;
        while cursor != self.tail {
            let header = self.header(cursor);
            out.push(FreeRegion {
                addr: cursor,
                size: header.size,
            });
            cursor = header.next.unwrap_or(self.tail);
        }
        out
    }
}

/// Handle to one heap instance.
///
/// Cloning is cheap and shares the arena; drop all clones to release it.
/// `R` selects the locking primitive, default busy-wait spin lock.
pub struct Heap<R: RawMutex = RawSpinLock> {
    state: Arc<Mutex<R, HeapState>>,
}

impl Heap {
    /// Heap with the default capacity and spin lock.
    pub fn new() -> Self {
        Self::with_config(HeapConfig::default())
    }

    /// Heap with a custom capacity (useful for testing).
    pub fn with_capacity(capacity: Size) -> Self {
        Self::with_config(HeapConfig::new().capacity(capacity))
    }
}

impl<R: RawMutex> Heap<R> {
    /// Heap from a full configuration. Use a turbofish to pick the lock:
    /// `Heap::<parking_lot::RawMutex>::with_config(cfg)`.
    ///
    /// # Panics
    /// Panics when the capacity cannot hold base padding, one minimum
    /// block, and the tail sentinel.
    pub fn with_config(config: HeapConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(HeapState::init(config))),
        }
    }

    /// Allocate `size` payload bytes.
    ///
    /// Returns the payload's arena offset, always 16-aligned in absolute
    /// address terms. Fails with [`HeapError::OutOfMemory`] (Full hook
    /// fires) on aggregate shortage, [`HeapError::Fragmented`] (no hook)
    /// when no single free block fits, and [`HeapError::ZeroSize`] for
    /// zero-byte requests.
    pub fn allocate(&self, size: Size) -> HeapResult<Address> {
        self.state.lock().alloc_locked(size)
    }

    /// Return a previously allocated payload to the heap, coalescing with
    /// adjacent free blocks.
    ///
    /// Foreign, misaligned, double-freed, or corrupted addresses leave the
    /// arena untouched and are reported via the error and the stats
    /// counters.
    pub fn deallocate(&self, addr: Address) -> HeapResult<()> {
        self.state.lock().free_locked(addr)
    }

    /// Current coalesced free total in bytes.
    pub fn free_bytes_remaining(&self) -> Size {
        self.state.lock().free_bytes
    }

    /// Minimum the free total has ever reached since construction.
    pub fn low_watermark(&self) -> Size {
        self.state.lock().low_watermark
    }

    /// Configured capacity of the backing buffer.
    pub fn capacity(&self) -> Size {
        self.state.lock().buf.len()
    }

    /// Bytes managed after base alignment and the tail sentinel.
    pub fn usable(&self) -> Size {
        self.state.lock().usable
    }

    /// Check whether `addr` is a live allocation.
    pub fn owns(&self, addr: Address) -> bool {
        self.block_size(addr).is_some()
    }

    /// Payload size of the allocation at `addr`, if there is one.
    ///
    /// The size is the block's capacity (header excluded), which may
    /// exceed the requested size due to alignment rounding.
    pub fn block_size(&self, addr: Address) -> Option<Size> {
        let state = self.state.lock();
        if !state.owns_payload(addr) {
            return None;
        }
        let header = state.header(addr - HEADER_SIZE);
        (header.allocated && header.next.is_none()).then(|| header.size - HEADER_SIZE)
    }

    /// Full statistics snapshot.
    pub fn stats(&self) -> HeapStats {
        let state = self.state.lock();
        let used = state.usable - state.free_bytes;
        HeapStats {
            capacity: state.buf.len(),
            usable: state.usable,
            free_bytes: state.free_bytes,
            used_bytes: used,
            low_watermark: state.low_watermark,
            usage_percentage: (used as f64 / state.usable as f64) * 100.0,
            free_blocks: state.regions().len(),
            allocated_blocks: state.allocated_blocks,
            not_owned_rejections: state.not_owned,
            double_free_rejections: state.double_free,
        }
    }

    /// Address-ordered snapshot of the free list.
    pub fn free_regions(&self) -> Vec<FreeRegion> {
        self.state.lock().regions()
    }

    /// Copy `data` into the payload at `addr`.
    pub fn write_payload(&self, addr: Address, data: &[u8]) -> HeapResult<()> {
        let mut state = self.state.lock();
        let (_, header) = state.checked_block(addr)?;
        let payload = header.size - HEADER_SIZE;
        if data.len() > payload {
            return Err(HeapError::OutOfBounds {
                addr,
                len: data.len(),
                payload,
            });
        }
        state.buf[addr..addr + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Copy `out.len()` bytes out of the payload at `addr`.
    pub fn read_payload(&self, addr: Address, out: &mut [u8]) -> HeapResult<()> {
        let mut state = self.state.lock();
        let (_, header) = state.checked_block(addr)?;
        let payload = header.size - HEADER_SIZE;
        if out.len() > payload {
            return Err(HeapError::OutOfBounds {
                addr,
                len: out.len(),
                payload,
            });
        }
        out.copy_from_slice(&state.buf[addr..addr + out.len()]);
        Ok(())
    }

    /// Raw pointer to the payload at `addr`, for the pointer-facing
    /// boundary layers. `None` unless `addr` is a live allocation.
    pub fn payload_ptr(&self, addr: Address) -> Option<NonNull<u8>> {
        let state = self.state.lock();
        if !state.owns_payload(addr) {
            return None;
        }
        let header = state.header(addr - HEADER_SIZE);
        if !header.allocated || header.next.is_some() {
            return None;
        }
        NonNull::new(state.abs_addr(addr) as *mut u8)
    }

    /// Arena offset of a raw pointer, if it points into the backing
    /// buffer. This is the ownership check of the pointer boundary; the
    /// offset is validated again by whatever operation consumes it.
    pub fn offset_of(&self, ptr: *const u8) -> Option<Address> {
        let state = self.state.lock();
        let start = state.buf.as_ptr() as usize;
        let addr = ptr as usize;
        (addr >= start && addr < start + state.buf.len()).then(|| addr - start)
    }

    /// Record a rejected foreign pointer (outside the buffer entirely),
    /// keeping the NotOwned counter accurate for the pointer shims.
    pub(crate) fn note_foreign_pointer(&self, raw: usize) -> HeapError {
        let mut state = self.state.lock();
        state.not_owned += 1;
        log::warn!("rejected pointer outside the arena: 0x{:x}", raw);
        HeapError::NotOwned(raw)
    }
}

// Trait interfaces
impl<R: RawMutex + Send + Sync> Allocator for Heap<R> {
    fn allocate(&self, size: Size) -> HeapResult<Address> {
        Heap::allocate(self, size)
    }

    fn deallocate(&self, addr: Address) -> HeapResult<()> {
        Heap::deallocate(self, addr)
    }

    fn owns(&self, addr: Address) -> bool {
        Heap::owns(self, addr)
    }

    fn block_size(&self, addr: Address) -> Option<Size> {
        Heap::block_size(self, addr)
    }
}

impl<R: RawMutex + Send + Sync> HeapInfo for Heap<R> {
    fn stats(&self) -> HeapStats {
        Heap::stats(self)
    }

    fn free_bytes_remaining(&self) -> Size {
        Heap::free_bytes_remaining(self)
    }

    fn low_watermark(&self) -> Size {
        Heap::low_watermark(self)
    }

    fn free_regions(&self) -> Vec<FreeRegion> {
        Heap::free_regions(self)
    }
}

impl<R: RawMutex> Clone for Heap<R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}
