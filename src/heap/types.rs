/*!
 * Heap Types
 * Errors, statistics, and configuration for the heap engine
 */

use crate::core::limits::DEFAULT_HEAP_CAPACITY;
use crate::core::types::{Address, Size};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Heap operation result
pub type HeapResult<T> = Result<T, HeapError>;

/// Heap errors
///
/// Capacity failures (`OutOfMemory`, `Fragmented`) are expected and
/// recoverable. `NotOwned` and `DoubleFreeOrCorrupted` indicate defects in
/// caller code; the arena is left untouched and a rejection counter is
/// incremented so the condition stays observable. Invariant violations are
/// not represented here: they fire the error hook and panic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeapError {
    #[error("zero-byte allocation request")]
    ZeroSize,

    #[error("out of memory: requested {requested} bytes, {available} free of {usable} usable")]
    OutOfMemory {
        requested: Size,
        available: Size,
        usable: Size,
    },

    #[error(
        "fragmented: requested {requested} bytes needs a {needed}-byte block, largest free block is {largest_free} bytes"
    )]
    Fragmented {
        requested: Size,
        /// Header-inclusive, alignment-rounded block size the request needs.
        needed: Size,
        largest_free: Size,
    },

    #[error("address not owned by this arena: 0x{0:x}")]
    NotOwned(Address),

    #[error("double free or corrupted block at 0x{0:x}")]
    DoubleFreeOrCorrupted(Address),

    #[error("payload access out of bounds at 0x{addr:x}: {len} bytes into a {payload}-byte payload")]
    OutOfBounds {
        addr: Address,
        len: usize,
        payload: Size,
    },
}

/// One entry of the free-list snapshot, address-ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeRegion {
    /// Arena offset of the block header.
    pub addr: Address,
    /// Total block size, header included.
    pub size: Size,
}

/// Heap statistics snapshot.
///
/// `free_bytes` says nothing about fragmentation: a large value does not
/// guarantee a large contiguous block exists. Use
/// [`free_regions`](crate::heap::Heap::free_regions) for that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeapStats {
    /// Backing buffer size as configured.
    pub capacity: Size,
    /// Bytes actually managed after base alignment and the tail sentinel.
    pub usable: Size,
    pub free_bytes: Size,
    pub used_bytes: Size,
    /// Historical minimum of `free_bytes` since construction.
    pub low_watermark: Size,
    pub usage_percentage: f64,
    pub free_blocks: usize,
    pub allocated_blocks: usize,
    /// Deallocations rejected because the address was outside the arena.
    pub not_owned_rejections: u64,
    /// Deallocations rejected as double frees or corrupted headers.
    pub double_free_rejections: u64,
}

/// Failure notification callback.
///
/// Hooks run while the heap lock is held; calling back into the same heap
/// from a hook deadlocks.
pub type Hook = Arc<dyn Fn() + Send + Sync>;

/// Heap construction parameters.
///
/// Capacity is fixed for the lifetime of the instance. Hooks default to
/// debug-log no-ops.
#[derive(Clone)]
pub struct HeapConfig {
    pub capacity: Size,
    pub(crate) on_full: Option<Hook>,
    pub(crate) on_error: Option<Hook>,
}

impl HeapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the arena capacity in bytes.
    pub fn capacity(mut self, capacity: Size) -> Self {
        self.capacity = capacity;
        self
    }

    /// Callback fired when an allocation fails for aggregate shortage.
    ///
    /// Not fired on fragmentation misses: those return
    /// [`HeapError::Fragmented`] while aggregate bytes remain.
    pub fn on_full(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_full = Some(Arc::new(hook));
        self
    }

    /// Callback fired on a fatal invariant violation, before the engine
    /// panics.
    pub fn on_error(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(hook));
        self
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HEAP_CAPACITY,
            on_full: None,
            on_error: None,
        }
    }
}

impl fmt::Debug for HeapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapConfig")
            .field("capacity", &self.capacity)
            .field("on_full", &self.on_full.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
