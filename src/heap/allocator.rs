/*!
 * Heap Allocator Implementation
 * Allocation and deallocation logic
 */

use super::free_list::Fit;
use super::layout::{align_up, BlockHeader, ALIGNMENT_MASK, HEADER_SIZE, MIN_BLOCK_SIZE};
use super::HeapState;
use crate::core::types::{Address, Size};
use log::{debug, warn};

impl HeapState {
    /// Absolute machine address of an arena offset.
    #[inline]
    pub(crate) fn abs_addr(&self, offset: Address) -> usize {
        self.buf.as_ptr() as usize + offset
    }

    /// Fire the error hook and abort. Invariant violations are
    /// unrecoverable by contract and must not be caught or retried.
    pub(crate) fn fatal(&self, what: &str) -> ! {
        log::error!("heap invariant violated: {}", what);
        if let Some(hook) = &self.on_error {
            hook();
        }
        panic!("heap invariant violated: {}", what);
    }

    fn fire_full_hook(&self) {
        match &self.on_full {
            Some(hook) => hook(),
            None => debug!("heap full hook (default): allocation rejected"),
        }
    }

    /// First-fit allocation. Runs under the engine lock.
    pub(crate) fn alloc_locked(&mut self, size: Size) -> super::HeapResult<Address> {
        use super::HeapError;

        if size == 0 {
            return Err(HeapError::ZeroSize);
        }

        // Fast reject on aggregate shortage. The full hook fires here and
        // only here; a fragmentation miss further down returns without it.
        if size > self.free_bytes || self.free_bytes < MIN_BLOCK_SIZE {
            warn!(
                "heap full: requested {} bytes, {} free of {} usable",
                size, self.free_bytes, self.usable
            );
            self.fire_full_hook();
            return Err(HeapError::OutOfMemory {
                requested: size,
                available: self.free_bytes,
                usable: self.usable,
            });
        }

        // Grow the request to hold the header, then round to alignment.
        let needed = align_up(size + HEADER_SIZE);

        let (prev, block) = match self.find_first_fit(needed) {
            Fit::Found { prev, block } => (prev, block),
            Fit::Miss { largest } => {
                debug!(
                    "fragmentation miss: need {} contiguous bytes, largest free block {} ({} free total)",
                    needed, largest, self.free_bytes
                );
                return Err(HeapError::Fragmented {
                    requested: size,
                    needed,
                    largest_free: largest,
                });
            }
        };

        self.unlink(prev, block);
        let mut header = self.header(block);

        // Split when the remainder is worth tracking as its own block. The
        // remainder re-enters through merge/insert; it cannot coalesce with
        // anything because both neighbors are in use or the tail sentinel.
        if header.size - needed > MIN_BLOCK_SIZE {
            let remainder = block + needed;
            if self.abs_addr(remainder) & ALIGNMENT_MASK != 0 {
                self.fatal("split produced an unaligned block");
            }
            self.write_header(
                remainder,
                BlockHeader {
                    size: header.size - needed,
                    allocated: false,
                    next: None,
                },
            );
            header.size = needed;
            self.insert_free_block(remainder);
        }

        self.free_bytes -= header.size;
        if self.free_bytes < self.low_watermark {
            self.low_watermark = self.free_bytes;
        }

        header.allocated = true;
        header.next = None;
        self.write_header(block, header);
        self.allocated_blocks += 1;

        let payload = block + HEADER_SIZE;
        if self.abs_addr(payload) & ALIGNMENT_MASK != 0 {
            self.fatal("computed payload address is unaligned");
        }

        debug!(
            "allocated {} bytes at offset 0x{:x} ({} remaining, watermark {})",
            header.size, payload, self.free_bytes, self.low_watermark
        );
        Ok(payload)
    }

    /// Validate that `addr` lies inside the managed span and is aligned.
    pub(crate) fn owns_payload(&self, addr: Address) -> bool {
        addr >= self.base + HEADER_SIZE
            && addr < self.tail
            && self.abs_addr(addr) & ALIGNMENT_MASK == 0
    }

    /// Header checks shared by deallocate and the payload accessors.
    /// Returns the block offset and its decoded header.
    pub(crate) fn checked_block(
        &mut self,
        addr: Address,
    ) -> super::HeapResult<(Address, BlockHeader)> {
        use super::HeapError;

        if !self.owns_payload(addr) {
            self.not_owned += 1;
            warn!("rejected foreign address 0x{:x}", addr);
            return Err(HeapError::NotOwned(addr));
        }

        let block = addr - HEADER_SIZE;
        let header = self.header(block);

        // An allocated block never carries a live list link; a stray link
        // or a clear flag means a double free or caller corruption.
        let corrupt = !header.allocated
            || header.next.is_some()
            || header.size < MIN_BLOCK_SIZE
            || header.size & ALIGNMENT_MASK != 0
            || block + header.size > self.tail;
        if corrupt {
            self.double_free += 1;
            warn!("rejected double free or corrupted block at 0x{:x}", addr);
            return Err(HeapError::DoubleFreeOrCorrupted(addr));
        }

        Ok((block, header))
    }

    /// Return a block to the free list. Runs under the engine lock.
    pub(crate) fn free_locked(&mut self, addr: Address) -> super::HeapResult<()> {
        let (block, header) = self.checked_block(addr)?;

        self.write_header(
            block,
            BlockHeader {
                size: header.size,
                allocated: false,
                next: None,
            },
        );
        self.free_bytes += header.size;
        self.allocated_blocks = self.allocated_blocks.saturating_sub(1);
        self.insert_free_block(block);

        debug!(
            "freed {} bytes at offset 0x{:x} ({} now free)",
            header.size, addr, self.free_bytes
        );
        Ok(())
    }
}
