/*!
 * Address-Ordered Free List
 *
 * First-fit search and the merge/insert algorithm over the arena state.
 * The list is singly linked through the in-band headers, strictly
 * ascending by offset, bounded by the head link (`first_free`, held in the
 * engine state rather than the arena) and the zero-size tail sentinel at
 * the top of the arena. Coalescing is exhaustive: after every insert no
 * two list entries are byte-adjacent.
 */

use super::layout::BlockHeader;
use super::HeapState;
use crate::core::types::{Address, Size};

/// Outcome of a first-fit walk.
pub(crate) enum Fit {
    Found {
        /// Free block preceding the hit, `None` when the hit is the list head.
        prev: Option<Address>,
        block: Address,
    },
    /// Walk reached the tail sentinel; no single block was large enough.
    Miss { largest: Size },
}

impl HeapState {
    /// Decode the header at `offset`.
    pub(crate) fn header(&self, offset: Address) -> BlockHeader {
        BlockHeader::read(&self.buf, offset)
    }

    /// Encode `header` at `offset`.
    pub(crate) fn write_header(&mut self, offset: Address, header: BlockHeader) {
        header.write(&mut self.buf, offset);
    }

    /// Rewrite only the link word of the block at `offset`.
    pub(crate) fn set_next(&mut self, offset: Address, next: Option<Address>) {
        let mut header = self.header(offset);
        header.next = next;
        self.write_header(offset, header);
    }

    /// Walk the list in address order and return the first block whose size
    /// satisfies `needed`.
    pub(crate) fn find_first_fit(&self, needed: Size) -> Fit {
        let mut prev = None;
        let mut cursor = self.first_free;
        let mut largest = 0;

        while cursor != self.tail {
            let header = self.header(cursor);
            if header.size >= needed {
                return Fit::Found {
                    prev,
                    block: cursor,
                };
            }
            largest = largest.max(header.size);
            prev = Some(cursor);
            cursor = header.next.unwrap_or(self.tail);
        }

        Fit::Miss { largest }
    }

    /// Remove `block` from the list given its predecessor.
    pub(crate) fn unlink(&mut self, prev: Option<Address>, block: Address) {
        let successor = self.header(block).next;
        match prev {
            Some(prev) => self.set_next(prev, successor),
            None => self.first_free = successor.unwrap_or(self.tail),
        }
    }

    /// Insert a block that is not currently in the list at its
    /// address-sorted position, merging with byte-adjacent neighbors.
    ///
    /// The block's header must already carry its size; the allocated flag
    /// and link are rewritten here.
    pub(crate) fn insert_free_block(&mut self, offset: Address) {
        // Find the insertion point: `next` is the first list entry at a
        // higher offset, `prev` the entry before it (None = head).
        let mut prev: Option<Address> = None;
        let mut next = self.first_free;
        while next < offset {
            prev = Some(next);
            next = self.header(next).next.unwrap_or(self.tail);
        }

        // Backward adjacency: absorb the block into its predecessor and
        // continue positioning the predecessor instead.
        let mut block = offset;
        let mut merged_back = false;
        if let Some(pred) = prev {
            let pred_header = self.header(pred);
            if pred + pred_header.size == offset {
                let absorbed = self.header(offset).size;
                self.write_header(
                    pred,
                    BlockHeader {
                        size: pred_header.size + absorbed,
                        allocated: false,
                        next: pred_header.next,
                    },
                );
                block = pred;
                merged_back = true;
            }
        }

        // Forward adjacency: absorb the successor unless it is the tail
        // sentinel, which is never merged away.
        let block_size = self.header(block).size;
        if block + block_size == next && next != self.tail {
            let next_header = self.header(next);
            self.write_header(
                block,
                BlockHeader {
                    size: block_size + next_header.size,
                    allocated: false,
                    next: next_header.next,
                },
            );
        } else {
            self.write_header(
                block,
                BlockHeader {
                    size: block_size,
                    allocated: false,
                    next: Some(next),
                },
            );
        }

        // Link the predecessor forward unless the block was absorbed into
        // it, in which case the link already points past the merged span.
        if !merged_back {
            match prev {
                Some(pred) => self.set_next(pred, Some(block)),
                None => self.first_free = block,
            }
        }
    }
}
