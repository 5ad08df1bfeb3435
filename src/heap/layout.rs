/*!
 * Block Layout
 *
 * Alignment rules and the in-band block header. Every block (free or
 * allocated) starts with a 16-byte header written directly into the arena
 * buffer as two little-endian `u64` words:
 *
 * ```text
 *   word 0: size_and_flag - MSB = allocated flag, low bits = total block
 *           size in bytes (header + payload), always a multiple of 16
 *   word 1: next          - arena offset of the next free block, or NIL;
 *           allocated blocks must carry NIL
 * ```
 *
 * The packed size+flag word is the stored representation only; everything
 * above this module works with the decoded [`BlockHeader`].
 */

use crate::core::types::{Address, Size};

/// Alignment of block starts and returned payloads, in bytes.
pub const ALIGNMENT: usize = 16;

pub(crate) const ALIGNMENT_MASK: usize = ALIGNMENT - 1;

/// Size of the in-band block header. Exactly one alignment unit, so that
/// aligned block starts produce aligned payloads.
pub const HEADER_SIZE: usize = 16;

/// Smallest block the engine will create by splitting: header plus one
/// header-sized payload.
pub const MIN_BLOCK_SIZE: usize = HEADER_SIZE * 2;

/// Stored encoding of "no next block".
const NIL: u64 = u64::MAX;

/// Allocated flag, kept in the most significant bit of the size word.
const ALLOCATED_BIT: u64 = 1 << 63;

/// Round `value` up to the next alignment boundary.
#[inline]
pub(crate) const fn align_up(value: usize) -> usize {
    (value + ALIGNMENT_MASK) & !ALIGNMENT_MASK
}

/// Round `value` down to the previous alignment boundary.
#[inline]
pub(crate) const fn align_down(value: usize) -> usize {
    value & !ALIGNMENT_MASK
}

/// Decoded block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockHeader {
    /// Total block size in bytes, header included.
    pub size: Size,
    pub allocated: bool,
    /// Next free block, meaningful only while the block is free.
    pub next: Option<Address>,
}

impl BlockHeader {
    /// Decode the header stored at `offset`.
    ///
    /// # Panics
    /// Panics if `offset + HEADER_SIZE` is out of bounds; callers validate
    /// offsets before reading.
    pub fn read(buf: &[u8], offset: usize) -> Self {
        let word0 = u64::from_le_bytes(buf[offset..offset + 8].try_into().unwrap());
        let word1 = u64::from_le_bytes(buf[offset + 8..offset + 16].try_into().unwrap());

        Self {
            size: (word0 & !ALLOCATED_BIT) as Size,
            allocated: word0 & ALLOCATED_BIT != 0,
            next: if word1 == NIL {
                None
            } else {
                Some(word1 as Address)
            },
        }
    }

    /// Encode the header into the arena at `offset`.
    pub fn write(self, buf: &mut [u8], offset: usize) {
        let mut word0 = self.size as u64;
        if self.allocated {
            word0 |= ALLOCATED_BIT;
        }
        let word1 = match self.next {
            Some(next) => next as u64,
            None => NIL,
        };

        buf[offset..offset + 8].copy_from_slice(&word0.to_le_bytes());
        buf[offset + 8..offset + 16].copy_from_slice(&word1.to_le_bytes());
    }
}
