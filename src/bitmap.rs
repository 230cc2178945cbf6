//! Physical frame occupancy bitmap.
//!
//! Bit `(row, bit)` is set when frame `row * BM_WIDTH + bit` is in use. Bit
//! `(0, 0)` belongs to the segment table and is never handed out by the
//! search functions, even after [`BitMap::clear`].

use std::fmt;

use crate::constants::BM_WIDTH;
use crate::error::{AllocationRequest, MemoryError};

/// First position any search starts from; `(0, 0)` is reserved.
const SEARCH_START: (usize, usize) = (0, 1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMap {
    rows: Box<[u32]>,
}

impl BitMap {
    /// Create a bitmap with `capacity` rows, all frames free
    pub fn new(capacity: usize) -> Self {
        BitMap {
            rows: vec![0u32; capacity].into_boxed_slice(),
        }
    }

    /// Number of rows
    #[inline]
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// Bits per row
    #[inline]
    pub fn width(&self) -> usize {
        BM_WIDTH
    }

    pub fn is_set(&self, row: usize, bit: usize) -> Result<bool, MemoryError> {
        self.check_bounds(row, bit)?;
        Ok(self.rows[row] & (1 << bit) != 0)
    }

    pub fn set(&mut self, row: usize, bit: usize, value: bool) -> Result<(), MemoryError> {
        self.check_bounds(row, bit)?;
        if value {
            self.rows[row] |= 1 << bit;
        } else {
            self.rows[row] &= !(1 << bit);
        }
        Ok(())
    }

    /// Mark every frame free
    pub fn clear(&mut self) {
        self.rows.fill(0);
    }

    /// Mark frame `(0, 0)` occupied; it always backs the segment table
    pub fn reserve_first(&mut self) {
        if let Some(row) = self.rows.first_mut() {
            *row |= 1;
        }
    }

    /// Total number of occupied frames
    pub fn count_occupied(&self) -> usize {
        self.rows.iter().map(|row| row.count_ones() as usize).sum()
    }

    /// First free frame, skipping the reserved `(0, 0)`
    pub fn find_first_zero(&self) -> Result<(usize, usize), MemoryError> {
        let (row, bit) = SEARCH_START;
        self.find_zero_from(row, bit, AllocationRequest::Frame)
    }

    /// First free frame whose raster successor is also free.
    ///
    /// The successor of the last bit in a row is bit 0 of the next row. When
    /// a candidate's successor is taken, the scan resumes after the successor
    /// instead of restarting from the beginning.
    pub fn find_consecutive_zeros(&self) -> Result<(usize, usize), MemoryError> {
        const REQUEST: AllocationRequest = AllocationRequest::ConsecutiveFrames;

        let (mut row, mut bit) = SEARCH_START;
        while row < self.size() {
            let first = self.find_zero_from(row, bit, REQUEST)?;
            let (next_row, next_bit) = Self::successor(first);
            if next_row >= self.size() {
                break;
            }
            if self.rows[next_row] & (1 << next_bit) == 0 {
                return Ok(first);
            }
            (row, bit) = Self::successor((next_row, next_bit));
        }
        Err(MemoryError::AllocationExhausted { request: REQUEST })
    }

    fn find_zero_from(
        &self,
        row: usize,
        bit: usize,
        request: AllocationRequest,
    ) -> Result<(usize, usize), MemoryError> {
        for (index, &word) in self.rows.iter().enumerate().skip(row) {
            // Treat bits before the starting position as taken
            let skipped = if index == row { (1u32 << bit) - 1 } else { 0 };
            let free = !(word | skipped);
            if free != 0 {
                return Ok((index, free.trailing_zeros() as usize));
            }
        }
        Err(MemoryError::AllocationExhausted { request })
    }

    /// Position immediately after `(row, bit)`, carrying into the next row
    #[inline]
    fn successor((row, bit): (usize, usize)) -> (usize, usize) {
        if bit + 1 == BM_WIDTH {
            (row + 1, 0)
        } else {
            (row, bit + 1)
        }
    }

    fn check_bounds(&self, row: usize, bit: usize) -> Result<(), MemoryError> {
        if row >= self.size() || bit >= BM_WIDTH {
            return Err(MemoryError::OutOfRange { row, bit });
        }
        Ok(())
    }
}

impl fmt::Display for BitMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BitMap(")?;
        for (index, row) in self.rows.iter().enumerate() {
            writeln!(f, "  {:>2}: {:032b}", index, row)?;
        }
        write!(f, ")")
    }
}
