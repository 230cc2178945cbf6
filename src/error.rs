//! Fatal memory-system errors.
//!
//! Faulting translations (`pf`, `err`) are ordinary results and never show up
//! here. A [`MemoryError`] means the allocator's capacity assumptions were
//! violated and the current run cannot continue.

use std::fmt;

/// What the allocator was asked to find when it ran out of space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationRequest {
    /// A single free frame (data page)
    Frame,
    /// Two raster-adjacent free frames (page table)
    ConsecutiveFrames,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// No free frame, or no free pair of adjacent frames, is left
    AllocationExhausted { request: AllocationRequest },

    /// Bitmap position outside the tracked rows/bits
    OutOfRange { row: usize, bit: usize },

    /// Segment or page number past the end of its table
    EntryOutOfRange { table: &'static str, index: u32, limit: usize },
}

impl fmt::Display for AllocationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationRequest::Frame => write!(f, "free frame"),
            AllocationRequest::ConsecutiveFrames => write!(f, "pair of consecutive free frames"),
        }
    }
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::AllocationExhausted { request } => {
                write!(f, "bitmap out of space: no {} available", request)
            }
            MemoryError::OutOfRange { row, bit } => {
                write!(f, "bitmap position ({}, {}) out of range", row, bit)
            }
            MemoryError::EntryOutOfRange { table, index, limit } => {
                write!(f, "{} index {} out of range (limit {})", table, index, limit)
            }
        }
    }
}

impl std::error::Error for MemoryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let exhausted = MemoryError::AllocationExhausted {
            request: AllocationRequest::ConsecutiveFrames,
        };
        assert_eq!(
            exhausted.to_string(),
            "bitmap out of space: no pair of consecutive free frames available"
        );

        let range = MemoryError::OutOfRange { row: 32, bit: 0 };
        assert_eq!(range.to_string(), "bitmap position (32, 0) out of range");

        let entry = MemoryError::EntryOutOfRange { table: "segment", index: 600, limit: 512 };
        assert_eq!(entry.to_string(), "segment index 600 out of range (limit 512)");
    }
}
