use crate::constants::*;

/// Flat word-addressed physical memory. The segment table lives in frame 0,
/// so `PM[s]` is the ST entry for segment `s`.
pub struct PhysicalMemory {
    data: Box<[i32]>,
}

impl PhysicalMemory {
    /// Create a new physical memory initialized to all zeros
    pub fn new() -> Self {
        PhysicalMemory {
            data: vec![0i32; PM_SIZE].into_boxed_slice(),
        }
    }

    /// Read a word from physical memory
    #[inline]
    pub fn read(&self, address: usize) -> i32 {
        self.data[address]
    }

    /// Write a word to physical memory
    #[inline]
    pub fn write(&mut self, address: usize, value: i32) {
        self.data[address] = value;
    }

    /// `ST[s]`: base address of the segment's page table, or a sentinel
    #[inline]
    pub fn segment_entry(&self, segment: u32) -> i32 {
        self.read(segment as usize)
    }

    pub fn set_segment_entry(&mut self, segment: u32, pt_address: i32) {
        self.write(segment as usize, pt_address);
    }

    /// `PT[p]` for the page table starting at `pt_address`
    #[inline]
    pub fn page_entry(&self, pt_address: i32, page: u32) -> i32 {
        self.read(pt_address as usize + page as usize)
    }

    pub fn set_page_entry(&mut self, pt_address: i32, page: u32, page_address: i32) {
        self.write(pt_address as usize + page as usize, page_address);
    }

    /// Zero every word
    pub fn fill_zero(&mut self) {
        self.data.fill(0);
    }

    /// Calculate the starting address of a frame
    #[inline]
    pub fn frame_to_address(frame: usize) -> usize {
        frame * FRAME_SIZE
    }
}

impl Default for PhysicalMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pm_initialization() {
        let pm = PhysicalMemory::new();
        // All memory should be zeroed
        assert_eq!(pm.read(0), 0);
        assert_eq!(pm.read(PM_SIZE - 1), 0);
    }

    #[test]
    fn test_pm_read_write() {
        let mut pm = PhysicalMemory::new();
        pm.write(100, 42);
        assert_eq!(pm.read(100), 42);

        pm.write(100, -1);
        assert_eq!(pm.read(100), -1);
    }

    #[test]
    fn test_segment_table_operations() {
        let mut pm = PhysicalMemory::new();

        // Segment 6 has its PT at address 1024 (frames 2-3)
        pm.set_segment_entry(6, 1024);
        assert_eq!(pm.segment_entry(6), 1024);

        // The ST sits at the very start of memory
        assert_eq!(pm.read(6), 1024);
    }

    #[test]
    fn test_page_table_operations() {
        let mut pm = PhysicalMemory::new();

        // PT at 2048, page 700 backed by the frame at 5120
        pm.set_page_entry(2048, 700, 5120);

        assert_eq!(pm.page_entry(2048, 700), 5120);
        // PTs span two frames, so page 700 lands in the second one
        assert_eq!(pm.read(2048 + 700), 5120);
    }

    #[test]
    fn test_fill_zero() {
        let mut pm = PhysicalMemory::new();
        pm.write(0, 7);
        pm.write(PM_SIZE - 1, -1);
        pm.fill_zero();
        assert_eq!(pm.read(0), 0);
        assert_eq!(pm.read(PM_SIZE - 1), 0);
    }

    #[test]
    fn test_frame_to_address() {
        assert_eq!(PhysicalMemory::frame_to_address(0), 0);
        assert_eq!(PhysicalMemory::frame_to_address(1), 512);
        assert_eq!(PhysicalMemory::frame_to_address(4), 2048);
        assert_eq!(PhysicalMemory::frame_to_address(N_FRAMES - 1), PM_SIZE - FRAME_SIZE);
    }
}
