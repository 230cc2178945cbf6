//! Segment/page translation over physical memory, with demand allocation
//! on writes and an optional TLB in front of the tables.

use log::{debug, trace, warn};

use crate::bitmap::BitMap;
use crate::constants::*;
use crate::error::MemoryError;
use crate::memory::PhysicalMemory;
use crate::tlb::TranslationLookasideBuffer;
use crate::translation::{
    Access, Action, Operation, TlbEvent, TranslationResult, VirtualAddress,
};

/// State of the ST/PT entries for one (s, p) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    /// ST[s] or PT[s,p] is invalid
    Fault,
    /// ST[s] is 0: no page table yet
    TableMissing,
    /// PT[s,p] is 0: no data frame yet
    PageMissing,
    /// Base address of the data frame
    Resolved(i32),
}

pub struct VirtualMemorySystem {
    pm: PhysicalMemory,
    bit_map: BitMap,
    tlb: TranslationLookasideBuffer,
}

impl VirtualMemorySystem {
    pub fn new() -> Self {
        Self::with_tlb_capacity(DEFAULT_TLB_CAPACITY)
    }

    pub fn with_tlb_capacity(capacity: usize) -> Self {
        let mut bit_map = BitMap::new(BM_SIZE);
        bit_map.reserve_first();

        VirtualMemorySystem {
            pm: PhysicalMemory::new(),
            bit_map,
            tlb: TranslationLookasideBuffer::new(capacity),
        }
    }

    pub fn bitmap(&self) -> &BitMap {
        &self.bit_map
    }

    pub fn tlb(&self) -> &TranslationLookasideBuffer {
        &self.tlb
    }

    /// `ST[s]`; `segment` must be below `ST_SIZE`
    pub fn segment_entry(&self, segment: u32) -> i32 {
        self.pm.segment_entry(segment)
    }

    /// `PM[PM[s] + p]`.
    ///
    /// A segment without a resident table reports its own ST entry for every
    /// page, so an invalid segment looks invalid and an unallocated one looks
    /// unallocated.
    pub fn get_page_table(&self, segment: u32, page: u32) -> i32 {
        match self.pm.segment_entry(segment) {
            pt_address if pt_address > 0 => self.pm.page_entry(pt_address, page),
            entry => entry,
        }
    }

    /// Bitmap position `(row, bit)` of the frame containing `address`
    pub fn frame_location(address: i32) -> (usize, usize) {
        let frame = address.max(0) as usize / FRAME_SIZE;
        (frame / BM_WIDTH, frame % BM_WIDTH)
    }

    /// Preload `ST[segment] = address`, claiming both frames of the table
    pub fn create_page_table(&mut self, segment: u32, address: i32) -> Result<(), MemoryError> {
        Self::check_entry("segment", segment, ST_SIZE)?;
        if address > 0 {
            if address as usize + PT_SIZE > PM_SIZE {
                let (row, bit) = Self::frame_location(address);
                return Err(MemoryError::OutOfRange { row, bit });
            }
            self.mark_frames(address, PT_FRAMES)?;
        }
        debug!("preload: ST[{}] = {}", segment, address);
        self.pm.set_segment_entry(segment, address);
        Ok(())
    }

    /// Preload `PT[segment, page] = address`, claiming the data frame
    pub fn create_page(&mut self, page: u32, segment: u32, address: i32) -> Result<(), MemoryError> {
        Self::check_entry("segment", segment, ST_SIZE)?;
        Self::check_entry("page", page, PT_SIZE)?;
        let pt_address = self.pm.segment_entry(segment);
        if pt_address <= 0 {
            warn!(
                "preload: skipping page {} of segment {}, ST entry is {}",
                page, segment, pt_address
            );
            return Ok(());
        }
        if address > 0 {
            self.mark_frames(address, 1)?;
        }
        debug!("preload: PT[{}, {}] = {}", segment, page, address);
        self.pm.set_page_entry(pt_address, page, address);
        Ok(())
    }

    pub fn read(&mut self, address: i32, use_tlb: bool) -> Result<Access, MemoryError> {
        self.access(VirtualAddress::new(address), Operation::Read, use_tlb)
    }

    pub fn write(&mut self, address: i32, use_tlb: bool) -> Result<Access, MemoryError> {
        self.access(VirtualAddress::new(address), Operation::Write, use_tlb)
    }

    /// Run every action in order and return the concatenated output tokens
    pub fn replay(&mut self, actions: &[Action], use_tlb: bool) -> Result<String, MemoryError> {
        let mut output = String::new();
        for action in actions {
            let access = match action.op {
                Operation::Read => self.read(action.address, use_tlb)?,
                Operation::Write => self.write(action.address, use_tlb)?,
            };
            output.push_str(&access.to_string());
        }
        Ok(output)
    }

    /// Zero physical memory and free every frame except the segment table's
    pub fn clear(&mut self) {
        self.pm.fill_zero();
        self.bit_map.clear();
        self.bit_map.reserve_first();
    }

    fn access(
        &mut self,
        va: VirtualAddress,
        op: Operation,
        use_tlb: bool,
    ) -> Result<Access, MemoryError> {
        let access = if use_tlb {
            self.tlb_operation(&va, op)?
        } else {
            let result = match op {
                Operation::Read => self.read_no_tlb(&va),
                Operation::Write => self.write_no_tlb(&va)?,
            };
            Access { tlb: None, result }
        };
        trace!("{:?} {} -> {}", op, va, access);
        Ok(access)
    }

    fn lookup(&self, va: &VirtualAddress) -> Lookup {
        let st_entry = self.pm.segment_entry(va.segment());
        let pt_entry = self.get_page_table(va.segment(), va.page());

        if st_entry < 0 || pt_entry < 0 {
            Lookup::Fault
        } else if st_entry == UNALLOCATED_ENTRY {
            Lookup::TableMissing
        } else if pt_entry == UNALLOCATED_ENTRY {
            Lookup::PageMissing
        } else {
            Lookup::Resolved(pt_entry)
        }
    }

    /// Reads never allocate
    fn read_no_tlb(&self, va: &VirtualAddress) -> TranslationResult {
        match self.lookup(va) {
            Lookup::Fault => TranslationResult::PageFault,
            Lookup::TableMissing | Lookup::PageMissing => TranslationResult::Error,
            Lookup::Resolved(base) => TranslationResult::Resolved(base + va.offset() as i32),
        }
    }

    fn write_no_tlb(&mut self, va: &VirtualAddress) -> Result<TranslationResult, MemoryError> {
        let mut allocations = 0;
        loop {
            match self.lookup(va) {
                Lookup::Fault => return Ok(TranslationResult::PageFault),
                Lookup::Resolved(base) => {
                    return Ok(TranslationResult::Resolved(base + va.offset() as i32));
                }
                Lookup::TableMissing => self.allocate_page_table(va.segment())?,
                Lookup::PageMissing => self.allocate_page(va.segment(), va.page())?,
            }
            allocations += 1;
            debug_assert!(
                allocations <= MAX_DEMAND_ALLOCATIONS,
                "write to {} did not resolve after {} allocations",
                va,
                allocations
            );
        }
    }

    fn tlb_operation(&mut self, va: &VirtualAddress, op: Operation) -> Result<Access, MemoryError> {
        let key = va.segment_page();

        if let Some(index) = self.tlb.hit_index(key) {
            let frame = self.tlb.do_hit(key, index);
            return Ok(Access {
                tlb: Some(TlbEvent::Hit),
                result: TranslationResult::Resolved(frame + va.offset() as i32),
            });
        }

        let result = match op {
            Operation::Read => self.read_no_tlb(va),
            Operation::Write => self.write_no_tlb(va)?,
        };
        if result.is_resolved() {
            let frame = self.get_page_table(va.segment(), va.page());
            self.tlb.do_miss(key, frame);
        }
        Ok(Access { tlb: Some(TlbEvent::Miss), result })
    }

    fn allocate_page_table(&mut self, segment: u32) -> Result<(), MemoryError> {
        let (row, bit) = self.bit_map.find_consecutive_zeros()?;
        let address = self.location_to_address(row, bit);
        debug_assert_eq!(self.pm.segment_entry(segment), UNALLOCATED_ENTRY);

        self.mark_frames(address, PT_FRAMES)?;
        self.pm.set_segment_entry(segment, address);
        debug!("allocated page table for segment {} at {}", segment, address);
        Ok(())
    }

    fn allocate_page(&mut self, segment: u32, page: u32) -> Result<(), MemoryError> {
        let (row, bit) = self.bit_map.find_first_zero()?;
        let address = self.location_to_address(row, bit);
        let pt_address = self.pm.segment_entry(segment);

        self.mark_frames(address, 1)?;
        self.pm.set_page_entry(pt_address, page, address);
        debug!("allocated page {} of segment {} at {}", page, segment, address);
        Ok(())
    }

    fn check_entry(table: &'static str, index: u32, limit: usize) -> Result<(), MemoryError> {
        if index as usize >= limit {
            return Err(MemoryError::EntryOutOfRange { table, index, limit });
        }
        Ok(())
    }

    /// Set the bits of `count` frames starting with the one holding `address`
    fn mark_frames(&mut self, address: i32, count: usize) -> Result<(), MemoryError> {
        let first = address as usize / FRAME_SIZE;
        let width = self.bit_map.width();
        for frame in first..first + count {
            self.bit_map.set(frame / width, frame % width, true)?;
        }
        Ok(())
    }

    #[inline]
    fn location_to_address(&self, row: usize, bit: usize) -> i32 {
        PhysicalMemory::frame_to_address(row * self.bit_map.width() + bit) as i32
    }
}

impl Default for VirtualMemorySystem {
    fn default() -> Self {
        Self::new()
    }
}
