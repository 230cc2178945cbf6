// Physical memory geometry (sizes in words)
pub const FRAME_SIZE: usize = 512;
pub const N_FRAMES: usize = 1024;
pub const PM_SIZE: usize = FRAME_SIZE * N_FRAMES;

pub const ST_SIZE: usize = FRAME_SIZE;
pub const PT_SIZE: usize = FRAME_SIZE * 2;
pub const PAGE_SIZE: usize = FRAME_SIZE;

pub const PT_FRAMES: usize = PT_SIZE / FRAME_SIZE;

// Bitmap: BM_SIZE rows of BM_WIDTH bits, one bit per frame
pub const BM_WIDTH: usize = 32;
pub const BM_SIZE: usize = N_FRAMES / BM_WIDTH;

// Virtual address layout: | discarded 4 | s 9 | p 10 | w 9 |
pub const DISCARD_BITS: u32 = 4;
pub const S_BITS: u32 = 9;
pub const P_BITS: u32 = 10;
pub const W_BITS: u32 = 9;

pub const P_SHIFT: u32 = W_BITS;
pub const S_SHIFT: u32 = P_BITS + W_BITS;

pub const S_MASK: u32 = (1 << S_BITS) - 1;
pub const P_MASK: u32 = (1 << P_BITS) - 1;
pub const W_MASK: u32 = (1 << W_BITS) - 1;
pub const SP_MASK: u32 = (1 << (S_BITS + P_BITS)) - 1;
pub const ADDRESS_MASK: u32 = (1 << (32 - DISCARD_BITS)) - 1;

// ST/PT entry sentinels
pub const INVALID_ENTRY: i32 = -1;
pub const UNALLOCATED_ENTRY: i32 = 0;

pub const DEFAULT_TLB_CAPACITY: usize = 4;

/// A write can demand-allocate at most a page table and then a page.
pub const MAX_DEMAND_ALLOCATIONS: usize = 2;
