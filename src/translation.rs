use std::fmt;

use crate::constants::*;

/// Represents the decomposed components of a Virtual Address.
///
/// The 4 most significant bits of the 32-bit pattern are discarded and never
/// interpreted; the remaining 28 bits split into segment (9), page (10) and
/// offset (9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualAddress {
    raw: i32,
    s: u32,
    p: u32,
    w: u32,
    sp: u32,
}

impl VirtualAddress {
    /// Decompose a raw VA into its components
    pub fn new(raw: i32) -> Self {
        let bits = raw as u32 & ADDRESS_MASK;
        let s = (bits >> S_SHIFT) & S_MASK;
        let p = (bits >> P_SHIFT) & P_MASK;
        let w = bits & W_MASK;
        let sp = (bits >> P_SHIFT) & SP_MASK;

        VirtualAddress { raw, s, p, w, sp }
    }

    #[inline]
    pub fn raw(&self) -> i32 {
        self.raw
    }

    #[inline]
    pub fn segment(&self) -> u32 {
        self.s
    }

    #[inline]
    pub fn page(&self) -> u32 {
        self.p
    }

    #[inline]
    pub fn offset(&self) -> u32 {
        self.w
    }

    /// The 19-bit segment‖page key used for TLB lookups
    #[inline]
    pub fn segment_page(&self) -> u32 {
        self.sp
    }
}

impl fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VA({}) = (s={}, p={}, w={}, sp={})",
            self.raw, self.s, self.p, self.w, self.sp
        )
    }
}

/// Kind of access a trace record performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

impl TryFrom<i32> for Operation {
    type Error = String;

    fn try_from(op: i32) -> Result<Self, Self::Error> {
        match op {
            0 => Ok(Operation::Read),
            1 => Ok(Operation::Write),
            other => Err(format!("Invalid operation code: {} (expected 0 or 1)", other)),
        }
    }
}

/// One record of the action stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub op: Operation,
    pub address: i32,
}

/// Result of an address translation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationResult {
    /// Physical address `PT[s,p] + offset`
    Resolved(i32),
    /// ST or PT entry is -1
    PageFault,
    /// ST or PT entry is 0 on a read
    Error,
}

impl TranslationResult {
    #[inline]
    pub fn is_resolved(&self) -> bool {
        matches!(self, TranslationResult::Resolved(_))
    }
}

impl fmt::Display for TranslationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationResult::Resolved(pa) => write!(f, "{}", pa),
            TranslationResult::PageFault => write!(f, "pf"),
            TranslationResult::Error => write!(f, "err"),
        }
    }
}

/// Whether a TLB lookup found the segment‖page key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlbEvent {
    Hit,
    Miss,
}

impl fmt::Display for TlbEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlbEvent::Hit => write!(f, "h"),
            TlbEvent::Miss => write!(f, "m"),
        }
    }
}

/// Everything one trace record contributes to the output stream.
///
/// Displays as the exact token sequence, each token followed by one space:
/// `"4608 "`, `"pf "`, `"m err "`, `"h 5047 "`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub tlb: Option<TlbEvent>,
    pub result: TranslationResult,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(event) = self.tlb {
            write!(f, "{} ", event)?;
        }
        write!(f, "{} ", self.result)
    }
}
