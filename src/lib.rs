pub mod bitmap;
pub mod constants;
pub mod error;
pub mod io;
pub mod logger;
pub mod memory;
pub mod tlb;
pub mod translation;
pub mod vm_system;

// Re-export commonly used items for convenience
pub use constants::*;
pub use error::MemoryError;
pub use translation::{Access, Action, Operation, TranslationResult, VirtualAddress};
pub use vm_system::VirtualMemorySystem;
