//! Handlers for the commands users type, e.g. `tree 0`.
pub mod dwarf;
pub mod elf;
pub mod tables;

pub use dwarf::*;
pub use elf::*;
