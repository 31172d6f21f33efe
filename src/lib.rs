//! Decodes the DWARF debugging info in ELF executables into trees of debugging
//! information entries.
//!
//! ```no_run
//! use dinfo::debug::DebugInfo;
//! use dinfo::elf::ElfFile;
//!
//! let file = ElfFile::new("a.out".into()).unwrap();
//! let info = DebugInfo::open(&file);
//! info.for_each_compilation_unit(|unit| {
//!     println!("{:?}", unit.root().name());
//! });
//! ```
pub mod debug;
pub mod elf;
pub mod error;
