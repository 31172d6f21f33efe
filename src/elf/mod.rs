//! Just enough ELF support to find the sections holding debugging info.
//! Quick ELF reference: https://gist.github.com/x0nu11byt3/bcb35c3de461e5fb66173071a2379779
//!
//! ELF files start with an ELF header which includes:
//! * A magic number to identify the file as an ELF file.
//! * The architecture, e.g. Linux AMD x86-64.
//! * The offset to and number of program headers.
//! * The offset to and number of section headers.
//!
//! Section headers identify sections. Sections are used for static linking and
//! debugging. Section headers have name, type, vaddr, offset, size, etc. The DWARF
//! data lives in sections like .debug_info, .debug_abbrev, and .debug_str.
pub mod elf_file;
pub mod header;
pub mod io;
pub mod primitives;
pub mod sections;

pub use elf_file::*;
pub use header::*;
pub use io::*;
pub use primitives::*;
pub use sections::*;
