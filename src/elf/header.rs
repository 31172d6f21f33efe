//! The ELF header at the very start of the file.
use super::{Reader, SectionIndex};
use std::error::Error;

const ET_REL: u16 = 1;
const ET_EXEC: u16 = 2;
const ET_DYN: u16 = 3;
const ET_CORE: u16 = 4;

// Section table indexes at or above this mean the real value is stored elsewhere.
const SHN_LORESERVE: u16 = 0xff00;
const SHN_XINDEX: u16 = 0xffff;

/// Elf32_Ehdr or Elf64_Ehdr, minus the identification bytes which Reader checks.
#[derive(Clone, Debug)]
pub struct ElfHeader {
    pub etype: u16,
    pub machine: u16,
    pub version: u32,

    /// Virtual address of the entry point, zero if there isn't one.
    pub entry: u64,
    pub flags: u32,

    pub ph_offset: u64,
    pub ph_entry_size: u16,
    pub num_ph_entries: u16,

    pub section_offset: u64,
    pub section_entry_size: u16,

    /// Note that this can be zero with more sections stored in the first section header.
    pub num_section_entries: u16,

    /// Section containing the section names. May be SHN_XINDEX.
    pub string_table_index: u16,
}

impl ElfHeader {
    pub fn new(reader: &Reader) -> Result<Self, Box<dyn Error>> {
        let mut s = reader.stream(16);
        let etype = s.read_half()?;
        let machine = s.read_half()?;
        let version = s.read_word()?;
        let addr_size = if reader.sixty_four_bit { 8 } else { 4 };
        let entry = s.read_uint(addr_size)?;
        let ph_offset = s.read_uint(addr_size)?;
        let section_offset = s.read_uint(addr_size)?;
        let flags = s.read_word()?;
        let _header_size = s.read_half()?;
        let ph_entry_size = s.read_half()?;
        let num_ph_entries = s.read_half()?;
        let section_entry_size = s.read_half()?;
        let num_section_entries = s.read_half()?;
        let string_table_index = s.read_half()?;

        Ok(ElfHeader {
            etype,
            machine,
            version,
            entry,
            flags,
            ph_offset,
            ph_entry_size,
            num_ph_entries,
            section_offset,
            section_entry_size,
            num_section_entries,
            string_table_index,
        })
    }

    pub fn stype(&self) -> &'static str {
        match self.etype {
            ET_REL => "relocatable",
            ET_EXEC => "executable",
            ET_DYN => "shared object",
            ET_CORE => "core",
            _ => "unknown",
        }
    }

    pub fn machine(&self) -> &'static str {
        // see https://en.wikipedia.org/wiki/Executable_and_Linkable_Format
        match self.machine {
            0x03 => "x86",
            0x08 => "MIPS",
            0x14 => "PowerPC",
            0x15 => "PowerPC 64",
            0x28 => "ARM",
            0x2a => "SuperH",
            0x32 => "IA-64",
            0x3e => "x86-64",
            0xb7 => "AArch64",
            0xf3 => "RISC-V",
            0x102 => "LoongArch",
            _ => "unknown",
        }
    }

    /// Resolves the extended numbering used by files with lots of sections. The first
    /// section header holds the real values when the header's fields overflow.
    pub(crate) fn section_name_table(&self, first_link: Option<u32>) -> Option<SectionIndex> {
        match self.string_table_index {
            0 => None,
            SHN_XINDEX => first_link.map(SectionIndex),
            i if i >= SHN_LORESERVE => None,
            i => Some(SectionIndex(i as u32)),
        }
    }
}
