//! Helpers for assembling .debug_abbrev, .debug_info, and .debug_str contents by hand.
#![allow(dead_code)]

pub const TAG_ARRAY_TYPE: u64 = 0x01;
pub const TAG_LEXICAL_BLOCK: u64 = 0x0b;
pub const TAG_COMPILE_UNIT: u64 = 0x11;
pub const TAG_STRUCTURE_TYPE: u64 = 0x13;
pub const TAG_BASE_TYPE: u64 = 0x24;
pub const TAG_SUBPROGRAM: u64 = 0x2e;
pub const TAG_VARIABLE: u64 = 0x34;

pub const AT_SIBLING: u64 = 0x01;
pub const AT_LOCATION: u64 = 0x02;
pub const AT_NAME: u64 = 0x03;
pub const AT_BYTE_SIZE: u64 = 0x0b;
pub const AT_LOW_PC: u64 = 0x11;
pub const AT_HIGH_PC: u64 = 0x12;
pub const AT_LANGUAGE: u64 = 0x13;
pub const AT_CONST_VALUE: u64 = 0x1c;
pub const AT_PRODUCER: u64 = 0x25;
pub const AT_DECL_LINE: u64 = 0x3b;
pub const AT_EXTERNAL: u64 = 0x3f;
pub const AT_TYPE: u64 = 0x49;

pub const FORM_ADDR: u64 = 0x01;
pub const FORM_BLOCK2: u64 = 0x03;
pub const FORM_BLOCK4: u64 = 0x04;
pub const FORM_DATA2: u64 = 0x05;
pub const FORM_DATA4: u64 = 0x06;
pub const FORM_DATA8: u64 = 0x07;
pub const FORM_STRING: u64 = 0x08;
pub const FORM_BLOCK: u64 = 0x09;
pub const FORM_BLOCK1: u64 = 0x0a;
pub const FORM_DATA1: u64 = 0x0b;
pub const FORM_FLAG: u64 = 0x0c;
pub const FORM_SDATA: u64 = 0x0d;
pub const FORM_STRP: u64 = 0x0e;
pub const FORM_UDATA: u64 = 0x0f;
pub const FORM_REF_ADDR: u64 = 0x10;
pub const FORM_REF1: u64 = 0x11;
pub const FORM_REF2: u64 = 0x12;
pub const FORM_REF4: u64 = 0x13;
pub const FORM_REF8: u64 = 0x14;
pub const FORM_REF_UDATA: u64 = 0x15;
pub const FORM_INDIRECT: u64 = 0x16;
pub const FORM_SEC_OFFSET: u64 = 0x17;
pub const FORM_EXPRLOC: u64 = 0x18;
pub const FORM_FLAG_PRESENT: u64 = 0x19;
pub const FORM_REF_SIG8: u64 = 0x20;
pub const FORM_STRX: u64 = 0x1a; // DWARF 5, unsupported

pub fn uleb(mut value: u64) -> Vec<u8> {
    let mut result = Vec::new();
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            result.push(byte);
            return result;
        }
        result.push(byte | 0x80);
    }
}

pub fn sleb(mut value: i64) -> Vec<u8> {
    let mut result = Vec::new();
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if done {
            result.push(byte);
            return result;
        }
        result.push(byte | 0x80);
    }
}

/// Builds a .debug_abbrev section. Each table has to be finished with end().
#[derive(Default)]
pub struct Abbrevs {
    pub bytes: Vec<u8>,
}

impl Abbrevs {
    pub fn new() -> Self {
        Abbrevs::default()
    }

    pub fn offset(&self) -> u32 {
        self.bytes.len() as u32
    }

    pub fn abbrev(mut self, code: u64, tag: u64, children: bool, attrs: &[(u64, u64)]) -> Self {
        self.bytes.extend(uleb(code));
        self.bytes.extend(uleb(tag));
        self.bytes.push(children as u8);
        for (name, form) in attrs {
            self.bytes.extend(uleb(*name));
            self.bytes.extend(uleb(*form));
        }
        self.bytes.extend([0, 0]);
        self
    }

    pub fn end(mut self) -> Self {
        self.bytes.push(0);
        self
    }
}

/// Builds the entries that follow a unit header.
#[derive(Default)]
pub struct Entries {
    pub bytes: Vec<u8>,
}

impl Entries {
    pub fn new() -> Self {
        Entries::default()
    }

    pub fn entry(mut self, code: u64) -> Self {
        self.bytes.extend(uleb(code));
        self
    }

    pub fn null(mut self) -> Self {
        self.bytes.push(0);
        self
    }

    pub fn u8(mut self, value: u8) -> Self {
        self.bytes.push(value);
        self
    }

    pub fn u16(mut self, value: u16) -> Self {
        self.bytes.extend(value.to_le_bytes());
        self
    }

    pub fn u32(mut self, value: u32) -> Self {
        self.bytes.extend(value.to_le_bytes());
        self
    }

    pub fn u64(mut self, value: u64) -> Self {
        self.bytes.extend(value.to_le_bytes());
        self
    }

    pub fn uleb(mut self, value: u64) -> Self {
        self.bytes.extend(uleb(value));
        self
    }

    pub fn sleb(mut self, value: i64) -> Self {
        self.bytes.extend(sleb(value));
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend(bytes);
        self
    }

    pub fn string(mut self, s: &str) -> Self {
        self.bytes.extend(s.as_bytes());
        self.bytes.push(0);
        self
    }
}

/// Size of a 32-bit unit header.
pub const HEADER_SIZE: usize = 11;

/// A 32-bit format unit: header followed by entries.
pub fn unit(version: u16, address_size: u8, abbrev_offset: u32, entries: &[u8]) -> Vec<u8> {
    let length = (2 + 4 + 1 + entries.len()) as u32;
    let mut bytes = Vec::new();
    bytes.extend(length.to_le_bytes());
    bytes.extend(version.to_le_bytes());
    bytes.extend(abbrev_offset.to_le_bytes());
    bytes.push(address_size);
    bytes.extend(entries);
    bytes
}

/// A 64-bit format unit.
pub fn unit64(version: u16, address_size: u8, abbrev_offset: u64, entries: &[u8]) -> Vec<u8> {
    let length = (2 + 8 + 1 + entries.len()) as u64;
    let mut bytes = Vec::new();
    bytes.extend(0xffff_ffffu32.to_le_bytes());
    bytes.extend(length.to_le_bytes());
    bytes.extend(version.to_le_bytes());
    bytes.extend(abbrev_offset.to_le_bytes());
    bytes.push(address_size);
    bytes.extend(entries);
    bytes
}

/// Builds a .debug_str section and hands back offsets of the strings added.
#[derive(Default)]
pub struct Strings {
    pub bytes: Vec<u8>,
}

impl Strings {
    pub fn new() -> Self {
        Strings::default()
    }

    pub fn add(&mut self, s: &str) -> u32 {
        let offset = self.bytes.len() as u32;
        self.bytes.extend(s.as_bytes());
        self.bytes.push(0);
        offset
    }
}

pub const SHT_PROGBITS: u32 = 1;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_NOBITS: u32 = 8;

/// A little endian 64-bit x86 executable with a null section, the given sections, and
/// a trailing .shstrtab. NoBits sections are given a size of 0x100 but no file bytes.
pub fn elf64(sections: &[(&str, u32, &[u8])]) -> Vec<u8> {
    let mut names = vec![0u8];
    let mut name_offsets = Vec::new();
    for (name, _, _) in sections {
        name_offsets.push(names.len() as u32);
        names.extend(name.as_bytes());
        names.push(0);
    }
    let shstrtab_name = names.len() as u32;
    names.extend(b".shstrtab\0");

    let mut bytes = vec![0u8; 64];
    let mut placed = Vec::new();
    for (_, stype, data) in sections {
        if *stype == SHT_NOBITS {
            placed.push((bytes.len() as u64, 0x100));
        } else {
            placed.push((bytes.len() as u64, data.len() as u64));
            bytes.extend(*data);
        }
    }
    let names_offset = bytes.len() as u64;
    bytes.extend(&names);
    while bytes.len() % 8 != 0 {
        bytes.push(0);
    }

    let section_offset = bytes.len() as u64;
    bytes.extend([0; 64]);
    for (i, (_, stype, _)) in sections.iter().enumerate() {
        let (offset, size) = placed[i];
        push_section_header(&mut bytes, name_offsets[i], *stype, offset, size);
    }
    push_section_header(&mut bytes, shstrtab_name, SHT_STRTAB, names_offset, names.len() as u64);

    let num_sections = (sections.len() + 2) as u16;
    let mut header = Vec::new();
    header.extend(b"\x7fELF");
    header.extend([2, 1, 1, 0]); // 64-bit, little endian, version 1, System V
    header.extend([0; 8]);
    header.extend(2u16.to_le_bytes()); // executable
    header.extend(0x3eu16.to_le_bytes()); // x86-64
    header.extend(1u32.to_le_bytes());
    header.extend(0u64.to_le_bytes()); // entry
    header.extend(0u64.to_le_bytes()); // program headers
    header.extend(section_offset.to_le_bytes());
    header.extend(0u32.to_le_bytes()); // flags
    header.extend(64u16.to_le_bytes());
    header.extend(56u16.to_le_bytes());
    header.extend(0u16.to_le_bytes());
    header.extend(64u16.to_le_bytes());
    header.extend(num_sections.to_le_bytes());
    header.extend((num_sections - 1).to_le_bytes());
    bytes[0..64].copy_from_slice(&header);
    bytes
}

fn push_section_header(bytes: &mut Vec<u8>, name: u32, stype: u32, offset: u64, size: u64) {
    bytes.extend(name.to_le_bytes());
    bytes.extend(stype.to_le_bytes());
    bytes.extend(0u64.to_le_bytes()); // flags
    bytes.extend(0u64.to_le_bytes()); // vaddr
    bytes.extend(offset.to_le_bytes());
    bytes.extend(size.to_le_bytes());
    bytes.extend(0u32.to_le_bytes()); // link
    bytes.extend(0u32.to_le_bytes()); // info
    bytes.extend(1u64.to_le_bytes()); // align
    bytes.extend(0u64.to_le_bytes()); // entry size
}

/// Writes bytes to a file in the temp directory. Names need to be unique across tests
/// because they run in parallel.
pub fn write_temp(name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("dinfo-{}-{name}", std::process::id()));
    std::fs::write(&path, bytes).unwrap();
    path
}
