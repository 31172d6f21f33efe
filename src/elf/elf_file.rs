//! An executable or shared object along with its section table.
use super::{ElfHeader, Reader, SectionHeader, SectionType, Stream};
use crate::debug::Image;
use log::{debug, warn};
use memmap2::Mmap;
use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

pub struct ElfFile {
    pub path: PathBuf,
    pub header: ElfHeader,
    pub reader: Reader,
    sections: Vec<SectionHeader>,
    names: Vec<String>, // parallel to sections, empty for sections without a name
}

impl ElfFile {
    pub fn new(path: PathBuf) -> Result<Self, Box<dyn Error>> {
        let file = File::open(&path)?;

        // This is unsafe because it has undefined behavior if the underlying file is
        // modified while the memory map is in use.
        let bytes = unsafe { Mmap::map(&file) }?;
        let reader = Reader::new(bytes)?;
        let header = ElfHeader::new(&reader)?;
        let sections = ElfFile::load_sections(&reader, &header);
        let names = ElfFile::load_names(&reader, &header, &sections);
        debug!("{} has {} sections", path.display(), sections.len());
        Ok(ElfFile {
            path,
            header,
            reader,
            sections,
            names,
        })
    }

    pub fn sections(&self) -> &[SectionHeader] {
        &self.sections
    }

    pub fn section_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(|s| s.as_str())
    }

    /// If there is more than one section with the name the first is returned.
    pub fn find_section_named(&self, name: &str) -> Option<&SectionHeader> {
        let index = self.names.iter().position(|n| n == name)?;
        self.sections.get(index)
    }

    /// The section's bytes within the file. Sections that don't fit within the file
    /// are treated as empty.
    pub fn section_bytes(&self, section: &SectionHeader) -> &[u8] {
        let start = usize::try_from(section.obytes.start.0);
        let size = usize::try_from(section.file_size());
        match (start, size) {
            (Ok(start), Ok(size)) => match self.reader.slice(start, size) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!("section at 0x{start:x} is truncated: {err}");
                    &[]
                }
            },
            _ => &[],
        }
    }
}

impl Image for ElfFile {
    /// The decoder only handles little endian files.
    fn is_valid(&self) -> bool {
        self.reader.little_endian && !self.sections.is_empty()
    }

    fn section_data(&self, name: &str) -> &[u8] {
        match self.find_section_named(name) {
            Some(section) => self.section_bytes(section),
            None => &[],
        }
    }
}

impl ElfFile {
    fn load_sections(reader: &Reader, header: &ElfHeader) -> Vec<SectionHeader> {
        let mut sections = Vec::new();
        if header.section_offset == 0 {
            return sections;
        }
        let min_size = if reader.sixty_four_bit { 64 } else { 40 };
        if (header.section_entry_size as usize) < min_size {
            warn!("section header size is too small: {}", header.section_entry_size);
            return sections;
        }

        let Ok(mut offset) = usize::try_from(header.section_offset) else {
            return sections;
        };
        let mut count = header.num_section_entries as usize;
        if count == 0 {
            // too many sections to fit in the header so the count is in section zero
            match SectionHeader::new(reader, offset) {
                Ok(first) => count = usize::try_from(first.obytes.size).unwrap_or(0),
                Err(err) => warn!("failed to read section header at {offset}: {err}"),
            }
        }

        for _ in 0..count {
            match SectionHeader::new(reader, offset) {
                Ok(h) => sections.push(h),
                Err(err) => {
                    // later headers will be past the end too
                    warn!("failed to read section header at {offset}: {err}");
                    break;
                }
            }
            offset = offset.saturating_add(header.section_entry_size as usize);
        }
        sections
    }

    fn load_names(reader: &Reader, header: &ElfHeader, sections: &[SectionHeader]) -> Vec<String> {
        let first_link = sections.first().map(|s| s.link.0);
        let table = header
            .section_name_table(first_link)
            .and_then(|i| sections.get(i.0 as usize))
            .filter(|s| s.stype == SectionType::StringTable);
        let Some(table) = table else {
            warn!("couldn't find the section name string table");
            return vec![String::new(); sections.len()];
        };

        let bytes = usize::try_from(table.obytes.start.0)
            .ok()
            .zip(usize::try_from(table.obytes.size).ok())
            .and_then(|(start, size)| reader.slice(start, size).ok())
            .unwrap_or(&[]);
        sections
            .iter()
            .map(|s| {
                Stream::new(bytes, s.name.0 as usize)
                    .read_string()
                    .unwrap_or_default()
            })
            .collect()
    }
}
