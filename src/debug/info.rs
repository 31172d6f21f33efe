use crate::{
    debug::{
        Abbreviations, AttributeValue, CompilationUnit, Die, MIN_HEADER_SIZE, UnitHeader,
        read_unit_length, table_offset,
    },
    elf::Stream,
    error::{DwarfError, Result},
};
use log::{debug, warn};
use rangemap::RangeMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Where the DWARF sections come from, normally an ELF file.
pub trait Image {
    /// False if the image can't be decoded, e.g. a big endian file.
    fn is_valid(&self) -> bool;

    /// Contents of the named section, empty if it's missing.
    fn section_data(&self, name: &str) -> &[u8];
}

/// Limits that keep hostile inputs from using unbounded time or memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Most entries with children that can be open at once within a unit.
    pub max_depth: usize,

    /// Framing stops after this many units (whether they parsed or not).
    pub max_units: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_depth: 1024,
            max_units: usize::MAX,
        }
    }
}

/// A unit that couldn't be parsed, or the reason framing stopped early.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitError {
    /// Offset of the unit header within .debug_info.
    pub offset: usize,
    pub error: DwarfError,
}

/// All the compilation units in a binary. Units are parsed up front and never change
/// afterwards so this can be freely shared between threads.
#[derive(Debug)]
pub struct DebugInfo<'a> {
    debug_info: &'a [u8],
    abbreviation: &'a [u8],
    debug_strings: &'a [u8],
    units: Vec<CompilationUnit<'a>>,
    errors: Vec<UnitError>,
    ranges: RangeMap<usize, usize>, // unit range => index into units
}

impl<'a> DebugInfo<'a> {
    pub fn open<I: Image + ?Sized>(image: &'a I) -> Self {
        DebugInfo::open_with(image, &ParseOptions::default())
    }

    /// Images that aren't valid result in an empty DebugInfo.
    pub fn open_with<I: Image + ?Sized>(image: &'a I, options: &ParseOptions) -> Self {
        if !image.is_valid() {
            warn!("image isn't valid, ignoring its debug info");
            return DebugInfo::new(&[], &[], &[], options);
        }
        DebugInfo::new(
            image.section_data(".debug_info"),
            image.section_data(".debug_abbrev"),
            image.section_data(".debug_str"),
            options,
        )
    }

    pub fn new(
        debug_info: &'a [u8],
        abbreviation: &'a [u8],
        debug_strings: &'a [u8],
        options: &ParseOptions,
    ) -> Self {
        let mut info = DebugInfo {
            debug_info,
            abbreviation,
            debug_strings,
            units: Vec::new(),
            errors: Vec::new(),
            ranges: RangeMap::new(),
        };
        info.load_units(options);
        info
    }

    pub fn debug_info_data(&self) -> &'a [u8] {
        self.debug_info
    }

    pub fn abbreviation_data(&self) -> &'a [u8] {
        self.abbreviation
    }

    pub fn debug_strings_data(&self) -> &'a [u8] {
        self.debug_strings
    }

    /// Units that parsed, in section order.
    pub fn units(&self) -> impl Iterator<Item = &CompilationUnit<'a>> {
        self.units.iter()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn unit(&self, index: usize) -> Option<&CompilationUnit<'a>> {
        self.units.get(index)
    }

    /// Calls visitor with each unit in section order. Nothing is re-parsed so this can
    /// be called as often as needed.
    pub fn for_each_compilation_unit<F>(&self, mut visitor: F)
    where
        F: FnMut(&CompilationUnit<'a>),
    {
        for unit in self.units.iter() {
            visitor(unit);
        }
    }

    /// Units that were skipped and why.
    pub fn errors(&self) -> &[UnitError] {
        &self.errors
    }

    /// The unit whose bytes (header included) cover offset.
    pub fn unit_containing(&self, offset: usize) -> Option<&CompilationUnit<'a>> {
        self.ranges.get(&offset).map(|i| &self.units[*i])
    }

    /// The entry starting at offset within .debug_info.
    pub fn die_at_offset(&self, offset: usize) -> Option<&Die<'a>> {
        self.unit_containing(offset)?.die_at_offset(offset)
    }

    /// Returns the entry a reference within unit points to. This works for both unit
    /// relative references and DW_FORM_ref_addr references into other units.
    pub fn resolve(&self, unit: &CompilationUnit<'a>, value: &AttributeValue) -> Option<&Die<'a>> {
        self.die_at_offset(unit.absolute_offset(value)?)
    }

    fn load_units(&mut self, options: &ParseOptions) {
        let mut tables: HashMap<usize, Result<Arc<Abbreviations>>> = HashMap::new();
        let mut offset = 0;
        let mut count = 0;
        while self.debug_info.len().saturating_sub(offset) >= MIN_HEADER_SIZE {
            if count >= options.max_units {
                warn!("stopping after {count} units");
                break;
            }
            count += 1;

            // If we can't figure out where the next unit starts we have to bail.
            let header = match self.frame_unit(offset) {
                Ok(h) => h,
                Err(FramingError::Skip(next, error)) => {
                    warn!("skipping unit at 0x{offset:x}: {error}");
                    self.errors.push(UnitError { offset, error });
                    offset = next;
                    continue;
                }
                Err(FramingError::Abort(error)) => {
                    warn!("giving up on .debug_info at 0x{offset:x}: {error}");
                    self.errors.push(UnitError { offset, error });
                    break;
                }
            };
            let next = header.end().unwrap_or(self.debug_info.len());
            debug!(
                "unit at 0x{offset:x}: length 0x{:x}, version {}, address size {}, abbrevs at 0x{:x}",
                header.length,
                header.encoding.version,
                header.encoding.address_size,
                header.abbrev_offset
            );

            match self.parse_unit(header, &mut tables, options) {
                Ok(unit) => {
                    let range = unit.range();
                    if !range.is_empty() {
                        self.ranges.insert(range, self.units.len());
                    }
                    self.units.push(unit);
                }
                Err(error) => {
                    warn!("skipping unit at 0x{offset:x}: {error}");
                    self.errors.push(UnitError { offset, error });
                }
            }
            offset = next;
        }

        let rest = self.debug_info.len().saturating_sub(offset);
        if rest > 0 && rest < MIN_HEADER_SIZE {
            debug!("ignoring {rest} trailing bytes in .debug_info");
        }
        debug!(
            "parsed {} units ({} skipped)",
            self.units.len(),
            self.errors.len()
        );
    }

    fn frame_unit(&self, offset: usize) -> std::result::Result<UnitHeader, FramingError> {
        let mut stream = Stream::new(self.debug_info, offset);
        let (format, length) = read_unit_length(&mut stream).map_err(FramingError::Abort)?;
        let next = usize::try_from(length)
            .ok()
            .and_then(|l| stream.offset().checked_add(l))
            .filter(|n| *n <= self.debug_info.len());
        match next {
            Some(next) => UnitHeader::parse(self.debug_info, offset)
                .map_err(|error| FramingError::Skip(next, error)),
            None => Err(FramingError::Abort(DwarfError::OutOfBounds {
                offset,
                wanted: usize::try_from(length)
                    .unwrap_or(usize::MAX)
                    .saturating_add(format.initial_length_size()),
                available: self.debug_info.len() - offset,
            })),
        }
    }

    fn parse_unit(
        &self,
        header: UnitHeader,
        tables: &mut HashMap<usize, Result<Arc<Abbreviations>>>,
        options: &ParseOptions,
    ) -> Result<CompilationUnit<'a>> {
        let table_offset = table_offset(&header)?;
        let abbrevs = tables
            .entry(table_offset)
            .or_insert_with(|| Abbreviations::parse(self.abbreviation, table_offset).map(Arc::new))
            .clone()?;
        CompilationUnit::with_header(self.debug_info, header, abbrevs, self.debug_strings, options)
    }
}

enum FramingError {
    /// The unit is bad but the next one starts at the offset.
    Skip(usize, DwarfError),

    /// Couldn't find where the next unit starts.
    Abort(DwarfError),
}
