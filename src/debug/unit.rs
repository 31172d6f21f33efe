use crate::{
    debug::{Abbreviations, AttributeValue, Die, DieBuilder, ParseOptions},
    elf::Stream,
    error::{DwarfError, Result},
};
use log::debug;
use std::ops::Range;
use std::sync::Arc;

/// 32-bit DWARF uses 4 byte section offsets, 64-bit DWARF uses 8 byte offsets. This is
/// independent of the target's address size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Dwarf32,
    Dwarf64,
}

impl Format {
    pub fn offset_size(self) -> usize {
        match self {
            Format::Dwarf32 => 4,
            Format::Dwarf64 => 8,
        }
    }

    /// Size of the unit_length field.
    pub fn initial_length_size(self) -> usize {
        match self {
            Format::Dwarf32 => 4,
            Format::Dwarf64 => 12,
        }
    }
}

/// The header fields needed to decode attribute values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Encoding {
    pub format: Format,
    pub version: u16,
    pub address_size: u8,
}

/// See section 7.5.1.1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitHeader {
    /// Offset of the header within .debug_info.
    pub offset: usize,

    /// unit_length, the number of bytes after the length field.
    pub length: u64,

    pub encoding: Encoding,

    /// Offset of the unit's abbreviation table within .debug_abbrev.
    pub abbrev_offset: u64,

    /// Offset of the first entry within .debug_info.
    pub entries_offset: usize,
}

/// Smallest possible header: 32-bit unit_length, version, abbrev offset, address size.
pub const MIN_HEADER_SIZE: usize = 4 + 2 + 4 + 1;

/// Reads unit_length. Lengths in [0xfffffff0, 0xfffffffe] are reserved.
pub fn read_unit_length(stream: &mut Stream) -> Result<(Format, u64)> {
    let offset = stream.offset();
    match stream.read_word()? {
        0xffff_ffff => Ok((Format::Dwarf64, stream.read_xword()?)),
        length @ 0xffff_fff0..=0xffff_fffe => Err(DwarfError::BadUnitLength {
            offset,
            length: length as u64,
        }),
        length => Ok((Format::Dwarf32, length as u64)),
    }
}

impl UnitHeader {
    pub fn parse(debug_info: &[u8], offset: usize) -> Result<UnitHeader> {
        let mut stream = Stream::new(debug_info, offset);
        let (format, length) = read_unit_length(&mut stream)?;

        let header = UnitHeader {
            offset,
            length,
            encoding: Encoding {
                format,
                version: 0,
                address_size: 0,
            },
            abbrev_offset: 0,
            entries_offset: 0,
        };
        let end = header.end();
        if end.is_none_or(|e| e > debug_info.len()) {
            return Err(DwarfError::OutOfBounds {
                offset,
                wanted: usize::try_from(length).unwrap_or(usize::MAX),
                available: stream.remaining(),
            });
        }

        let version = stream.read_half()?;
        if !(2..=4).contains(&version) {
            return Err(DwarfError::UnsupportedDwarfVersion { offset, version });
        }
        let abbrev_offset = stream.read_uint(format.offset_size())?;
        let address_size = stream.read_byte()?;
        if !matches!(address_size, 1 | 2 | 4 | 8) {
            return Err(DwarfError::UnsupportedAddressSize {
                offset,
                size: address_size,
            });
        }

        let header = UnitHeader {
            encoding: Encoding {
                format,
                version,
                address_size,
            },
            abbrev_offset,
            entries_offset: stream.offset(),
            ..header
        };
        if header.entries_offset > header.end().unwrap_or(0) {
            return Err(DwarfError::LengthMismatch {
                offset,
                declared: length,
                consumed: (header.entries_offset - offset - format.initial_length_size()) as u64,
            });
        }
        Ok(header)
    }

    /// Offset just past the unit, i.e. where the next unit's header starts.
    pub fn end(&self) -> Option<usize> {
        let length = usize::try_from(self.length).ok()?;
        self.offset
            .checked_add(self.encoding.format.initial_length_size())?
            .checked_add(length)
    }
}

/// A compilation unit along with its fully decoded entry tree.
#[derive(Clone, Debug)]
pub struct CompilationUnit<'a> {
    header: UnitHeader,
    abbrevs: Arc<Abbreviations>,
    root: Die<'a>,
}

impl<'a> CompilationUnit<'a> {
    /// Parses the unit whose header starts at offset. This is the one-off version, it
    /// parses the unit's abbreviation table instead of sharing a cached copy.
    pub fn parse(
        debug_info: &'a [u8],
        abbreviations: &[u8],
        strings: &'a [u8],
        offset: usize,
        options: &ParseOptions,
    ) -> Result<Self> {
        let header = UnitHeader::parse(debug_info, offset)?;
        let abbrevs = Abbreviations::parse(abbreviations, table_offset(&header)?)?;
        CompilationUnit::with_header(debug_info, header, Arc::new(abbrevs), strings, options)
    }

    pub(crate) fn with_header(
        debug_info: &'a [u8],
        header: UnitHeader,
        abbrevs: Arc<Abbreviations>,
        strings: &'a [u8],
        options: &ParseOptions,
    ) -> Result<Self> {
        let end = header.end().unwrap_or(debug_info.len()).min(debug_info.len());

        // the entries can't be decoded past the end of the unit
        let mut stream = Stream::new(&debug_info[..end], header.entries_offset);
        let builder = DieBuilder::new(&abbrevs, strings, header.encoding, options.max_depth);
        let root = builder.build(&mut stream)?;

        // compilers and linkers sometimes pad units with nulls
        let rest = stream.peek_bytes(stream.remaining())?;
        if rest.iter().any(|b| *b != 0) {
            return Err(DwarfError::LengthMismatch {
                offset: header.offset,
                declared: header.length,
                consumed: (stream.offset() - header.offset - header.encoding.format.initial_length_size())
                    as u64,
            });
        }
        if !rest.is_empty() {
            debug!("unit at 0x{:x} has {} bytes of padding", header.offset, rest.len());
        }

        Ok(CompilationUnit {
            header,
            abbrevs,
            root,
        })
    }

    pub fn header(&self) -> &UnitHeader {
        &self.header
    }

    /// Offset of the unit header within .debug_info.
    pub fn offset(&self) -> usize {
        self.header.offset
    }

    /// unit_length, doesn't include the length field itself.
    pub fn length(&self) -> u64 {
        self.header.length
    }

    pub fn abbreviation_offset(&self) -> u64 {
        self.header.abbrev_offset
    }

    pub fn version(&self) -> u16 {
        self.header.encoding.version
    }

    pub fn address_size(&self) -> u8 {
        self.header.encoding.address_size
    }

    pub fn format(&self) -> Format {
        self.header.encoding.format
    }

    pub fn encoding(&self) -> Encoding {
        self.header.encoding
    }

    pub fn abbreviations(&self) -> &Abbreviations {
        &self.abbrevs
    }

    /// The top level entry, usually a DW_TAG_compile_unit.
    pub fn root(&self) -> &Die<'a> {
        &self.root
    }

    /// The bytes of .debug_info covered by this unit (header included).
    pub fn range(&self) -> Range<usize> {
        self.header.offset..self.header.end().unwrap_or(self.header.offset)
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.range().contains(&offset)
    }

    /// Converts a reference into an offset within .debug_info.
    pub fn absolute_offset(&self, value: &AttributeValue) -> Option<usize> {
        match *value {
            AttributeValue::UnitRef(r) => self.header.offset.checked_add(usize::try_from(r).ok()?),
            AttributeValue::DebugInfoRef(r) => usize::try_from(r).ok(),
            _ => None,
        }
    }

    /// Returns the entry a reference points to if it's in this unit. Use
    /// DebugInfo::resolve for references that may point into other units.
    pub fn resolve(&self, value: &AttributeValue) -> Option<&Die<'a>> {
        self.die_at_offset(self.absolute_offset(value)?)
    }

    pub fn die_at_offset(&self, offset: usize) -> Option<&Die<'a>> {
        if self.contains(offset) {
            self.root.find(offset)
        } else {
            None
        }
    }
}

pub(crate) fn table_offset(header: &UnitHeader) -> Result<usize> {
    usize::try_from(header.abbrev_offset).map_err(|_| {
        DwarfError::malformed(header.offset, format!("bad table offset 0x{:x}", header.abbrev_offset))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::test_util::*;
    use crate::debug::{AttributeName, Tag};

    fn abbrevs() -> Vec<u8> {
        Abbrevs::new()
            .abbrev(1, TAG_COMPILE_UNIT, true, &[(AT_NAME, FORM_STRP)])
            .abbrev(2, TAG_BASE_TYPE, false, &[(AT_NAME, FORM_STRING), (AT_BYTE_SIZE, FORM_DATA1)])
            .abbrev(3, TAG_VARIABLE, false, &[(AT_NAME, FORM_STRING), (AT_TYPE, FORM_REF4)])
            .end()
            .bytes
    }

    // name is the first string in strings
    fn entries() -> Vec<u8> {
        Entries::new()
            .entry(1)
            .u32(0)
            .entry(2) // HEADER_SIZE + 5
            .string("int")
            .u8(4)
            .entry(3)
            .string("x")
            .u32((HEADER_SIZE + 5) as u32)
            .null()
            .bytes
    }

    fn strings() -> Vec<u8> {
        let mut strings = Strings::new();
        strings.add("a.c");
        strings.bytes
    }

    #[test]
    fn parses_header() {
        let info = unit(4, 8, 0, &entries());
        let header = UnitHeader::parse(&info, 0).unwrap();
        assert_eq!(header.length as usize, info.len() - 4);
        assert_eq!(header.encoding.version, 4);
        assert_eq!(header.encoding.address_size, 8);
        assert_eq!(header.encoding.format, Format::Dwarf32);
        assert_eq!(header.entries_offset, HEADER_SIZE);
        assert_eq!(header.end(), Some(info.len()));

        let info = unit64(3, 4, 0x10, &entries());
        let header = UnitHeader::parse(&info, 0).unwrap();
        assert_eq!(header.encoding.format, Format::Dwarf64);
        assert_eq!(header.abbrev_offset, 0x10);
        assert_eq!(header.entries_offset, 23);
        assert_eq!(header.end(), Some(info.len()));
    }

    #[test]
    fn bad_headers() {
        let info = unit(5, 8, 0, &entries());
        assert_eq!(
            UnitHeader::parse(&info, 0),
            Err(DwarfError::UnsupportedDwarfVersion { offset: 0, version: 5 })
        );
        let info = unit(1, 8, 0, &entries());
        assert!(matches!(
            UnitHeader::parse(&info, 0),
            Err(DwarfError::UnsupportedDwarfVersion { version: 1, .. })
        ));
        let info = unit(4, 3, 0, &entries());
        assert_eq!(
            UnitHeader::parse(&info, 0),
            Err(DwarfError::UnsupportedAddressSize { offset: 0, size: 3 })
        );

        let mut info = 0xffff_fff0u32.to_le_bytes().to_vec();
        info.extend([0; 16]);
        assert_eq!(
            UnitHeader::parse(&info, 0),
            Err(DwarfError::BadUnitLength {
                offset: 0,
                length: 0xffff_fff0
            })
        );

        // declared length runs past the section
        let mut info = unit(4, 8, 0, &entries());
        info.truncate(info.len() - 1);
        assert!(matches!(UnitHeader::parse(&info, 0), Err(DwarfError::OutOfBounds { .. })));

        // length too small to hold the rest of the header
        let mut info = 2u32.to_le_bytes().to_vec();
        info.extend([4, 0, 0, 0, 0, 0, 8]);
        assert!(matches!(UnitHeader::parse(&info, 0), Err(DwarfError::LengthMismatch { .. })));
    }

    #[test]
    fn parses_unit() {
        let info = unit(4, 8, 0, &entries());
        let strings = strings();
        let cu = CompilationUnit::parse(&info, &abbrevs(), &strings, 0, &ParseOptions::default()).unwrap();
        assert_eq!(cu.offset(), 0);
        assert_eq!(cu.version(), 4);
        assert_eq!(cu.address_size(), 8);
        assert_eq!(cu.range(), 0..info.len());
        assert_eq!(cu.abbreviations().len(), 3);
        assert_eq!(cu.root().tag(), Tag::DW_TAG_compile_unit);
        assert_eq!(cu.root().name(), Some("a.c"));
        assert_eq!(cu.root().offset(), HEADER_SIZE);
    }

    #[test]
    fn resolves_references() {
        let info = unit(4, 8, 0, &entries());
        let strings = strings();
        let cu = CompilationUnit::parse(&info, &abbrevs(), &strings, 0, &ParseOptions::default()).unwrap();
        let x = &cu.root().children()[1];
        let ty = x.attribute(AttributeName::DW_AT_type).unwrap();
        assert_eq!(cu.absolute_offset(ty), Some(HEADER_SIZE + 5));
        assert_eq!(cu.resolve(ty).and_then(|d| d.name()), Some("int"));

        assert!(cu.resolve(&AttributeValue::UnitRef(1)).is_none());
        assert!(cu.resolve(&AttributeValue::UnitRef(0x1000)).is_none());
        assert!(cu.resolve(&AttributeValue::Unsigned(HEADER_SIZE as u64)).is_none());
        assert_eq!(
            cu.resolve(&AttributeValue::DebugInfoRef(HEADER_SIZE as u64)).map(|d| d.tag()),
            Some(Tag::DW_TAG_compile_unit)
        );
    }

    #[test]
    fn units_at_nonzero_offsets() {
        let mut info = unit(4, 8, 0, &entries());
        let second = info.len();
        info.extend(unit(2, 4, 0, &entries()));
        let strings = strings();
        let cu = CompilationUnit::parse(&info, &abbrevs(), &strings, second, &ParseOptions::default()).unwrap();
        assert_eq!(cu.range(), second..info.len());
        assert_eq!(cu.root().offset(), second + HEADER_SIZE);

        // unit relative references are relative to this unit's header
        let x = &cu.root().children()[1];
        let ty = x.attribute(AttributeName::DW_AT_type).unwrap();
        assert_eq!(cu.resolve(ty).and_then(|d| d.name()), Some("int"));
    }

    #[test]
    fn trailing_padding() {
        let mut body = entries();
        body.extend([0, 0, 0]);
        let info = unit(4, 8, 0, &body);
        let strings = strings();
        assert!(CompilationUnit::parse(&info, &abbrevs(), &strings, 0, &ParseOptions::default()).is_ok());

        let mut body = entries();
        body.extend([0, 2, 0]);
        let info = unit(4, 8, 0, &body);
        assert_eq!(
            CompilationUnit::parse(&info, &abbrevs(), &strings, 0, &ParseOptions::default()).unwrap_err(),
            DwarfError::LengthMismatch {
                offset: 0,
                declared: (info.len() - 4) as u64,
                consumed: (info.len() - 4 - 3) as u64,
            }
        );
    }

    #[test]
    fn entries_cant_run_past_the_unit() {
        // the unit claims to end before the terminating null
        let mut info = unit(4, 8, 0, &entries());
        let length = (info.len() - 4 - 1) as u32;
        info[0..4].copy_from_slice(&length.to_le_bytes());
        let strings = strings();
        assert!(matches!(
            CompilationUnit::parse(&info, &abbrevs(), &strings, 0, &ParseOptions::default()),
            Err(DwarfError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn bad_abbreviation_offset() {
        let info = unit(4, 8, 0x100, &entries());
        let strings = strings();
        assert!(matches!(
            CompilationUnit::parse(&info, &abbrevs(), &strings, 0, &ParseOptions::default()),
            Err(DwarfError::MalformedAbbreviation { .. })
        ));
    }
}
