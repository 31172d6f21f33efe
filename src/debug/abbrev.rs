use crate::{
    debug::{AttributeName, FormEncoding, Tag, decode_u64},
    elf::Stream,
    error::{DwarfError, Result},
};
use indexmap::IndexMap;

/// This determines how values are encoded into the .debug_info section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Abbreviation {
    /// Entries in .debug_info start with this code. Never zero.
    pub code: u64,

    /// DW_TAG_compile_unit, DW_TAG_typedef, DW_TAG_base_type, etc
    pub tag: Tag,

    /// If true then subsequent entries are children (until a NULL entry). Otherwise
    /// they are siblings.
    pub has_children: bool,

    /// The type of an attribute in a .debug_info entry along with how the associated
    /// value is encoded. These appear in the same order as the values do.
    pub attrs: Vec<AttributeEncoding>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttributeEncoding {
    pub name: AttributeName,
    pub encoding: FormEncoding,
}

/// All the abbreviations used by one compilation unit (units can share a table).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Abbreviations {
    /// Offset into .debug_abbrev at which the table starts.
    pub offset: usize,
    entries: IndexMap<u64, Abbreviation>,
}

impl Abbreviation {
    /// Returns an abbreviation or None if we've reached the end of the abbreviations for
    /// a compilation unit.
    pub fn new(stream: &mut Stream) -> Result<Option<Self>> {
        let start = stream.offset();
        if stream.at_end() {
            return Ok(None); // last table in the section may omit the null code
        }
        let code = read(stream, start)?;
        if code == 0 {
            return Ok(None); // ends the compilation unit
        }

        let tag = read(stream, start)?;
        if tag == 0 {
            return Err(DwarfError::malformed(start, format!("code {code} has a zero tag")));
        }
        let tag = Tag::from_u64(tag);
        let has_children = match stream.read_byte() {
            Ok(0) => false,
            Ok(1) => true,
            Ok(b) => {
                return Err(DwarfError::malformed(
                    start,
                    format!("code {code} has a bad children flag: {b}"),
                ));
            }
            Err(_) => return Err(truncated(start, code)),
        };

        let mut attrs: Vec<AttributeEncoding> = Vec::new();
        loop {
            let name = read(stream, start)?;
            let encoding = read(stream, start)?;
            if name == 0 && encoding == 0 {
                break;
            }
            if name == 0 || encoding == 0 {
                return Err(DwarfError::malformed(
                    start,
                    format!("code {code} has a bad attribute: ({name:x}, {encoding:x})"),
                ));
            }

            let name = AttributeName::from_u64(name);
            if attrs.iter().any(|a| a.name == name) {
                return Err(DwarfError::malformed(
                    start,
                    format!("code {code} repeats {name}"),
                ));
            }
            let encoding = FormEncoding::from_u64(encoding);
            attrs.push(AttributeEncoding { name, encoding })
        }
        Ok(Some(Abbreviation {
            code,
            tag,
            has_children,
            attrs,
        }))
    }
}

impl Abbreviations {
    /// Parses the table starting at offset within .debug_abbrev.
    pub fn parse(section: &[u8], offset: usize) -> Result<Self> {
        if offset >= section.len() {
            return Err(DwarfError::malformed(
                offset,
                format!("table starts past the end of .debug_abbrev (0x{:x})", section.len()),
            ));
        }

        let mut stream = Stream::new(section, offset);
        let mut entries = IndexMap::new();
        loop {
            let start = stream.offset();
            match Abbreviation::new(&mut stream)? {
                Some(abbrev) => {
                    let code = abbrev.code;
                    if entries.insert(code, abbrev).is_some() {
                        return Err(DwarfError::malformed(start, format!("code {code} repeats")));
                    }
                }
                None => break,
            }
        }
        Ok(Abbreviations { offset, entries })
    }

    pub fn get(&self, code: u64) -> Option<&Abbreviation> {
        self.entries.get(&code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates in the order the abbreviations appear in .debug_abbrev.
    pub fn iter(&self) -> impl Iterator<Item = &Abbreviation> {
        self.entries.values()
    }
}

// Running out of bytes inside an abbreviation means the table is malformed rather than
// that the caller read too far.
fn read(stream: &mut Stream, start: usize) -> Result<u64> {
    decode_u64(stream).map_err(|err| match err {
        DwarfError::IntegerOverflow { offset } => {
            DwarfError::malformed(offset, "LEB128 value overflows")
        }
        _ => DwarfError::malformed(start, "section ends before the terminating (0, 0) pair"),
    })
}

fn truncated(start: usize, code: u64) -> DwarfError {
    DwarfError::malformed(start, format!("section ends inside code {code}"))
}
