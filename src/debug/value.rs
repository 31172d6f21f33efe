//! Attribute values. See section 7.5.4 for encoding details.
use crate::{
    debug::{Encoding, FormEncoding, decode_i64, decode_u64},
    elf::Stream,
    error::{DwarfError, Result},
};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeValue<'a> {
    /// DW_FORM_addr, relocated address in the target.
    Address(u64),

    /// DW_FORM_data1, data2, data4, data8, udata. Note that DWARF 2 and 3 also use
    /// data4 and data8 for section offsets.
    Unsigned(u64),

    /// DW_FORM_sdata
    Signed(i64),

    /// DW_FORM_string (inline) or DW_FORM_strp (from .debug_str). Without the null.
    String(&'a [u8]),

    /// DW_FORM_block1, block2, block4, block. Often a DWARF expression but that's up to
    /// whoever evaluates it.
    Block(&'a [u8]),

    /// DW_FORM_exprloc
    Exprloc(&'a [u8]),

    /// DW_FORM_flag or DW_FORM_flag_present
    Flag(bool),

    /// DW_FORM_ref1, ref2, ref4, ref8, ref_udata. Offset from the first byte of the
    /// header of the unit containing the reference.
    UnitRef(u64),

    /// DW_FORM_ref_addr, offset from the start of .debug_info. Can point into other units.
    DebugInfoRef(u64),

    /// DW_FORM_ref_sig8, signature of a type unit.
    TypeSignature(u64),

    /// DW_FORM_sec_offset, offset into some other section (e.g. .debug_line).
    SecOffset(u64),
}

impl<'a> AttributeValue<'a> {
    /// Strings that aren't UTF-8 return None, use as_bytes for those.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            AttributeValue::String(s) => std::str::from_utf8(s).ok(),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        match self {
            AttributeValue::String(s) => Some(s),
            AttributeValue::Block(b) | AttributeValue::Exprloc(b) => Some(b),
            _ => None,
        }
    }

    /// Blocks and expressions, uninterpreted.
    pub fn as_block(&self) -> Option<&'a [u8]> {
        match self {
            AttributeValue::Block(b) | AttributeValue::Exprloc(b) => Some(b),
            _ => None,
        }
    }

    /// Unsigned constants, addresses, and offsets. Signed constants are returned if
    /// they are non-negative.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            AttributeValue::Address(v)
            | AttributeValue::Unsigned(v)
            | AttributeValue::UnitRef(v)
            | AttributeValue::DebugInfoRef(v)
            | AttributeValue::SecOffset(v) => Some(v),
            AttributeValue::Signed(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            AttributeValue::Signed(v) => Some(v),
            AttributeValue::Unsigned(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match *self {
            AttributeValue::Flag(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            AttributeValue::UnitRef(_) | AttributeValue::DebugInfoRef(_)
        )
    }
}

impl fmt::Display for AttributeValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttributeValue::Address(a) => write!(f, "0x{a:x}"),
            AttributeValue::Unsigned(v) => write!(f, "{v}"),
            AttributeValue::Signed(v) => write!(f, "{v}"),
            AttributeValue::String(s) => write!(f, "\"{}\"", String::from_utf8_lossy(s)),
            AttributeValue::Block(b) => write_block(f, "block", b),
            AttributeValue::Exprloc(b) => write_block(f, "exprloc", b),
            AttributeValue::Flag(v) => write!(f, "{v}"),
            AttributeValue::UnitRef(r) => write!(f, "<unit+0x{r:x}>"),
            AttributeValue::DebugInfoRef(r) => write!(f, "<0x{r:x}>"),
            AttributeValue::TypeSignature(s) => write!(f, "signature 0x{s:016x}"),
            AttributeValue::SecOffset(o) => write!(f, "section offset 0x{o:x}"),
        }
    }
}

fn write_block(f: &mut fmt::Formatter, label: &str, bytes: &[u8]) -> fmt::Result {
    write!(f, "{label}[{}]", bytes.len())?;
    for b in bytes.iter().take(16) {
        write!(f, " {b:02x}")?;
    }
    if bytes.len() > 16 {
        write!(f, " ...")?;
    }
    Ok(())
}

/// Consumes exactly the bytes used by a value with the given form. Forms we don't know
/// how to size fail with UnsupportedForm: skipping them would misalign every attribute
/// after them.
pub fn decode_attribute<'a>(
    form: FormEncoding,
    stream: &mut Stream<'a>,
    strings: &'a [u8],
    encoding: Encoding,
) -> Result<AttributeValue<'a>> {
    let start = stream.offset();
    let form = match form {
        FormEncoding::DW_FORM_indirect => match FormEncoding::from_u64(decode_u64(stream)?) {
            FormEncoding::DW_FORM_indirect => {
                return Err(DwarfError::UnsupportedForm {
                    offset: start,
                    form: 0x16,
                });
            }
            f => f,
        },
        f => f,
    };
    decode_direct(form, stream, strings, encoding)
}

fn decode_direct<'a>(
    form: FormEncoding,
    stream: &mut Stream<'a>,
    strings: &'a [u8],
    encoding: Encoding,
) -> Result<AttributeValue<'a>> {
    let value = match form {
        FormEncoding::DW_FORM_addr => AttributeValue::Address(parse_addr(stream, encoding)?),
        FormEncoding::DW_FORM_data1 => AttributeValue::Unsigned(stream.read_byte()? as u64),
        FormEncoding::DW_FORM_data2 => AttributeValue::Unsigned(stream.read_half()? as u64),
        FormEncoding::DW_FORM_data4 => AttributeValue::Unsigned(stream.read_word()? as u64),
        FormEncoding::DW_FORM_data8 => AttributeValue::Unsigned(stream.read_xword()?),
        FormEncoding::DW_FORM_udata => AttributeValue::Unsigned(decode_u64(stream)?),
        FormEncoding::DW_FORM_sdata => AttributeValue::Signed(decode_i64(stream)?),
        FormEncoding::DW_FORM_string => AttributeValue::String(stream.read_cstr()?),
        FormEncoding::DW_FORM_strp => AttributeValue::String(parse_strp(stream, strings, encoding)?),
        FormEncoding::DW_FORM_block1 => {
            let length = stream.read_byte()? as u64;
            AttributeValue::Block(parse_block(stream, length)?)
        }
        FormEncoding::DW_FORM_block2 => {
            let length = stream.read_half()? as u64;
            AttributeValue::Block(parse_block(stream, length)?)
        }
        FormEncoding::DW_FORM_block4 => {
            let length = stream.read_word()? as u64;
            AttributeValue::Block(parse_block(stream, length)?)
        }
        FormEncoding::DW_FORM_block => {
            let length = decode_u64(stream)?;
            AttributeValue::Block(parse_block(stream, length)?)
        }
        FormEncoding::DW_FORM_exprloc => {
            let length = decode_u64(stream)?;
            AttributeValue::Exprloc(parse_block(stream, length)?)
        }
        FormEncoding::DW_FORM_flag => AttributeValue::Flag(stream.read_byte()? != 0),
        FormEncoding::DW_FORM_flag_present => AttributeValue::Flag(true),
        FormEncoding::DW_FORM_ref1 => AttributeValue::UnitRef(stream.read_byte()? as u64),
        FormEncoding::DW_FORM_ref2 => AttributeValue::UnitRef(stream.read_half()? as u64),
        FormEncoding::DW_FORM_ref4 => AttributeValue::UnitRef(stream.read_word()? as u64),
        FormEncoding::DW_FORM_ref8 => AttributeValue::UnitRef(stream.read_xword()?),
        FormEncoding::DW_FORM_ref_udata => AttributeValue::UnitRef(decode_u64(stream)?),
        FormEncoding::DW_FORM_ref_addr => {
            // DWARF 2 used an address here, later versions switched to an offset
            if encoding.version <= 2 {
                AttributeValue::DebugInfoRef(parse_addr(stream, encoding)?)
            } else {
                AttributeValue::DebugInfoRef(stream.read_uint(encoding.format.offset_size())?)
            }
        }
        FormEncoding::DW_FORM_ref_sig8 => AttributeValue::TypeSignature(stream.read_xword()?),
        FormEncoding::DW_FORM_sec_offset => {
            AttributeValue::SecOffset(stream.read_uint(encoding.format.offset_size())?)
        }
        FormEncoding::DW_FORM_indirect => {
            return Err(DwarfError::UnsupportedForm {
                offset: stream.offset(),
                form: 0x16,
            });
        }
        FormEncoding::DW_FORM_unknown(form) => {
            return Err(DwarfError::UnsupportedForm {
                offset: stream.offset(),
                form,
            });
        }
    };
    Ok(value)
}

// DW_FORM_addr
fn parse_addr(stream: &mut Stream, encoding: Encoding) -> Result<u64> {
    match encoding.address_size {
        1 | 2 | 4 | 8 => stream.read_uint(encoding.address_size as usize),
        size => Err(DwarfError::UnsupportedAddressSize {
            offset: stream.offset(),
            size,
        }),
    }
}

// DW_FORM_strp, offset into .debug_str
fn parse_strp<'a>(stream: &mut Stream<'a>, strings: &'a [u8], encoding: Encoding) -> Result<&'a [u8]> {
    let offset = stream.read_uint(encoding.format.offset_size())?;
    let offset = usize::try_from(offset).unwrap_or(usize::MAX);
    Stream::new(strings, offset).read_cstr()
}

fn parse_block<'a>(stream: &mut Stream<'a>, length: u64) -> Result<&'a [u8]> {
    let length = usize::try_from(length).unwrap_or(usize::MAX);
    stream.read_bytes(length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::Format;
    use crate::debug::test_util::*;

    const V4: Encoding = Encoding {
        format: Format::Dwarf32,
        version: 4,
        address_size: 8,
    };

    fn decode<'a>(form: u64, bytes: &'a [u8], strings: &'a [u8]) -> Result<(AttributeValue<'a>, usize)> {
        decode_with(form, bytes, strings, V4)
    }

    fn decode_with<'a>(
        form: u64,
        bytes: &'a [u8],
        strings: &'a [u8],
        encoding: Encoding,
    ) -> Result<(AttributeValue<'a>, usize)> {
        let mut s = Stream::new(bytes, 0);
        let value = decode_attribute(FormEncoding::from_u64(form), &mut s, strings, encoding)?;
        Ok((value, s.offset()))
    }

    #[test]
    fn constants() {
        let bytes = [0xfe, 0xff, 0xff, 0xff, 0x01, 0x02, 0x03, 0x04, 0x99];
        assert_eq!(decode(FORM_DATA1, &bytes, &[]).unwrap(), (AttributeValue::Unsigned(0xfe), 1));
        assert_eq!(decode(FORM_DATA2, &bytes, &[]).unwrap(), (AttributeValue::Unsigned(0xfffe), 2));
        assert_eq!(
            decode(FORM_DATA4, &bytes, &[]).unwrap(),
            (AttributeValue::Unsigned(0xffff_fffe), 4)
        );
        assert_eq!(
            decode(FORM_DATA8, &bytes, &[]).unwrap(),
            (AttributeValue::Unsigned(0x0403_0201_ffff_fffe), 8)
        );
        assert_eq!(decode(FORM_UDATA, &[0x80, 0x01], &[]).unwrap(), (AttributeValue::Unsigned(128), 2));
        assert_eq!(decode(FORM_SDATA, &[0x7e], &[]).unwrap(), (AttributeValue::Signed(-2), 1));
    }

    #[test]
    fn addresses_use_the_unit_address_size() {
        let bytes = [1, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(
            decode(FORM_ADDR, &bytes, &[]).unwrap(),
            (AttributeValue::Address(0x0807_0605_0403_0201), 8)
        );
        let four = Encoding {
            address_size: 4,
            ..V4
        };
        assert_eq!(
            decode_with(FORM_ADDR, &bytes, &[], four).unwrap(),
            (AttributeValue::Address(0x0403_0201), 4)
        );
        let three = Encoding {
            address_size: 3,
            ..V4
        };
        assert!(matches!(
            decode_with(FORM_ADDR, &bytes, &[], three),
            Err(DwarfError::UnsupportedAddressSize { size: 3, .. })
        ));
    }

    #[test]
    fn strings() {
        let mut strings = Strings::new();
        strings.add("main");
        let offset = strings.add("x");
        let bytes = offset.to_le_bytes();
        let (value, used) = decode(FORM_STRP, &bytes, &strings.bytes).unwrap();
        assert_eq!(value.as_str(), Some("x"));
        assert_eq!(used, 4);

        let (value, used) = decode(FORM_STRING, b"hello\0world", &[]).unwrap();
        assert_eq!(value, AttributeValue::String(b"hello"));
        assert_eq!(used, 6);

        let sixty_four = Encoding {
            format: Format::Dwarf64,
            ..V4
        };
        let bytes = (offset as u64).to_le_bytes();
        let (value, used) = decode_with(FORM_STRP, &bytes, &strings.bytes, sixty_four).unwrap();
        assert_eq!(value.as_str(), Some("x"));
        assert_eq!(used, 8);
    }

    #[test]
    fn bad_string_offsets() {
        let strings = b"abc"; // no terminator
        assert!(matches!(
            decode(FORM_STRP, &0u32.to_le_bytes(), strings),
            Err(DwarfError::OutOfBounds { .. })
        ));
        assert!(matches!(
            decode(FORM_STRP, &100u32.to_le_bytes(), b"abc\0"),
            Err(DwarfError::OutOfBounds { .. })
        ));
        assert!(matches!(
            decode(FORM_STRING, b"no null", &[]),
            Err(DwarfError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn blocks() {
        let bytes = [2, 0xaa, 0xbb, 0xcc];
        assert_eq!(decode(FORM_BLOCK1, &bytes, &[]).unwrap(), (AttributeValue::Block(&[0xaa, 0xbb]), 3));
        assert_eq!(decode(FORM_BLOCK, &bytes, &[]).unwrap(), (AttributeValue::Block(&[0xaa, 0xbb]), 3));
        assert_eq!(decode(FORM_EXPRLOC, &bytes, &[]).unwrap(), (AttributeValue::Exprloc(&[0xaa, 0xbb]), 3));

        let bytes = [1, 0, 0x91];
        assert_eq!(decode(FORM_BLOCK2, &bytes, &[]).unwrap(), (AttributeValue::Block(&[0x91]), 3));
        let bytes = [0, 0, 0, 0];
        assert_eq!(decode(FORM_BLOCK4, &bytes, &[]).unwrap(), (AttributeValue::Block(&[]), 4));

        // length claims more than there is
        let bytes = [0xff, 0xff, 0xff, 0xff, 0x0f, 1];
        assert!(matches!(decode(FORM_BLOCK, &bytes, &[]), Err(DwarfError::OutOfBounds { .. })));
        assert!(matches!(decode(FORM_BLOCK4, &bytes, &[]), Err(DwarfError::OutOfBounds { .. })));
    }

    #[test]
    fn flags() {
        assert_eq!(decode(FORM_FLAG, &[0], &[]).unwrap(), (AttributeValue::Flag(false), 1));
        assert_eq!(decode(FORM_FLAG, &[3], &[]).unwrap(), (AttributeValue::Flag(true), 1));
        assert_eq!(decode(FORM_FLAG_PRESENT, &[], &[]).unwrap(), (AttributeValue::Flag(true), 0));
    }

    #[test]
    fn references() {
        let bytes = [0x10, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(decode(FORM_REF1, &bytes, &[]).unwrap(), (AttributeValue::UnitRef(0x10), 1));
        assert_eq!(decode(FORM_REF2, &bytes, &[]).unwrap(), (AttributeValue::UnitRef(0x10), 2));
        assert_eq!(decode(FORM_REF4, &bytes, &[]).unwrap(), (AttributeValue::UnitRef(0x10), 4));
        assert_eq!(decode(FORM_REF8, &bytes, &[]).unwrap(), (AttributeValue::UnitRef(0x10), 8));
        assert_eq!(decode(FORM_REF_UDATA, &bytes, &[]).unwrap(), (AttributeValue::UnitRef(0x10), 1));
        assert_eq!(decode(FORM_REF_SIG8, &bytes, &[]).unwrap(), (AttributeValue::TypeSignature(0x10), 8));
        assert_eq!(decode(FORM_SEC_OFFSET, &bytes, &[]).unwrap(), (AttributeValue::SecOffset(0x10), 4));

        // ref_addr is an offset in DWARF 3+ and an address in DWARF 2
        assert_eq!(decode(FORM_REF_ADDR, &bytes, &[]).unwrap(), (AttributeValue::DebugInfoRef(0x10), 4));
        let v2 = Encoding { version: 2, ..V4 };
        assert_eq!(
            decode_with(FORM_REF_ADDR, &bytes, &[], v2).unwrap(),
            (AttributeValue::DebugInfoRef(0x10), 8)
        );
    }

    #[test]
    fn indirect() {
        let bytes = [FORM_DATA2 as u8, 0x34, 0x12];
        assert_eq!(decode(FORM_INDIRECT, &bytes, &[]).unwrap(), (AttributeValue::Unsigned(0x1234), 3));

        let bytes = [FORM_INDIRECT as u8, FORM_DATA1 as u8, 0];
        assert!(matches!(
            decode(FORM_INDIRECT, &bytes, &[]),
            Err(DwarfError::UnsupportedForm { form: 0x16, .. })
        ));
    }

    #[test]
    fn unsupported_forms() {
        assert_eq!(
            decode(FORM_STRX, &[0, 0, 0, 0], &[]),
            Err(DwarfError::UnsupportedForm { offset: 0, form: 0x1a })
        );
        let bytes = [FORM_STRX as u8, 0];
        assert!(matches!(
            decode(FORM_INDIRECT, &bytes, &[]),
            Err(DwarfError::UnsupportedForm { form: 0x1a, .. })
        ));
    }

    #[test]
    fn truncated_values() {
        for form in [FORM_DATA2, FORM_DATA4, FORM_DATA8, FORM_ADDR, FORM_REF4, FORM_UDATA, FORM_FLAG] {
            assert!(
                matches!(decode(form, &[], &[]), Err(DwarfError::OutOfBounds { .. })),
                "form 0x{form:x}"
            );
        }
    }

    #[test]
    fn accessors() {
        assert_eq!(AttributeValue::Signed(-1).as_u64(), None);
        assert_eq!(AttributeValue::Signed(5).as_u64(), Some(5));
        assert_eq!(AttributeValue::Unsigned(u64::MAX).as_i64(), None);
        assert_eq!(AttributeValue::Flag(true).as_flag(), Some(true));
        assert_eq!(AttributeValue::String(b"\xff").as_str(), None);
        assert_eq!(AttributeValue::String(b"\xff").as_bytes(), Some(&b"\xff"[..]));
        assert_eq!(AttributeValue::String(b"\xff").as_block(), None);
        assert_eq!(AttributeValue::Exprloc(&[1]).as_block(), Some(&[1u8][..]));
        assert!(AttributeValue::UnitRef(3).is_reference());
        assert!(!AttributeValue::SecOffset(3).is_reference());
    }

    #[test]
    fn display() {
        assert_eq!(AttributeValue::String(b"x").to_string(), "\"x\"");
        assert_eq!(AttributeValue::Address(0x1000).to_string(), "0x1000");
        assert_eq!(AttributeValue::UnitRef(0x2a).to_string(), "<unit+0x2a>");
        assert_eq!(AttributeValue::Exprloc(&[0x91, 0x68]).to_string(), "exprloc[2] 91 68");
    }
}
