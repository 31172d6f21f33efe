//! Errors produced while decoding DWARF. Offsets are relative to the start of the
//! section being read (usually .debug_info, .debug_abbrev for abbreviation errors).
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DwarfError {
    /// A read would have consumed more bytes than remain in the slice.
    #[error("out of bounds: wanted {wanted} byte(s) at 0x{offset:x} but only {available} remain")]
    OutOfBounds {
        offset: usize,
        wanted: usize,
        available: usize,
    },

    /// A LEB128 value didn't terminate within ten bytes.
    #[error("LEB128 value at 0x{offset:x} overflows 64 bits")]
    IntegerOverflow { offset: usize },

    #[error("malformed abbreviation at 0x{offset:x}: {reason}")]
    MalformedAbbreviation { offset: usize, reason: String },

    #[error("unknown abbreviation code {code} at 0x{offset:x}")]
    UnknownAbbreviationCode { offset: usize, code: u64 },

    #[error("unsupported form 0x{form:x} at 0x{offset:x}")]
    UnsupportedForm { offset: usize, form: u64 },

    #[error("unsupported DWARF version {version} at 0x{offset:x}")]
    UnsupportedDwarfVersion { offset: usize, version: u16 },

    #[error("unsupported address size {size} at 0x{offset:x}")]
    UnsupportedAddressSize { offset: usize, size: u8 },

    /// The entries in a unit didn't line up with the unit's declared length.
    #[error("unit at 0x{offset:x} declares {declared} bytes but its entries use {consumed}")]
    LengthMismatch {
        offset: usize,
        declared: u64,
        consumed: u64,
    },

    #[error("entries nested deeper than {max_depth} at 0x{offset:x}")]
    TreeTooDeep { offset: usize, max_depth: usize },

    /// The first entry of a unit was the null entry.
    #[error("unit at 0x{offset:x} has no root entry")]
    EmptyUnit { offset: usize },

    /// A unit length in the reserved 0xfffffff0..=0xfffffffe range.
    #[error("reserved unit length 0x{length:x} at 0x{offset:x}")]
    BadUnitLength { offset: usize, length: u64 },
}

impl DwarfError {
    /// Offset at which the problem was detected.
    pub fn offset(&self) -> usize {
        match self {
            DwarfError::OutOfBounds { offset, .. }
            | DwarfError::IntegerOverflow { offset }
            | DwarfError::MalformedAbbreviation { offset, .. }
            | DwarfError::UnknownAbbreviationCode { offset, .. }
            | DwarfError::UnsupportedForm { offset, .. }
            | DwarfError::UnsupportedDwarfVersion { offset, .. }
            | DwarfError::UnsupportedAddressSize { offset, .. }
            | DwarfError::LengthMismatch { offset, .. }
            | DwarfError::TreeTooDeep { offset, .. }
            | DwarfError::EmptyUnit { offset }
            | DwarfError::BadUnitLength { offset, .. } => *offset,
        }
    }

    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        DwarfError::MalformedAbbreviation {
            offset,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DwarfError>;
