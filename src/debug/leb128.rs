//! LEB128 variable length integers, see section 7.6 of the DWARF spec.
use crate::elf::Stream;
use crate::error::{DwarfError, Result};

/// A u64 needs at most ten bytes of seven bits each.
const MAX_BYTES: usize = 10;

/// Unsigned LEB128.
pub fn decode_u64(stream: &mut Stream) -> Result<u64> {
    let start = stream.offset();
    let mut result = 0;
    let mut shift = 0;
    for i in 0..MAX_BYTES {
        let byte = stream.read_byte()?;
        let low = (byte & 0x7f) as u64;
        if i == MAX_BYTES - 1 && low > 1 {
            // only the top bit of the u64 is left for the last byte
            return Err(DwarfError::IntegerOverflow { offset: start });
        }
        result |= low << shift;
        if (byte & 0x80) == 0 {
            return Ok(result);
        }
        shift += 7;
    }
    Err(DwarfError::IntegerOverflow { offset: start })
}

/// Signed LEB128.
pub fn decode_i64(stream: &mut Stream) -> Result<i64> {
    let start = stream.offset();
    let mut result: u64 = 0;
    let mut shift = 0;
    for _ in 0..MAX_BYTES {
        let byte = stream.read_byte()?;
        result |= ((byte & 0x7f) as u64) << shift;
        shift += 7;
        if (byte & 0x80) == 0 {
            if shift < 64 && (byte & 0x40) != 0 {
                result |= !0 << shift;
            }
            return Ok(result as i64);
        }
    }
    Err(DwarfError::IntegerOverflow { offset: start })
}
