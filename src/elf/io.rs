use crate::error::{DwarfError, Result};
use memmap2::Mmap;
use std::error::Error;

fn require(predicate: bool, err: &str) -> std::result::Result<(), Box<dyn Error>> {
    if predicate { Ok(()) } else { Err(err.into()) }
}

/// Owns the bytes of a memory mapped ELF file.
pub struct Reader {
    pub little_endian: bool,
    pub sixty_four_bit: bool,
    bytes: Mmap,
}

impl Reader {
    /// Only the identification bytes are checked here. Everything past them is read
    /// through a Stream so that truncated or corrupted files produce errors instead
    /// of panics.
    pub fn new(bytes: Mmap) -> std::result::Result<Self, Box<dyn Error>> {
        // see https://en.wikipedia.org/wiki/Executable_and_Linkable_Format
        require(bytes.len() >= 16, "file is much too small to be ELF")?;
        require(&bytes[0..4] == b"\x7fELF", "not an ELF file (bad magic)")?;

        let ei_class = bytes[0x04];
        let ei_data = bytes[0x05];
        let ei_version = bytes[0x06];
        require(ei_class == 1 || ei_class == 2, &format!("bad elf class: {ei_class}"))?;
        require(ei_data == 1 || ei_data == 2, &format!("bad elf data: {ei_data}"))?;
        require(ei_version == 1, &format!("bad elf version: {ei_version}"))?;

        Ok(Reader {
            bytes,
            sixty_four_bit: ei_class == 2,
            little_endian: ei_data == 1,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns a stream positioned at offset that uses the file's byte order.
    pub fn stream(&self, offset: usize) -> Stream<'_> {
        Stream::with_endian(&self.bytes, offset, self.little_endian)
    }

    pub fn slice(&self, offset: usize, size: usize) -> Result<&[u8]> {
        let mut s = Stream::new(&self.bytes, 0);
        s.seek(offset)?;
        s.read_bytes(size)
    }
}

/// Bounds checked cursor over a byte slice. Reads never go past the end of the slice,
/// no matter what lengths the data claims: they fail with OutOfBounds and leave the
/// position where it was.
#[derive(Clone, Debug)]
pub struct Stream<'a> {
    bytes: &'a [u8],
    offset: usize,
    little_endian: bool,
}

impl<'a> Stream<'a> {
    /// Little endian stream. Note that offset may be past the end of bytes in which
    /// case every read fails.
    pub fn new(bytes: &'a [u8], offset: usize) -> Self {
        Stream {
            bytes,
            offset,
            little_endian: true,
        }
    }

    pub fn with_endian(bytes: &'a [u8], offset: usize, little_endian: bool) -> Self {
        Stream {
            bytes,
            offset,
            little_endian,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// All the bytes the stream is reading from (not just the remaining ones).
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    pub fn at_end(&self) -> bool {
        self.remaining() == 0
    }

    /// Moves to an absolute offset. Seeking to the very end is allowed.
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.bytes.len() {
            return Err(DwarfError::OutOfBounds {
                offset,
                wanted: 0,
                available: 0,
            });
        }
        self.offset = offset;
        Ok(())
    }

    pub fn seek_relative(&mut self, delta: i64) -> Result<()> {
        let target = if delta < 0 {
            self.offset.checked_sub(delta.unsigned_abs() as usize)
        } else {
            self.offset.checked_add(delta as usize)
        };
        match target {
            Some(t) => self.seek(t),
            None => Err(self.out_of_bounds(delta.unsigned_abs() as usize)),
        }
    }

    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        match self.offset.checked_add(count) {
            Some(end) if end <= self.bytes.len() => Ok(&self.bytes[self.offset..end]),
            _ => Err(self.out_of_bounds(count)),
        }
    }

    pub fn peek_byte(&self) -> Result<u8> {
        Ok(self.peek_bytes(1)?[0])
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.offset += count;
        Ok(bytes)
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_half(&mut self) -> Result<u16> {
        let bytes: [u8; 2] = self.read_array()?;
        if self.little_endian {
            Ok(u16::from_le_bytes(bytes))
        } else {
            Ok(u16::from_be_bytes(bytes))
        }
    }

    pub fn read_word(&mut self) -> Result<u32> {
        let bytes: [u8; 4] = self.read_array()?;
        if self.little_endian {
            Ok(u32::from_le_bytes(bytes))
        } else {
            Ok(u32::from_be_bytes(bytes))
        }
    }

    pub fn read_xword(&mut self) -> Result<u64> {
        let bytes: [u8; 8] = self.read_array()?;
        if self.little_endian {
            Ok(u64::from_le_bytes(bytes))
        } else {
            Ok(u64::from_be_bytes(bytes))
        }
    }

    /// Reads an unsigned integer that is 1, 2, 4, or 8 bytes wide. Other sizes are
    /// programmer errors and panic in debug builds.
    pub fn read_uint(&mut self, size: usize) -> Result<u64> {
        match size {
            1 => Ok(self.read_byte()? as u64),
            2 => Ok(self.read_half()? as u64),
            4 => Ok(self.read_word()? as u64),
            8 => self.read_xword(),
            _ => {
                debug_assert!(false, "bad integer size {size}");
                Err(self.out_of_bounds(size))
            }
        }
    }

    /// Returns the bytes before the next null and moves past the null. Fails if the
    /// slice ends before a null is found.
    pub fn read_cstr(&mut self) -> Result<&'a [u8]> {
        let rest = self.bytes.get(self.offset..).unwrap_or(&[]);
        match rest.iter().position(|b| *b == 0) {
            Some(len) => {
                let s = &rest[..len];
                self.offset += len + 1;
                Ok(s)
            }
            None => Err(self.out_of_bounds(rest.len() + 1)),
        }
    }

    /// Read a null-terminated string, replacing anything that isn't UTF-8.
    pub fn read_string(&mut self) -> Result<String> {
        Ok(String::from_utf8_lossy(self.read_cstr()?).into_owned())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut result = [0; N];
        result.copy_from_slice(self.read_bytes(N)?);
        Ok(result)
    }

    fn out_of_bounds(&self, wanted: usize) -> DwarfError {
        DwarfError::OutOfBounds {
            offset: self.offset,
            wanted,
            available: self.remaining(),
        }
    }
}
