use std::ops::{Add, Sub};

/// Index into the section table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct SectionIndex(pub u32);

/// Index into a string table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct StringIndex(pub u32);

/// An index into a byte within an ELF file.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct ElfOffset(pub u64);

/// The address of a byte once the exe has been loaded into memory.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct VirtualAddr(pub u64);

/// A range of bytes that can be addressed using either offsets into an ELF file or
/// virtual addresses. Sections that aren't loaded have a zero virtual address.
#[derive(Copy, Clone, Debug)]
pub struct Bytes<A>
where
    A: Add<u64, Output = A> + Copy + Ord,
{
    pub start: A,
    pub size: u64,
}

impl Bytes<ElfOffset> {
    pub fn from_raw(start: u64, size: u64) -> Self {
        Bytes {
            start: ElfOffset(start),
            size,
        }
    }
}

impl Bytes<VirtualAddr> {
    pub fn from_raw(start: u64, size: u64) -> Self {
        Bytes {
            start: VirtualAddr(start),
            size,
        }
    }
}

impl<A: Add<u64, Output = A> + Copy + Ord> Bytes<A> {
    pub fn contains(&self, addr: A) -> bool {
        addr >= self.start && addr < self.end()
    }

    /// Saturates instead of wrapping for corrupted headers.
    pub fn end(&self) -> A {
        self.start + self.size
    }
}

impl Sub<ElfOffset> for ElfOffset {
    type Output = i64;

    fn sub(self, rhs: ElfOffset) -> Self::Output {
        (self.0 as i64) - (rhs.0 as i64)
    }
}

impl Add<u64> for VirtualAddr {
    type Output = VirtualAddr;

    fn add(self, rhs: u64) -> Self::Output {
        VirtualAddr(self.0.saturating_add(rhs))
    }
}

impl Add<u64> for ElfOffset {
    type Output = ElfOffset;

    fn add(self, rhs: u64) -> Self::Output {
        ElfOffset(self.0.saturating_add(rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges() {
        let bytes = Bytes::<ElfOffset>::from_raw(0x100, 0x10);
        assert!(bytes.contains(ElfOffset(0x100)));
        assert!(bytes.contains(ElfOffset(0x10f)));
        assert!(!bytes.contains(ElfOffset(0x110)));
        assert_eq!(bytes.end() - bytes.start, 0x10);

        let huge = Bytes::<VirtualAddr>::from_raw(u64::MAX - 1, 0x10);
        assert_eq!(huge.end(), VirtualAddr(u64::MAX));
    }
}
