//! Sector numbers (SECT) and their sentinel values.
//!
//! A sector number is an index into the file's sector array, with a
//! handful of reserved values at the high end used as markers rather than
//! real indices.

use core::fmt;

/// Maximum regular sector number; anything at or above this is a sentinel.
pub const MAXREGSECT: u32 = 0xFFFFFFFA;
/// Sector is itself a DIFAT page.
pub const DIFSECT: u32 = 0xFFFFFFFC;
/// Sector is itself a FAT page.
pub const FATSECT: u32 = 0xFFFFFFFD;
/// Terminates a chain.
pub const ENDOFCHAIN: u32 = 0xFFFFFFFE;
/// Unallocated sector, or (for directory child/sibling links) "absent".
pub const FREESECT: u32 = 0xFFFFFFFF;
/// Directory sentinel for an absent child/sibling link; same bit pattern as FREESECT.
pub const NOSTREAM: u32 = 0xFFFFFFFF;

/// A 32-bit sector index, or one of the sentinel values above.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Sect(pub u32);

impl Sect {
    pub const END_OF_CHAIN: Sect = Sect(ENDOFCHAIN);
    pub const FREE: Sect = Sect(FREESECT);
    pub const FAT: Sect = Sect(FATSECT);
    pub const DIF: Sect = Sect(DIFSECT);
    pub const NO_STREAM: Sect = Sect(NOSTREAM);

    pub fn is_end_of_chain(self) -> bool {
        self.0 == ENDOFCHAIN
    }

    pub fn is_free(self) -> bool {
        self.0 == FREESECT
    }

    pub fn is_fatsect(self) -> bool {
        self.0 == FATSECT
    }

    pub fn is_difsect(self) -> bool {
        self.0 == DIFSECT
    }

    pub fn is_no_stream(self) -> bool {
        self.0 == NOSTREAM
    }

    /// A regular sector number addressable in the sector array.
    pub fn is_regular(self) -> bool {
        self.0 <= MAXREGSECT
    }

    /// Byte offset of this sector in the mapped file (sector slot -1 is the header).
    pub fn byte_offset(self, sector_size: u32) -> u64 {
        (self.0 as u64 + 1) * sector_size as u64
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Sect {
    fn from(value: u32) -> Self {
        Sect(value)
    }
}

impl fmt::Debug for Sect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            FREESECT => f.write_str("FREESECT"),
            FATSECT => f.write_str("FATSECT"),
            DIFSECT => f.write_str("DIFSECT"),
            ENDOFCHAIN => f.write_str("ENDOFCHAIN"),
            v => write!(f, "Sect(0x{:08X})", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_roundtrip() {
        assert!(Sect::END_OF_CHAIN.is_end_of_chain());
        assert!(Sect::FREE.is_free());
        assert!(Sect::FAT.is_fatsect());
        assert!(Sect::DIF.is_difsect());
        assert!(Sect::NO_STREAM.is_no_stream());
        assert!(Sect(0).is_regular());
        assert!(!Sect(MAXREGSECT + 1).is_regular());
    }

    #[test]
    fn byte_offset_accounts_for_header_slot() {
        assert_eq!(Sect(0).byte_offset(512), 512);
        assert_eq!(Sect(1).byte_offset(512), 1024);
    }
}
