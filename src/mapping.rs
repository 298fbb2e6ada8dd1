//! Read-only memory mapping of the container file.

use crate::error::{Error, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// A read-only view of the whole container file.
///
/// Sector `S` begins at byte offset `(S + 1) * sector_size` — the header
/// occupies sector slot -1.
pub struct Mapping {
    mmap: Mmap,
    sector_size: u32,
}

impl Mapping {
    pub fn open(path: impl AsRef<Path>, sector_size: u32) -> Result<Mapping> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let metadata = file.metadata()?;
        if (metadata.len() as usize) < crate::header::HEADER_SIZE {
            return Err(Error::Format(format!(
                "{} is too small ({} bytes) to contain a header",
                path.display(),
                metadata.len()
            )));
        }

        // SAFETY: the file is opened read-only for the lifetime of the
        // mapping and the caller does not mutate it concurrently; this
        // mirrors the original C implementation's `mmap(..., PROT_READ,
        // MAP_SHARED, ...)`.
        let mmap = unsafe { Mmap::map(&file)? };

        Ok(Mapping { mmap, sector_size })
    }

    pub fn len(&self) -> u64 {
        self.mmap.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    pub fn header_bytes(&self) -> &[u8] {
        &self.mmap[..crate::header::HEADER_SIZE.min(self.mmap.len())]
    }

    /// Returns the bytes of sector `sect`, or an error if they would extend
    /// past the end of the mapped file.
    pub fn sector_ptr(&self, sect: crate::sector::Sect) -> Result<&[u8]> {
        let offset = sect.byte_offset(self.sector_size);
        let end = offset
            .checked_add(self.sector_size as u64)
            .ok_or_else(|| Error::Format(format!("sector {:?} overflows file offset", sect)))?;
        if end > self.mmap.len() as u64 {
            return Err(Error::Format(format!(
                "sector {:?} is past the end of the file (file size {}, sector size {})",
                sect,
                self.mmap.len(),
                self.sector_size
            )));
        }
        Ok(&self.mmap[offset as usize..end as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn rejects_truncated_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 10]).unwrap();
        let err = Mapping::open(file.path(), 512).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn sector_ptr_bounds_check() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 512 * 3]).unwrap();
        let mapping = Mapping::open(file.path(), 512).unwrap();
        assert!(mapping.sector_ptr(crate::sector::Sect(0)).is_ok());
        assert!(mapping.sector_ptr(crate::sector::Sect(10)).is_err());
    }
}
