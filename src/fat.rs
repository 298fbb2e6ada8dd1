//! The main File Allocation Table: construction from the header's fixed
//! DIFAT array plus the DIFAT chain, and `next sector of chain` lookup.

use crate::error::{Error, Result};
use crate::header::Header;
use crate::mapping::Mapping;
use crate::sector::{self, Sect};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

/// The materialized FAT: every page concatenated into one flat entry array.
pub struct Fat {
    entries: Vec<u32>,
    /// FAT page sector numbers, in the order they contribute entries: the
    /// first `min(109, csect_fat)` from the header array, the rest from the
    /// DIFAT chain (FREESECT padding entries excluded).
    pages: Vec<Sect>,
    /// DIFAT sector numbers visited while locating the extra FAT pages.
    difat_sectors: Vec<Sect>,
    sector_size: u32,
}

impl Fat {
    pub fn build(mapping: &Mapping, header: &Header) -> Result<Fat> {
        let sector_size = header.sector_size();
        let entries_per_sector = (sector_size / 4) as usize;
        let num_start_sectors = header.csect_fat.min(109) as usize;

        let mut pages: Vec<Sect> = header.sect_fat[..num_start_sectors]
            .iter()
            .map(|&s| Sect(s))
            .collect();

        let mut difat_sectors = Vec::new();
        let mut difat_sect = Sect(header.sect_dif_start);

        for _ in 0..header.csect_dif {
            if difat_sect.is_end_of_chain() || difat_sect.is_free() {
                break;
            }
            difat_sectors.push(difat_sect);

            let bytes = mapping.sector_ptr(difat_sect).map_err(|_| {
                Error::Structure(format!(
                    "DIFAT sector {:?} is past the end of the file",
                    difat_sect
                ))
            })?;
            let mut cursor = Cursor::new(bytes);

            for _ in 0..entries_per_sector - 1 {
                let entry = cursor.read_u32::<LittleEndian>()?;
                if entry != sector::FREESECT {
                    pages.push(Sect(entry));
                }
            }
            difat_sect = Sect(cursor.read_u32::<LittleEndian>()?);
        }

        if difat_sectors.len() as u32 != header.csect_dif {
            return Err(Error::Structure(format!(
                "expected {} DIFAT sectors, found {}",
                header.csect_dif,
                difat_sectors.len()
            )));
        }
        if pages.len() as u32 != header.csect_fat {
            return Err(Error::Structure(format!(
                "expected {} FAT sectors, collected {}",
                header.csect_fat,
                pages.len()
            )));
        }

        let mut entries = Vec::with_capacity(pages.len() * entries_per_sector);
        for &page in &pages {
            let bytes = mapping.sector_ptr(page).map_err(|_| {
                Error::Structure(format!("FAT page sector {:?} is past the end of the file", page))
            })?;
            let mut cursor = Cursor::new(bytes);
            for _ in 0..entries_per_sector {
                entries.push(cursor.read_u32::<LittleEndian>()?);
            }
        }

        Ok(Fat {
            entries,
            pages,
            difat_sectors,
            sector_size,
        })
    }

    /// The entry at sector `s`: the next sector in the chain, or a sentinel.
    pub fn next(&self, s: Sect) -> Result<Sect> {
        let idx = s.as_usize();
        let raw = self.entries.get(idx).copied().ok_or_else(|| {
            Error::Format(format!("sector {:?} has no FAT entry (out of range)", s))
        })?;
        if raw > sector::MAXREGSECT
            && raw != sector::FATSECT
            && raw != sector::DIFSECT
            && raw != sector::ENDOFCHAIN
            && raw != sector::FREESECT
        {
            return Err(Error::Structure(format!(
                "sector {:?}: FAT entry 0x{:08X} is neither a valid sector nor a sentinel",
                s, raw
            )));
        }
        Ok(Sect(raw))
    }

    pub fn sector_size(&self) -> u32 {
        self.sector_size
    }

    pub fn header_pages(&self, num_start_sectors: usize) -> &[Sect] {
        &self.pages[..num_start_sectors.min(self.pages.len())]
    }

    pub fn extra_pages(&self, num_start_sectors: usize) -> &[Sect] {
        &self.pages[num_start_sectors.min(self.pages.len())..]
    }

    pub fn difat_sectors(&self) -> &[Sect] {
        &self.difat_sectors
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_minimal_container;

    #[test]
    fn single_fat_page_chain() {
        let (mapping, header) = build_minimal_container();
        let fat = Fat::build(&mapping, &header).unwrap();
        assert_eq!(fat.page_count(), 1);
        assert!(fat.difat_sectors().is_empty());
    }

    #[test]
    fn next_rejects_out_of_range_sector() {
        let (mapping, header) = build_minimal_container();
        let fat = Fat::build(&mapping, &header).unwrap();
        assert!(fat.next(Sect(10_000)).is_err());
    }
}
