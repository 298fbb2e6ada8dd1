//! The mini-FAT: a second allocation table, identical in shape to the main
//! FAT but indexing mini-sectors, stored as an ordinary stream in the main
//! FAT starting at `sectMiniFatStart`.

use crate::chain;
use crate::error::Result;
use crate::fat::Fat;
use crate::header::Header;
use crate::mapping::Mapping;
use crate::sector::Sect;

pub struct MiniFat {
    entries: Vec<u32>,
}

impl MiniFat {
    pub fn build(mapping: &Mapping, header: &Header, fat: &Fat) -> Result<MiniFat> {
        if header.csect_mini_fat == 0 {
            return Ok(MiniFat {
                entries: Vec::new(),
            });
        }

        let byte_len = header.csect_mini_fat as u64 * header.sector_size() as u64;
        let bytes = chain::read_chain_bytes(
            mapping,
            fat,
            Sect(header.sect_mini_fat_start),
            byte_len,
            fat.sector_size(),
        )?;

        let entries = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(MiniFat { entries })
    }

    pub fn next(&self, s: Sect) -> Result<Sect> {
        let idx = s.as_usize();
        let raw = self.entries.get(idx).copied().ok_or_else(|| {
            crate::error::Error::Format(format!(
                "mini-sector {:?} has no MiniFAT entry (out of range)",
                s
            ))
        })?;
        Ok(Sect(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_minimal_container;

    #[test]
    fn mini_fat_chains_the_two_mini_sectors_used_by_stream_a() {
        let (mapping, header) = build_minimal_container();
        let fat = Fat::build(&mapping, &header).unwrap();
        let mini_fat = MiniFat::build(&mapping, &header, &fat).unwrap();
        assert_eq!(mini_fat.next(Sect(0)).unwrap(), Sect(1));
        assert!(mini_fat.next(Sect(1)).unwrap().is_end_of_chain());
    }
}
