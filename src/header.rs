//! The 512-byte structured storage header at the start of the file.

use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

pub const SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
pub const BYTE_ORDER_MARK: u16 = 0xFFFE;
pub const HEADER_SIZE: usize = 512;
const DIFAT_LEN: usize = 109;

/// Parsed fields of the structured storage header.
///
/// Field names follow the on-disk layout rather than friendlier aliases,
/// matching the teacher crate's `Header` and the original C struct.
#[derive(Debug, Clone)]
pub struct Header {
    pub minor_version: u16,
    pub major_version: u16,
    pub sector_shift: u16,
    pub mini_sector_shift: u16,
    pub csect_dir: u32,
    pub csect_fat: u32,
    pub sect_dir_start: u32,
    pub transaction_signature_number: u32,
    pub mini_stream_cutoff: u32,
    pub sect_mini_fat_start: u32,
    pub csect_mini_fat: u32,
    pub sect_dif_start: u32,
    pub csect_dif: u32,
    pub sect_fat: [u32; DIFAT_LEN],
}

impl Header {
    /// Parses the header out of the first `HEADER_SIZE` bytes of the file.
    pub fn parse(bytes: &[u8]) -> Result<Header> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::Format(format!(
                "file is too small ({} bytes) to contain a header ({} bytes)",
                bytes.len(),
                HEADER_SIZE
            )));
        }

        let mut signature = [0u8; 8];
        signature.copy_from_slice(&bytes[0..8]);
        if signature != SIGNATURE {
            return Err(Error::Format("signature bytes not as expected".into()));
        }

        let mut cursor = Cursor::new(bytes);
        cursor.set_position(24); // signature (8) + clsid (16)

        let minor_version = cursor.read_u16::<LittleEndian>()?;
        let major_version = cursor.read_u16::<LittleEndian>()?;
        let byte_order = cursor.read_u16::<LittleEndian>()?;
        if byte_order != BYTE_ORDER_MARK {
            return Err(Error::Format(format!(
                "byte-order mark 0x{:04X} is not 0x{:04X}",
                byte_order, BYTE_ORDER_MARK
            )));
        }

        let sector_shift = cursor.read_u16::<LittleEndian>()?;
        let mini_sector_shift = cursor.read_u16::<LittleEndian>()?;
        cursor.set_position(cursor.position() + 6); // reserved

        let csect_dir = cursor.read_u32::<LittleEndian>()?;
        let csect_fat = cursor.read_u32::<LittleEndian>()?;
        let sect_dir_start = cursor.read_u32::<LittleEndian>()?;
        let transaction_signature_number = cursor.read_u32::<LittleEndian>()?;
        let mini_stream_cutoff = cursor.read_u32::<LittleEndian>()?;
        let sect_mini_fat_start = cursor.read_u32::<LittleEndian>()?;
        let csect_mini_fat = cursor.read_u32::<LittleEndian>()?;
        let sect_dif_start = cursor.read_u32::<LittleEndian>()?;
        let csect_dif = cursor.read_u32::<LittleEndian>()?;

        let mut sect_fat = [0u32; DIFAT_LEN];
        for slot in sect_fat.iter_mut() {
            *slot = cursor.read_u32::<LittleEndian>()?;
        }

        Ok(Header {
            minor_version,
            major_version,
            sector_shift,
            mini_sector_shift,
            csect_dir,
            csect_fat,
            sect_dir_start,
            transaction_signature_number,
            mini_stream_cutoff,
            sect_mini_fat_start,
            csect_mini_fat,
            sect_dif_start,
            csect_dif,
            sect_fat,
        })
    }

    pub fn sector_size(&self) -> u32 {
        1 << self.sector_shift
    }

    pub fn mini_sector_size(&self) -> u32 {
        1 << self.mini_sector_shift
    }

    /// Only meaningful when `sector_shift >= 12` (version 4 files); version 3
    /// files MUST report zero here.
    pub fn directory_sector_count(&self) -> Option<u32> {
        if self.sector_shift >= 12 {
            Some(self.csect_dir)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_header(sector_shift: u16) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_SIZE];
        buf[0..8].copy_from_slice(&SIGNATURE);
        buf[24..26].copy_from_slice(&0x003Eu16.to_le_bytes());
        buf[26..28].copy_from_slice(&0x0003u16.to_le_bytes());
        buf[28..30].copy_from_slice(&BYTE_ORDER_MARK.to_le_bytes());
        buf[30..32].copy_from_slice(&sector_shift.to_le_bytes());
        buf[32..34].copy_from_slice(&6u16.to_le_bytes());
        buf[44..48].copy_from_slice(&1u32.to_le_bytes()); // csect_fat
        buf[48..52].copy_from_slice(&1u32.to_le_bytes()); // sect_dir_start
        buf[56..60].copy_from_slice(&4096u32.to_le_bytes()); // mini_stream_cutoff
        buf[60..64].copy_from_slice(&ENDOFCHAIN_BYTES);
        buf[68..72].copy_from_slice(&crate::sector::ENDOFCHAIN.to_le_bytes()); // sect_dif_start
        buf
    }

    const ENDOFCHAIN_BYTES: [u8; 4] = crate::sector::ENDOFCHAIN.to_le_bytes();

    #[test]
    fn rejects_truncated_file() {
        let buf = vec![0u8; 10];
        assert!(Header::parse(&buf).is_err());
    }

    #[test]
    fn rejects_bad_signature() {
        let buf = vec![0u8; HEADER_SIZE];
        assert!(Header::parse(&buf).is_err());
    }

    #[test]
    fn parses_minimal_512_byte_header() {
        let buf = minimal_header(9);
        let header = Header::parse(&buf).unwrap();
        assert_eq!(header.sector_size(), 512);
        assert_eq!(header.mini_sector_size(), 64);
        assert_eq!(header.directory_sector_count(), None);
        assert_eq!(header.csect_fat, 1);
        assert_eq!(header.mini_stream_cutoff, 4096);
    }

    #[test]
    fn version4_reports_directory_sector_count() {
        let buf = minimal_header(12);
        let header = Header::parse(&buf).unwrap();
        assert_eq!(header.sector_size(), 4096);
        assert_eq!(header.directory_sector_count(), Some(0));
    }
}
