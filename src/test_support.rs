//! Synthetic CFBF containers used by unit and integration tests.
//!
//! No real `.doc`/`.hwp` fixture files are available in this workspace, so
//! tests build minimal valid containers byte-by-byte instead. Each builder
//! here is scenario-specific rather than routed through a generic
//! container-building API: the layouts are small and differ enough in shape
//! (DIFAT overflow, shared sectors, FAT cycles) that a one-size-fits-all
//! builder would be harder to read than the bytes themselves.

use crate::encoding::string_to_utf16le_bytes_with_nul;
use crate::header::{Header, HEADER_SIZE, SIGNATURE};
use crate::mapping::Mapping;
use crate::sector::ENDOFCHAIN;
use std::io::Write;

const SECTOR_SIZE: usize = 512;
const MINI_SECTOR_SIZE: usize = 64;

fn write_header_block(buf: &mut Vec<u8>, sect_dir_start: u32, csect_mini_fat: u32, sect_mini_fat_start: u32) {
    buf.extend_from_slice(&SIGNATURE);
    buf.extend_from_slice(&[0u8; 16]); // CLSID, unused
    buf.extend_from_slice(&0x003Eu16.to_le_bytes()); // minor_version
    buf.extend_from_slice(&0x0003u16.to_le_bytes()); // major_version
    buf.extend_from_slice(&0xFFFEu16.to_le_bytes()); // byte order mark
    buf.extend_from_slice(&9u16.to_le_bytes()); // sector_shift -> 512
    buf.extend_from_slice(&6u16.to_le_bytes()); // mini_sector_shift -> 64
    buf.extend_from_slice(&[0u8; 6]); // reserved
    buf.extend_from_slice(&0u32.to_le_bytes()); // csect_dir (unused, v3)
    buf.extend_from_slice(&1u32.to_le_bytes()); // csect_fat
    buf.extend_from_slice(&sect_dir_start.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // transaction signature
    buf.extend_from_slice(&4096u32.to_le_bytes()); // mini_stream_cutoff
    buf.extend_from_slice(&sect_mini_fat_start.to_le_bytes());
    buf.extend_from_slice(&csect_mini_fat.to_le_bytes());
    buf.extend_from_slice(&ENDOFCHAIN.to_le_bytes()); // sect_dif_start
    buf.extend_from_slice(&0u32.to_le_bytes()); // csect_dif

    // header DIFAT array: slot 0 points at the single FAT page, rest free.
    buf.extend_from_slice(&0u32.to_le_bytes());
    for _ in 1..109 {
        buf.extend_from_slice(&0xFFFFFFFFu32.to_le_bytes());
    }

    assert_eq!(buf.len(), HEADER_SIZE);
}

fn write_directory_entry(
    buf: &mut Vec<u8>,
    name: &str,
    object_type: u8,
    child_id: u32,
    start_sector: u32,
    stream_size: u64,
) {
    let start = buf.len();
    let name_utf16 = string_to_utf16le_bytes_with_nul(name);
    let mut name_field = vec![0u8; 64];
    name_field[..name_utf16.len().min(64)].copy_from_slice(&name_utf16[..name_utf16.len().min(64)]);
    buf.extend_from_slice(&name_field);
    buf.extend_from_slice(&((name_utf16.len()) as u16).to_le_bytes());
    buf.push(object_type);
    buf.push(1); // color flag, irrelevant to parsing
    buf.extend_from_slice(&0xFFFFFFFFu32.to_le_bytes()); // left sibling: none
    buf.extend_from_slice(&0xFFFFFFFFu32.to_le_bytes()); // right sibling: none
    buf.extend_from_slice(&child_id.to_le_bytes());
    buf.extend_from_slice(&[0u8; 16]); // CLSID
    buf.extend_from_slice(&0u32.to_le_bytes()); // state bits
    buf.extend_from_slice(&[0u8; 8]); // created
    buf.extend_from_slice(&[0u8; 8]); // modified
    buf.extend_from_slice(&start_sector.to_le_bytes());
    buf.extend_from_slice(&stream_size.to_le_bytes());
    assert_eq!(buf.len() - start, 128);
}

/// The "E1" scenario's raw bytes: a root storage whose mini-stream holds
/// one small stream `"A"` (100 bytes, two mini-sectors), plus a one-page
/// main FAT and a one-sector MiniFAT. Four regular sectors after the
/// header:
///
/// - sector 0: the main FAT page
/// - sector 1: the directory (Root Entry + stream "A")
/// - sector 2: the mini-stream's backing storage
/// - sector 3: the MiniFAT
pub fn minimal_container_bytes() -> Vec<u8> {
    let mut header_buf = Vec::with_capacity(HEADER_SIZE);
    write_header_block(&mut header_buf, 1, 1, 3);

    // Sector 0: main FAT page. Entry 0 = FATSECT (self), 1 = ENDOFCHAIN (dir),
    // 2 = ENDOFCHAIN (mini-stream), 3 = ENDOFCHAIN (MiniFAT), rest FREESECT.
    let mut fat_sector = vec![0xFFu8; SECTOR_SIZE];
    fat_sector[0..4].copy_from_slice(&0xFFFFFFFDu32.to_le_bytes()); // FATSECT
    fat_sector[4..8].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
    fat_sector[8..12].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
    fat_sector[12..16].copy_from_slice(&ENDOFCHAIN.to_le_bytes());

    // Sector 1: directory. Entry 0 = Root Entry, entry 1 = stream "A".
    let mut dir_sector = Vec::with_capacity(SECTOR_SIZE);
    write_directory_entry(&mut dir_sector, "Root Entry", 5, 1, 2, 128);
    write_directory_entry(&mut dir_sector, "A", 2, 0xFFFFFFFF, 0, 100);
    write_directory_entry(&mut dir_sector, "", 0, 0xFFFFFFFF, 0, 0);
    write_directory_entry(&mut dir_sector, "", 0, 0xFFFFFFFF, 0, 0);
    assert_eq!(dir_sector.len(), SECTOR_SIZE);

    // Sector 2: mini-stream storage, holding "A"'s 100 bytes across its two
    // 64-byte mini-sectors (128 bytes total, padded out to a full sector).
    let mut mini_stream_sector = vec![0u8; SECTOR_SIZE];
    let payload: Vec<u8> = (0u8..100).collect();
    mini_stream_sector[..100].copy_from_slice(&payload);

    // Sector 3: MiniFAT. entries[0] = 1 (chains to mini-sector 1),
    // entries[1] = ENDOFCHAIN, rest FREESECT.
    let mut mini_fat_sector = vec![0xFFu8; SECTOR_SIZE];
    mini_fat_sector[0..4].copy_from_slice(&1u32.to_le_bytes());
    mini_fat_sector[4..8].copy_from_slice(&ENDOFCHAIN.to_le_bytes());

    let mut file_bytes = Vec::with_capacity(HEADER_SIZE + SECTOR_SIZE * 4);
    file_bytes.extend_from_slice(&header_buf);
    file_bytes.extend_from_slice(&fat_sector);
    file_bytes.extend_from_slice(&dir_sector);
    file_bytes.extend_from_slice(&mini_stream_sector);
    file_bytes.extend_from_slice(&mini_fat_sector);

    let _ = MINI_SECTOR_SIZE;
    file_bytes
}

/// The same E1 scenario, already mapped: a temp file backs the mapping, but
/// (as with any POSIX `mmap`) the mapping stays valid after the temp file is
/// dropped and unlinked.
pub fn build_minimal_container() -> (Mapping, Header) {
    let bytes = minimal_container_bytes();
    let header = Header::parse(&bytes[..HEADER_SIZE]).expect("synthetic header must parse");

    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(&bytes).expect("write synthetic container");
    file.flush().expect("flush synthetic container");
    let mapping = Mapping::open(file.path(), header.sector_size()).expect("map synthetic container");

    (mapping, header)
}
