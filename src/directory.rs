//! Directory entries, the child/sibling tree they form, and UTF-16 path
//! resolution over that tree.

use crate::chain;
use crate::encoding;
use crate::error::{Error, Result};
use crate::fat::Fat;
use crate::header::Header;
use crate::mapping::Mapping;
use crate::sector::{Sect, NOSTREAM};
use byteorder::{LittleEndian, ReadBytesExt};
use chrono::{Duration, NaiveDateTime};
use std::convert::TryFrom;
use std::io::{Cursor, Read};

pub const ENTRY_SIZE: usize = 128;
const NAME_FIELD_LEN: usize = 64;
/// Seconds between the Windows FILETIME epoch (1601-01-01) and the Unix epoch.
const FILETIME_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ObjectType {
    Storage = 1,
    Stream = 2,
    Root = 5,
}

impl TryFrom<u8> for ObjectType {
    type Error = ();

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(ObjectType::Storage),
            2 => Ok(ObjectType::Stream),
            5 => Ok(ObjectType::Root),
            _ => Err(()),
        }
    }
}

/// One 128-byte directory entry, fully parsed (the mapping is not retained
/// past `Directory::build`, so there's nothing to borrow from).
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub id: u32,
    pub name: String,
    pub name_units: Vec<u16>,
    pub name_length_bytes: u16,
    pub raw_object_type: u8,
    pub left_sibling: Sect,
    pub right_sibling: Sect,
    pub child: Sect,
    pub clsid: [u8; 16],
    pub state_bits: u32,
    pub created: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
    pub start_sector: Sect,
    pub stream_size: u64,
}

impl DirEntry {
    pub fn object_type(&self) -> Option<ObjectType> {
        ObjectType::try_from(self.raw_object_type).ok()
    }

    pub fn is_unused(&self) -> bool {
        self.raw_object_type == 0
    }

    /// `stored_in_mini(entry)` per the spec: a stream, non-empty, and below
    /// the mini-stream cutoff.
    pub fn stored_in_mini(&self, mini_stream_cutoff: u64) -> bool {
        self.object_type() == Some(ObjectType::Stream)
            && self.stream_size > 0
            && self.stream_size < mini_stream_cutoff
    }

    fn matches_component(&self, units: &[u16]) -> bool {
        self.name_units.len() == units.len() && self.name_units == units
    }
}

fn filetime_to_datetime(nanos_since_filetime_epoch: u64) -> Option<NaiveDateTime> {
    if nanos_since_filetime_epoch == 0 {
        return None;
    }
    let secs = (nanos_since_filetime_epoch / 1_000_000_000) as i64;
    let nanos = (nanos_since_filetime_epoch % 1_000_000_000) as u32;
    let unix = NaiveDateTime::from_timestamp_opt(secs, nanos)?;
    Some(unix - Duration::seconds(FILETIME_EPOCH_OFFSET_SECS))
}

fn parse_entry(id: u32, bytes: &[u8]) -> Result<DirEntry> {
    if bytes.len() != ENTRY_SIZE {
        return Err(Error::Format(format!(
            "directory entry {} is {} bytes, expected {}",
            id,
            bytes.len(),
            ENTRY_SIZE
        )));
    }

    let mut cursor = Cursor::new(bytes);
    let mut name_field = [0u8; NAME_FIELD_LEN];
    name_field.copy_from_slice(&bytes[0..NAME_FIELD_LEN]);
    cursor.set_position(NAME_FIELD_LEN as u64);

    let name_length_bytes = cursor.read_u16::<LittleEndian>()?;
    let raw_object_type = cursor.read_u8()?;
    let _color_flag = cursor.read_u8()?;
    let left_sibling = Sect(cursor.read_u32::<LittleEndian>()?);
    let right_sibling = Sect(cursor.read_u32::<LittleEndian>()?);
    let child = Sect(cursor.read_u32::<LittleEndian>()?);

    let mut clsid = [0u8; 16];
    cursor.read_exact(&mut clsid)?;
    let state_bits = cursor.read_u32::<LittleEndian>()?;
    let created_raw = cursor.read_u64::<LittleEndian>()?;
    let modified_raw = cursor.read_u64::<LittleEndian>()?;
    let start_sector = Sect(cursor.read_u32::<LittleEndian>()?);
    let stream_size = cursor.read_u64::<LittleEndian>()?;

    // name_length_bytes includes the trailing NUL code unit; 0 for unused slots.
    let name_unit_count = (name_length_bytes as usize / 2).saturating_sub(1);
    let name_unit_count = name_unit_count.min(NAME_FIELD_LEN / 2);
    let name_units: Vec<u16> = name_field[..name_unit_count * 2]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let name = encoding::utf16le_units_to_string(&name_units);

    Ok(DirEntry {
        id,
        name,
        name_units,
        name_length_bytes,
        raw_object_type,
        left_sibling,
        right_sibling,
        child,
        clsid,
        state_bits,
        created: filetime_to_datetime(created_raw),
        modified: filetime_to_datetime(modified_raw),
        start_sector,
        stream_size,
    })
}

/// Result of a directory walk: whether it ran to completion or a visitor
/// short-circuited it, and with what verdict.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum WalkOutcome {
    Completed,
    StoppedOk,
    StoppedFail,
}

/// What a `DirVisitor` tells the walk to do next.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Step {
    Continue,
    StopOk,
    StopFail,
}

/// A capability the caller supplies to `Directory::walk`, replacing the
/// cookie-plus-function-pointer callback of the original design.
pub trait DirVisitor {
    fn visit(&mut self, entry: &DirEntry, parent: Option<u32>, depth: u32) -> Result<Step>;
}

/// The parsed directory entry array plus tree-walking and path resolution.
pub struct Directory {
    entries: Vec<DirEntry>,
}

impl Directory {
    pub fn build(mapping: &Mapping, header: &Header, fat: &Fat) -> Result<Directory> {
        let bytes = chain::read_unbounded_chain_bytes(
            mapping,
            fat,
            Sect(header.sect_dir_start),
            fat.sector_size(),
        )?;

        if bytes.is_empty() || bytes.len() % ENTRY_SIZE != 0 {
            return Err(Error::Structure(format!(
                "directory stream is {} bytes, not a positive multiple of {}",
                bytes.len(),
                ENTRY_SIZE
            )));
        }

        let entries = bytes
            .chunks_exact(ENTRY_SIZE)
            .enumerate()
            .map(|(i, chunk)| parse_entry(i as u32, chunk))
            .collect::<Result<Vec<_>>>()?;

        if entries[0].object_type() != Some(ObjectType::Root) {
            return Err(Error::Structure(
                "directory entry 0 is not the root storage".into(),
            ));
        }

        Ok(Directory { entries })
    }

    pub fn root(&self) -> &DirEntry {
        &self.entries[0]
    }

    pub fn get(&self, id: u32) -> Option<&DirEntry> {
        if id == NOSTREAM {
            None
        } else {
            self.entries.get(id as usize)
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    /// Walks the tree depth-first starting at entry 0, using an explicit
    /// work stack rather than system-stack recursion (pathological files
    /// can nest as deep as the entry count).
    pub fn walk(&self, visitor: &mut impl DirVisitor) -> Result<WalkOutcome> {
        // (id, depth, parent); pushed right-then-left-then-child so popping
        // yields child, then left sibling, then right sibling, matching the
        // recursive reference order.
        let mut stack: Vec<(u32, u32, Option<u32>)> = vec![(0, 0, None)];

        while let Some((id, depth, parent)) = stack.pop() {
            if id == NOSTREAM {
                continue;
            }
            let entry = match self.entries.get(id as usize) {
                Some(e) => e,
                None => {
                    log::warn!("directory link to entry {} is out of range, skipping", id);
                    continue;
                }
            };

            match entry.object_type() {
                None if entry.is_unused() => {
                    log::warn!("directory entry {} is unused but was reached via a link", id);
                    continue;
                }
                None => {
                    log::warn!(
                        "directory entry {} has an invalid object type (0x{:02X}), skipping",
                        id,
                        entry.raw_object_type
                    );
                    continue;
                }
                Some(_) => {}
            }

            match visitor.visit(entry, parent, depth)? {
                Step::StopOk => return Ok(WalkOutcome::StoppedOk),
                Step::StopFail => return Ok(WalkOutcome::StoppedFail),
                Step::Continue => {
                    if entry.right_sibling.0 != NOSTREAM {
                        stack.push((entry.right_sibling.0, depth, parent));
                    }
                    if entry.left_sibling.0 != NOSTREAM {
                        stack.push((entry.left_sibling.0, depth, parent));
                    }
                    if entry.child.0 != NOSTREAM {
                        stack.push((entry.child.0, depth + 1, Some(id)));
                    }
                }
            }
        }

        Ok(WalkOutcome::Completed)
    }

    /// Resolves a UTF-8, slash-delimited path to a directory entry id.
    ///
    /// Per-component name comparison matches only on equal UTF-16 code-unit
    /// length plus bytewise equality; on mismatch the search tries the left
    /// sibling subtree, then the right, tolerating arbitrarily unbalanced
    /// trees rather than assuming BST ordering.
    pub fn find_path(&self, path: &str) -> Result<u32> {
        let stripped = path.trim_start_matches('/');
        if stripped.is_empty() {
            return Err(Error::NotFound(path.to_string()));
        }
        let components: Vec<Vec<u16>> = stripped
            .split('/')
            .map(encoding::string_to_utf16le_units)
            .collect();

        // (id, component index to match against); explicit stack in place
        // of the recursive "compare, else search left then right" algorithm.
        let mut stack: Vec<(u32, usize)> = vec![(0, 0)];

        while let Some((id, comp_idx)) = stack.pop() {
            if id == NOSTREAM {
                continue;
            }
            let entry = match self.entries.get(id as usize) {
                Some(e) => e,
                None => continue,
            };

            match entry.object_type() {
                None if entry.is_unused() => continue,
                None => {
                    log::warn!(
                        "directory entry {} has an invalid object type (0x{:02X}), skipping",
                        id,
                        entry.raw_object_type
                    );
                    continue;
                }
                Some(_) => {}
            }

            if entry.matches_component(&components[comp_idx]) {
                if comp_idx + 1 == components.len() {
                    return Ok(id);
                }
                if entry.child.0 != NOSTREAM {
                    stack.push((entry.child.0, comp_idx + 1));
                }
            } else {
                if entry.right_sibling.0 != NOSTREAM {
                    stack.push((entry.right_sibling.0, comp_idx));
                }
                if entry.left_sibling.0 != NOSTREAM {
                    stack.push((entry.left_sibling.0, comp_idx));
                }
            }
        }

        Err(Error::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_minimal_container;

    struct CollectNames(Vec<String>);
    impl DirVisitor for CollectNames {
        fn visit(&mut self, entry: &DirEntry, _parent: Option<u32>, _depth: u32) -> Result<Step> {
            self.0.push(entry.name.clone());
            Ok(Step::Continue)
        }
    }

    #[test]
    fn parses_root_and_one_stream() {
        let (mapping, header) = build_minimal_container();
        let fat = Fat::build(&mapping, &header).unwrap();
        let dir = Directory::build(&mapping, &header, &fat).unwrap();
        assert_eq!(dir.root().name, "Root Entry");
        assert_eq!(dir.root().object_type(), Some(ObjectType::Root));
        let stream_a = dir.get(1).unwrap();
        assert_eq!(stream_a.name, "A");
        assert!(stream_a.stored_in_mini(4096));
    }

    #[test]
    fn walk_visits_root_then_stream() {
        let (mapping, header) = build_minimal_container();
        let fat = Fat::build(&mapping, &header).unwrap();
        let dir = Directory::build(&mapping, &header, &fat).unwrap();
        let mut visitor = CollectNames(Vec::new());
        let outcome = dir.walk(&mut visitor).unwrap();
        assert_eq!(outcome, WalkOutcome::Completed);
        assert_eq!(visitor.0, vec!["Root Entry", "A"]);
    }

    #[test]
    fn find_path_resolves_and_rejects_missing() {
        let (mapping, header) = build_minimal_container();
        let fat = Fat::build(&mapping, &header).unwrap();
        let dir = Directory::build(&mapping, &header, &fat).unwrap();
        let id = dir.find_path("Root Entry/A").unwrap();
        assert_eq!(dir.get(id).unwrap().name, "A");
        assert!(dir.find_path("Root Entry/Missing").is_err());
    }
}
