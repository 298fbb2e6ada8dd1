//! The top-level parser value: owns the mapping, FAT, MiniFAT, materialized
//! mini-stream, and directory for the lifetime of an open container.

use crate::chain::{self, SectorSink};
use crate::directory::{DirEntry, DirVisitor, Directory, WalkOutcome};
use crate::error::Result;
use crate::fat::Fat;
use crate::header::{Header, HEADER_SIZE};
use crate::mapping::Mapping;
use crate::minifat::MiniFat;
use crate::stream;
use crate::walker::{self, Report};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// An open CFBF container. Everything it owns — the mapping, the FAT and
/// MiniFAT page tables, the materialized mini-stream, and the directory —
/// is read-only for its whole lifetime and released together when it's
/// dropped.
pub struct Cfbf {
    mapping: Mapping,
    header: Header,
    fat: Fat,
    mini_fat: MiniFat,
    mini_stream: Vec<u8>,
    directory: Directory,
}

impl Cfbf {
    pub fn open(path: impl AsRef<Path>) -> Result<Cfbf> {
        let path = path.as_ref();

        // The header occupies a fixed 512 bytes regardless of the sector
        // size it declares, so it's read directly before the mapping (which
        // needs to know the sector size) can be established.
        let mut raw_header = vec![0u8; HEADER_SIZE];
        File::open(path)?.read_exact(&mut raw_header)?;
        let header = Header::parse(&raw_header)?;

        let mapping = Mapping::open(path, header.sector_size())?;
        let fat = Fat::build(&mapping, &header)?;
        let directory = Directory::build(&mapping, &header, &fat)?;

        let root = directory.root();
        let mini_stream = if root.stream_size > 0 {
            chain::read_chain_bytes(
                &mapping,
                &fat,
                root.start_sector,
                root.stream_size,
                fat.sector_size(),
            )?
        } else {
            Vec::new()
        };
        let mini_fat = MiniFat::build(&mapping, &header, &fat)?;

        log::debug!(
            "opened {}: sector_size={}, {} directory entries, mini-stream {} bytes",
            path.display(),
            header.sector_size(),
            directory.len(),
            mini_stream.len()
        );

        Ok(Cfbf {
            mapping,
            header,
            fat,
            mini_fat,
            mini_stream,
            directory,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn entry(&self, id: u32) -> Option<&DirEntry> {
        self.directory.get(id)
    }

    pub fn find_path(&self, path: &str) -> Result<u32> {
        self.directory.find_path(path)
    }

    pub fn walk_tree(&self, visitor: &mut impl DirVisitor) -> Result<WalkOutcome> {
        self.directory.walk(visitor)
    }

    pub fn dump(&self, entry: &DirEntry, sink: &mut impl SectorSink) -> Result<()> {
        stream::dump(
            &self.mapping,
            &self.header,
            &self.fat,
            &self.mini_fat,
            &self.mini_stream,
            entry,
            sink,
        )
    }

    pub fn run_walker(&self) -> Result<Report> {
        walker::walk(
            &self.mapping,
            &self.header,
            &self.fat,
            &self.mini_fat,
            &self.mini_stream,
            &self.directory,
        )
    }
}
