//! Streaming a directory entry's bytes out through a caller-supplied sink,
//! auto-selecting the main FAT or the MiniFAT by size threshold.

use crate::chain::{self, FatSource, MiniSource, SectorSink};
use crate::directory::{DirEntry, ObjectType};
use crate::error::{Error, Result};
use crate::fat::Fat;
use crate::header::Header;
use crate::mapping::Mapping;
use crate::minifat::MiniFat;

/// Feeds `entry`'s bytes to `sink` in chain order. Rejects the root storage
/// and anything that isn't a stream; picks FAT or MiniFAT per
/// `stored_in_mini`.
pub fn dump(
    mapping: &Mapping,
    header: &Header,
    fat: &Fat,
    mini_fat: &MiniFat,
    mini_stream: &[u8],
    entry: &DirEntry,
    sink: &mut impl SectorSink,
) -> Result<()> {
    match entry.object_type() {
        Some(ObjectType::Root) => {
            return Err(Error::Misuse("cannot dump the root storage".into()));
        }
        Some(ObjectType::Stream) => {}
        _ => {
            return Err(Error::Misuse(format!(
                "entry {} ({}) is not a stream",
                entry.id, entry.name
            )));
        }
    }

    if entry.stream_size == 0 {
        return Ok(());
    }

    if entry.stored_in_mini(header.mini_stream_cutoff as u64) {
        let source = MiniSource {
            mini_fat,
            mini_stream,
            mini_sector_size: header.mini_sector_size(),
        };
        let max_iterations =
            chain::max_iterations_for(mini_stream.len() as u64, header.mini_sector_size());
        chain::deliver_chain(&source, entry.start_sector, entry.stream_size, max_iterations, sink)
    } else {
        let source = FatSource { mapping, fat };
        let max_iterations = chain::max_iterations_for(mapping.len(), fat.sector_size());
        chain::deliver_chain(&source, entry.start_sector, entry.stream_size, max_iterations, sink)
    }
}
