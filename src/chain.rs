//! Chain resolution: turning a starting sector plus a declared byte length
//! into the ordered sequence of sector bytes that make up a stream.
//!
//! Works uniformly over the main FAT (regular sectors, borrowed straight
//! from the mapping) and the MiniFAT (mini-sectors, borrowed from the
//! materialized mini-stream buffer) via the `SectorSource` trait.

use crate::error::{Error, Result};
use crate::fat::Fat;
use crate::mapping::Mapping;
use crate::minifat::MiniFat;
use crate::sector::Sect;

/// Something that can answer "what's after sector S" and "give me sector S's
/// bytes", abstracting over the main FAT/mapping pair and the MiniFAT/
/// mini-stream pair.
pub trait SectorSource {
    fn sector_size(&self) -> u32;
    fn next(&self, s: Sect) -> Result<Sect>;
    fn sector_bytes(&self, s: Sect) -> Result<&[u8]>;
}

pub struct FatSource<'a> {
    pub mapping: &'a Mapping,
    pub fat: &'a Fat,
}

impl<'a> SectorSource for FatSource<'a> {
    fn sector_size(&self) -> u32 {
        self.fat.sector_size()
    }

    fn next(&self, s: Sect) -> Result<Sect> {
        self.fat.next(s)
    }

    fn sector_bytes(&self, s: Sect) -> Result<&[u8]> {
        self.mapping.sector_ptr(s)
    }
}

pub struct MiniSource<'a> {
    pub mini_fat: &'a MiniFat,
    pub mini_stream: &'a [u8],
    pub mini_sector_size: u32,
}

impl<'a> SectorSource for MiniSource<'a> {
    fn sector_size(&self) -> u32 {
        self.mini_sector_size
    }

    fn next(&self, s: Sect) -> Result<Sect> {
        self.mini_fat.next(s)
    }

    fn sector_bytes(&self, s: Sect) -> Result<&[u8]> {
        let offset = s.as_usize() * self.mini_sector_size as usize;
        let end = offset + self.mini_sector_size as usize;
        self.mini_stream.get(offset..end).ok_or_else(|| {
            Error::Format(format!(
                "mini-sector {:?} is past the end of the mini-stream ({} bytes)",
                s,
                self.mini_stream.len()
            ))
        })
    }
}

/// A consumer of stream bytes, delivered strictly in chain order.
///
/// Mirrors the wire contract `write_sector(cookie, bytes, length,
/// sector_index, byte_offset)`: the caller supplies a capability instead of
/// an opaque cookie plus function pointer.
pub trait SectorSink {
    /// `bytes` may be shorter than a full sector on the final call, already
    /// truncated to the stream's declared size. Returning `Err` aborts the
    /// dump.
    fn on_sector(&mut self, bytes: &[u8], sector_index: u64, byte_offset: u64) -> Result<()>;
}

impl SectorSink for Vec<u8> {
    fn on_sector(&mut self, bytes: &[u8], _sector_index: u64, _byte_offset: u64) -> Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Delivers a stream's bytes to `sink` in chain order.
///
/// Stops once `size` bytes have been delivered, truncating the final
/// slice; a chain that terminates early is a structural error, and a chain
/// that doesn't terminate within `max_iterations` sectors is treated as a
/// cycle and refused rather than looped forever.
pub fn deliver_chain<S: SectorSource>(
    source: &S,
    start: Sect,
    size: u64,
    max_iterations: usize,
    sink: &mut impl SectorSink,
) -> Result<()> {
    if size == 0 {
        return Ok(());
    }

    let sector_size = source.sector_size() as u64;
    let mut sect = start;
    let mut delivered: u64 = 0;
    let mut sector_index: u64 = 0;
    let mut iterations = 0usize;

    while !sect.is_end_of_chain() {
        if iterations >= max_iterations {
            return Err(Error::Structure(format!(
                "chain starting at {:?} did not terminate within {} sectors (cycle?)",
                start, max_iterations
            )));
        }
        iterations += 1;

        if delivered >= size {
            return Err(Error::Structure(format!(
                "chain starting at {:?} delivered {} bytes already but has more sectors",
                start, delivered
            )));
        }

        let bytes = source.sector_bytes(sect)?;
        let remaining = size - delivered;
        let take = remaining.min(sector_size).min(bytes.len() as u64) as usize;
        let byte_offset = sector_index * sector_size;

        sink.on_sector(&bytes[..take], sector_index, byte_offset)?;

        delivered += take as u64;
        sector_index += 1;
        sect = source.next(sect)?;
    }

    if delivered != size {
        return Err(Error::Structure(format!(
            "chain starting at {:?} delivered {} bytes, expected {}",
            start, delivered, size
        )));
    }

    Ok(())
}

/// Convenience wrapper that materializes a main-FAT chain's bytes into an
/// owned `Vec`. `sector_size` is accepted (rather than derived solely from
/// `fat`) so callers reading header-adjacent streams can pass the header's
/// own notion of sector size explicitly.
pub fn read_chain_bytes(
    mapping: &Mapping,
    fat: &Fat,
    start: Sect,
    size: u64,
    sector_size: u32,
) -> Result<Vec<u8>> {
    let source = FatSource { mapping, fat };
    let max_iterations = max_iterations_for(mapping.len(), sector_size);
    let mut buf = Vec::with_capacity(size as usize);
    deliver_chain(&source, start, size, max_iterations, &mut buf)?;
    Ok(buf)
}

/// Upper bound on chain length used for cycle detection: a chain can never
/// legitimately be longer than the number of sectors in the file.
pub fn max_iterations_for(file_size: u64, sector_size: u32) -> usize {
    (file_size / sector_size as u64).max(1) as usize
}

/// Follows a chain to `ENDOFCHAIN` with no declared size limit, returning
/// the ordered sector numbers visited. Used for streams whose length isn't
/// known up front (the directory stream itself) and by the walker, which
/// needs the sector sequence independent of any byte payload.
pub fn resolve_chain<S: SectorSource>(
    source: &S,
    start: Sect,
    max_iterations: usize,
) -> Result<Vec<Sect>> {
    let mut sectors = Vec::new();
    let mut sect = start;
    let mut iterations = 0usize;

    while !sect.is_end_of_chain() {
        if iterations >= max_iterations {
            return Err(Error::Structure(format!(
                "chain starting at {:?} did not terminate within {} sectors (cycle?)",
                start, max_iterations
            )));
        }
        iterations += 1;
        sectors.push(sect);
        sect = source.next(sect)?;
    }

    Ok(sectors)
}

/// Materializes every sector of a chain with no declared size limit,
/// concatenating full sectors (no truncation). Used for the directory
/// stream on version-3 files, where `csectDir` is not meaningful.
pub fn read_unbounded_chain_bytes(
    mapping: &Mapping,
    fat: &Fat,
    start: Sect,
    sector_size: u32,
) -> Result<Vec<u8>> {
    let source = FatSource { mapping, fat };
    let max_iterations = max_iterations_for(mapping.len(), sector_size);
    let sectors = resolve_chain(&source, start, max_iterations)?;
    let mut buf = Vec::with_capacity(sectors.len() * sector_size as usize);
    for sect in sectors {
        buf.extend_from_slice(source.sector_bytes(sect)?);
    }
    Ok(buf)
}
