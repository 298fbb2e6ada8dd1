//! The cross-checking sector walker: marks every sector with what it's used
//! for and reports anomalies (double-marks, length mismatches, orphans,
//! count mismatches) rather than stopping at the first one.

use crate::chain::{self, FatSource, MiniSource};
use crate::directory::{Directory, ObjectType};
use crate::fat::Fat;
use crate::header::Header;
use crate::mapping::Mapping;
use crate::minifat::MiniFat;
use crate::sector::{Sect, FREESECT};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SectorKind {
    Data,
    FatSect,
    DifSect,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SectorOwner {
    /// The directory stream itself, walked as if it were a synthetic entry.
    Directory,
    /// The MiniFAT's own backing sectors, likewise synthetic: no directory
    /// entry names them, but they're an ordinary main-FAT stream.
    MiniFatTable,
    Entry(u32),
    FatTable,
    Difat,
}

#[derive(Debug, Clone, Copy)]
pub struct SectorUse {
    pub kind: SectorKind,
    pub owner: SectorOwner,
    pub index_in_stream: u64,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum AnomalyKind {
    DoubleMark,
    LengthMismatch,
    UnexpectedFatEntry,
    OrphanSector,
    CountMismatch,
}

#[derive(Debug, Clone)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub message: String,
}

/// The full sector-usage map plus whatever anomalies were found along the
/// way. The walk keeps going past local anomalies so it surfaces every
/// problem in one pass.
pub struct Report {
    pub usage: Vec<Option<SectorUse>>,
    pub anomalies: Vec<Anomaly>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }
}

fn ceil_div(a: u64, b: u64) -> u64 {
    (a + b - 1) / b
}

struct Usage {
    slots: Vec<Option<SectorUse>>,
    anomalies: Vec<Anomaly>,
}

impl Usage {
    fn mark(&mut self, sect: Sect, kind: SectorKind, owner: SectorOwner, index_in_stream: u64) {
        let idx = sect.as_usize();
        match self.slots.get_mut(idx) {
            None => self.anomalies.push(Anomaly {
                kind: AnomalyKind::OrphanSector,
                message: format!("sector {:?} is past the end of the sector-usage map", sect),
            }),
            Some(slot @ None) => {
                *slot = Some(SectorUse {
                    kind,
                    owner,
                    index_in_stream,
                });
            }
            Some(Some(existing)) => {
                self.anomalies.push(Anomaly {
                    kind: AnomalyKind::DoubleMark,
                    message: format!(
                        "sector {:?} already marked as {:?} owned by {:?}, now claimed again by {:?}",
                        sect, existing.kind, existing.owner, owner
                    ),
                });
            }
        }
    }
}

/// Runs the full walk described in the design: directory chain, every
/// storage/stream/root entry's own chain, the header's FAT page list, and
/// the DIFAT chain; then reports any sector left unaccounted for.
pub fn walk(
    mapping: &Mapping,
    header: &Header,
    fat: &Fat,
    mini_fat: &MiniFat,
    mini_stream: &[u8],
    directory: &Directory,
) -> Result<Report> {
    let sector_size = fat.sector_size();
    let num_sectors = ((mapping.len().saturating_sub(sector_size as u64)) / sector_size as u64) as usize;
    let mut usage = Usage {
        slots: vec![None; num_sectors],
        anomalies: Vec::new(),
    };

    let main_source = FatSource { mapping, fat };
    let max_iterations = chain::max_iterations_for(mapping.len(), sector_size);

    // (1) the directory chain itself, as a synthetic entry.
    let dir_sectors = chain::resolve_chain(&main_source, Sect(header.sect_dir_start), max_iterations)?;
    for (i, &s) in dir_sectors.iter().enumerate() {
        usage.mark(s, SectorKind::Data, SectorOwner::Directory, i as u64);
    }

    // (1b) the mini-stream itself: the root entry's own stream, always read
    // through the main FAT regardless of size. No directory-entry walk
    // below covers this (root has no stream of its own *to walk as an
    // entry*, per the design note), so without this step every file that
    // uses the mini-stream would report its sectors as orphaned.
    let root = directory.root();
    if root.stream_size > 0 {
        let root_sectors = chain::resolve_chain(&main_source, root.start_sector, max_iterations)?;
        let expected = ceil_div(root.stream_size, sector_size as u64);
        if root_sectors.len() as u64 != expected {
            usage.anomalies.push(Anomaly {
                kind: AnomalyKind::LengthMismatch,
                message: format!(
                    "root entry mini-stream: chain has {} sectors, expected {}",
                    root_sectors.len(),
                    expected
                ),
            });
        }
        for (i, &s) in root_sectors.iter().enumerate() {
            usage.mark(s, SectorKind::Data, SectorOwner::Entry(root.id), i as u64);
        }
    }

    // (1c) the MiniFAT's own backing sectors: likewise an ordinary main-FAT
    // stream with no directory entry of its own.
    if header.csect_mini_fat > 0 {
        let mini_fat_sectors =
            chain::resolve_chain(&main_source, Sect(header.sect_mini_fat_start), max_iterations)?;
        if mini_fat_sectors.len() as u64 != header.csect_mini_fat as u64 {
            usage.anomalies.push(Anomaly {
                kind: AnomalyKind::CountMismatch,
                message: format!(
                    "MiniFAT chain has {} sectors, expected csectMiniFat={}",
                    mini_fat_sectors.len(),
                    header.csect_mini_fat
                ),
            });
        }
        for (i, &s) in mini_fat_sectors.iter().enumerate() {
            usage.mark(s, SectorKind::Data, SectorOwner::MiniFatTable, i as u64);
        }
    }

    // (2) every storage/stream entry's own chain (root's was handled above).
    for entry in directory.entries() {
        match entry.object_type() {
            Some(ObjectType::Storage) | Some(ObjectType::Root) => continue,
            Some(ObjectType::Stream) => {
                if entry.stream_size == 0 {
                    continue;
                }
                if entry.stored_in_mini(header.mini_stream_cutoff as u64) {
                    let mini_source = MiniSource {
                        mini_fat,
                        mini_stream,
                        mini_sector_size: header.mini_sector_size(),
                    };
                    let max_iter_mini =
                        chain::max_iterations_for(mini_stream.len() as u64, header.mini_sector_size());
                    let sectors = chain::resolve_chain(&mini_source, entry.start_sector, max_iter_mini)?;
                    let expected = ceil_div(entry.stream_size, header.mini_sector_size() as u64);
                    if sectors.len() as u64 != expected {
                        usage.anomalies.push(Anomaly {
                            kind: AnomalyKind::LengthMismatch,
                            message: format!(
                                "entry {} ({}): mini-chain has {} sectors, expected {}",
                                entry.id,
                                entry.name,
                                sectors.len(),
                                expected
                            ),
                        });
                    }
                    // Mini-sectors share a main sector (the mini-stream), so
                    // they are not marked in the main usage map.
                } else {
                    let sectors = chain::resolve_chain(&main_source, entry.start_sector, max_iterations)?;
                    let expected = ceil_div(entry.stream_size, sector_size as u64);
                    if sectors.len() as u64 != expected {
                        usage.anomalies.push(Anomaly {
                            kind: AnomalyKind::LengthMismatch,
                            message: format!(
                                "entry {} ({}): chain has {} sectors, expected {}",
                                entry.id,
                                entry.name,
                                sectors.len(),
                                expected
                            ),
                        });
                    }
                    for (i, &s) in sectors.iter().enumerate() {
                        usage.mark(s, SectorKind::Data, SectorOwner::Entry(entry.id), i as u64);
                    }
                }
            }
            None => continue,
        }
    }

    // (3) the 109 header-listed FAT page sectors, cross-checked against the
    // FAT's own "this sector is a FAT page" sentinel.
    for &raw in header.sect_fat.iter() {
        if raw == FREESECT {
            continue;
        }
        let s = Sect(raw);
        match fat.next(s) {
            Ok(next) if next.is_fatsect() => {}
            Ok(next) => usage.anomalies.push(Anomaly {
                kind: AnomalyKind::UnexpectedFatEntry,
                message: format!(
                    "header FAT page {:?}: fat_next is {:?}, expected FATSECT",
                    s, next
                ),
            }),
            Err(e) => usage.anomalies.push(Anomaly {
                kind: AnomalyKind::UnexpectedFatEntry,
                message: format!("header FAT page {:?}: {}", s, e),
            }),
        }
        usage.mark(s, SectorKind::FatSect, SectorOwner::FatTable, 0);
    }

    // (4) the DIFAT chain and the extra FAT pages it lists.
    for (i, &s) in fat.difat_sectors().iter().enumerate() {
        usage.mark(s, SectorKind::DifSect, SectorOwner::Difat, i as u64);
    }
    let num_start_sectors = header.csect_fat.min(109) as usize;
    for &s in fat.extra_pages(num_start_sectors) {
        usage.mark(s, SectorKind::FatSect, SectorOwner::FatTable, 0);
    }

    // Final reconciliation: every sector not marked must be FREESECT in the FAT.
    for idx in 0..num_sectors {
        if usage.slots[idx].is_some() {
            continue;
        }
        match fat.next(Sect(idx as u32)) {
            Ok(next) if next.is_free() => {}
            Ok(next) => usage.anomalies.push(Anomaly {
                kind: AnomalyKind::OrphanSector,
                message: format!("sector {} is unmarked but its FAT entry is {:?}", idx, next),
            }),
            Err(_) => usage.anomalies.push(Anomaly {
                kind: AnomalyKind::OrphanSector,
                message: format!("sector {} is unmarked and has no FAT entry", idx),
            }),
        }
    }

    Ok(Report {
        usage: usage.slots,
        anomalies: usage.anomalies,
    })
}
