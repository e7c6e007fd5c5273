//! Geometry inspection and FAT8 variant dispatch.
//!
//! The known-format table is a closed sum type plus an ordered list of
//! fingerprint predicates: one hand-written layout per machine family, picked
//! by the first matching predicate rather than an open class hierarchy.

use crate::container::{sector_size_for_code, DiskImage, SectorAddr};
use crate::error::VariantError;

/// Which machine family produced a disk, which in turn selects a character
/// set ([`crate::charset::Charset`]) and an obfuscation scheme
/// ([`crate::obfuscate`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineFamily {
    Pc8001,
    Pc8801,
    Pc9801,
    Pasopia,
    Pc6001,
}

impl MachineFamily {
    pub fn charset(self) -> crate::charset::Charset {
        match self {
            MachineFamily::Pc6001 => crate::charset::Charset::Pc6001,
            _ => crate::charset::Charset::Pc88,
        }
    }
}

/// Geometry facts collected from a [`DiskImage`] before a variant has been
/// chosen: number of distinct tracks/sides seen, the sector size and count
/// of track 0 side 0, and the first 16 bytes of its first sector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageGeometry {
    pub tracks_seen: usize,
    pub sides_seen: usize,
    pub sector_size: usize,
    pub sector_count_track0_side0: usize,
    pub first_sector_prefix: [u8; 16],
}

impl ImageGeometry {
    pub fn collect(image: &DiskImage<'_>) -> Option<Self> {
        let mut cylinders = std::collections::HashSet::new();
        let mut heads = std::collections::HashSet::new();
        let mut track0_side0_count = 0usize;

        for (addr, _) in image.sectors() {
            cylinders.insert(addr.cylinder);
            heads.insert(addr.head);
            if addr.cylinder == 0 && addr.head == 0 {
                track0_side0_count += 1;
            }
        }

        let first = image.sector(SectorAddr { cylinder: 0, head: 0, sector_id: 1 })?;
        let sector_size = sector_size_for_code(first.header.size_code);

        let mut prefix = [0u8; 16];
        let n = first.data.len().min(16);
        prefix[..n].copy_from_slice(&first.data[..n]);

        Some(Self {
            tracks_seen: cylinders.len(),
            sides_seen: heads.len().max(1),
            sector_size,
            sector_count_track0_side0: track0_side0_count,
            first_sector_prefix: prefix,
        })
    }
}

/// Where the system track's boot sector, directory, and three FAT copies
/// live, plus the geometry needed to map a cluster number to sectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fat8Variant {
    pub name: &'static str,
    pub family: MachineFamily,
    pub total_tracks: u8,
    pub sides: u8,
    pub sectors_per_track: u8,
    pub sector_size: usize,
    pub sectors_per_cluster: u8,
    pub system_cylinder: u8,
    pub system_head: u8,
    pub boot_sector: u8,
    pub directory_sectors: &'static [u8],
    pub fat_copies: [&'static [u8]; 3],
}

impl Fat8Variant {
    /// Maps a cluster number to the sectors it occupies, using the base-2
    /// convention: cluster numbers start at 2, and each cluster spans
    /// `sectors_per_cluster` consecutive sector IDs in the data area, which
    /// begins on the track immediately following the system track (the
    /// system track itself holds the boot sector, directory, and three FAT
    /// copies, so data clusters must never land on it). Tracks are numbered
    /// linearly (cylinder * sides + head) so the data area advances across
    /// heads first, then cylinders, once a track's sectors are exhausted.
    pub fn cluster_sectors(&self, cluster: u8) -> Vec<SectorAddr> {
        let base = (cluster.saturating_sub(2)) as u32 * self.sectors_per_cluster as u32;
        let sides = self.sides.max(1) as u32;
        let system_track = self.system_cylinder as u32 * sides + self.system_head as u32;
        let data_area_start = system_track + 1;

        (0..self.sectors_per_cluster as u32)
            .map(|i| {
                let linear = base + i;
                let sector_id = (linear % self.sectors_per_track as u32) + 1;
                let track = data_area_start + linear / self.sectors_per_track as u32;

                SectorAddr {
                    cylinder: (track / sides) as u8,
                    head: (track % sides) as u8,
                    sector_id: sector_id as u8,
                }
            })
            .collect()
    }
}

struct FormatEntry {
    name: &'static str,
    family: MachineFamily,
    fingerprint: fn(&ImageGeometry) -> bool,
    variant: fn() -> Fat8Variant,
}

/// Known FAT8 layouts, evaluated in order; the first matching fingerprint
/// wins. PC-6001 media-kind identification is unavailable (no boot-sector ID
/// string is guaranteed), so its entry is discriminated on geometry alone and
/// placed last; autostart detection is intentionally not part of this
/// fingerprint.
const FORMATS: &[FormatEntry] = &[
    FormatEntry {
        name: "PC-8001 single-sided 2D",
        family: MachineFamily::Pc8001,
        fingerprint: |g| g.sides_seen == 1 && g.sector_size == 256 && g.sector_count_track0_side0 <= 16,
        variant: || Fat8Variant {
            name: "PC-8001 single-sided 2D",
            family: MachineFamily::Pc8001,
            total_tracks: 40,
            sides: 1,
            sectors_per_track: 16,
            sector_size: 256,
            sectors_per_cluster: 1,
            system_cylinder: 1,
            system_head: 0,
            boot_sector: 1,
            directory_sectors: &[2, 3, 4, 5, 6, 7],
            fat_copies: [&[8, 9], &[10, 11], &[12, 13]],
        },
    },
    FormatEntry {
        name: "PC-8801 double-sided 2D",
        family: MachineFamily::Pc8801,
        fingerprint: |g| g.sides_seen == 2 && g.sector_size == 256 && g.tracks_seen <= 40,
        variant: || Fat8Variant {
            name: "PC-8801 double-sided 2D",
            family: MachineFamily::Pc8801,
            total_tracks: 40,
            sides: 2,
            sectors_per_track: 16,
            sector_size: 256,
            sectors_per_cluster: 1,
            system_cylinder: 18,
            system_head: 0,
            boot_sector: 1,
            directory_sectors: &[2, 3, 4, 5, 6, 7, 8, 9],
            fat_copies: [&[10, 11], &[12, 13], &[14, 15]],
        },
    },
    FormatEntry {
        name: "PC-9801 2HD",
        family: MachineFamily::Pc9801,
        fingerprint: |g| g.sides_seen == 2 && g.sector_size == 1024,
        variant: || Fat8Variant {
            name: "PC-9801 2HD",
            family: MachineFamily::Pc9801,
            total_tracks: 77,
            sides: 2,
            sectors_per_track: 8,
            sector_size: 1024,
            sectors_per_cluster: 1,
            system_cylinder: 1,
            system_head: 0,
            boot_sector: 1,
            directory_sectors: &[2, 3, 4, 5],
            fat_copies: [&[6], &[7], &[8]],
        },
    },
    FormatEntry {
        name: "Toshiba Pasopia 2D",
        family: MachineFamily::Pasopia,
        fingerprint: |g| g.sides_seen == 1 && g.sector_size == 128,
        variant: || Fat8Variant {
            name: "Toshiba Pasopia 2D",
            family: MachineFamily::Pasopia,
            total_tracks: 40,
            sides: 1,
            sectors_per_track: 26,
            sector_size: 128,
            sectors_per_cluster: 2,
            system_cylinder: 1,
            system_head: 0,
            boot_sector: 1,
            directory_sectors: &[2, 3, 4, 5, 6, 7, 8, 9],
            fat_copies: [&[10, 11], &[12, 13], &[14, 15]],
        },
    },
    FormatEntry {
        name: "PC-6001 cassette-compatible 2D",
        family: MachineFamily::Pc6001,
        fingerprint: |g| g.sides_seen == 1 && g.sector_size == 256,
        variant: || Fat8Variant {
            name: "PC-6001 cassette-compatible 2D",
            family: MachineFamily::Pc6001,
            total_tracks: 40,
            sides: 1,
            sectors_per_track: 16,
            sector_size: 256,
            sectors_per_cluster: 1,
            system_cylinder: 1,
            system_head: 0,
            boot_sector: 1,
            directory_sectors: &[2, 3, 4, 5, 6, 7],
            fat_copies: [&[8, 9], &[10, 11], &[12, 13]],
        },
    },
];

/// Picks the first matching [`Fat8Variant`] out of [`FORMATS`] for `image`.
/// Returns [`VariantError::UnknownFormat`] when no fingerprint matches, or
/// when the image doesn't even have a (0, 0, 1) sector to inspect.
pub fn detect(image: &DiskImage<'_>) -> Result<Fat8Variant, VariantError> {
    let geometry = ImageGeometry::collect(image).ok_or(VariantError::UnknownFormat)?;

    FORMATS
        .iter()
        .find(|entry| (entry.fingerprint)(&geometry))
        .map(|entry| (entry.variant)())
        .ok_or(VariantError::UnknownFormat)
}
