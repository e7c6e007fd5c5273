//! FAT8 filesystem decoding: directory scan, FAT triplicate reconciliation,
//! and cluster-chain walking, tied together into one `decode` entry point
//! the pipeline driver calls per disk image.

pub mod chain;
pub mod dir;
pub mod table;

pub use chain::ChainResult;
pub use dir::{DirEntry, State};
pub use table::FatSlot;

use crate::container::{DiskImage, SectorAddr};
use crate::error::FsError;
use crate::variant::Fat8Variant;

/// One directory entry paired with its materialized file body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFile {
    pub entry: DirEntry,
    pub chain: ChainResult,
}

/// Everything the decoder produced for one disk image: the files found in
/// its directory, in on-disk order, plus the FAT reconciliation errors
/// encountered while building the table those files were decoded against.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DecodeResult {
    pub files: Vec<DecodedFile>,
    pub reconciliation_errors: Vec<FsError>,
}

fn read_region<'a>(image: &'a DiskImage<'a>, cylinder: u8, head: u8, sector_ids: &[u8], sector_size: usize) -> Vec<u8> {
    let mut region = Vec::with_capacity(sector_ids.len() * sector_size);

    for &sector_id in sector_ids {
        let addr = SectorAddr { cylinder, head, sector_id };
        match image.sector(addr) {
            Some(sector) => region.extend_from_slice(&sector.data),
            None => region.extend(std::iter::repeat(0u8).take(sector_size)),
        }
    }

    region
}

/// Decodes the FAT8 filesystem on `image` using `variant`'s layout. Never
/// fails outright: structural problems are recorded as errors against the
/// affected file (or, for FAT reconciliation, against the whole image)
/// rather than aborting.
pub fn decode<'a>(image: &'a DiskImage<'a>, variant: &Fat8Variant) -> DecodeResult {
    let directory_region = read_region(image, variant.system_cylinder, variant.system_head, variant.directory_sectors, variant.sector_size);
    let entries = dir::scan(&directory_region);

    let copies: Vec<Vec<u8>> = variant
        .fat_copies
        .iter()
        .map(|sector_ids| read_region(image, variant.system_cylinder, variant.system_head, sector_ids, variant.sector_size))
        .collect();

    let (table, reconciliation_errors) = table::reconcile([&copies[0], &copies[1], &copies[2]]);

    let files = entries
        .into_iter()
        .map(|entry| {
            let chain = chain::walk(entry.start_cluster, &table, variant, |addr| image.sector(addr).map(|s| s.data.as_ref()));
            DecodedFile { entry, chain }
        })
        .collect();

    DecodeResult { files, reconciliation_errors }
}
