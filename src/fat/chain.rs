//! Cluster chain walking: follows a reconciled FAT table from a directory
//! entry's starting cluster, materializing sectors into a file body and
//! guarding against cycles, out-of-range pointers, and pointers into
//! free/bad clusters.
//!
//! The walk runs over [`super::table::reconcile`]'s already-merged table; the
//! cycle guard is [`crate::util::BitMap`], sized to the 256-cluster FAT8
//! address space so detection is O(1) per step regardless of disk size.

use crate::container::SectorAddr;
use crate::error::FsError;
use crate::util::BitMap;
use crate::variant::Fat8Variant;

use super::table::FatSlot;

/// The materialized body of a chain walk, plus any structural errors
/// encountered along the way. A non-empty `errors` means the body was
/// truncated at the point of failure.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChainResult {
    pub body: Vec<u8>,
    pub errors: Vec<FsError>,
}

/// Walks the chain anchored at `start_cluster` over `table` (already
/// FAT-reconciled), using `variant` to map clusters to sectors and
/// `read_sector` to fetch each sector's bytes (`None` when the sector is
/// absent from the image, the `MissingSector` case).
pub fn walk<'a>(start_cluster: u8, table: &[u8], variant: &Fat8Variant, mut read_sector: impl FnMut(SectorAddr) -> Option<&'a [u8]>) -> ChainResult {
    let mut result = ChainResult::default();
    let mut visited = BitMap::new();
    let mut current = start_cluster;

    loop {
        if visited.mark_and_check(current as usize) {
            result.errors.push(FsError::ChainCycle(current));
            break;
        }

        if current as usize >= table.len() {
            result.errors.push(FsError::ChainOutOfRange(current));
            break;
        }

        match FatSlot::decode(table[current as usize]) {
            FatSlot::Next(next) => {
                emit_cluster(&mut result, variant, current, variant.sectors_per_cluster, &mut read_sector);
                current = next;
            }
            FatSlot::Terminal(sector_count) => {
                emit_cluster(&mut result, variant, current, sector_count, &mut read_sector);
                break;
            }
            FatSlot::Free | FatSlot::Bad => {
                result.errors.push(FsError::ChainCorrupt(current));
                break;
            }
        }
    }

    result
}

fn emit_cluster<'a>(result: &mut ChainResult, variant: &Fat8Variant, cluster: u8, sector_count: u8, read_sector: &mut impl FnMut(SectorAddr) -> Option<&'a [u8]>) {
    let addrs = variant.cluster_sectors(cluster);

    for addr in addrs.into_iter().take(sector_count as usize) {
        match read_sector(addr) {
            Some(data) => result.body.extend_from_slice(data),
            None => {
                result.body.extend(std::iter::repeat(0u8).take(variant.sector_size));
                result.errors.push(FsError::MissingSector { cylinder: addr.cylinder, head: addr.head, sector: addr.sector_id });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_eq as eq;
    use std::collections::HashMap;

    fn test_variant() -> Fat8Variant {
        Fat8Variant {
            name: "test",
            family: crate::variant::MachineFamily::Pc8001,
            total_tracks: 40,
            sides: 1,
            sectors_per_track: 16,
            sector_size: 4,
            sectors_per_cluster: 1,
            system_cylinder: 1,
            system_head: 0,
            boot_sector: 1,
            directory_sectors: &[2, 3],
            fat_copies: [&[4], &[5], &[6]],
        }
    }

    #[test]
    fn terminal_cluster_emits_only_declared_sectors() {
        let variant = test_variant();
        // cluster 2 is terminal with low-3-bits = 0 -> 1 sector
        let table = vec![0u8; 256];
        let mut table = table;
        table[2] = 0xC0;

        let mut sectors = HashMap::new();
        let addr = variant.cluster_sectors(2)[0];
        sectors.insert(addr, [0xAAu8, 0xAA, 0xAA, 0xAA]);

        let result = walk(2, &table, &variant, |a| sectors.get(&a).map(|s| s.as_slice()));
        eq!(result.body, vec![0xAA, 0xAA, 0xAA, 0xAA]);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn next_pointer_chains_into_another_cluster() {
        let variant = test_variant();
        let mut table = vec![0u8; 256];
        table[2] = 3; // cluster 2 -> cluster 3
        table[3] = 0xC0; // terminal, 1 sector

        let mut sectors = HashMap::new();
        sectors.insert(variant.cluster_sectors(2)[0], [1u8, 1, 1, 1]);
        sectors.insert(variant.cluster_sectors(3)[0], [2u8, 2, 2, 2]);

        let result = walk(2, &table, &variant, |a| sectors.get(&a).map(|s| s.as_slice()));
        eq!(result.body, vec![1, 1, 1, 1, 2, 2, 2, 2]);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn cycle_is_detected_and_stops_the_walk() {
        let variant = test_variant();
        let mut table = vec![0u8; 256];
        table[2] = 3;
        table[3] = 2; // cycle back to 2

        let sectors: HashMap<SectorAddr, [u8; 4]> = HashMap::new();
        let result = walk(2, &table, &variant, |a| sectors.get(&a).map(|s| s.as_slice()));

        assert!(matches!(result.errors.last(), Some(FsError::ChainCycle(2))));
    }

    #[test]
    fn free_or_bad_next_pointer_is_corrupt() {
        let variant = test_variant();
        let mut table = vec![0xFFu8; 256];
        table[2] = 3;
        table[3] = 0xFF; // free, not terminal

        let sectors: HashMap<SectorAddr, [u8; 4]> = HashMap::new();
        let result = walk(2, &table, &variant, |a| sectors.get(&a).map(|s| s.as_slice()));

        assert!(matches!(result.errors.last(), Some(FsError::ChainCorrupt(3))));
    }

    #[test]
    fn missing_sector_is_zero_filled_and_recorded() {
        let variant = test_variant();
        let mut table = vec![0u8; 256];
        table[2] = 0xC0;

        let sectors: HashMap<SectorAddr, [u8; 4]> = HashMap::new();
        let result = walk(2, &table, &variant, |a| sectors.get(&a).map(|s| s.as_slice()));

        eq!(result.body, vec![0, 0, 0, 0]);
        assert!(matches!(result.errors.last(), Some(FsError::MissingSector { .. })));
    }
}
