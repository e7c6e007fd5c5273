//! Error kinds layered by component: container, geometry, and filesystem
//! errors are distinct types; [`PipelineError`] is the sum a caller sees
//! attached to a particular image or file.

use thiserror::Error;

/// Errors from walking the D88 container itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum D88Error {
    #[error("malformed D88 container: {reason}")]
    MalformedContainer { reason: &'static str },

    #[error("stream ended before the declared image size was reached")]
    TruncatedStream,
}

/// Errors from geometry/variant detection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VariantError {
    #[error("no known FAT8 variant fingerprint matched this image's geometry")]
    UnknownFormat,
}

/// Errors from decoding the FAT8 filesystem proper.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("FAT copies disagree at slot {0}; majority value used")]
    FatDisagreement(u8),

    #[error("cluster chain revisited cluster {0} (cycle)")]
    ChainCycle(u8),

    #[error("cluster chain pointed to out-of-range cluster {0}")]
    ChainOutOfRange(u8),

    #[error("cluster chain pointed to a free/bad cluster {0}")]
    ChainCorrupt(u8),

    #[error("sector (C={cylinder}, H={head}, R={sector}) referenced by a cluster is missing from the image")]
    MissingSector { cylinder: u8, head: u8, sector: u8 },

    #[error("directory entry at offset {0} within the directory region is malformed")]
    MalformedDirectoryEntry(usize),
}

/// Top-level error type for the decode path that runs before a disk image has
/// individual files to report errors about (container parse, variant
/// detection). Filesystem-level errors after this point are recorded, not
/// propagated — see [`PipelineError`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Fat8Error {
    #[error(transparent)]
    Container(#[from] D88Error),

    #[error(transparent)]
    Variant(#[from] VariantError),

    #[error(transparent)]
    Fs(#[from] FsError),
}

/// A single error recorded by the pipeline driver while processing one disk
/// image. Unlike [`Fat8Error`], encountering one of these never aborts
/// processing of the image: it is pushed onto the image's error list and the
/// driver moves on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("disk image could not be decoded at all: {0}")]
    Image(#[from] Fat8Error),
}
