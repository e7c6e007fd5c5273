//! Extracts files from FAT8 floppy images stored in the D88 container
//! format (NEC PC-6001/6601, PC-8001/8801, PC-9801, and the Toshiba
//! Pasopia).
//!
//! Modules run in roughly the dependency order the pipeline uses them in:
//! [`charset`] and [`container`] are leaves; [`variant`] sits on
//! [`container`]; [`fat`] sits on [`variant`] and [`container`]; [`classify`],
//! [`obfuscate`], and [`naming`] are independent of each other; [`pipeline`]
//! ties all of it together behind the [`pipeline::ArtifactSink`] seam.

pub mod charset;
pub mod classify;
pub mod container;
pub mod error;
pub mod fat;
pub mod naming;
pub mod obfuscate;
pub mod pipeline;
pub mod util;
pub mod variant;
