//! Small bit-level helpers shared by the filesystem decoder.

pub mod bitmap;
pub mod bits;

pub use bitmap::BitMap;
pub use bits::Bits;
