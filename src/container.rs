//! D88 container parsing: walks a concatenated sequence of disk images, each
//! with its own per-track sector index, out of a borrowed byte buffer.

use std::borrow::Cow;
use std::collections::HashMap;
use std::convert::TryInto;

use crate::error::D88Error;

const D88_HEADER_LEN: usize = 688;
const TRACK_TABLE_LEN: usize = 164;
const SECTOR_HEADER_LEN: usize = 16;

/// The 688-byte header every D88 image starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct D88Header {
    pub disk_name: String,
    pub write_protected: bool,
    pub media_kind: u8,
    pub image_size: u32,
    pub track_offsets: [u32; TRACK_TABLE_LEN],
}

impl D88Header {
    fn read(buf: &[u8]) -> Result<Self, D88Error> {
        if buf.len() < D88_HEADER_LEN {
            return Err(D88Error::TruncatedStream);
        }

        macro_rules! e {
            ($ty:tt, $offset:literal) => {
                $ty::from_le_bytes(buf[$offset..($offset + std::mem::size_of::<$ty>())].try_into().unwrap())
            };
        }

        let disk_name = String::from_utf8_lossy(&buf[0..17]).trim_end_matches('\0').to_string();
        let write_protected = buf[26] != 0x00;
        let media_kind = buf[27];
        let image_size: u32 = e!(u32, 28);

        let mut track_offsets = [0u32; TRACK_TABLE_LEN];
        for (i, slot) in track_offsets.iter_mut().enumerate() {
            let off = 32 + i * 4;
            *slot = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
        }

        Ok(Self { disk_name, write_protected, media_kind, image_size, track_offsets })
    }
}

/// Returns the nominal sector size in bytes for a D88 size code (0..3 ->
/// 128/256/512/1024).
pub fn sector_size_for_code(code: u8) -> usize {
    128usize << (code.min(3) as usize)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectorAddr {
    pub cylinder: u8,
    pub head: u8,
    pub sector_id: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorHeader {
    pub addr: SectorAddr,
    pub size_code: u8,
    pub sectors_in_track: u16,
    pub density: u8,
    pub deleted: bool,
    pub status: u8,
    pub data_length: u16,
}

impl SectorHeader {
    fn read(buf: &[u8; SECTOR_HEADER_LEN]) -> Self {
        let sectors_in_track = u16::from_le_bytes([buf[4], buf[5]]);
        let data_length = u16::from_le_bytes([buf[14], buf[15]]);

        Self {
            addr: SectorAddr { cylinder: buf[0], head: buf[1], sector_id: buf[2] },
            size_code: buf[3],
            sectors_in_track,
            density: buf[6],
            deleted: buf[7] != 0,
            status: buf[8],
            data_length,
        }
    }
}

/// One physical sector: its header plus payload, clamped to the declared
/// sector size. `malformed` is set when the
/// stream's `data_length` disagreed with the size the sector's `size_code`
/// declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sector<'a> {
    pub header: SectorHeader,
    pub data: Cow<'a, [u8]>,
    pub malformed: bool,
}

impl<'a> Sector<'a> {
    fn new(header: SectorHeader, raw: &'a [u8]) -> Self {
        let declared = sector_size_for_code(header.size_code);
        let malformed = raw.len() != declared;

        let data = if raw.len() == declared {
            Cow::Borrowed(raw)
        } else if raw.len() > declared {
            Cow::Borrowed(&raw[..declared])
        } else {
            let mut padded = raw.to_vec();
            padded.resize(declared, 0);
            Cow::Owned(padded)
        };

        Self { header, data, malformed }
    }
}

/// A single floppy image out of a D88 container: its header plus a sector
/// index keyed by `(cylinder, head, sector_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskImage<'a> {
    pub header: D88Header,
    sectors: HashMap<SectorAddr, Sector<'a>>,
}

impl<'a> DiskImage<'a> {
    pub fn sector(&self, addr: SectorAddr) -> Option<&Sector<'a>> {
        self.sectors.get(&addr)
    }

    pub fn sectors(&self) -> impl Iterator<Item = (&SectorAddr, &Sector<'a>)> {
        self.sectors.iter()
    }

    fn parse(buf: &'a [u8]) -> Result<Self, D88Error> {
        let header = D88Header::read(buf)?;
        let size = header.image_size as usize;

        if size > buf.len() {
            return Err(D88Error::TruncatedStream);
        }
        if size < D88_HEADER_LEN {
            return Err(D88Error::MalformedContainer { reason: "declared image size is smaller than the header" });
        }

        let image = &buf[..size];

        let mut offsets: Vec<u32> = header.track_offsets.iter().copied().filter(|&o| o != 0).collect();
        offsets.sort_unstable();
        offsets.dedup();

        let mut sectors = HashMap::new();
        let mut consumed_end = D88_HEADER_LEN;

        for (i, &start) in offsets.iter().enumerate() {
            let start = start as usize;
            if start < D88_HEADER_LEN || start > size {
                return Err(D88Error::MalformedContainer { reason: "track offset lies outside the image" });
            }
            if start != consumed_end {
                return Err(D88Error::MalformedContainer {
                    reason: "declared image size disagrees with the sum of track extents",
                });
            }

            let track_end = offsets.get(i + 1).map(|&o| o as usize).unwrap_or(size);
            if track_end < start || track_end > size {
                return Err(D88Error::MalformedContainer { reason: "track offset lies outside the image" });
            }

            let mut pos = start;
            while pos < track_end {
                if pos + SECTOR_HEADER_LEN > track_end {
                    return Err(D88Error::MalformedContainer { reason: "sector header truncated at end of track" });
                }

                let raw_header: [u8; SECTOR_HEADER_LEN] = image[pos..pos + SECTOR_HEADER_LEN].try_into().unwrap();
                let sec_header = SectorHeader::read(&raw_header);
                let data_start = pos + SECTOR_HEADER_LEN;
                let data_end = data_start + sec_header.data_length as usize;

                if data_end > track_end {
                    return Err(D88Error::MalformedContainer { reason: "sector payload extends past its track region" });
                }

                let raw_payload = &image[data_start..data_end];
                let addr = sec_header.addr;
                sectors.insert(addr, Sector::new(sec_header, raw_payload));

                pos = data_end;
            }

            consumed_end = track_end;
        }

        // Every track's extent, plus the header, must account for the whole
        // declared image size: a gap (or no tracks at all, when `size` is
        // larger than the header) leaves trailing bytes unaccounted for.
        if consumed_end != size {
            return Err(D88Error::MalformedContainer {
                reason: "declared image size disagrees with the sum of track extents",
            });
        }

        Ok(Self { header, sectors })
    }
}

/// A lazy sequence of disk images parsed out of a D88 byte stream.
/// Termination: end of stream, or a declared image size of zero.
pub struct DiskImageSet;

impl DiskImageSet {
    pub fn images(bytes: &[u8]) -> impl Iterator<Item = Result<DiskImage<'_>, D88Error>> {
        ImageIter { bytes, pos: 0, done: false }
    }
}

struct ImageIter<'a> {
    bytes: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> Iterator for ImageIter<'a> {
    type Item = Result<DiskImage<'a>, D88Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.bytes.len() {
            return None;
        }

        let remaining = &self.bytes[self.pos..];
        if remaining.len() < D88_HEADER_LEN {
            self.done = true;
            return Some(Err(D88Error::TruncatedStream));
        }

        let size = u32::from_le_bytes(remaining[28..32].try_into().unwrap());
        if size == 0 {
            self.done = true;
            return None;
        }

        match DiskImage::parse(remaining) {
            Ok(image) => {
                self.pos += size as usize;
                Some(Ok(image))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
