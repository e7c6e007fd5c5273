//! The per-image pipeline driver: detect → decode → classify → deobfuscate →
//! name → hand off to a sink, never aborting a whole image on a per-file
//! failure.

use std::io;

use log::{debug, info, warn};

use crate::charset;
use crate::classify::{classify, Classification};
use crate::container::DiskImageSet;
use crate::error::{Fat8Error, PipelineError};
use crate::fat;
use crate::naming::{self, NamingContext};
use crate::obfuscate;
use crate::variant::{self, MachineFamily};

/// The seam between the core and whatever writes artifacts to disk: output-
/// directory creation and uniquification, and stdout/log-file mirroring, are
/// all a caller's job. The core never creates a directory or touches a path
/// itself; it only calls through this trait.
pub trait ArtifactSink {
    fn write_file(&mut self, name: &str, body: &[u8]) -> io::Result<()>;
    fn log(&mut self, line: &str);
}

/// Driver-wide knobs. Defaults match the documented output policy: emit both
/// the obfuscated and deobfuscated bodies whenever the scheme is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub deobfuscate: bool,
    pub emit_obfuscated_body: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { deobfuscate: true, emit_obfuscated_body: true }
    }
}

/// What the driver produced: how many images it processed, and every
/// structural error recorded along the way, tagged with the index of the
/// image it occurred in.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub images_processed: usize,
    pub errors: Vec<(usize, PipelineError)>,
}

fn deobfuscate_for_family(family: MachineFamily, body: &[u8]) -> Option<Vec<u8>> {
    match family {
        MachineFamily::Pc8001 | MachineFamily::Pc8801 => Some(obfuscate::pc88_decode(body)),
        MachineFamily::Pc9801 => Some(obfuscate::pc98_decode(body)),
        MachineFamily::Pasopia | MachineFamily::Pc6001 => None,
    }
}

fn strip_obf_suffix(name: &str) -> &str {
    name.strip_suffix(".obf").unwrap_or(name)
}

/// Runs the full pipeline over every image in `bytes`, writing artifacts
/// through `sink`. Container-level parse failures stop the whole stream
/// (there's no reliable way to locate the next image once the current one's
/// own size field is in question); geometry/variant failures and
/// filesystem-level errors are recorded per image and processing continues.
pub fn run(bytes: &[u8], options: &PipelineOptions, sink: &mut impl ArtifactSink) -> PipelineReport {
    let mut report = PipelineReport::default();

    for (image_index, image_result) in DiskImageSet::images(bytes).enumerate() {
        let image = match image_result {
            Ok(image) => image,
            Err(e) => {
                report.errors.push((image_index, PipelineError::Image(Fat8Error::Container(e.clone()))));
                sink.log(&format!("[Disk {:02}] container error: {}", image_index + 1, e));
                break;
            }
        };

        let variant = match variant::detect(&image) {
            Ok(v) => v,
            Err(e) => {
                report.errors.push((image_index, PipelineError::Image(Fat8Error::Variant(e.clone()))));
                sink.log(&format!("[Disk {:02}] {}", image_index + 1, e));
                continue;
            }
        };

        let decode_result = fat::decode(&image, &variant);
        let mut image_error_count = 0usize;

        for err in &decode_result.reconciliation_errors {
            warn!("disk {}: {}", image_index + 1, err);
            sink.log(&format!("[Disk {:02}] {}", image_index + 1, err));
            report.errors.push((image_index, PipelineError::Fs(err.clone())));
            image_error_count += 1;
        }

        let charset = variant.family.charset();
        let mut ctx = NamingContext::new();

        for decoded in &decode_result.files {
            let (classification, flags) = classify(decoded.entry.attribute);
            let name = naming::name_for(&mut ctx, &decoded.entry.raw_name, charset, classification, flags);

            debug!("disk {}: entry {:?} -> {}", image_index + 1, decoded.entry.raw_name, name);

            for err in &decoded.chain.errors {
                warn!("disk {}: {}: {}", image_index + 1, name, err);
                sink.log(&format!("[Disk {:02}] {}: {}", image_index + 1, name, err));
                report.errors.push((image_index, PipelineError::Fs(err.clone())));
                image_error_count += 1;
            }

            let body = &decoded.chain.body;

            if flags.obfuscated() {
                if options.emit_obfuscated_body {
                    let _ = sink.write_file(&name, body);
                }
                if options.deobfuscate {
                    if let Some(plain) = deobfuscate_for_family(variant.family, body) {
                        let _ = sink.write_file(strip_obf_suffix(&name), &plain);
                    }
                }
            } else {
                let _ = sink.write_file(&name, body);
            }

            if let Classification::Ascii = classification {
                let dump = charset::decode_all(charset, body);
                let _ = sink.write_file(&naming::utf8_dump_name(&name), dump.as_bytes());
            }
        }

        info!("disk {}: {} files, {} errors", image_index + 1, decode_result.files.len(), image_error_count);
        sink.log(&format!("[Disk {:02}] [Error Count {:02}]", image_index + 1, image_error_count));

        report.images_processed += 1;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_eq as eq;
    use std::collections::HashMap;

    #[derive(Default)]
    struct RecordingSink {
        files: HashMap<String, Vec<u8>>,
        log_lines: Vec<String>,
    }

    impl ArtifactSink for RecordingSink {
        fn write_file(&mut self, name: &str, body: &[u8]) -> io::Result<()> {
            self.files.insert(name.to_string(), body.to_vec());
            Ok(())
        }

        fn log(&mut self, line: &str) {
            self.log_lines.push(line.to_string());
        }
    }

    fn sector_bytes(cyl: u8, head: u8, id: u8, payload: &[u8]) -> Vec<u8> {
        let mut buf = vec![cyl, head, id, 1];
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.push(0);
        buf.push(0);
        buf.push(0);
        buf.extend_from_slice(&[0u8; 5]);
        buf.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        buf.extend_from_slice(payload);
        buf
    }

    #[test]
    fn single_clean_image_yields_one_file() {
        let mut dir_entry = [0u8; 16];
        dir_entry[0..6].copy_from_slice(b"HELLO ");
        dir_entry[6..9].copy_from_slice(b"BAS");
        dir_entry[10] = 2;

        let mut fat = [0xFFu8; 256];
        fat[2] = 0xC0;

        let mut track = Vec::new();
        track.extend(sector_bytes(0, 0, 1, &[0u8; 256])); // geometry fingerprint sector
        track.extend(sector_bytes(1, 0, 2, &dir_entry));
        track.extend(sector_bytes(1, 0, 8, &fat)); // fat_copies[0] == [8, 9]
        track.extend(sector_bytes(1, 0, 10, &fat)); // fat_copies[1] == [10, 11]
        track.extend(sector_bytes(1, 0, 12, &fat)); // fat_copies[2] == [12, 13]
        track.extend(sector_bytes(2, 0, 1, &[0x42u8; 256])); // data area starts on the cylinder after the system track

        let mut image_bytes = vec![0u8; 688];
        image_bytes[32..36].copy_from_slice(&688u32.to_le_bytes());
        image_bytes.extend(track);
        let size = image_bytes.len() as u32;
        image_bytes[28..32].copy_from_slice(&size.to_le_bytes());

        let mut sink = RecordingSink::default();
        let report = run(&image_bytes, &PipelineOptions::default(), &mut sink);

        eq!(report.images_processed, 1);
        assert!(report.errors.is_empty());
        assert!(sink.files.contains_key("HELLO.BAS"));
    }
}
