//! Output file naming and extension policy.

use std::collections::HashSet;

use crate::charset::Charset;
use crate::classify::{Classification, FileFlags};
use crate::fat::dir::RawName;

const BINARY_ALLOWED_EXTS: &[&str] = &["bin", "cod"];
const BASIC_ALLOWED_EXTS: &[&str] = &["bas", "n88", "nip", "bin"];
const ASCII_ALLOWED_EXTS: &[&str] = &["asc", "txt"];

/// Tracks already-produced output names (case-folded) so repeated calls to
/// [`name_for`] resolve collisions deterministically, the way a real
/// extractor accumulates state across the files of one disk image.
#[derive(Debug, Default)]
pub struct NamingContext {
    produced: HashSet<String>,
}

impl NamingContext {
    pub fn new() -> Self {
        Self::default()
    }
}

fn decode_trimmed(charset: Charset, bytes: &[u8]) -> String {
    let decoded: String = bytes.iter().map(|&b| charset.decode_byte(b)).collect();
    decoded.trim_end_matches(' ').to_string()
}

fn has_extension(name: &str, allowed: &[&str]) -> bool {
    match name.rsplit_once('.') {
        Some((_, ext)) => allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

fn apply_extension_policy(name: String, classification: Classification) -> String {
    let (allowed, fallback) = match classification {
        Classification::Binary => (BINARY_ALLOWED_EXTS, "bin"),
        Classification::Basic => (BASIC_ALLOWED_EXTS, "bas"),
        Classification::Ascii => (ASCII_ALLOWED_EXTS, "asc"),
    };

    if has_extension(&name, allowed) {
        name
    } else {
        format!("{}.{}", name, fallback)
    }
}

fn append_flag_suffixes(mut name: String, flags: FileFlags) -> String {
    if flags.r1() {
        name.push_str(".r-1");
    }
    if flags.r2() {
        name.push_str(".r-2");
    }
    if flags.r3() {
        name.push_str(".r-3");
    }
    if flags.read_only() {
        name.push_str(".r-o");
    }
    if flags.verify() {
        name.push_str(".vfy");
    }
    if flags.obfuscated() {
        name.push_str(".obf");
    }
    name
}

fn insert_disambiguator(name: &str, k: usize) -> String {
    match name.rfind('.') {
        Some(idx) => format!("{} ({}){}", &name[..idx], k, &name[idx..]),
        None => format!("{} ({})", name, k),
    }
}

/// Builds the output file name for one directory entry: decode name/ext,
/// apply the classification's extension policy, append flag suffixes, then
/// disambiguate. Collisions (compared case-insensitively) are resolved
/// against every name `ctx` has already produced.
pub fn name_for(ctx: &mut NamingContext, raw: &RawName, charset: Charset, classification: Classification, flags: FileFlags) -> String {
    let base = decode_trimmed(charset, &raw.name);
    let ext = decode_trimmed(charset, &raw.ext);

    let joined = if ext.is_empty() { base } else { format!("{}.{}", base, ext) };
    let with_extension = apply_extension_policy(joined, classification);
    let candidate = append_flag_suffixes(with_extension, flags);

    let mut name = candidate.clone();
    let mut k = 2;
    while ctx.produced.contains(&name.to_ascii_lowercase()) {
        name = insert_disambiguator(&candidate, k);
        k += 1;
    }

    ctx.produced.insert(name.to_ascii_lowercase());
    name
}

/// Derives the companion "UTF-8 dump" artifact name for `name`, replacing
/// its final extension group with `_EXT_utf8_dump.txt`.
pub fn utf8_dump_name(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) => format!("{}_{}_utf8_dump.txt", &name[..idx], &name[idx + 1..]),
        None => format!("{}_utf8_dump.txt", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_eq as eq;

    fn raw(name: &[u8; 6], ext: &[u8; 3]) -> RawName {
        RawName { name: *name, ext: *ext }
    }

    #[test]
    fn basic_file_gets_no_flag_suffixes() {
        let mut ctx = NamingContext::new();
        let name = name_for(&mut ctx, &raw(b"HELLO ", b"BAS"), Charset::Pc88, Classification::Basic, FileFlags::default());
        eq!(name, "HELLO.BAS");
    }

    #[test]
    fn ascii_extension_outside_allow_list_gets_asc_appended() {
        let mut ctx = NamingContext::new();
        let name = name_for(&mut ctx, &raw(b"DATA  ", b"DAT"), Charset::Pc88, Classification::Ascii, FileFlags::default());
        eq!(name, "DATA.DAT.asc");
    }

    #[test]
    fn binary_with_dat_extension_gets_bin_appended() {
        let mut ctx = NamingContext::new();
        let name = name_for(&mut ctx, &raw(b"DATA  ", b"DAT"), Charset::Pc88, Classification::Binary, FileFlags::default());
        eq!(name, "DATA.DAT.bin");
    }

    #[test]
    fn obfuscated_binary_gets_obf_suffix() {
        let mut ctx = NamingContext::new();
        let flags = FileFlags::from_attribute(1 << 4);
        let name = name_for(&mut ctx, &raw(b"DATA  ", b"DAT"), Charset::Pc88, Classification::Binary, flags);
        eq!(name, "DATA.DAT.bin.obf");
    }

    #[test]
    fn colliding_names_get_disambiguated() {
        let mut ctx = NamingContext::new();
        let first = name_for(&mut ctx, &raw(b"README", b"TXT"), Charset::Pc88, Classification::Ascii, FileFlags::default());
        let second = name_for(&mut ctx, &raw(b"README", b"TXT"), Charset::Pc88, Classification::Ascii, FileFlags::default());
        eq!(first, "README.TXT");
        eq!(second, "README (2).TXT");
    }

    #[test]
    fn utf8_dump_name_replaces_final_extension() {
        eq!(utf8_dump_name("HELLO.BAS"), "HELLO_BAS_utf8_dump.txt");
    }
}
