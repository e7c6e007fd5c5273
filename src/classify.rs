//! File classification from a directory entry's attribute byte.
//!
//! Bit layout: bits 0-1 are the two "kind" bits, bits 2-4 are
//! read-only/verify/obfuscated, and bits 5-7 are the reserved `r-1`..`r-3`
//! bits the tool preserves as suffixes rather than interprets.

/// The three file kinds a FAT8 directory entry's attribute byte can encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Basic,
    Ascii,
    Binary,
}

impl Classification {
    fn from_kind_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Classification::Basic,
            0b01 => Classification::Ascii,
            _ => Classification::Binary,
        }
    }
}

const READ_ONLY_BIT: u8 = 1 << 2;
const VERIFY_BIT: u8 = 1 << 3;
const OBFUSCATED_BIT: u8 = 1 << 4;
const R1_BIT: u8 = 1 << 5;
const R2_BIT: u8 = 1 << 6;
const R3_BIT: u8 = 1 << 7;

/// Modifier flags carried alongside a [`Classification`], decoded
/// independently of the kind bits. The classifier is total: every attribute
/// byte produces a `FileFlags`, with unrecognized reserved bits preserved
/// rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct FileFlags(u8);

impl FileFlags {
    pub fn from_attribute(attribute: u8) -> Self {
        Self(attribute & (READ_ONLY_BIT | VERIFY_BIT | OBFUSCATED_BIT | R1_BIT | R2_BIT | R3_BIT))
    }

    pub fn read_only(self) -> bool {
        self.0 & READ_ONLY_BIT != 0
    }

    pub fn verify(self) -> bool {
        self.0 & VERIFY_BIT != 0
    }

    pub fn obfuscated(self) -> bool {
        self.0 & OBFUSCATED_BIT != 0
    }

    pub fn r1(self) -> bool {
        self.0 & R1_BIT != 0
    }

    pub fn r2(self) -> bool {
        self.0 & R2_BIT != 0
    }

    pub fn r3(self) -> bool {
        self.0 & R3_BIT != 0
    }
}

/// Decodes both the classification and the flag set from a raw attribute
/// byte. Total: every input byte produces a result, never a rejection.
pub fn classify(attribute: u8) -> (Classification, FileFlags) {
    (Classification::from_kind_bits(attribute), FileFlags::from_attribute(attribute))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_eq as eq;

    #[test]
    fn kind_bits_select_classification() {
        eq!(classify(0b000).0, Classification::Basic);
        eq!(classify(0b001).0, Classification::Ascii);
        eq!(classify(0b010).0, Classification::Binary);
        eq!(classify(0b011).0, Classification::Binary);
    }

    #[test]
    fn modifier_flags_are_independent_of_kind() {
        let (_, flags) = classify(0b1011_1101);
        assert!(flags.obfuscated());
        assert!(flags.verify());
        assert!(flags.read_only());
        assert!(flags.r1());
        assert!(flags.r2());
        assert!(flags.r3());
    }

    #[test]
    fn no_flags_set_when_only_kind_bits_present() {
        let (_, flags) = classify(0b01);
        eq!(flags, FileFlags::default());
    }
}
