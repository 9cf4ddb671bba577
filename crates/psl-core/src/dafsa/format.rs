//! DAFSA byte format constants
//!
//! A graph is a sequence of nodes and link lists. The first bytes of the
//! graph are the root link list.

/// File header prefix: ".DAFSA@PSL_"
pub const HEADER_MAGIC: &[u8; 11] = b".DAFSA@PSL_";

/// Header size in bytes (magic, version, space padding, newline)
pub const HEADER_SIZE: usize = 16;

/// Current file format version
pub const DAFSA_VERSION: u32 = 0;

// =============================================================================
// Link list encoding
// =============================================================================

/// Link byte flags.
pub mod link {
    /// Set on the first byte of the last link in a list
    pub const LAST: u8 = 0x80;
    /// Mask selecting the offset width
    pub const WIDTH_MASK: u8 = 0x60;
    /// Three byte offset, 21 significant bits
    pub const WIDE_3: u8 = 0x60;
    /// Two byte offset, 13 significant bits
    pub const WIDE_2: u8 = 0x40;
    /// Payload of the first byte of a multi-byte offset
    pub const HIGH_MASK: u8 = 0x1F;
    /// Payload of a one byte offset
    pub const SHORT_MASK: u8 = 0x3F;

    /// Largest distance a one byte offset can hold (exclusive)
    pub const MAX_1: usize = 1 << 6;
    /// Largest distance a two byte offset can hold (exclusive)
    pub const MAX_2: usize = 1 << 13;
    /// Largest distance a three byte offset can hold (exclusive)
    pub const MAX_3: usize = 1 << 21;
}

// =============================================================================
// Node encoding
// =============================================================================

/// Node byte markers.
pub mod node {
    /// End of label bit
    pub const END_OF_LABEL: u8 = 0x80;
    /// Mask/value identifying a return value byte
    pub const VALUE_MASK: u8 = 0xE0;
    pub const VALUE_TAG: u8 = 0x80;
    /// Payload of a return value byte
    pub const VALUE_BITS: u8 = 0x0F;
    /// Placeholder announcing a multibyte UTF-8 character
    pub const MULTIBYTE: u8 = 0x1F;
    /// XOR applied to the leading byte of a multibyte character
    pub const LEAD_XOR: u8 = 0x80;
    /// XOR applied to continuation bytes
    pub const CONT_XOR: u8 = 0xC0;
    /// Trailing byte marking a UTF-8 mode graph
    pub const UTF_MODE_MARK: u8 = 0x01;
}

/// UTF-8 sequence length for a leading byte, 0 for ASCII and continuations.
#[inline]
pub fn multibyte_length(b: u8) -> usize {
    match b >> 4 {
        0xC | 0xD => 2,
        0xE => 3,
        0xF => 4,
        _ => 0,
    }
}

/// True if `b` encodes a return value (never the end-of-label placeholder).
#[inline]
pub fn is_value_byte(b: u8) -> bool {
    b & node::VALUE_MASK == node::VALUE_TAG && b != (node::MULTIBYTE | node::END_OF_LABEL)
}

/// Build the 16 byte file header.
pub fn file_header() -> [u8; HEADER_SIZE] {
    let mut header = [b' '; HEADER_SIZE];
    header[..HEADER_MAGIC.len()].copy_from_slice(HEADER_MAGIC);
    header[HEADER_MAGIC.len()] = b'0' + DAFSA_VERSION as u8;
    header[HEADER_SIZE - 1] = b'\n';
    header
}

/// True if `data` starts with the DAFSA magic.
#[inline]
pub fn has_magic(data: &[u8]) -> bool {
    data.starts_with(HEADER_MAGIC)
}

/// Parse the decimal version that follows the magic.
pub fn header_version(data: &[u8]) -> Option<u32> {
    let header = data.get(..HEADER_SIZE)?;
    if !has_magic(header) {
        return None;
    }
    let digits = &header[HEADER_MAGIC.len()..];
    let end = digits
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    std::str::from_utf8(&digits[..end]).ok()?.parse().ok()
}

/// True if the last byte marks a UTF-8 mode graph.
#[inline]
pub fn is_utf_mode(graph: &[u8]) -> bool {
    graph.last().is_some_and(|&b| b < 0x80)
}
