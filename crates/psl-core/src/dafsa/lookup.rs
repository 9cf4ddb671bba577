//! Right-anchored key lookup over a DAFSA byte graph.
//!
//! The walk never backtracks: once a child consumed a key byte, a later
//! mismatch ends the search. Every read goes through `slice::get`, so a
//! truncated or corrupted graph yields `None` instead of a panic.

use super::format::{is_value_byte, link, multibyte_length, node};

/// Decode the link at `pos`.
///
/// Returns `(distance, bytes consumed, is last link)`. A link is only read
/// when at least three bytes remain: the link itself, a node to skip over
/// and a destination node.
#[inline]
pub(crate) fn read_link(graph: &[u8], pos: usize) -> Option<(usize, usize, bool)> {
    let bytes = graph.get(pos..)?.get(..3)?;
    let b0 = bytes[0];
    let (distance, consumed) = match b0 & link::WIDTH_MASK {
        link::WIDE_3 => (
            (usize::from(b0 & link::HIGH_MASK) << 16)
                | (usize::from(bytes[1]) << 8)
                | usize::from(bytes[2]),
            3,
        ),
        link::WIDE_2 => (
            (usize::from(b0 & link::HIGH_MASK) << 8) | usize::from(bytes[1]),
            2,
        ),
        _ => (usize::from(b0 & link::SHORT_MASK), 1),
    };
    Some((distance, consumed, b0 & link::LAST != 0))
}

/// Key cursor with the multibyte matching state.
struct KeyCursor<'k> {
    key: &'k [u8],
    pos: usize,
    /// Start of the UTF-8 sequence being matched byte by byte
    multibyte_start: Option<usize>,
}

impl<'k> KeyCursor<'k> {
    #[inline]
    fn at_end(&self) -> bool {
        self.pos >= self.key.len()
    }

    #[inline]
    fn current(&self) -> Option<u8> {
        self.key.get(self.pos).copied()
    }

    fn matches(&self, matcher: u8) -> bool {
        let Some(b) = self.current() else {
            return false;
        };
        match self.multibyte_start {
            Some(start) if start == self.pos => matcher ^ node::LEAD_XOR == b,
            Some(_) => matcher ^ node::CONT_XOR == b,
            // A leading byte outside multibyte mode only matches the mode switch.
            None if multibyte_length(b) != 0 => matcher == node::MULTIBYTE,
            None => matcher == b,
        }
    }

    /// Advance after a graph byte matched.
    fn advance(&mut self) {
        match self.multibyte_start {
            Some(start) => {
                self.pos += 1;
                let len = self.key.get(start).copied().map_or(0, multibyte_length);
                if self.pos - start == len {
                    self.multibyte_start = None;
                }
            }
            None => {
                if self.current().map_or(0, multibyte_length) != 0 {
                    self.multibyte_start = Some(self.pos);
                } else {
                    self.pos += 1;
                }
            }
        }
    }
}

#[inline]
fn is_eol(graph: &[u8], at: usize) -> bool {
    graph.get(at).is_some_and(|&b| b & node::END_OF_LABEL != 0)
}

#[inline]
fn is_match(graph: &[u8], at: usize, cursor: &KeyCursor<'_>) -> bool {
    graph.get(at).is_some_and(|&b| cursor.matches(b))
}

#[inline]
fn is_end_char_match(graph: &[u8], at: usize, cursor: &KeyCursor<'_>) -> bool {
    graph
        .get(at)
        .is_some_and(|&b| cursor.matches(b ^ node::END_OF_LABEL))
}

#[inline]
fn return_value(graph: &[u8], at: usize, cursor: &KeyCursor<'_>) -> Option<u8> {
    if cursor.multibyte_start.is_some() {
        return None;
    }
    graph
        .get(at)
        .copied()
        .filter(|&b| is_value_byte(b))
        .map(|b| b & node::VALUE_BITS)
}

/// Look up `key` in `graph`.
///
/// Returns the 4-bit value stored for the key, or `None` if the key is not
/// in the set. Keys containing ASCII control bytes never match, since those
/// byte values are reserved for graph markers.
pub fn lookup(graph: &[u8], key: &[u8]) -> Option<u8> {
    if key.iter().any(|&b| b < 0x20) {
        return None;
    }

    let end = graph.len();
    let mut pos = 0usize;
    let mut offset = 0usize;
    let mut cursor = KeyCursor {
        key,
        pos: 0,
        multibyte_start: None,
    };

    while pos != end {
        let (distance, consumed, last) = read_link(graph, pos)?;
        offset = offset.saturating_add(distance);
        pos = if last { end } else { pos + consumed };

        let mut did_consume = false;

        if !cursor.at_end() && !is_eol(graph, offset) {
            // Leading char is not a match, try the next child.
            if !is_match(graph, offset, &cursor) {
                continue;
            }
            did_consume = true;
            offset += 1;
            cursor.advance();

            while !is_eol(graph, offset) && !cursor.at_end() {
                if !is_match(graph, offset, &cursor) {
                    return None;
                }
                offset += 1;
                cursor.advance();
            }
        }

        if cursor.at_end() {
            if let Some(value) = return_value(graph, offset, &cursor) {
                return Some(value);
            }
            if did_consume {
                return None;
            }
            continue;
        }

        if !is_end_char_match(graph, offset, &cursor) {
            if did_consume {
                return None;
            }
            continue;
        }
        offset += 1;
        cursor.advance();
        // Dive into the child's link list.
        pos = offset;
    }

    None
}
