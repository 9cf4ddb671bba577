//! Enumeration of every `(key, value)` pair stored in a graph.

use super::format::{is_value_byte, multibyte_length, node};
use super::lookup::read_link;

/// Upper bound on visited graph bytes, per graph byte.
const MAX_STEPS_PER_BYTE: usize = 256;

/// Maximum nesting of link lists.
const MAX_DEPTH: usize = 1024;

/// Error type for graph enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalkError {
    #[error("Graph truncated at offset {0}")]
    Truncated(usize),
    #[error("Malformed multibyte sequence at offset {0}")]
    BadMultibyte(usize),
    #[error("Graph walk exceeded {0} steps")]
    TooManySteps(usize),
    #[error("Graph nesting deeper than {MAX_DEPTH}")]
    TooDeep,
}

/// One key stored in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Vec<u8>,
    pub value: u8,
}

/// Symbol decoding state across multibyte characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decode {
    Normal,
    Lead,
    Continuation(usize),
}

struct Walker<'g> {
    graph: &'g [u8],
    key: Vec<u8>,
    out: Vec<Entry>,
    steps: usize,
    max_steps: usize,
}

/// Collect all entries of `graph` in graph order.
pub fn entries(graph: &[u8]) -> Result<Vec<Entry>, WalkError> {
    let mut walker = Walker {
        graph,
        key: Vec::new(),
        out: Vec::new(),
        steps: 0,
        max_steps: graph.len().saturating_mul(MAX_STEPS_PER_BYTE).max(1 << 16),
    };
    if !graph.is_empty() {
        walker.links(0, Decode::Normal, 0)?;
    }
    Ok(walker.out)
}

impl<'g> Walker<'g> {
    fn tick(&mut self) -> Result<(), WalkError> {
        self.steps += 1;
        if self.steps > self.max_steps {
            return Err(WalkError::TooManySteps(self.max_steps));
        }
        Ok(())
    }

    fn links(&mut self, start: usize, state: Decode, depth: usize) -> Result<(), WalkError> {
        if depth > MAX_DEPTH {
            return Err(WalkError::TooDeep);
        }
        let mut pos = start;
        let mut offset = start;
        loop {
            self.tick()?;
            let (distance, consumed, last) =
                read_link(self.graph, pos).ok_or(WalkError::Truncated(pos))?;
            offset = offset.saturating_add(distance);
            self.node(offset, state, depth)?;
            if last {
                return Ok(());
            }
            pos += consumed;
        }
    }

    fn node(&mut self, mut at: usize, mut state: Decode, depth: usize) -> Result<(), WalkError> {
        let prefix_len = self.key.len();
        loop {
            self.tick()?;
            let b = *self.graph.get(at).ok_or(WalkError::Truncated(at))?;
            if state == Decode::Normal && is_value_byte(b) {
                self.out.push(Entry {
                    key: self.key.clone(),
                    value: b & node::VALUE_BITS,
                });
                break;
            }
            state = self.push_symbol(b & !node::END_OF_LABEL, state, at)?;
            at += 1;
            if b & node::END_OF_LABEL != 0 {
                self.links(at, state, depth + 1)?;
                break;
            }
        }
        self.key.truncate(prefix_len);
        Ok(())
    }

    fn push_symbol(&mut self, sym: u8, state: Decode, at: usize) -> Result<Decode, WalkError> {
        match state {
            Decode::Normal if sym == node::MULTIBYTE => Ok(Decode::Lead),
            Decode::Normal => {
                self.key.push(sym);
                Ok(Decode::Normal)
            }
            Decode::Lead => {
                let lead = sym ^ node::LEAD_XOR;
                let len = multibyte_length(lead);
                if len < 2 {
                    return Err(WalkError::BadMultibyte(at));
                }
                self.key.push(lead);
                Ok(Decode::Continuation(len - 1))
            }
            Decode::Continuation(remaining) => {
                self.key.push(sym ^ node::CONT_XOR);
                Ok(if remaining > 1 {
                    Decode::Continuation(remaining - 1)
                } else {
                    Decode::Normal
                })
            }
        }
    }
}
