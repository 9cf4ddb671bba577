//! DAFSA graph builder
//!
//! Turns a rule set into the byte graph read by `psl_core::dafsa::lookup`.
//! Keys become words of symbols terminated by their flag value. The words
//! are stored in a trie which is then minimized by merging equivalent
//! states. Each edge of the minimized automaton becomes a labeled node,
//! single-parent chains are joined into multi-character labels, and the
//! nodes are emitted back to front so that every link points forward.

use std::collections::{BTreeMap, HashMap};

use psl_core::dafsa::{file_header, link, node};
use psl_core::{Rule, RuleFlags};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("No rules to compile")]
    Empty,
    #[error("Invalid byte 0x{byte:02x} in key '{key}'")]
    InvalidKeyByte { key: String, byte: u8 },
    #[error("Non-ASCII key '{0}' cannot be stored in an ASCII graph")]
    NonAsciiKey(String),
    #[error("Rule value {value} of '{key}' does not fit in a node")]
    ValueOutOfRange { key: String, value: u8 },
    #[error("Link distance {0} exceeds the three byte offset range")]
    OffsetTooLarge(usize),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DafsaOptions {
    /// Store non-ASCII keys as raw UTF-8 instead of rejecting them.
    pub utf_mode: bool,
}

/// Build a bare graph (no file header).
pub fn build_dafsa(rules: &[Rule], options: &DafsaOptions) -> Result<Vec<u8>, BuildError> {
    if rules.is_empty() {
        return Err(BuildError::Empty);
    }

    let mut merged: BTreeMap<&str, RuleFlags> = BTreeMap::new();
    for rule in rules {
        *merged.entry(rule.key.as_str()).or_insert_with(RuleFlags::empty) |= rule.flags;
    }

    let mut words = Vec::with_capacity(merged.len());
    for (key, flags) in &merged {
        words.push(encode_word(key, flags.bits(), options.utf_mode)?);
    }

    let graph = DafsaBuilder::from_words(&words).encode(options.utf_mode)?;

    log::info!(
        "Built {} byte {} graph from {} keys",
        graph.len(),
        if options.utf_mode { "utf-8" } else { "ascii" },
        merged.len()
    );

    Ok(graph)
}

/// Build a graph prefixed with the file header, ready to be written out.
pub fn build_dafsa_file(rules: &[Rule], options: &DafsaOptions) -> Result<Vec<u8>, BuildError> {
    let graph = build_dafsa(rules, options)?;
    let mut out = Vec::with_capacity(graph.len() + 16);
    out.extend_from_slice(&file_header());
    out.extend_from_slice(&graph);
    Ok(out)
}

// =============================================================================
// Words
// =============================================================================

/// Encode a key as graph symbols followed by its value symbol.
fn encode_word(key: &str, value: u8, utf_mode: bool) -> Result<Vec<u8>, BuildError> {
    if value > node::VALUE_BITS {
        return Err(BuildError::ValueOutOfRange {
            key: key.to_string(),
            value,
        });
    }

    let mut word = Vec::with_capacity(key.len() + 4);
    for ch in key.chars() {
        let mut buf = [0u8; 4];
        let bytes = ch.encode_utf8(&mut buf).as_bytes();

        if let [b] = bytes {
            if !(0x20..0x7F).contains(b) {
                return Err(BuildError::InvalidKeyByte {
                    key: key.to_string(),
                    byte: *b,
                });
            }
            word.push(*b);
            continue;
        }

        if !utf_mode {
            return Err(BuildError::NonAsciiKey(key.to_string()));
        }
        word.push(node::MULTIBYTE);
        word.push(bytes[0] ^ node::LEAD_XOR);
        word.extend(bytes[1..].iter().map(|b| b ^ node::CONT_XOR));
    }
    word.push(value);
    Ok(word)
}

// =============================================================================
// Graph construction
// =============================================================================

/// Outgoing edges of an automaton state. `None` marks the sink reached by a
/// value symbol.
type Edges = Vec<(u8, Option<usize>)>;

#[derive(Debug, Clone)]
struct Node {
    label: Vec<u8>,
    children: Vec<usize>,
}

struct DafsaBuilder {
    nodes: Vec<Node>,
    roots: Vec<usize>,
}

impl DafsaBuilder {
    fn from_words(words: &[Vec<u8>]) -> Self {
        let (states, root) = minimize(&build_trie(words));

        let mut labeled = Labeler {
            states: &states,
            nodes: Vec::new(),
            index: HashMap::new(),
        };
        let roots: Vec<usize> = states[root]
            .iter()
            .map(|&(sym, target)| labeled.node_for(sym, target))
            .collect();

        let mut builder = Self {
            nodes: labeled.nodes,
            roots,
        };
        builder.join_labels();
        builder
    }

    /// Merge every node into its only child when that child has no other
    /// parent.
    fn join_labels(&mut self) {
        let mut parents = vec![0usize; self.nodes.len()];
        for &root in &self.roots {
            parents[root] += 1;
        }
        for node in &self.nodes {
            for &child in &node.children {
                parents[child] += 1;
            }
        }

        // Children are created before their parents, so a forward pass sees
        // every child already joined. Indices are preserved.
        let mut out: Vec<Node> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let joined = match node.children.as_slice() {
                [only] if parents[*only] == 1 => {
                    let child = &out[*only];
                    let mut label = node.label.clone();
                    label.extend_from_slice(&child.label);
                    Node {
                        label,
                        children: child.children.clone(),
                    }
                }
                _ => node.clone(),
            };
            out.push(joined);
        }
        self.nodes = out;
    }

    /// Reachable nodes, parents before children.
    fn top_sort(&self) -> Vec<usize> {
        let mut incoming = vec![0usize; self.nodes.len()];
        let mut seen = vec![false; self.nodes.len()];
        let mut stack: Vec<usize> = Vec::new();
        for &root in &self.roots {
            if !seen[root] {
                seen[root] = true;
                stack.push(root);
            }
        }
        while let Some(idx) = stack.pop() {
            for &child in &self.nodes[idx].children {
                incoming[child] += 1;
                if !seen[child] {
                    seen[child] = true;
                    stack.push(child);
                }
            }
        }

        let mut waiting: Vec<usize> = self
            .roots
            .iter()
            .copied()
            .filter(|&root| incoming[root] == 0)
            .collect();

        let mut order = Vec::new();
        while let Some(idx) = waiting.pop() {
            order.push(idx);
            for &child in &self.nodes[idx].children {
                incoming[child] -= 1;
                if incoming[child] == 0 {
                    waiting.push(child);
                }
            }
        }
        order
    }

    fn encode(&self, utf_mode: bool) -> Result<Vec<u8>, BuildError> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; self.nodes.len()];

        // Built in reverse: leaves first, so link targets are known.
        for &idx in self.top_sort().iter().rev() {
            let node = &self.nodes[idx];
            let falls_through =
                matches!(node.children.as_slice(), [only] if offsets[*only] == output.len());
            if falls_through {
                output.extend(node.label.iter().rev());
            } else {
                let links = encode_links(&node.children, &offsets, output.len())?;
                output.extend_from_slice(&links);
                output.extend_from_slice(&encode_label(&node.label));
            }
            offsets[idx] = output.len();
        }

        let links = encode_links(&self.roots, &offsets, output.len())?;
        output.extend_from_slice(&links);
        output.reverse();

        if utf_mode {
            output.push(node::UTF_MODE_MARK);
        }
        Ok(output)
    }
}

fn build_trie(words: &[Vec<u8>]) -> Vec<Edges> {
    let mut trie: Vec<Edges> = vec![Vec::new()];
    for word in words {
        let Some((&value, body)) = word.split_last() else {
            continue;
        };
        let mut state = 0;
        for &sym in body {
            let existing = trie[state]
                .iter()
                .find_map(|&(s, target)| if s == sym { target } else { None });
            state = match existing {
                Some(next) => next,
                None => {
                    let next = trie.len();
                    trie.push(Vec::new());
                    trie[state].push((sym, Some(next)));
                    next
                }
            };
        }
        trie[state].push((value, None));
    }
    trie
}

/// Merge trie states with identical outgoing edges. Returns the distinct
/// states and the index of the root.
fn minimize(trie: &[Edges]) -> (Vec<Edges>, usize) {
    let mut state_of = vec![0usize; trie.len()];
    let mut states: Vec<Edges> = Vec::new();
    let mut registry: HashMap<Edges, usize> = HashMap::new();

    // Trie children are always created after their parent.
    for idx in (0..trie.len()).rev() {
        let mut signature: Edges = trie[idx]
            .iter()
            .map(|&(sym, target)| (sym, target.map(|t| state_of[t])))
            .collect();
        signature.sort_unstable();

        let id = match registry.get(&signature) {
            Some(&id) => id,
            None => {
                let id = states.len();
                states.push(signature.clone());
                registry.insert(signature, id);
                id
            }
        };
        state_of[idx] = id;
    }

    (states, state_of[0])
}

/// One node per distinct `(symbol, target state)` edge.
struct Labeler<'s> {
    states: &'s [Edges],
    nodes: Vec<Node>,
    index: HashMap<(u8, Option<usize>), usize>,
}

impl Labeler<'_> {
    fn node_for(&mut self, sym: u8, target: Option<usize>) -> usize {
        if let Some(&idx) = self.index.get(&(sym, target)) {
            return idx;
        }
        let states = self.states;
        let children = match target {
            Some(state) => states[state]
                .iter()
                .map(|&(s, t)| self.node_for(s, t))
                .collect(),
            None => Vec::new(),
        };
        let idx = self.nodes.len();
        self.nodes.push(Node {
            label: vec![sym],
            children,
        });
        self.index.insert((sym, target), idx);
        idx
    }
}

// =============================================================================
// Byte encoding
// =============================================================================

/// Reversed label with the end-of-label bit on its final character.
fn encode_label(label: &[u8]) -> Vec<u8> {
    let mut buf: Vec<u8> = label.iter().rev().copied().collect();
    if let Some(first) = buf.first_mut() {
        *first |= node::END_OF_LABEL;
    }
    buf
}

/// Reversed link list for `children`, to be placed at `current`.
///
/// Distances are relative to the previous link target, so the encoded
/// length depends on where the list lands. Start from the widest guess and
/// shrink until the length is stable.
fn encode_links(children: &[usize], offsets: &[usize], current: usize) -> Result<Vec<u8>, BuildError> {
    if children.is_empty() {
        return Ok(Vec::new());
    }

    let mut targets: Vec<usize> = children.iter().map(|&c| offsets[c]).collect();
    targets.sort_unstable_by(|a, b| b.cmp(a));

    let mut guess = 3 * targets.len();
    loop {
        let mut offset = current + guess;
        let mut buf: Vec<u8> = Vec::with_capacity(guess);
        let mut last = 0;

        for &target in &targets {
            last = buf.len();
            let distance = offset - target;
            if distance < link::MAX_1 {
                buf.push(distance as u8);
            } else if distance < link::MAX_2 {
                buf.push(link::WIDE_2 | (distance >> 8) as u8);
                buf.push((distance & 0xFF) as u8);
            } else if distance < link::MAX_3 {
                buf.push(link::WIDE_3 | (distance >> 16) as u8);
                buf.push(((distance >> 8) & 0xFF) as u8);
                buf.push((distance & 0xFF) as u8);
            } else {
                return Err(BuildError::OffsetTooLarge(distance));
            }
            offset -= distance;
        }

        if buf.len() == guess {
            buf[last] |= link::LAST;
            buf.reverse();
            return Ok(buf);
        }
        guess = buf.len();
    }
}
