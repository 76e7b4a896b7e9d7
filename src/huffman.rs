//! Huffman tree construction, code derivation and bit-level decoding
//!
//! Trees are built deterministically: equal frequencies are ordered by the
//! lowest byte value beneath each subtree, so two builds over the same
//! frequency table always produce the same shape and the same codes.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{Cursor, Write};

use bitstream_io::{BigEndian, BitRead, BitReader};
use tracing::{debug, trace};

use crate::error::CompressError;
use crate::frequency::FrequencyTable;
use crate::priority_queue::{Entry, MinPriorityQueue};

const OUTPUT_CHUNK: usize = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffNode {
    Leaf {
        symbol: u8,
        frequency: u64,
    },
    Internal {
        frequency: u64,
        /// Every symbol reachable beneath this node, left subtree first.
        symbols: Vec<u8>,
        left: Box<HuffNode>,
        right: Box<HuffNode>,
    },
}

impl HuffNode {
    pub fn leaf(symbol: u8, frequency: u64) -> Self {
        HuffNode::Leaf { symbol, frequency }
    }

    /// Join two subtrees under a new parent. Both inputs are consumed.
    pub fn merge(left: HuffNode, right: HuffNode) -> Result<Self, CompressError> {
        let frequency = left
            .frequency()
            .checked_add(right.frequency())
            .ok_or(CompressError::FrequencyOverflow)?;
        let mut symbols = Vec::with_capacity(left.symbols().len() + right.symbols().len());
        symbols.extend_from_slice(left.symbols());
        symbols.extend_from_slice(right.symbols());
        Ok(HuffNode::Internal {
            frequency,
            symbols,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn frequency(&self) -> u64 {
        match self {
            HuffNode::Leaf { frequency, .. } | HuffNode::Internal { frequency, .. } => *frequency,
        }
    }

    pub fn symbols(&self) -> &[u8] {
        match self {
            HuffNode::Leaf { symbol, .. } => std::slice::from_ref(symbol),
            HuffNode::Internal { symbols, .. } => symbols,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, HuffNode::Leaf { .. })
    }

    pub fn children(&self) -> Option<(&HuffNode, &HuffNode)> {
        match self {
            HuffNode::Leaf { .. } => None,
            HuffNode::Internal { left, right, .. } => Some((&**left, &**right)),
        }
    }
}

/// Root-to-leaf path of one symbol; `false` is a left edge (`0`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Code(Vec<bool>);

impl Code {
    pub fn bits(&self) -> &[bool] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_prefix_of(&self, other: &Code) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl From<Vec<bool>> for Code {
    fn from(bits: Vec<bool>) -> Self {
        Code(bits)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.0 {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Symbol -> code mapping derived from a built tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable {
    codes: BTreeMap<u8, Code>,
}

impl CodeTable {
    pub fn get(&self, symbol: u8) -> Option<&Code> {
        self.codes.get(&symbol)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &Code)> + '_ {
        self.codes.iter().map(|(&s, c)| (s, c))
    }

    /// True when no code is a prefix of another.
    pub fn is_prefix_free(&self) -> bool {
        let codes: Vec<&Code> = self.codes.values().collect();
        codes.iter().enumerate().all(|(i, a)| {
            codes
                .iter()
                .enumerate()
                .all(|(j, b)| i == j || !a.is_prefix_of(b))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    root: HuffNode,
}

impl HuffmanTree {
    /// Build the tree for a frequency table.
    ///
    /// Each symbol enters the queue keyed by `(frequency, byte value)`. Merged
    /// subtrees take the smaller tie key of their two parts, and the entry
    /// popped second becomes the left child.
    pub fn from_frequencies(table: &FrequencyTable) -> Result<Self, CompressError> {
        if table.is_empty() {
            return Err(CompressError::EmptyInput);
        }

        let leaves = table
            .iter()
            .map(|(symbol, freq)| Entry::new(freq, u32::from(symbol), HuffNode::leaf(symbol, freq)))
            .collect();
        let mut queue = MinPriorityQueue::build_from(leaves);

        while queue.len() > 1 {
            let first = queue.pop()?;
            let second = queue.pop()?;
            let tie = first.tie.min(second.tie);
            let merged = HuffNode::merge(second.value, first.value)?;
            trace!(
                frequency = merged.frequency(),
                tie,
                symbols = merged.symbols().len(),
                "merged subtrees"
            );
            queue.push(merged.frequency(), tie, merged);
        }

        let root = queue.pop()?.value;
        debug!(
            symbols = table.len(),
            total = root.frequency(),
            "built huffman tree"
        );
        Ok(Self { root })
    }

    pub fn root(&self) -> &HuffNode {
        &self.root
    }

    /// Total frequency of all symbols in the tree.
    pub fn frequency(&self) -> u64 {
        self.root.frequency()
    }

    /// Derive every symbol's code. A tree with a single leaf gets the code `0`.
    pub fn build_codes(&self) -> CodeTable {
        let mut codes = BTreeMap::new();
        match &self.root {
            HuffNode::Leaf { symbol, .. } => {
                codes.insert(*symbol, Code(vec![false]));
            }
            root => collect_codes(root, &mut Vec::new(), &mut codes),
        }
        CodeTable { codes }
    }

    /// Decode a bit-packed payload into a byte vector.
    pub fn decode(&self, payload: &[u8], padding: u8) -> Result<Vec<u8>, CompressError> {
        let mut out = Vec::with_capacity(payload.len() * 2);
        self.decode_to(payload, padding, &mut out)?;
        Ok(out)
    }

    /// Decode a bit-packed payload, writing symbols to `out`.
    ///
    /// Bits are read most significant first. The last `padding` bits of the
    /// final byte are ignored. Returns the number of symbols written.
    pub fn decode_to<W: Write>(
        &self,
        payload: &[u8],
        padding: u8,
        out: &mut W,
    ) -> Result<u64, CompressError> {
        if padding > 7 {
            return Err(CompressError::MalformedPadding(padding));
        }
        if payload.is_empty() && padding != 0 {
            return Err(CompressError::MalformedPadding(padding));
        }

        let total_bits = payload.len() as u64 * 8 - u64::from(padding);
        let mut reader = BitReader::endian(Cursor::new(payload), BigEndian);
        let mut buf = Vec::with_capacity(OUTPUT_CHUNK);
        let mut emitted = 0u64;

        if let HuffNode::Leaf { symbol, .. } = self.root {
            for offset in 0..total_bits {
                if reader.read_bit()? {
                    return Err(CompressError::CorruptPayload { bit_offset: offset });
                }
                buf.push(symbol);
                if buf.len() == OUTPUT_CHUNK {
                    out.write_all(&buf)?;
                    buf.clear();
                }
            }
            out.write_all(&buf)?;
            return Ok(total_bits);
        }

        let mut node = &self.root;
        for offset in 0..total_bits {
            let bit = reader.read_bit()?;
            node = match node {
                HuffNode::Internal { left, right, .. } => {
                    if bit {
                        &**right
                    } else {
                        &**left
                    }
                }
                HuffNode::Leaf { .. } => {
                    return Err(CompressError::CorruptPayload { bit_offset: offset })
                }
            };
            if let HuffNode::Leaf { symbol, .. } = node {
                buf.push(*symbol);
                emitted += 1;
                node = &self.root;
                if buf.len() == OUTPUT_CHUNK {
                    out.write_all(&buf)?;
                    buf.clear();
                }
            }
        }
        out.write_all(&buf)?;

        if !std::ptr::eq(node, &self.root) {
            return Err(CompressError::TruncatedStream("bit stream ended inside a code"));
        }
        Ok(emitted)
    }
}

fn collect_codes(node: &HuffNode, prefix: &mut Vec<bool>, codes: &mut BTreeMap<u8, Code>) {
    match node {
        HuffNode::Leaf { symbol, .. } => {
            codes.insert(*symbol, Code(prefix.clone()));
        }
        HuffNode::Internal { left, right, .. } => {
            prefix.push(false);
            collect_codes(left, prefix, codes);
            prefix.pop();
            prefix.push(true);
            collect_codes(right, prefix, codes);
            prefix.pop();
        }
    }
}
