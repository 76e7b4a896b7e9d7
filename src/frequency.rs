//! Per-file byte frequency counting

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use crate::error::CompressError;

/// Byte value -> occurrence count, ordered by byte value.
///
/// Zero counts are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<u8, u64>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        let mut freq = [0u64; 256];
        for &b in data {
            freq[b as usize] += 1;
        }
        Self::from_array(&freq)
    }

    /// Count bytes from a reader in chunks of `buffer_size`.
    pub fn from_reader<R: Read>(mut reader: R, buffer_size: usize) -> Result<Self, CompressError> {
        let mut freq = [0u64; 256];
        let mut buffer = vec![0u8; buffer_size.max(1)];
        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            for &b in &buffer[..n] {
                freq[b as usize] += 1;
            }
        }
        Ok(Self::from_array(&freq))
    }

    pub fn from_path(path: impl AsRef<Path>, buffer_size: usize) -> Result<Self, CompressError> {
        let file = File::open(path)?;
        Self::from_reader(file, buffer_size)
    }

    fn from_array(freq: &[u64; 256]) -> Self {
        let counts = freq
            .iter()
            .enumerate()
            .filter(|&(_, &f)| f > 0)
            .map(|(i, &f)| (i as u8, f))
            .collect();
        Self { counts }
    }

    /// Record `count` occurrences of `symbol`. A zero count removes the entry.
    pub fn insert(&mut self, symbol: u8, count: u64) {
        if count == 0 {
            self.counts.remove(&symbol);
        } else {
            self.counts.insert(symbol, count);
        }
    }

    pub fn get(&self, symbol: u8) -> Option<u64> {
        self.counts.get(&symbol).copied()
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts, i.e. the length of the counted input.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Entries in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts.iter().map(|(&s, &f)| (s, f))
    }

    /// Shannon entropy of the counted input in bits per byte.
    pub fn entropy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let len = total as f64;
        let mut entropy = 0.0;
        for (_, f) in self.iter() {
            let p = f as f64 / len;
            entropy -= p * p.log2();
        }
        entropy
    }
}

impl FromIterator<(u8, u64)> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = (u8, u64)>>(iter: I) -> Self {
        let mut table = FrequencyTable::new();
        for (symbol, count) in iter {
            table.insert(symbol, count);
        }
        table
    }
}
