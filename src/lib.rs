//! huffpack: lossless byte-stream compression with deterministic Huffman codes.
//!
//! A compressed file is laid out as:
//! - an ASCII header of `token:count` pairs, terminated by a blank line
//! - the bit-packed payload, most significant bit first
//! - one trailing byte holding the number of padding bits (0-7)
//!
//! The same frequency table always yields the same tree and codes, so the
//! decoder rebuilds the encoder's tree from the header alone.

pub mod cli;
pub mod config;
pub mod error;
pub mod frequency;
pub mod header;
pub mod huffman;
pub mod payload;
pub mod priority_queue;

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::CompressionConfig;
use crate::error::CompressError;

pub use crate::frequency::FrequencyTable;
pub use crate::huffman::{Code, CodeTable, HuffNode, HuffmanTree};
pub use crate::payload::PayloadSummary;
pub use crate::priority_queue::MinPriorityQueue;

/// Sizes of one encoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedSize {
    pub header_bytes: u64,
    pub payload: PayloadSummary,
}

impl EncodedSize {
    pub fn total(&self) -> u64 {
        self.header_bytes + self.payload.written()
    }
}

/// Compressed output container
#[derive(Debug, Clone)]
pub struct CompressedOutput {
    pub data: Vec<u8>,
    pub stats: CompressionStats,
}

/// Result of compressing one file
#[derive(Debug, Clone)]
pub struct CompressedFile {
    pub stats: CompressionStats,
    pub codes: CodeTable,
}

/// Statistics about one compression run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionStats {
    pub original_size: u64,
    pub compressed_size: u64,
    pub ratio: f64,
    /// Shannon entropy of the input in bits per byte.
    pub entropy_bits: f64,
    pub distinct_symbols: usize,
    pub padding_bits: u8,
}

impl CompressionStats {
    fn new(table: &FrequencyTable, size: &EncodedSize) -> Self {
        let original_size = table.total();
        let compressed_size = size.total();
        let ratio = if original_size == 0 {
            1.0
        } else {
            compressed_size as f64 / original_size as f64
        };
        Self {
            original_size,
            compressed_size,
            ratio,
            entropy_bits: table.entropy(),
            distinct_symbols: table.len(),
            padding_bits: size.payload.padding,
        }
    }
}

/// Build the Huffman tree for a frequency table.
pub fn build_tree(table: &FrequencyTable) -> Result<HuffmanTree, CompressError> {
    HuffmanTree::from_frequencies(table)
}

/// Derive the code table of a built tree.
pub fn build_codes(tree: &HuffmanTree) -> CodeTable {
    tree.build_codes()
}

/// Write a complete compressed stream: header, payload and padding trailer.
///
/// `tree` and `codes` must have been built from `table`, and `input` must
/// yield the bytes `table` was counted from.
pub fn encode<R: Read, W: Write>(
    tree: &HuffmanTree,
    codes: &CodeTable,
    table: &FrequencyTable,
    input: R,
    output: &mut W,
    buffer_size: usize,
) -> Result<EncodedSize, CompressError> {
    if tree.frequency() != table.total() {
        return Err(CompressError::InvalidArgument(format!(
            "tree total {} does not match frequency table total {}",
            tree.frequency(),
            table.total()
        )));
    }
    let header_bytes = header::write_header(output, table)? as u64;
    let payload = payload::write_payload(codes, input, output, buffer_size)?;
    Ok(EncodedSize {
        header_bytes,
        payload,
    })
}

/// Read a complete compressed stream and write the decoded bytes.
///
/// Returns the number of bytes written to `output`.
pub fn decode<R: BufRead, W: Write>(mut input: R, output: &mut W) -> Result<u64, CompressError> {
    let table = header::read_header(&mut input)?;
    let tree = HuffmanTree::from_frequencies(&table)?;

    let mut tail = Vec::new();
    input.read_to_end(&mut tail)?;
    let (payload, padding) = payload::split_payload(&tail)?;
    debug!(
        symbols = table.len(),
        payload_bytes = payload.len(),
        padding,
        "read compressed stream"
    );
    tree.decode_to(payload, padding, output)
}

/// The main compressor engine
#[derive(Debug, Clone, Default)]
pub struct Compressor {
    config: CompressionConfig,
}

impl Compressor {
    /// Create a new compressor with the given configuration
    pub fn new(config: CompressionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Compress an in-memory buffer
    pub fn compress(&self, data: &[u8]) -> Result<CompressedOutput, CompressError> {
        if data.is_empty() {
            return Err(CompressError::EmptyInput);
        }
        self.check_size(data.len() as u64)?;

        let table = FrequencyTable::from_bytes(data);
        let tree = build_tree(&table)?;
        let codes = build_codes(&tree);

        let mut out = Vec::with_capacity(data.len() / 2 + 64);
        let size = encode(&tree, &codes, &table, data, &mut out, self.config.read_buffer_size)?;
        Ok(CompressedOutput {
            data: out,
            stats: CompressionStats::new(&table, &size),
        })
    }

    /// Decompress an in-memory compressed stream
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressError> {
        let mut out = Vec::with_capacity(data.len() * 2);
        decode(Cursor::new(data), &mut out)?;
        Ok(out)
    }

    /// Compress `input` into `output`.
    ///
    /// The input is read twice: once to count bytes, once to encode them.
    /// `output` is replaced only if compression succeeds.
    pub fn compress_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<CompressedFile, CompressError> {
        let (input, output) = (input.as_ref(), output.as_ref());
        self.check_size(fs::metadata(input)?.len())?;

        let table = FrequencyTable::from_path(input, self.config.read_buffer_size)?;
        if table.is_empty() {
            return Err(CompressError::EmptyInput);
        }
        let tree = build_tree(&table)?;
        let codes = build_codes(&tree);

        let reader = File::open(input)?;
        let size = write_atomically(output, |writer| {
            encode(&tree, &codes, &table, reader, writer, self.config.read_buffer_size)
        })?;

        let stats = CompressionStats::new(&table, &size);
        info!(
            input = %input.display(),
            output = %output.display(),
            original = stats.original_size,
            compressed = stats.compressed_size,
            "compressed file"
        );
        Ok(CompressedFile { stats, codes })
    }

    /// Decompress `input` into `output`. Returns the number of bytes written.
    ///
    /// `output` is replaced only if the whole stream decodes.
    pub fn decompress_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<u64, CompressError> {
        let (input, output) = (input.as_ref(), output.as_ref());
        let reader = BufReader::with_capacity(self.config.read_buffer_size, File::open(input)?);
        let written = write_atomically(output, |writer| decode(reader, writer))?;

        info!(
            input = %input.display(),
            output = %output.display(),
            bytes = written,
            "decompressed file"
        );
        Ok(written)
    }

    fn check_size(&self, len: u64) -> Result<(), CompressError> {
        if len > self.config.max_input_size {
            return Err(CompressError::InvalidArgument(format!(
                "input of {} bytes exceeds the {} byte limit",
                len, self.config.max_input_size
            )));
        }
        Ok(())
    }
}

/// Run `write` against a temporary file next to `output`, then rename it over
/// `output`. On error the temporary file is removed and `output` is untouched.
fn write_atomically<T, F>(output: &Path, write: F) -> Result<T, CompressError>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<T, CompressError>,
{
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    let value = {
        let mut writer = BufWriter::new(temp.as_file_mut());
        let value = write(&mut writer)?;
        writer.flush()?;
        value
    };
    temp.persist(output).map_err(|e| CompressError::IoError(e.error))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_scenario_bytes() {
        let compressor = Compressor::default();
        let result = compressor.compress(b"AAAB").unwrap();
        assert_eq!(result.data, b"A:3 B:1\n\n\x10\x04".to_vec());
        assert_eq!(result.stats.original_size, 4);
        assert_eq!(result.stats.compressed_size, result.data.len() as u64);
        assert_eq!(result.stats.padding_bits, 4);
        assert_eq!(result.stats.distinct_symbols, 2);
    }

    #[test]
    fn test_compress_empty() {
        let compressor = Compressor::default();
        let result = compressor.compress(b"");
        assert!(matches!(result, Err(CompressError::EmptyInput)));
    }

    #[test]
    fn test_roundtrip() {
        let compressor = Compressor::default();
        let data = b"the quick brown fox jumps over the lazy dog";
        let compressed = compressor.compress(data).unwrap();
        let decompressed = compressor.decompress(&compressed.data).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn test_roundtrip_single_symbol() {
        let compressor = Compressor::default();
        let data = vec![0u8; 1000];
        let compressed = compressor.compress(&data).unwrap();
        // 1000 one-bit codes pack into 125 bytes with no padding
        assert_eq!(compressed.stats.padding_bits, 0);
        assert_eq!(compressor.decompress(&compressed.data).unwrap(), data);
    }

    #[test]
    fn test_compression_ratio() {
        let compressor = Compressor::default();
        let data = "aaaaaaaaab".repeat(100);
        let result = compressor.compress(data.as_bytes()).unwrap();
        assert!(result.stats.ratio < 0.5, "repetitive data should compress well");
    }

    #[test]
    fn test_entropy_in_stats() {
        let compressor = Compressor::default();
        let uniform = vec![42u8; 100];
        let result = compressor.compress(&uniform).unwrap();
        assert!(result.stats.entropy_bits < 0.01, "uniform data should have ~0 entropy");
    }

    #[test]
    fn test_size_limit() {
        let compressor = Compressor::new(CompressionConfig {
            max_input_size: 4,
            ..CompressionConfig::default()
        });
        assert!(compressor.compress(b"abcd").is_ok());
        assert!(matches!(
            compressor.compress(b"abcde"),
            Err(CompressError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_encode_rejects_foreign_tree() {
        let table = FrequencyTable::from_bytes(b"AAAB");
        let other = build_tree(&FrequencyTable::from_bytes(b"AB")).unwrap();
        let codes = build_codes(&other);
        let mut out = Vec::new();
        let err = encode(&other, &codes, &table, &b"AAAB"[..], &mut out, 64).unwrap_err();
        assert!(matches!(err, CompressError::InvalidArgument(_)));
    }

    #[test]
    fn test_decode_bad_padding_trailer() {
        let err = decode(Cursor::new(b"A:3 B:1\n\n\x10\x08".to_vec()), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, CompressError::MalformedPadding(8)));
    }

    #[test]
    fn test_failed_write_leaves_output_alone() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("kept.out");
        fs::write(&output, b"previous contents").unwrap();

        let result: Result<(), _> = write_atomically(&output, |writer| {
            writer.write_all(b"half written")?;
            Err(CompressError::CorruptPayload { bit_offset: 3 })
        });
        assert!(matches!(result, Err(CompressError::CorruptPayload { bit_offset: 3 })));
        assert_eq!(fs::read(&output).unwrap(), b"previous contents");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_decode_empty_header_table() {
        let err = decode(Cursor::new(b"\n\x00".to_vec()), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, CompressError::EmptyInput));
    }
}
