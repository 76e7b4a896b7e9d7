//! Integration tests for huffpack

use std::fs;
use std::io::Cursor;

use clap::Parser;
use huffpack::cli::{self, Args, Invocation};
use huffpack::config::CompressionConfig;
use huffpack::error::CompressError;
use huffpack::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn roundtrip(data: &[u8]) -> Vec<u8> {
    let compressor = Compressor::default();
    let compressed = compressor.compress(data).unwrap();
    compressor.decompress(&compressed.data).unwrap()
}

#[test]
fn test_full_lifecycle() {
    let data = b"the quick brown fox jumps over the lazy dog".repeat(50);
    assert_eq!(roundtrip(&data), data);
}

#[test]
fn test_scenario_file_layout() {
    let compressor = Compressor::default();
    let compressed = compressor.compress(&[0x41, 0x41, 0x41, 0x42]).unwrap();
    assert_eq!(compressed.data, b"A:3 B:1\n\n\x10\x04");
    assert_eq!(
        compressor.decompress(&compressed.data).unwrap(),
        vec![0x41, 0x41, 0x41, 0x42]
    );
}

#[test]
fn test_random_roundtrips() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for len in [1usize, 2, 7, 8, 9, 255, 1024, 10_000] {
        let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        assert_eq!(roundtrip(&data), data, "length {}", len);
    }
}

#[test]
fn test_skewed_random_roundtrips() {
    let mut rng = StdRng::seed_from_u64(42);
    for alphabet in [1u8, 2, 3, 5, 16] {
        let data: Vec<u8> = (0..5000)
            .map(|_| {
                let r: f64 = rng.gen();
                ((r * r * r) * f64::from(alphabet)) as u8
            })
            .collect();
        assert_eq!(roundtrip(&data), data, "alphabet {}", alphabet);
    }
}

#[test]
fn test_all_byte_values() {
    let data: Vec<u8> = (0..=255).cycle().take(2000).collect();
    assert_eq!(roundtrip(&data), data);
}

#[test]
fn test_special_header_bytes_roundtrip() {
    let data = b"key: value\\path\r\n\tindented \x00\x01\xff end".repeat(3);
    assert_eq!(roundtrip(&data), data);
}

#[test]
fn test_single_repeated_byte() {
    for len in [1usize, 7, 8, 9, 64] {
        let data = vec![b'z'; len];
        assert_eq!(roundtrip(&data), data, "length {}", len);
    }
}

#[test]
fn test_output_is_deterministic() {
    let compressor = Compressor::default();
    let data = b"determinism matters for interoperable output".repeat(20);
    let first = compressor.compress(&data).unwrap();
    let second = compressor.compress(&data).unwrap();
    assert_eq!(first.data, second.data);
}

#[test]
fn test_codes_independent_of_table_order() {
    let table = FrequencyTable::from_bytes(b"aaaabbbccd  ::\\\\");
    let shuffled: FrequencyTable = {
        let mut entries: Vec<(u8, u64)> = table.iter().collect();
        entries.reverse();
        entries.swap(0, 2);
        entries.into_iter().collect()
    };
    let a = build_codes(&build_tree(&table).unwrap());
    let b = build_codes(&build_tree(&shuffled).unwrap());
    assert_eq!(a, b);
    assert!(a.is_prefix_free());
}

#[test]
fn test_stream_encode_decode() {
    let data = b"streams in, streams out";
    let table = FrequencyTable::from_bytes(data);
    let tree = build_tree(&table).unwrap();
    let codes = build_codes(&tree);

    let mut compressed = Vec::new();
    let size = encode(&tree, &codes, &table, &data[..], &mut compressed, 4).unwrap();
    assert_eq!(size.total(), compressed.len() as u64);

    let mut restored = Vec::new();
    let written = decode(Cursor::new(&compressed), &mut restored).unwrap();
    assert_eq!(written, data.len() as u64);
    assert_eq!(restored, data);
}

#[test]
fn test_padding_byte_out_of_range() {
    let compressor = Compressor::default();
    let mut compressed = compressor.compress(b"padding check").unwrap().data;
    for bad in [8u8, 9, 0x80, 0xFF] {
        *compressed.last_mut().unwrap() = bad;
        let err = compressor.decompress(&compressed).unwrap_err();
        assert!(matches!(err, CompressError::MalformedPadding(p) if p == bad));
    }
}

#[test]
fn test_truncated_stream_detected() {
    let compressor = Compressor::default();
    let compressed = compressor.compress(b"abcc").unwrap().data;
    // c=0 b=10 a=11: payload 11 10 0 0, keep only "1" of the first code
    let header_len = compressed.len() - 2;
    let mut corrupt = compressed[..header_len].to_vec();
    corrupt.extend_from_slice(&[0b1000_0000, 7]);
    let err = compressor.decompress(&corrupt).unwrap_err();
    assert!(matches!(err, CompressError::TruncatedStream(_)));
}

#[test]
fn test_corrupt_header_rejected() {
    let compressor = Compressor::default();
    let err = compressor.decompress(b"A:3 \\q:1\n\n\x00\x00").unwrap_err();
    assert!(matches!(err, CompressError::InvalidHeaderToken { .. }));

    let err = compressor.decompress(b"A:3 B:1\n").unwrap_err();
    assert!(matches!(err, CompressError::TruncatedStream(_)));
}

#[test]
fn test_empty_input_error() {
    let compressor = Compressor::default();
    assert!(matches!(compressor.compress(b""), Err(CompressError::EmptyInput)));
}

#[test]
fn test_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.txt");
    let packed = dir.path().join("input.huff");
    let restored = dir.path().join("input.huff.out");

    let data = b"file based round trip with a small buffer\n".repeat(100);
    fs::write(&input, &data).unwrap();

    let compressor = Compressor::new(CompressionConfig {
        read_buffer_size: 13,
        ..CompressionConfig::default()
    });
    let result = compressor.compress_file(&input, &packed).unwrap();
    let stats = &result.stats;
    assert_eq!(stats.original_size, data.len() as u64);
    assert_eq!(stats.compressed_size, fs::metadata(&packed).unwrap().len());
    assert!(stats.ratio < 1.0);

    let written = compressor.decompress_file(&packed, &restored).unwrap();
    assert_eq!(written, data.len() as u64);
    assert_eq!(fs::read(&restored).unwrap(), data);

    // in-memory and file paths produce the same bytes
    let in_memory = compressor.compress(&data).unwrap();
    assert_eq!(fs::read(&packed).unwrap(), in_memory.data);
}

#[test]
fn test_empty_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("empty");
    fs::write(&input, b"").unwrap();
    let err = Compressor::default()
        .compress_file(&input, dir.path().join("empty.huff"))
        .unwrap_err();
    assert!(matches!(err, CompressError::EmptyInput));
}

#[test]
fn test_missing_file_propagates_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Compressor::default()
        .compress_file(dir.path().join("absent"), dir.path().join("absent.huff"))
        .unwrap_err();
    assert!(matches!(err, CompressError::IoError(_)));
    assert!(!dir.path().join("absent.huff").exists());
}

fn relaxed_config() -> CompressionConfig {
    CompressionConfig {
        strict_file_names: false,
        ..CompressionConfig::default()
    }
}

fn run_cli(argv: &[&str]) -> (anyhow::Result<()>, String) {
    let args = Args::try_parse_from(std::iter::once("huffpack").chain(argv.iter().copied())).unwrap();
    let config = relaxed_config();
    let invocation = Invocation::resolve(&args, &config).unwrap();
    let mut out = Vec::new();
    let result = cli::run(&args, &invocation, config, &mut out);
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn test_corrupt_input_keeps_existing_output() {
    let dir = tempfile::tempdir().unwrap();
    let packed = dir.path().join("bad.huff");
    let output = dir.path().join("bad.huff.out");
    fs::write(&packed, b"A:3 \\q:1\n\n\x10\x04").unwrap();
    fs::write(&output, b"keep me").unwrap();

    let (result, _) = run_cli(&["-d", packed.to_str().unwrap()]);
    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CompressError>(),
        Some(CompressError::InvalidHeaderToken { .. })
    ));
    assert_eq!(fs::read(&output).unwrap(), b"keep me");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[test]
fn test_failed_decompress_creates_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let packed = dir.path().join("cut.huff");
    fs::write(&packed, b"A:3 B:1\n\n").unwrap();

    let (result, _) = run_cli(&["-d", packed.to_str().unwrap()]);
    assert!(result.is_err());
    assert!(!dir.path().join("cut.huff.out").exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_compress_overwrites_existing_output_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("data.txt");
    let packed = dir.path().join("data.huff");
    fs::write(&input, b"AAAB").unwrap();
    fs::write(&packed, b"stale").unwrap();

    let (result, out) = run_cli(&["-c", input.to_str().unwrap()]);
    result.unwrap();
    assert!(out.is_empty());
    assert_eq!(fs::read(&packed).unwrap(), b"A:3 B:1\n\n\x10\x04".to_vec());
}

#[test]
fn test_print_codes_and_stats() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("scenario.txt");
    fs::write(&input, b"AAAB").unwrap();

    let (result, out) = run_cli(&["-c", input.to_str().unwrap(), "--print-codes", "--stats"]);
    result.unwrap();

    let (codes, json) = out.split_at(out.find('{').unwrap());
    assert_eq!(codes, "A\t0\nB\t1\n");
    let stats: CompressionStats = serde_json::from_str(json.trim()).unwrap();
    assert_eq!(stats.original_size, 4);
    assert_eq!(stats.compressed_size, 11);
    assert_eq!(stats.padding_bits, 4);
    assert_eq!(stats.distinct_symbols, 2);
}

#[test]
fn test_decompress_stats() {
    let dir = tempfile::tempdir().unwrap();
    let packed = dir.path().join("scenario.huff");
    let restored = dir.path().join("scenario.txt");
    fs::write(&packed, b"A:3 B:1\n\n\x10\x04").unwrap();

    let (result, out) = run_cli(&[
        "-d",
        packed.to_str().unwrap(),
        "-o",
        restored.to_str().unwrap(),
        "--stats",
    ]);
    result.unwrap();
    let summary: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
    assert_eq!(summary["decompressed_size"], 4);
    assert_eq!(fs::read(&restored).unwrap(), b"AAAB");
}
