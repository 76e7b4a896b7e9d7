//! Command-line arguments and their validation

use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;

use crate::config::CompressionConfig;
use crate::error::CompressError;
use crate::header::encode_symbol;
use crate::Compressor;

/// Compress or decompress a file with Huffman coding.
#[derive(Parser, Debug, Clone)]
#[command(name = "huffpack")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Compress FILE
    #[arg(
        short = 'c',
        long = "compress",
        value_name = "FILE",
        conflicts_with = "decompress",
        required_unless_present = "decompress"
    )]
    pub compress: Option<PathBuf>,

    /// Decompress FILE (must carry the compressed extension)
    #[arg(short = 'd', long = "decompress", value_name = "FILE")]
    pub decompress: Option<PathBuf>,

    /// Output file name
    #[arg(short = 'o', long = "output", value_name = "NAME")]
    pub output: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the code table after compressing
    #[arg(long)]
    pub print_codes: bool,

    /// Print run statistics as JSON
    #[arg(long)]
    pub stats: bool,

    /// Log level used when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Compress,
    Decompress,
}

/// A validated request: what to do, from where, to where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub mode: Mode,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Invocation {
    pub fn resolve(args: &Args, config: &CompressionConfig) -> Result<Self, CompressError> {
        let (mode, input) = match (&args.compress, &args.decompress) {
            (Some(path), None) => (Mode::Compress, path.clone()),
            (None, Some(path)) => (Mode::Decompress, path.clone()),
            (Some(_), Some(_)) => {
                return Err(CompressError::InvalidArgument(
                    "only one of -c and -d may be given".into(),
                ))
            }
            (None, None) => {
                return Err(CompressError::InvalidArgument(
                    "no mode selected: use -c FILE or -d FILE".into(),
                ))
            }
        };

        check_name(&input, "input", config)?;
        if mode == Mode::Decompress
            && input.extension() != Some(OsStr::new(&config.compressed_extension))
        {
            return Err(CompressError::InvalidArgument(format!(
                "decompression input must end with .{}",
                config.compressed_extension
            )));
        }

        let output = match &args.output {
            Some(path) => {
                check_name(path, "output", config)?;
                path.clone()
            }
            None => default_output(mode, &input, config),
        };
        if output == input {
            return Err(CompressError::InvalidArgument(
                "output must differ from input".into(),
            ));
        }

        Ok(Self {
            mode,
            input,
            output,
        })
    }
}

/// Carry out a resolved invocation. `--print-codes` and `--stats` output goes
/// to `out`.
pub fn run<W: Write>(
    args: &Args,
    invocation: &Invocation,
    config: CompressionConfig,
    out: &mut W,
) -> anyhow::Result<()> {
    let compressor = Compressor::new(config);

    match invocation.mode {
        Mode::Compress => {
            let result = compressor
                .compress_file(&invocation.input, &invocation.output)
                .with_context(|| format!("compressing {}", invocation.input.display()))?;
            if args.print_codes {
                for (symbol, code) in result.codes.iter() {
                    writeln!(out, "{}\t{}", encode_symbol(symbol), code)?;
                }
            }
            if args.stats {
                writeln!(out, "{}", serde_json::to_string_pretty(&result.stats)?)?;
            }
        }
        Mode::Decompress => {
            let written = compressor
                .decompress_file(&invocation.input, &invocation.output)
                .with_context(|| format!("decompressing {}", invocation.input.display()))?;
            if args.stats {
                let summary = serde_json::json!({ "decompressed_size": written });
                writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
            }
        }
    }
    Ok(())
}

/// Compression replaces the input's last extension; decompression appends a
/// suffix.
pub fn default_output(mode: Mode, input: &Path, config: &CompressionConfig) -> PathBuf {
    match mode {
        Mode::Compress => input.with_extension(&config.compressed_extension),
        Mode::Decompress => {
            let mut name = OsString::from(input.as_os_str());
            name.push(".");
            name.push(&config.decompressed_suffix);
            PathBuf::from(name)
        }
    }
}

fn check_name(path: &Path, role: &str, config: &CompressionConfig) -> Result<(), CompressError> {
    let name = path.to_string_lossy();
    if name.is_empty() {
        return Err(CompressError::InvalidArgument(format!("{} name is empty", role)));
    }
    if name.starts_with('-') {
        return Err(CompressError::InvalidArgument(format!(
            "expected a file name for {}, got option {:?}",
            role, name
        )));
    }
    if config.strict_file_names
        && !name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
    {
        return Err(CompressError::InvalidArgument(format!(
            "{} name {:?} must match [A-Za-z0-9._-]+",
            role, name
        )));
    }
    Ok(())
}
