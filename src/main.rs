//! huffpack command-line entrypoint.
//!
//! ```bash
//! # Compress notes.txt into notes.huff
//! huffpack -c notes.txt
//!
//! # Decompress into a chosen name
//! huffpack -d notes.huff -o notes.txt
//! ```

use std::io;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use huffpack::cli::{self, Args, Invocation};
use huffpack::config::CompressionConfig;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean for --stats and --print-codes.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();

    let config = match &args.config {
        Some(path) => CompressionConfig::from_json_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => CompressionConfig::default(),
    };
    let invocation = Invocation::resolve(&args, &config)?;

    cli::run(&args, &invocation, config, &mut io::stdout().lock())
}
