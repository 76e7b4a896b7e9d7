//! Configuration for huffpack

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CompressError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Extension given to compressed files and required on decompression input.
    pub compressed_extension: String,
    /// Suffix appended to a compressed file name when no output name is given.
    pub decompressed_suffix: String,
    /// Chunk size used when counting bytes in an input file.
    pub read_buffer_size: usize,
    pub max_input_size: u64,
    /// Restrict file names to `[A-Za-z0-9._-]+`.
    pub strict_file_names: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            compressed_extension: "huff".to_string(),
            decompressed_suffix: "out".to_string(),
            read_buffer_size: 16 * 1024,
            max_input_size: 1024 * 1024 * 1024, // 1 GiB
            strict_file_names: true,
        }
    }
}

impl CompressionConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CompressError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config: CompressionConfig = serde_json::from_str(&text)
            .map_err(|e| CompressError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CompressError> {
        if self.compressed_extension.is_empty() {
            return Err(CompressError::Config("compressed_extension must not be empty".into()));
        }
        if self.compressed_extension.starts_with('.') {
            return Err(CompressError::Config(
                "compressed_extension must not start with '.'".into(),
            ));
        }
        if self.decompressed_suffix.is_empty() {
            return Err(CompressError::Config("decompressed_suffix must not be empty".into()));
        }
        if self.read_buffer_size == 0 {
            return Err(CompressError::Config("read_buffer_size must be positive".into()));
        }
        Ok(())
    }
}
