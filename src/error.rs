//! Error types for huffpack

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("empty input: no symbols to compress")]
    EmptyInput,

    #[error("no code assigned to byte 0x{0:02X}")]
    UnmappedSymbol(u8),

    #[error("invalid header token {token:?}: {reason}")]
    InvalidHeaderToken { token: String, reason: &'static str },

    #[error("malformed padding: {0} bits (expected 0-7)")]
    MalformedPadding(u8),

    #[error("truncated stream: {0}")]
    TruncatedStream(&'static str),

    #[error("corrupt payload: unexpected bit at offset {bit_offset}")]
    CorruptPayload { bit_offset: u64 },

    #[error("frequency total exceeds u64")]
    FrequencyOverflow,

    #[error("pop from an empty priority queue")]
    EmptyQueue,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CompressError {
    pub(crate) fn header(token: impl Into<String>, reason: &'static str) -> Self {
        CompressError::InvalidHeaderToken {
            token: token.into(),
            reason,
        }
    }
}
