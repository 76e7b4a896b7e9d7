//! Bit-packed payload and padding trailer
//!
//! Codes are packed most significant bit first. A partial final byte is
//! filled with zero bits, and one trailing byte records how many bits of
//! padding were added (0-7). The trailer is written even when it is zero.

use std::io::{ErrorKind, Read, Write};

use bitstream_io::{BigEndian, BitWrite, BitWriter};
use tracing::debug;

use crate::error::CompressError;
use crate::huffman::CodeTable;

/// Byte counts of one written payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadSummary {
    /// Input bytes consumed.
    pub symbols: u64,
    /// Packed payload bytes, excluding the trailer.
    pub payload_bytes: u64,
    pub padding: u8,
}

impl PayloadSummary {
    /// Bytes written including the trailer.
    pub fn written(&self) -> u64 {
        self.payload_bytes + 1
    }
}

/// Encode every byte of `input` with `codes` and write the packed payload
/// followed by the padding trailer.
pub fn write_payload<R: Read, W: Write>(
    codes: &CodeTable,
    mut input: R,
    out: &mut W,
    buffer_size: usize,
) -> Result<PayloadSummary, CompressError> {
    let mut writer = BitWriter::endian(&mut *out, BigEndian);
    let mut buffer = vec![0u8; buffer_size.max(1)];
    let mut symbols = 0u64;
    let mut bits = 0u64;

    loop {
        let n = match input.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        for &byte in &buffer[..n] {
            let code = codes.get(byte).ok_or(CompressError::UnmappedSymbol(byte))?;
            for &bit in code.bits() {
                writer.write_bit(bit)?;
            }
            bits += code.len() as u64;
        }
        symbols += n as u64;
    }

    let leftover = (bits % 8) as u8;
    let padding = if leftover == 0 { 0 } else { 8 - leftover };
    writer.byte_align()?;
    drop(writer);
    out.write_all(&[padding])?;

    let summary = PayloadSummary {
        symbols,
        payload_bytes: bits.div_ceil(8),
        padding,
    };
    debug!(
        symbols = summary.symbols,
        payload_bytes = summary.payload_bytes,
        padding = summary.padding,
        "wrote payload"
    );
    Ok(summary)
}

/// Encode an in-memory buffer.
pub fn encode_bytes(codes: &CodeTable, data: &[u8]) -> Result<(Vec<u8>, u8), CompressError> {
    let mut out = Vec::with_capacity(data.len() / 2 + 1);
    let summary = write_payload(codes, data, &mut out, data.len().max(1))?;
    out.pop();
    Ok((out, summary.padding))
}

/// Split everything after the header into the packed payload and its
/// padding count.
pub fn split_payload(tail: &[u8]) -> Result<(&[u8], u8), CompressError> {
    let (&padding, payload) = tail
        .split_last()
        .ok_or(CompressError::TruncatedStream("missing padding trailer"))?;
    if padding > 7 {
        return Err(CompressError::MalformedPadding(padding));
    }
    Ok((payload, padding))
}
