//! Frequency table header
//!
//! The header is one ASCII line of space-separated `token:count` pairs in
//! ascending byte order, followed by a blank line. Printable bytes stand for
//! themselves; `\\`, `\n`, `\r`, `\t`, `\s` (space) and `\:` are escapes, and
//! every other byte is written as `\xHH`.

use std::io::{BufRead, Write};

use crate::error::CompressError;
use crate::frequency::FrequencyTable;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Render one byte as a header token.
pub fn encode_symbol(symbol: u8) -> String {
    match symbol {
        b'\\' => "\\\\".to_string(),
        b'\n' => "\\n".to_string(),
        b'\r' => "\\r".to_string(),
        b'\t' => "\\t".to_string(),
        b' ' => "\\s".to_string(),
        b':' => "\\:".to_string(),
        0x21..=0x7E => (symbol as char).to_string(),
        _ => {
            let hi = HEX_DIGITS[(symbol >> 4) as usize] as char;
            let lo = HEX_DIGITS[(symbol & 0x0F) as usize] as char;
            format!("\\x{}{}", hi, lo)
        }
    }
}

/// Parse one header token back into its byte.
pub fn decode_symbol(token: &str) -> Result<u8, CompressError> {
    match token.as_bytes() {
        [c] if c.is_ascii_graphic() && *c != b'\\' && *c != b':' => Ok(*c),
        [b'\\', b'\\'] => Ok(b'\\'),
        [b'\\', b'n'] => Ok(b'\n'),
        [b'\\', b'r'] => Ok(b'\r'),
        [b'\\', b't'] => Ok(b'\t'),
        [b'\\', b's'] => Ok(b' '),
        [b'\\', b':'] => Ok(b':'),
        [b'\\', b'x', hi, lo] => match (hex_value(*hi), hex_value(*lo)) {
            (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
            _ => Err(CompressError::header(token, "non-hex digit in \\x escape")),
        },
        [] => Err(CompressError::header(token, "empty symbol")),
        [b'\\', ..] => Err(CompressError::header(token, "unknown escape")),
        _ => Err(CompressError::header(token, "unrecognised symbol")),
    }
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        _ => None,
    }
}

/// Serialize a frequency table as the header line plus its blank terminator.
pub fn serialize(table: &FrequencyTable) -> String {
    let mut header = String::with_capacity(table.len() * 12 + 2);
    for (i, (symbol, count)) in table.iter().enumerate() {
        if i > 0 {
            header.push(' ');
        }
        header.push_str(&encode_symbol(symbol));
        header.push(':');
        header.push_str(&count.to_string());
    }
    header.push_str("\n\n");
    header
}

/// Write the header. Returns the number of bytes written.
pub fn write_header<W: Write>(out: &mut W, table: &FrequencyTable) -> Result<usize, CompressError> {
    let header = serialize(table);
    out.write_all(header.as_bytes())?;
    Ok(header.len())
}

/// Read header lines up to and including the blank terminator line.
///
/// The reader is left positioned at the first payload byte.
pub fn read_header<R: BufRead>(reader: &mut R) -> Result<FrequencyTable, CompressError> {
    let mut table = FrequencyTable::new();
    let mut total: u64 = 0;
    let mut line = Vec::new();

    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line)?;
        if n == 0 || line.last() != Some(&b'\n') {
            return Err(CompressError::TruncatedStream("header has no blank-line terminator"));
        }
        line.pop();
        if line.is_empty() {
            break;
        }

        let text = std::str::from_utf8(&line)
            .map_err(|_| CompressError::header(String::from_utf8_lossy(&line), "header is not ASCII"))?;
        for pair in text.split_ascii_whitespace() {
            let (symbol, count) = parse_pair(pair)?;
            total = total
                .checked_add(count)
                .ok_or_else(|| CompressError::header(pair, "frequency total overflows"))?;
            table.insert(symbol, count);
        }
    }

    Ok(table)
}

fn parse_pair(pair: &str) -> Result<(u8, u64), CompressError> {
    // counts are plain digits, so the last colon is always the separator
    let (token, number) = pair
        .rsplit_once(':')
        .ok_or_else(|| CompressError::header(pair, "missing ':' separator"))?;
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CompressError::header(pair, "frequency is not an unsigned integer"));
    }
    let count: u64 = number
        .parse()
        .map_err(|_| CompressError::header(pair, "frequency out of range"))?;
    if count == 0 {
        return Err(CompressError::header(pair, "frequency must be at least 1"));
    }
    let symbol = decode_symbol(token)?;
    Ok((symbol, count))
}
