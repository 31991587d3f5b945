//! Tag-length-value codec shared by Serato's crate files and Database V2.
//!
//! A chunk is `(tag, length, value)`: a 4-byte ASCII tag, a big-endian u32
//! length, then exactly `length` bytes of payload. Chunks are neither
//! aligned nor separated, and a payload may itself be a concatenation of
//! child chunks.

use thiserror::Error;

/// A 4-byte ASCII chunk tag, e.g. `b"otrk"`.
pub type Tag = [u8; 4];

#[derive(Error, Debug)]
pub enum TlvError {
    #[error("truncated chunk: {0}")]
    Truncated(String),
    #[error("malformed UTF-16BE string: {0}")]
    MalformedString(String),
}

/// Encode a single chunk: tag, big-endian length, then the payload.
pub fn encode_chunk(tag: &Tag, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + payload.len());
    out.extend_from_slice(tag);
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Encode a string as UTF-16BE with no byte-order mark and no terminator.
pub fn encode_utf16be(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

/// Decode a UTF-16BE byte string. Trailing NUL byte-pairs observed in real
/// files are stripped before decoding.
pub fn decode_utf16be(bytes: &[u8]) -> Result<String, TlvError> {
    if bytes.len() % 2 != 0 {
        return Err(TlvError::MalformedString(format!(
            "odd byte length {}",
            bytes.len()
        )));
    }

    let mut units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();

    while units.last() == Some(&0) {
        units.pop();
    }

    String::from_utf16(&units)
        .map_err(|e| TlvError::MalformedString(format!("invalid UTF-16 sequence: {e}")))
}

/// One decoded top-level or nested chunk: its tag and raw payload bytes.
#[derive(Debug, Clone)]
pub struct RawChunk {
    pub tag: Tag,
    pub value: Vec<u8>,
}

/// Strictly iterate the top-level chunks of a file-like byte stream.
///
/// End-of-stream between records is success (the loop simply stops).
/// End-of-stream mid-header or mid-payload is `Truncated`, since files are
/// authoritative and a cut-off chunk indicates corruption, not padding.
pub fn iter_top_level(buf: &[u8]) -> Result<Vec<RawChunk>, TlvError> {
    let mut chunks = Vec::new();
    let mut pos = 0usize;

    while pos < buf.len() {
        if buf.len() - pos < 8 {
            return Err(TlvError::Truncated(format!(
                "header cut off at offset {pos}"
            )));
        }

        let tag: Tag = buf[pos..pos + 4].try_into().unwrap();
        let len = u32::from_be_bytes(buf[pos + 4..pos + 8].try_into().unwrap()) as usize;
        pos += 8;

        if buf.len() - pos < len {
            return Err(TlvError::Truncated(format!(
                "payload cut off at offset {pos}, wanted {len} bytes, have {}",
                buf.len() - pos
            )));
        }

        chunks.push(RawChunk {
            tag,
            value: buf[pos..pos + len].to_vec(),
        });
        pos += len;
    }

    Ok(chunks)
}

/// Leniently iterate the chunks nested inside a chunk's payload.
///
/// Record payloads in the wild occasionally carry trailing pad bytes or an
/// incomplete trailer that doesn't form a full chunk header. Rather than
/// fail the whole record, stop silently at the first incomplete header.
pub fn iter_nested(buf: &[u8]) -> Vec<RawChunk> {
    let mut chunks = Vec::new();
    let mut pos = 0usize;

    while pos + 8 <= buf.len() {
        let tag: Tag = buf[pos..pos + 4].try_into().unwrap();
        let len = u32::from_be_bytes(buf[pos + 4..pos + 8].try_into().unwrap()) as usize;

        if buf.len() - (pos + 8) < len {
            break;
        }

        let start = pos + 8;
        chunks.push(RawChunk {
            tag,
            value: buf[start..start + len].to_vec(),
        });
        pos = start + len;
    }

    chunks
}
