//! ABI decoding for the domain registry call result
//!
//! The registry getter returns a single dynamic `string`, so the return
//! payload has a fixed shape: one offset word, one length word, then the
//! string bytes padded to a 32-byte boundary. The decoder extracts that
//! string from the raw hex in the JSON-RPC `result` field and maps every
//! malformed shape to an empty string instead of an error; the caller
//! treats an empty string as an unusable endpoint.

/// Size of one ABI word in bytes.
const WORD_SIZE: usize = 32;

/// Decodes a dynamic `string` return value from an `eth_call` hex payload.
///
/// Accepts the payload with or without the `0x` prefix. Invalid hex, a
/// truncated head, or a length the payload cannot satisfy all decode to
/// an empty string. Decoding stops early at the first zero byte.
pub fn decode_string_return(payload: &str) -> String {
    let stripped = payload.strip_prefix("0x").unwrap_or(payload);
    match hex::decode(stripped) {
        Ok(raw) => decode_dynamic_string(&raw),
        Err(_) => String::new(),
    }
}

/// Decodes the word-aligned layout: offset word, length word, data bytes.
fn decode_dynamic_string(raw: &[u8]) -> String {
    // A single string return always sits at offset 32, so the offset word
    // is skipped rather than dereferenced.
    if raw.len() < WORD_SIZE {
        return String::new();
    }
    let tail = &raw[WORD_SIZE..];
    if tail.len() < WORD_SIZE {
        return String::new();
    }
    let Some(length) = word_as_len(&tail[..WORD_SIZE]) else {
        return String::new();
    };
    let data = &tail[WORD_SIZE..];
    if data.len() < length {
        return String::new();
    }

    let mut decoded = String::with_capacity(length);
    for &byte in &data[..length] {
        if byte == 0 {
            break;
        }
        decoded.push(byte as char);
    }
    decoded
}

/// Reads a 32-byte big-endian word as a byte length.
///
/// Returns `None` when the value does not fit in `usize`; no payload can
/// satisfy such a length anyway.
fn word_as_len(word: &[u8]) -> Option<usize> {
    let (high, low) = word.split_at(WORD_SIZE - 8);
    if high.iter().any(|&b| b != 0) {
        return None;
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(low);
    usize::try_from(u64::from_be_bytes(buf)).ok()
}
