//! Message framing.
//!
//! Each message is a header block terminated by a blank line followed by
//! exactly `Content-Length` bytes of payload. [`split`] consumes a growing
//! byte buffer and yields complete payloads; [`encode`] serializes a
//! message with the same framing. Both are pure functions over byte
//! slices.

use serde::Serialize;
use thiserror::Error;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const CONTENT_LENGTH: &str = "content-length";

/// A malformed header block. Fatal to this single message, not to the
/// stream: `consumed` tells the caller how many bytes to discard before
/// resuming.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed frame header: {reason}")]
pub struct FrameError {
    /// What was wrong with the header.
    pub reason: String,
    /// Bytes to discard to skip the malformed header block.
    pub consumed: usize,
}

/// Attempts to split one complete message off the front of `buffer`.
///
/// Returns `Ok(None)` while the buffer holds an incomplete header or an
/// incomplete body, so the caller can await more input. Returns
/// `Ok(Some((consumed, payload)))` for a complete message. Returns an
/// error only when the header block is present but carries a missing or
/// non-numeric `Content-Length`.
pub fn split(buffer: &[u8]) -> Result<Option<(usize, Vec<u8>)>, FrameError> {
    let Some(header_end) = find(buffer, HEADER_TERMINATOR) else {
        return Ok(None);
    };
    let body_start = header_end + HEADER_TERMINATOR.len();

    let mut content_length: Option<usize> = None;
    let header = String::from_utf8_lossy(&buffer[..header_end]);
    for line in header.split("\r\n") {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().to_ascii_lowercase() == CONTENT_LENGTH {
                let value = value.trim();
                content_length =
                    Some(value.parse::<usize>().map_err(|_| FrameError {
                        reason: format!("non-numeric Content-Length {value:?}"),
                        consumed: body_start,
                    })?);
            }
        }
    }
    let Some(length) = content_length else {
        return Err(FrameError {
            reason: "missing Content-Length header".to_string(),
            consumed: body_start,
        });
    };

    if buffer.len() < body_start + length {
        return Ok(None);
    }
    let payload = buffer[body_start..body_start + length].to_vec();
    Ok(Some((body_start + length, payload)))
}

/// Serializes `message` and prefixes the `Content-Length` header.
///
/// # Errors
///
/// Propagates serialization failures.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, serde_json::Error> {
    let body = serde_json::to_vec(message)?;
    let mut frame = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
    frame.extend_from_slice(&body);
    Ok(frame)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
