//! JSON Lines framing for broker messages.

use std::io::{self, BufRead, Read};

use crate::protocol::Message;

use super::TransportError;

/// Largest accepted frame, newline included.
pub(super) const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Outcome of reading one line from a connection.
#[derive(Debug)]
pub(super) enum Frame {
    /// A decoded message.
    Message(Message),
    /// A line that did not decode; the connection stays usable.
    Malformed(serde_json::Error),
    /// The peer closed the connection.
    Closed,
}

/// Reads the next frame. Blank lines are skipped.
///
/// Oversized frames are reported as `InvalidData` since the stream cannot be
/// resynchronised.
pub(super) fn read_frame<R: BufRead>(reader: &mut R) -> io::Result<Frame> {
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        let limit = u64::try_from(MAX_FRAME_BYTES + 1).unwrap_or(u64::MAX);
        let read = reader.by_ref().take(limit).read_until(b'\n', &mut buffer)?;
        if read == 0 {
            return Ok(Frame::Closed);
        }
        if buffer.len() > MAX_FRAME_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "frame exceeds maximum size",
            ));
        }
        if buffer.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        return Ok(match serde_json::from_slice(trim_trailing_whitespace(&buffer)) {
            Ok(message) => Frame::Message(message),
            Err(error) => Frame::Malformed(error),
        });
    }
}

/// Serialises `message` as one newline-terminated line.
pub(super) fn encode_frame(message: &Message) -> Result<Vec<u8>, TransportError> {
    let mut bytes =
        serde_json::to_vec(message).map_err(|source| TransportError::Encode { source })?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn trim_trailing_whitespace(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|byte| !byte.is_ascii_whitespace())
        .map_or(0, |index| index + 1);
    bytes.get(..end).unwrap_or(bytes)
}
