//! Length-prefixed record frames.
//!
//! ```text
//! | len (4, little-endian u32) | payload (len bytes) |
//! ```
//!
//! Frames are concatenated back to back inside a (compressed) segment
//! stream. A stream that ends exactly on a frame boundary is a clean end;
//! one that ends inside a header or payload is an
//! [`CodecError::IncompleteFrame`].

use crate::error::{CodecError, CodecResult};
use crate::Payload;
use std::io::{self, Read, Write};

/// Size of the frame length header.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Encodes a record into a complete frame.
///
/// # Errors
///
/// Returns an error if the record cannot be serialized or its payload
/// exceeds `u32::MAX` bytes.
pub fn encode_frame<T: Payload>(record: &T) -> CodecResult<Vec<u8>> {
    let payload = record.encode_payload()?;
    let len = frame_len(&payload)?;

    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Writes one frame to `writer`.
///
/// Returns the payload length, excluding the header.
///
/// # Errors
///
/// Returns an error if serialization fails or the writer fails.
pub fn write_frame<W: Write, T: Payload>(writer: &mut W, record: &T) -> CodecResult<usize> {
    let payload = record.encode_payload()?;
    let len = frame_len(&payload)?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&payload)?;
    Ok(payload.len())
}

/// Reads one frame from `reader` and decodes its payload.
///
/// Returns `Ok(None)` if the stream is at a clean end (no header bytes at
/// all). Short reads are retried until the header and payload are complete.
///
/// # Errors
///
/// - [`CodecError::IncompleteFrame`] if the stream ends mid-frame
/// - [`CodecError::DecodingFailed`] if the payload is malformed
/// - [`CodecError::Io`] on reader failure
pub fn read_frame<R: Read, T: Payload>(reader: &mut R) -> CodecResult<Option<T>> {
    let mut header = [0u8; FRAME_HEADER_SIZE];
    let read = read_full(reader, &mut header)?;
    if read == 0 {
        return Ok(None);
    }
    if read < FRAME_HEADER_SIZE {
        return Err(CodecError::IncompleteFrame {
            expected: FRAME_HEADER_SIZE,
            read,
        });
    }

    // The header is untrusted, so the buffer only grows as bytes arrive.
    let len = u32::from_le_bytes(header);
    let mut payload = Vec::new();
    let read = reader.by_ref().take(u64::from(len)).read_to_end(&mut payload)?;
    let len = len as usize;
    if read < len {
        return Err(CodecError::IncompleteFrame {
            expected: len,
            read,
        });
    }

    T::decode_payload(&payload).map(Some)
}

fn frame_len(payload: &[u8]) -> CodecResult<u32> {
    u32::try_from(payload.len()).map_err(|_| CodecError::FrameTooLarge { len: payload.len() })
}

/// Fills `buf` from `reader`, stopping early only on a zero-length read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
