//! Error types for the codec crate.

use std::io;
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while framing, encoding or decoding records.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Failed to serialize a record payload.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// A payload was read in full but could not be deserialized.
    #[error("decoding failed: {message}")]
    DecodingFailed {
        /// Description of the decoding error.
        message: String,
    },

    /// The stream ended part way through a frame.
    ///
    /// Raised when a read returns zero bytes before the header or the
    /// payload is complete. A frame is never silently truncated.
    #[error("incomplete frame: read {read} of {expected} bytes")]
    IncompleteFrame {
        /// Bytes required to complete the header or payload.
        expected: usize,
        /// Bytes actually read before the stream ended.
        read: usize,
    },

    /// The serialized payload does not fit the 4-byte length header.
    #[error("frame too large: {len} bytes")]
    FrameTooLarge {
        /// Payload length in bytes.
        len: usize,
    },

    /// I/O error from the underlying reader or writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create a decoding failed error.
    pub fn decoding_failed(message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            message: message.into(),
        }
    }

    /// Returns true if the error marks a frame cut short by end of stream.
    #[must_use]
    pub fn is_incomplete_frame(&self) -> bool {
        matches!(self, Self::IncompleteFrame { .. })
    }
}

impl From<prost::DecodeError> for CodecError {
    fn from(err: prost::DecodeError) -> Self {
        Self::decoding_failed(err.to_string())
    }
}

impl From<prost::EncodeError> for CodecError {
    fn from(err: prost::EncodeError) -> Self {
        Self::encoding_failed(err.to_string())
    }
}
