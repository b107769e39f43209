//! # nodeseg codec
//!
//! Record schema and frame codec for nodeseg segment files.
//!
//! This crate owns everything that touches bytes:
//! - [`Node`] and [`DecodeError`], the records stored in segments
//! - the [`Sequenced`] capability (an ordering key) used by readers
//! - the [`Payload`] contract (serialize/deserialize one record)
//! - length-prefixed frames ([`encode_frame`], [`write_frame`], [`read_frame`])
//!
//! ## Usage
//!
//! ```
//! use nodeseg_codec::{encode_frame, read_frame, Node};
//! use std::io::Cursor;
//!
//! let node = Node::set("bank", &b"key"[..], &b"value"[..], 42);
//! let frame = encode_frame(&node).unwrap();
//!
//! let decoded: Node = read_frame(&mut Cursor::new(frame)).unwrap().unwrap();
//! assert_eq!(decoded, node);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod frame;
mod schema;

pub use error::{CodecError, CodecResult};
pub use frame::{encode_frame, read_frame, write_frame, FRAME_HEADER_SIZE};
pub use schema::{DecodeError, Node};

/// A record with an ordering key.
///
/// Segment writers name files by the range of keys they hold and changeset
/// readers group records that share a key.
pub trait Sequenced {
    /// Returns the record's ordering key (its block height).
    fn sequence(&self) -> i64;
}

/// Serialization contract for records stored in frames.
pub trait Payload: Sized {
    /// Serialize this record to its wire bytes.
    fn encode_payload(&self) -> CodecResult<Vec<u8>>;

    /// Deserialize a record from its wire bytes.
    fn decode_payload(bytes: &[u8]) -> CodecResult<Self>;
}
