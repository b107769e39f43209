//! Record wire schema.
//!
//! Records are encoded with the protobuf wire format. Field tags are part
//! of the on-disk format and must never be renumbered.
//!
//! ```text
//! Node         { key = 1, value = 2, delete = 3, block = 4, store_key = 5,
//!                hash = 6, first_version = 7, last_version = 8 }
//! DecodeError  { reason = 1, node = 2, store_key = 3 }
//! ```

use crate::error::CodecResult;
use crate::{Payload, Sequenced};
use bytes::Bytes;
use prost::Message;
use std::fmt;

/// A single key/value mutation at a block height.
///
/// `first_version`/`last_version` are only populated for orphaned nodes,
/// i.e. tree nodes that were overwritten or removed at `last_version`.
#[derive(Clone, PartialEq, Message)]
pub struct Node {
    /// Key in the store.
    #[prost(bytes = "bytes", tag = "1")]
    pub key: Bytes,
    /// Value written, empty for deletes.
    #[prost(bytes = "bytes", tag = "2")]
    pub value: Bytes,
    /// True if this mutation removes `key`.
    #[prost(bool, tag = "3")]
    pub delete: bool,
    /// Block height of the mutation. This is the ordering key.
    #[prost(int64, tag = "4")]
    pub block: i64,
    /// Logical store the node belongs to.
    #[prost(string, tag = "5")]
    pub store_key: String,
    /// Node hash, if the producer captured it.
    #[prost(bytes = "bytes", tag = "6")]
    pub hash: Bytes,
    /// First version an orphaned node was live at.
    #[prost(int64, tag = "7")]
    pub first_version: i64,
    /// Last version an orphaned node was live at.
    #[prost(int64, tag = "8")]
    pub last_version: i64,
}

impl Node {
    /// Creates a set mutation.
    pub fn set(
        store_key: impl Into<String>,
        key: impl Into<Bytes>,
        value: impl Into<Bytes>,
        block: i64,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            block,
            store_key: store_key.into(),
            ..Self::default()
        }
    }

    /// Creates a delete mutation.
    pub fn delete(store_key: impl Into<String>, key: impl Into<Bytes>, block: i64) -> Self {
        Self {
            key: key.into(),
            delete: true,
            block,
            store_key: store_key.into(),
            ..Self::default()
        }
    }

    /// Returns true if this node records an overwritten or removed tree node.
    #[must_use]
    pub fn is_orphaned(&self) -> bool {
        self.first_version > 0
    }
}

impl Sequenced for Node {
    fn sequence(&self) -> i64 {
        self.block
    }
}

impl Payload for Node {
    fn encode_payload(&self) -> CodecResult<Vec<u8>> {
        Ok(self.encode_to_vec())
    }

    fn decode_payload(bytes: &[u8]) -> CodecResult<Self> {
        Ok(Self::decode(bytes)?)
    }
}

/// A node that failed downstream validation, persisted with its reason.
///
/// Stored through the same segment format as [`Node`] so failures can be
/// replayed and inspected later.
#[derive(Clone, PartialEq, Message)]
pub struct DecodeError {
    /// Why the node was rejected.
    #[prost(string, tag = "1")]
    pub reason: String,
    /// The rejected node, if one was decoded at all.
    #[prost(message, optional, tag = "2")]
    pub node: Option<Node>,
    /// Store the failure was observed in.
    #[prost(string, tag = "3")]
    pub store_key: String,
}

impl DecodeError {
    /// Creates a decode error wrapping `node`.
    pub fn new(reason: impl Into<String>, node: Option<Node>) -> Self {
        let store_key = node
            .as_ref()
            .map(|n| n.store_key.clone())
            .unwrap_or_default();
        Self {
            reason: reason.into(),
            node,
            store_key,
        }
    }
}

impl Sequenced for DecodeError {
    fn sequence(&self) -> i64 {
        self.node.as_ref().map_or(0, |n| n.block)
    }
}

impl Payload for DecodeError {
    fn encode_payload(&self) -> CodecResult<Vec<u8>> {
        Ok(self.encode_to_vec())
    }

    fn decode_payload(bytes: &[u8]) -> CodecResult<Self> {
        Ok(Self::decode(bytes)?)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl std::error::Error for DecodeError {}
