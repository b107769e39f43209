//! # nodeseg core
//!
//! Segment store for versioned key-value tree exports.
//!
//! This crate provides:
//! - [`SegmentWriter`], which batches records into size-bounded gzip
//!   segment files named by block range
//! - [`SequencedIterator`], which reads the records of a segment directory
//!   back in write order
//! - [`ChangesetIterator`] and [`MultiChangesetIterator`], which regroup
//!   records into per-height changesets and merge them across stores
//! - [`Stats`], write accounting plus a read-after-write check
//!
//! ## Example
//!
//! ```no_run
//! use nodeseg_codec::Node;
//! use nodeseg_core::{MultiChangesetIterator, SegmentWriter, WriterConfig};
//!
//! for store in ["acc", "bank"] {
//!     let mut writer = SegmentWriter::new(WriterConfig::new(format!("out/{store}")));
//!     let nodes = (0..100).map(|b| Node::set(store, vec![b as u8], vec![0u8; 32], b));
//!     writer.compact(nodes)?.validate::<Node>()?;
//! }
//!
//! let mut merged = MultiChangesetIterator::open("out")?;
//! while let Some(changeset) = merged.pop()? {
//!     println!("{}: {} nodes", changeset.version, changeset.len());
//! }
//! # Ok::<(), nodeseg_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
pub mod iter;
pub mod segment;
mod stats;

pub use config::{WriterConfig, DEFAULT_COMPRESSION_LEVEL, DEFAULT_MAX_FILE_SIZE};
pub use error::{CoreError, CoreResult};
pub use iter::{
    Changeset, ChangesetIterator, CursorState, DirectoryEnumerator, MultiChangesetIterator,
    NodeIterator, SequencedIterator, StoreKeyedIterator,
};
pub use segment::{SegmentWriter, SEGMENT_EXTENSION};
pub use stats::{pretty_byte_size, with_commas, SegmentSummary, Stats};

/// Crate version, from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
