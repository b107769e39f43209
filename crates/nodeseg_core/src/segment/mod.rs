//! Segment files.
//!
//! A segment is one immutable gzip stream of concatenated frames:
//!
//! ```text
//! gzip( | len (4) | payload | len (4) | payload | ... )
//! ```
//!
//! Segments are written once by a [`SegmentWriter`] and never modified
//! afterwards. Readers decode them strictly from the start.

pub mod naming;
mod writer;

pub use naming::SEGMENT_EXTENSION;
pub use writer::SegmentWriter;
