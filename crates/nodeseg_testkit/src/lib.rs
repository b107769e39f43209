//! # nodeseg testkit
//!
//! Test utilities for nodeseg.
//!
//! This crate provides:
//! - Temporary segment directories with helpers to fill them
//! - Random node generators for end-to-end scenarios
//! - Property-based test strategies using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nodeseg_testkit::prelude::*;
//!
//! #[test]
//! fn reads_back() {
//!     let segments = SegmentDir::new();
//!     segments.write_store("bank", sequential_nodes("bank", 0..100));
//!     // ... open readers over segments.path()
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
