//! Shared helpers for the nodeseg benchmarks.

pub mod utils;
