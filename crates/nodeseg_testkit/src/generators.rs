//! Property-based test generators using proptest.
//!
//! Provides strategies for nodes and node streams that keep the ordering
//! the segment writer expects.

use nodeseg_codec::Node;
use proptest::prelude::*;

/// Strategy for store keys.
pub fn store_key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for a single node at `block`.
///
/// Covers sets, deletes and orphaned nodes.
pub fn node_strategy(block: i64) -> impl Strategy<Value = Node> {
    (
        prop::collection::vec(any::<u8>(), 1..32),
        prop::collection::vec(any::<u8>(), 0..256),
        any::<bool>(),
        prop::option::of((1i64..1000, 0i64..1000)),
    )
        .prop_map(move |(key, value, delete, orphan)| {
            let mut node = if delete {
                Node::delete("", key, block)
            } else {
                Node::set("", key, value, block)
            };
            if let Some((first, span)) = orphan {
                node.first_version = first;
                node.last_version = first + span;
            }
            node
        })
}

/// Strategy for block heights in non-decreasing order.
///
/// Consecutive heights repeat or step forward by up to 3.
pub fn ordered_blocks_strategy(max_len: usize) -> impl Strategy<Value = Vec<i64>> {
    (0i64..100, prop::collection::vec(0i64..4, 0..max_len)).prop_map(|(start, steps)| {
        steps
            .into_iter()
            .scan(start, |block, step| {
                *block += step;
                Some(*block)
            })
            .collect()
    })
}

/// Strategy for a node stream in non-decreasing block order.
pub fn ordered_nodes_strategy(max_len: usize) -> impl Strategy<Value = Vec<Node>> {
    ordered_blocks_strategy(max_len).prop_flat_map(|blocks| {
        blocks
            .into_iter()
            .map(node_strategy)
            .collect::<Vec<_>>()
    })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 64,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 16,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
