//! Changesets command implementation.

use nodeseg_core::{Changeset, MultiChangesetIterator};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Merged changeset summary for output.
#[derive(Debug, Serialize)]
pub struct ChangesetInfo {
    /// Block height.
    pub version: i64,
    /// Total nodes.
    pub nodes: usize,
    /// Deletes among the nodes.
    pub deletes: usize,
    /// Orphaned nodes among the nodes.
    pub orphaned: usize,
    /// Node count per store.
    pub stores: BTreeMap<String, usize>,
}

impl From<&Changeset> for ChangesetInfo {
    fn from(changeset: &Changeset) -> Self {
        let mut stores = BTreeMap::new();
        for node in &changeset.nodes {
            *stores.entry(node.store_key.clone()).or_insert(0) += 1;
        }
        Self {
            version: changeset.version,
            nodes: changeset.len(),
            deletes: changeset.nodes.iter().filter(|n| n.delete).count(),
            orphaned: changeset.nodes.iter().filter(|n| n.is_orphaned()).count(),
            stores,
        }
    }
}

/// Merge result for output.
#[derive(Debug, Serialize)]
pub struct ChangesetsResult {
    /// Root directory.
    pub path: String,
    /// Stores merged, in name order.
    pub stores: Vec<String>,
    /// Changesets in ascending version.
    pub changesets: Vec<ChangesetInfo>,
}

/// Runs the changesets command.
pub fn run(
    path: &Path,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = collect(path, limit)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }
    Ok(())
}

fn collect(
    path: &Path,
    limit: Option<usize>,
) -> Result<ChangesetsResult, Box<dyn std::error::Error>> {
    let max_changesets = limit.unwrap_or(usize::MAX);
    let mut iter = MultiChangesetIterator::open(path)?;
    let stores = iter.store_keys().into_iter().map(str::to_owned).collect();

    let mut changesets = Vec::new();
    while changesets.len() < max_changesets {
        let Some(changeset) = iter.pop()? else {
            break;
        };
        changesets.push(ChangesetInfo::from(&changeset));
    }

    Ok(ChangesetsResult {
        path: path.display().to_string(),
        stores,
        changesets,
    })
}

fn print_text_output(result: &ChangesetsResult) {
    println!("Changesets");
    println!("==========");
    println!();
    println!("Path:   {}", result.path);
    println!("Stores: {}", result.stores.join(", "));
    println!();

    for changeset in &result.changesets {
        print!(
            "[{:08}] {} nodes, {} deletes, {} orphaned:",
            changeset.version, changeset.nodes, changeset.deletes, changeset.orphaned
        );
        for (store, count) in &changeset.stores {
            print!(" {}={}", store, count);
        }
        println!();
    }
}
