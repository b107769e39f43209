//! Dump command implementation.

use super::hex_encode;
use nodeseg_codec::{DecodeError, Node, Payload, Sequenced};
use nodeseg_core::SequencedIterator;
use serde::Serialize;
use std::path::Path;

/// Node representation for output.
#[derive(Debug, Serialize)]
pub struct NodeInfo {
    /// Block height.
    pub block: i64,
    /// Store key.
    pub store_key: String,
    /// Key, hex-encoded.
    pub key: String,
    /// Value size in bytes.
    pub value_size: usize,
    /// Whether the node is a delete.
    pub delete: bool,
    /// Version range, if the node is orphaned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orphaned: Option<(i64, i64)>,
}

impl From<&Node> for NodeInfo {
    fn from(node: &Node) -> Self {
        Self {
            block: node.block,
            store_key: node.store_key.clone(),
            key: hex_encode(&node.key),
            value_size: node.value.len(),
            delete: node.delete,
            orphaned: node
                .is_orphaned()
                .then_some((node.first_version, node.last_version)),
        }
    }
}

/// Decode-error record representation for output.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    /// Ordering block (the wrapped node's, or 0).
    pub block: i64,
    /// Failure reason.
    pub reason: String,
    /// Store key.
    pub store_key: String,
    /// The wrapped node, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeInfo>,
}

impl From<&DecodeError> for ErrorInfo {
    fn from(error: &DecodeError) -> Self {
        Self {
            block: error.sequence(),
            reason: error.reason.clone(),
            store_key: error.store_key.clone(),
            node: error.node.as_ref().map(NodeInfo::from),
        }
    }
}

/// Runs the dump command.
pub fn run(
    path: &Path,
    errors: bool,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if !path.is_dir() {
        return Err(format!("No segment directory at {:?}", path).into());
    }

    if errors {
        let records = read_records::<DecodeError, ErrorInfo>(path, limit)?;
        match format {
            "json" => println!("{}", serde_json::to_string_pretty(&records)?),
            _ => print_errors(&records),
        }
    } else {
        let records = read_records::<Node, NodeInfo>(path, limit)?;
        match format {
            "json" => println!("{}", serde_json::to_string_pretty(&records)?),
            _ => print_nodes(&records),
        }
    }
    Ok(())
}

fn read_records<T, I>(
    path: &Path,
    limit: Option<usize>,
) -> Result<Vec<I>, Box<dyn std::error::Error>>
where
    T: Sequenced + Payload,
    I: for<'a> From<&'a T>,
{
    let max_records = limit.unwrap_or(usize::MAX);
    let mut iter = SequencedIterator::<T>::open(path)?;
    let mut records = Vec::new();
    while records.len() < max_records {
        let Some(record) = iter.pop()? else {
            break;
        };
        records.push(I::from(&record));
    }
    Ok(records)
}

fn print_nodes(records: &[NodeInfo]) {
    println!("Nodes ({} total)", records.len());
    println!("================");
    println!();

    for record in records {
        print!("[{:08}] {:10}", record.block, record.store_key);
        if record.delete {
            print!(" delete");
        } else {
            print!(" set   ");
        }
        print!(" key={}", record.key);
        print!(" value={} bytes", record.value_size);
        if let Some((first, last)) = record.orphaned {
            print!(" orphaned={}..{}", first, last);
        }
        println!();
    }
}

fn print_errors(records: &[ErrorInfo]) {
    println!("Decode errors ({} total)", records.len());
    println!("================");
    println!();

    for record in records {
        print!("[{:08}] {:10} {}", record.block, record.store_key, record.reason);
        if let Some(node) = &record.node {
            print!(" key={}", node.key);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeseg_core::{SegmentWriter, WriterConfig};
    use tempfile::tempdir;

    #[test]
    fn reads_up_to_limit() {
        let dir = tempdir().unwrap();
        let mut writer = SegmentWriter::new(WriterConfig::new(dir.path()));
        writer
            .compact((0..10).map(|b| Node::set("bank", vec![b as u8], vec![0u8; 4], b)))
            .unwrap();

        let records = read_records::<Node, NodeInfo>(dir.path(), Some(3)).unwrap();
        let blocks: Vec<_> = records.iter().map(|r| r.block).collect();
        assert_eq!(blocks, vec![0, 1, 2]);
        assert_eq!(records[1].key, "01");
    }

    #[test]
    fn reads_decode_errors() {
        let dir = tempdir().unwrap();
        let mut writer = SegmentWriter::new(WriterConfig::new(dir.path()));
        writer
            .compact([DecodeError::new("bad", Some(Node::delete("acc", vec![1u8], 4)))])
            .unwrap();

        let records = read_records::<DecodeError, ErrorInfo>(dir.path(), None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].block, 4);
        assert_eq!(records[0].store_key, "acc");
        assert!(records[0].node.as_ref().unwrap().delete);
    }
}
