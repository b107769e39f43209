//! Per-block grouping of one store's node stream.

use super::StoreKeyedIterator;
use crate::error::{CoreError, CoreResult};
use nodeseg_codec::Node;
use std::path::Path;
use tracing::debug;

/// All records one store wrote at one block height.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    /// Block height shared by every node.
    pub version: i64,
    /// Nodes in stream order.
    pub nodes: Vec<Node>,
}

impl Changeset {
    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the changeset holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Groups one store's records into changesets of equal block height.
///
/// Each call to [`next_changeset`](Self::next_changeset) resumes the node
/// cursor at the pending record's block. The caller then drains nodes
/// through [`nodes`](Self::nodes) (or [`drain`](Self::drain)) until the
/// cursor pauses at the next block.
///
/// ```no_run
/// use nodeseg_core::ChangesetIterator;
///
/// let mut changesets = ChangesetIterator::open("out/bank", Some("bank"))?;
/// while changesets.valid() {
///     let changeset = changesets.changeset()?;
///     println!("{}: {} nodes", changeset.version, changeset.len());
///     changesets.next_changeset()?;
/// }
/// # Ok::<(), nodeseg_core::CoreError>(())
/// ```
#[derive(Debug)]
pub struct ChangesetIterator {
    nodes: StoreKeyedIterator,
    version: i64,
}

impl ChangesetIterator {
    /// Wraps a paused node cursor and positions on its first changeset.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ExpectedPaused`] if `nodes` is not paused.
    pub fn new(nodes: StoreKeyedIterator) -> CoreResult<Self> {
        let mut iter = Self { nodes, version: 0 };
        iter.next_changeset()?;
        Ok(iter)
    }

    /// Opens the segment directory `dir` as one store.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn open(dir: impl AsRef<Path>, store_key: Option<&str>) -> CoreResult<Self> {
        Self::new(StoreKeyedIterator::open(dir, store_key)?)
    }

    /// Moves to the changeset of the pending record's block.
    ///
    /// At end of stream this does nothing and [`valid`](Self::valid) turns
    /// false.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ExpectedPaused`] if nodes of the current
    /// changeset are still undrained.
    pub fn next_changeset(&mut self) -> CoreResult<()> {
        if !self.nodes.is_paused() {
            return Err(CoreError::ExpectedPaused {
                store: self.nodes.store_key().unwrap_or_default().to_string(),
            });
        }
        let Some(version) = self.nodes.pending().map(|node| node.block) else {
            return Ok(());
        };

        debug!(
            store = self.nodes.store_key().unwrap_or_default(),
            version, "changeset boundary"
        );
        self.version = version;
        self.nodes.resume(version);
        Ok(())
    }

    /// Returns true while the store has records left.
    pub fn valid(&self) -> bool {
        self.nodes.has_pending()
    }

    /// Block height of the current changeset.
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Store key of this stream, if one is stamped.
    pub fn store_key(&self) -> Option<&str> {
        self.nodes.store_key()
    }

    /// Node cursor of the current changeset.
    pub fn nodes(&mut self) -> &mut StoreKeyedIterator {
        &mut self.nodes
    }

    /// Collects the remaining nodes of the current changeset.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be read.
    pub fn drain(&mut self) -> CoreResult<Vec<Node>> {
        let mut nodes = Vec::new();
        while let Some(node) = self.nodes.pop()? {
            nodes.push(node);
        }
        Ok(nodes)
    }

    /// Drains the current changeset into a [`Changeset`].
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be read.
    pub fn changeset(&mut self) -> CoreResult<Changeset> {
        Ok(Changeset {
            version: self.version,
            nodes: self.drain()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NodeIterator, SegmentWriter, WriterConfig};
    use nodeseg_codec::Payload;
    use tempfile::tempdir;

    fn write(dir: &Path, blocks: &[i64], max_file_size: usize) {
        let mut writer = SegmentWriter::new(WriterConfig::new(dir).max_file_size(max_file_size));
        writer
            .compact(
                blocks
                    .iter()
                    .enumerate()
                    .map(|(i, &b)| Node::set("", vec![i as u8], vec![0u8; 16], b)),
            )
            .unwrap();
    }

    fn collect(iter: &mut ChangesetIterator) -> Vec<(i64, usize)> {
        let mut out = Vec::new();
        while iter.valid() {
            let changeset = iter.changeset().unwrap();
            out.push((changeset.version, changeset.len()));
            iter.next_changeset().unwrap();
        }
        out
    }

    #[test]
    fn groups_by_block() {
        let dir = tempdir().unwrap();
        write(dir.path(), &[1, 1, 1, 2, 4, 4], usize::MAX);

        let mut iter = ChangesetIterator::open(dir.path(), Some("bank")).unwrap();
        assert_eq!(iter.version(), 1);
        assert_eq!(collect(&mut iter), vec![(1, 3), (2, 1), (4, 2)]);
    }

    #[test]
    fn groups_across_segment_files() {
        let dir = tempdir().unwrap();
        write(dir.path(), &[1, 1, 2, 2, 2, 3, 3], 1);

        let mut iter = ChangesetIterator::open(dir.path(), None).unwrap();
        assert_eq!(collect(&mut iter), vec![(1, 2), (2, 3), (3, 2)]);
    }

    #[test]
    fn repeated_height_spanning_fallback_segments() {
        let dir = tempdir().unwrap();
        let frame = 4 + Node::set("", vec![0], vec![0u8; 16], 5)
            .encode_payload()
            .unwrap()
            .len();
        // Two frames per segment: a base name, a sequence fallback, then a range.
        write(dir.path(), &[5, 5, 5, 5, 5, 6], 2 * frame - 1);
        assert!(dir.path().join("00000005-00000005-00000001.pb.gz").exists());

        let mut iter = ChangesetIterator::open(dir.path(), None).unwrap();
        assert_eq!(collect(&mut iter), vec![(5, 5), (6, 1)]);
    }

    #[test]
    fn stamps_store_key_on_nodes() {
        let dir = tempdir().unwrap();
        write(dir.path(), &[7, 7], usize::MAX);

        let mut iter = ChangesetIterator::open(dir.path(), Some("acc")).unwrap();
        assert_eq!(iter.store_key(), Some("acc"));
        for node in iter.drain().unwrap() {
            assert_eq!(node.store_key, "acc");
        }
    }

    #[test]
    fn nodes_cursor_drains_one_changeset() {
        let dir = tempdir().unwrap();
        write(dir.path(), &[1, 1, 2], usize::MAX);

        let mut iter = ChangesetIterator::open(dir.path(), None).unwrap();
        let mut count = 0;
        while iter.nodes().valid() {
            assert_eq!(iter.nodes().current().unwrap().block, 1);
            iter.nodes().advance().unwrap();
            count += 1;
        }
        assert_eq!(count, 2);
        iter.next_changeset().unwrap();
        assert_eq!(iter.version(), 2);
    }

    #[test]
    fn next_before_drain_is_rejected() {
        let dir = tempdir().unwrap();
        write(dir.path(), &[1, 2], usize::MAX);

        let mut iter = ChangesetIterator::open(dir.path(), Some("bank")).unwrap();
        let err = iter.next_changeset().unwrap_err();
        assert!(matches!(err, CoreError::ExpectedPaused { store } if store == "bank"));
    }

    #[test]
    fn empty_store_is_invalid() {
        let dir = tempdir().unwrap();
        let iter = ChangesetIterator::open(dir.path(), None).unwrap();
        assert!(!iter.valid());
    }

    #[test]
    fn last_changeset_is_valid_until_drained() {
        let dir = tempdir().unwrap();
        write(dir.path(), &[9], usize::MAX);

        let mut iter = ChangesetIterator::open(dir.path(), None).unwrap();
        assert!(iter.valid());
        assert_eq!(iter.drain().unwrap().len(), 1);
        assert!(!iter.valid());
        iter.next_changeset().unwrap();
        assert_eq!(iter.version(), 9);
    }
}
