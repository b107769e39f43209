//! Store-stamping cursor that pauses at a block boundary.

use super::{NodeIterator, SequencedIterator};
use crate::error::CoreResult;
use nodeseg_codec::Node;
use std::path::Path;
use tracing::{info_span, trace};

/// Whether a [`StoreKeyedIterator`] is yielding records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Yielding records up to and including the boundary block.
    Draining,
    /// Stopped in front of the first record past the boundary, or at end
    /// of stream. Only [`StoreKeyedIterator::resume`] leaves this state.
    PausedAtBoundary,
}

/// Wraps a node stream, stamping each record with a store key and pausing
/// once the stream moves past a block boundary.
///
/// The iterator starts paused. While paused, [`advance`](NodeIterator::advance)
/// does nothing and [`current`](NodeIterator::current) is `None`; the record
/// that caused the pause stays pending and becomes the first record after
/// the next [`resume`](Self::resume).
#[derive(Debug)]
pub struct StoreKeyedIterator {
    inner: SequencedIterator<Node>,
    store_key: Option<String>,
    state: CursorState,
    boundary: i64,
}

impl StoreKeyedIterator {
    /// Wraps `inner`. A non-empty `store_key` overwrites every record's key.
    pub fn new(inner: SequencedIterator<Node>, store_key: Option<String>) -> Self {
        let mut iter = Self {
            inner,
            store_key: store_key.filter(|key| !key.is_empty()),
            state: CursorState::PausedAtBoundary,
            boundary: i64::MIN,
        };
        iter.stamp();
        iter
    }

    /// Opens the segment directory `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be walked or its first
    /// record cannot be read.
    pub fn open(dir: impl AsRef<Path>, store_key: Option<&str>) -> CoreResult<Self> {
        let dir = dir.as_ref();
        let span = info_span!(
            "segment_reader",
            dir = %dir.display(),
            store = store_key.unwrap_or_default()
        );
        let inner = SequencedIterator::open_with_span(dir, span)?;
        Ok(Self::new(inner, store_key.map(str::to_owned)))
    }

    /// Clears the pause and drains records with `block <= boundary`.
    ///
    /// Pauses again immediately if the pending record is already past the
    /// boundary or the stream is exhausted.
    pub fn resume(&mut self, boundary: i64) {
        self.boundary = boundary;
        self.state = CursorState::Draining;
        self.check_boundary();
    }

    /// Current state.
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Returns true while paused.
    pub fn is_paused(&self) -> bool {
        self.state == CursorState::PausedAtBoundary
    }

    /// Block boundary of the last resume.
    pub fn boundary(&self) -> i64 {
        self.boundary
    }

    /// Store key stamped onto records, if any.
    pub fn store_key(&self) -> Option<&str> {
        self.store_key.as_deref()
    }

    /// The next record of the underlying stream, paused or not.
    pub fn pending(&self) -> Option<&Node> {
        self.inner.current()
    }

    /// Returns true if the underlying stream has records left.
    pub fn has_pending(&self) -> bool {
        self.inner.valid()
    }

    /// Moves the current record out and advances.
    ///
    /// Returns `Ok(None)` while paused.
    ///
    /// # Errors
    ///
    /// Returns an error if the next record cannot be read.
    pub fn pop(&mut self) -> CoreResult<Option<Node>> {
        let Some(node) = self.current().cloned() else {
            return Ok(None);
        };
        self.advance()?;
        Ok(Some(node))
    }

    fn stamp(&mut self) {
        if let Some(key) = &self.store_key {
            if let Some(node) = self.inner.current_mut() {
                node.store_key.clone_from(key);
            }
        }
    }

    fn check_boundary(&mut self) {
        let past = self
            .inner
            .current()
            .map_or(true, |node| node.block > self.boundary);
        if past {
            trace!(boundary = self.boundary, "paused at boundary");
            self.state = CursorState::PausedAtBoundary;
        }
    }
}

impl NodeIterator for StoreKeyedIterator {
    type Item = Node;

    fn advance(&mut self) -> CoreResult<()> {
        if self.is_paused() {
            return Ok(());
        }
        self.inner.advance()?;
        self.stamp();
        self.check_boundary();
        Ok(())
    }

    fn valid(&self) -> bool {
        self.state == CursorState::Draining && self.inner.valid()
    }

    fn current(&self) -> Option<&Node> {
        match self.state {
            CursorState::Draining => self.inner.current(),
            CursorState::PausedAtBoundary => None,
        }
    }
}
