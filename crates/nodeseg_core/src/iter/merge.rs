//! Ascending-height merge of several stores' changesets.

use super::{Changeset, ChangesetIterator};
use crate::error::{CoreError, CoreResult};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info_span, Span};

/// Merges per-store changeset streams into one stream of ascending height.
///
/// Each step takes the lowest version among the stores and combines every
/// store's changeset at that version into one [`Changeset`]. Stores at a
/// higher version are left alone until the merge catches up.
///
/// The merge ends as soon as any store runs out of records, even if others
/// still have data. Stores are expected to cover the same height range.
///
/// A read error ends the merge too: the failing call returns the error and
/// the iterator then reports itself exhausted.
#[derive(Debug)]
pub struct MultiChangesetIterator {
    stores: Vec<ChangesetIterator>,
    /// Stores whose changeset went into `current` and must move on next step.
    absorbed: Vec<bool>,
    current: Option<Changeset>,
    failed: bool,
    span: Span,
}

impl MultiChangesetIterator {
    /// Opens every subdirectory of `dir` as a store named after it.
    ///
    /// Stores are opened in name order.
    ///
    /// # Errors
    ///
    /// - [`CoreError::DirectoryShape`] if `dir` holds a plain file
    /// - [`CoreError::Walk`] if `dir` cannot be listed
    /// - any error opening a store
    pub fn open(dir: impl AsRef<Path>) -> CoreResult<Self> {
        let dir = dir.as_ref();
        let span = info_span!("changeset_merge", dir = %dir.display());

        let mut entries = fs::read_dir(dir)
            .and_then(|entries| entries.collect::<io::Result<Vec<_>>>())
            .map_err(|e| CoreError::walk(dir, e))?;
        entries.sort_by_key(|entry| entry.file_name());

        let mut stores = Vec::with_capacity(entries.len());
        for entry in entries {
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| CoreError::walk(&path, e))?;
            if !file_type.is_dir() {
                return Err(CoreError::directory_shape(
                    path,
                    "expected a store directory, found a file",
                ));
            }
            let store_key = entry.file_name().to_string_lossy().into_owned();
            stores.push(ChangesetIterator::open(&path, Some(store_key.as_str()))?);
        }
        Self::with_span(stores, span)
    }

    /// Merges already opened stores and positions on the first changeset.
    ///
    /// # Errors
    ///
    /// Returns an error if the first changeset cannot be read.
    pub fn from_stores(stores: Vec<ChangesetIterator>) -> CoreResult<Self> {
        let span = info_span!("changeset_merge", stores = stores.len());
        Self::with_span(stores, span)
    }

    /// Like [`from_stores`](Self::from_stores), logging under the given span.
    ///
    /// # Errors
    ///
    /// Returns an error if the first changeset cannot be read.
    pub fn with_span(stores: Vec<ChangesetIterator>, span: Span) -> CoreResult<Self> {
        let mut iter = Self {
            absorbed: vec![false; stores.len()],
            stores,
            current: None,
            failed: false,
            span,
        };
        iter.next_changeset()?;
        Ok(iter)
    }

    /// Moves to the next merged changeset.
    ///
    /// After an error the merge is exhausted and further calls do nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if a store fails to read.
    pub fn next_changeset(&mut self) -> CoreResult<()> {
        if self.failed {
            return Ok(());
        }
        let span = self.span.clone();
        let _enter = span.enter();

        let result = self.step();
        if let Err(e) = &result {
            debug!(error = %e, "merge failed");
            self.failed = true;
            self.current = None;
        }
        result
    }

    fn step(&mut self) -> CoreResult<()> {
        for (store, absorbed) in self.stores.iter_mut().zip(self.absorbed.iter_mut()) {
            if *absorbed {
                store.next_changeset()?;
                *absorbed = false;
            }
        }

        if self.stores.is_empty() || !self.stores.iter().all(ChangesetIterator::valid) {
            if self.current.take().is_some() {
                debug!("merge exhausted");
            }
            return Ok(());
        }

        let Some(version) = self.stores.iter().map(ChangesetIterator::version).min() else {
            self.current = None;
            return Ok(());
        };

        let mut nodes = Vec::new();
        for store in self.stores.iter_mut().filter(|s| s.version() == version) {
            nodes.extend(store.drain()?);
        }
        for (store, absorbed) in self.stores.iter().zip(self.absorbed.iter_mut()) {
            *absorbed = store.version() == version;
        }
        debug!(version, nodes = nodes.len(), "merged changeset");
        self.current = Some(Changeset { version, nodes });
        Ok(())
    }

    /// Returns true if a merged changeset is available.
    pub fn valid(&self) -> bool {
        self.current.is_some()
    }

    /// Version of the current merged changeset.
    pub fn version(&self) -> Option<i64> {
        self.current.as_ref().map(|changeset| changeset.version)
    }

    /// The current merged changeset.
    pub fn changeset(&self) -> Option<&Changeset> {
        self.current.as_ref()
    }

    /// Moves the current merged changeset out and advances.
    ///
    /// # Errors
    ///
    /// Returns an error if a store fails to read.
    pub fn pop(&mut self) -> CoreResult<Option<Changeset>> {
        let Some(changeset) = self.current.take() else {
            return Ok(None);
        };
        self.next_changeset()?;
        Ok(Some(changeset))
    }

    /// Store keys being merged, in open order.
    pub fn store_keys(&self) -> Vec<&str> {
        self.stores
            .iter()
            .map(|store| store.store_key().unwrap_or_default())
            .collect()
    }
}
