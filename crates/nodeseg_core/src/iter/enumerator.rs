//! Lazy directory enumeration.
//!
//! A background thread walks the directory tree and hands file paths to
//! the reader through a rendezvous channel, so the walk never runs more
//! than one file ahead of the reader. Walk failures are sent down the same
//! channel and surface as errors from [`DirectoryEnumerator::next_file`].

use crate::error::{CoreError, CoreResult};
use crate::segment::naming::segment_order;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, Span};

type Handoff = flume::Sender<CoreResult<PathBuf>>;

/// Yields every non-directory path under a root, in segment read order.
///
/// Entries of each directory are ordered by [`segment_order`], which puts
/// the files of one writer back in the order they were written.
#[derive(Debug)]
pub struct DirectoryEnumerator {
    root: PathBuf,
    rx: flume::Receiver<CoreResult<PathBuf>>,
    done: bool,
}

impl DirectoryEnumerator {
    /// Starts walking `root` on a background thread.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Spawn`] if the walker thread cannot start.
    /// Errors from the walk itself are delivered by [`next_file`](Self::next_file).
    pub fn spawn(root: impl AsRef<Path>, span: Span) -> CoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        let (tx, rx) = flume::bounded(0);

        let walk_root = root.clone();
        let name = "segment-walk".to_string();
        thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let _enter = span.enter();
                debug!(root = %walk_root.display(), "walk started");
                match walk(&walk_root, &tx) {
                    Ok(true) => debug!(root = %walk_root.display(), "walk complete"),
                    Ok(false) => debug!(root = %walk_root.display(), "reader went away"),
                    Err(e) => {
                        let _ = tx.send(Err(e));
                    }
                }
            })
            .map_err(|source| CoreError::Spawn { name, source })?;

        Ok(Self {
            root,
            rx,
            done: false,
        })
    }

    /// Returns the directory being walked.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Waits for the next file path.
    ///
    /// Returns `Ok(None)` once the walk has finished. A walk error is
    /// returned once, after which the enumerator is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Walk`] if a directory could not be read.
    pub fn next_file(&mut self) -> CoreResult<Option<PathBuf>> {
        if self.done {
            return Ok(None);
        }
        match self.rx.recv() {
            Ok(Ok(path)) => Ok(Some(path)),
            Ok(Err(e)) => {
                self.done = true;
                Err(e)
            }
            Err(flume::RecvError::Disconnected) => {
                self.done = true;
                Ok(None)
            }
        }
    }
}

/// Walks `dir` depth first, sending file paths in segment order.
///
/// Returns `Ok(false)` as soon as the receiving side has been dropped.
fn walk(dir: &Path, tx: &Handoff) -> CoreResult<bool> {
    let mut entries = fs::read_dir(dir)
        .and_then(|entries| entries.collect::<io::Result<Vec<_>>>())
        .map_err(|e| CoreError::walk(dir, e))?;
    entries.sort_by_cached_key(|entry| segment_order(&entry.file_name()));

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| CoreError::walk(&path, e))?;
        if file_type.is_dir() {
            if !walk(&path, tx)? {
                return Ok(false);
            }
        } else if tx.send(Ok(path)).is_err() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Where a sequenced reader gets its file paths from.
#[derive(Debug)]
pub(crate) enum FileSource {
    /// A live directory walk.
    Walk(DirectoryEnumerator),
    /// An explicit list, read in order.
    Listed(std::vec::IntoIter<PathBuf>),
}

impl FileSource {
    pub(crate) fn next_file(&mut self) -> CoreResult<Option<PathBuf>> {
        match self {
            Self::Walk(enumerator) => enumerator.next_file(),
            Self::Listed(files) => Ok(files.next()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn drain(enumerator: &mut DirectoryEnumerator) -> Vec<PathBuf> {
        let mut files = Vec::new();
        while let Some(path) = enumerator.next_file().unwrap() {
            files.push(path);
        }
        files
    }

    #[test]
    fn yields_files_in_name_order() {
        let dir = tempdir().unwrap();
        for name in ["00000003.pb.gz", "00000001.pb.gz", "00000002.pb.gz"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let mut enumerator = DirectoryEnumerator::spawn(dir.path(), Span::none()).unwrap();
        let files = drain(&mut enumerator);
        assert_eq!(
            files,
            vec![
                dir.path().join("00000001.pb.gz"),
                dir.path().join("00000002.pb.gz"),
                dir.path().join("00000003.pb.gz"),
            ]
        );
        assert!(enumerator.next_file().unwrap().is_none());
    }

    #[test]
    fn fallback_names_follow_their_base() {
        let dir = tempdir().unwrap();
        let names = [
            "00000005-00000006.pb.gz",
            "00000005-00000005-00000001.pb.gz",
            "00000005.pb.gz",
            "00000004-00000005.pb.gz",
            "00000010.pb.gz",
        ];
        for name in names {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let mut enumerator = DirectoryEnumerator::spawn(dir.path(), Span::none()).unwrap();
        let expected: Vec<_> = [
            "00000004-00000005.pb.gz",
            "00000005.pb.gz",
            "00000005-00000005-00000001.pb.gz",
            "00000005-00000006.pb.gz",
            "00000010.pb.gz",
        ]
        .iter()
        .map(|name| dir.path().join(name))
        .collect();
        assert_eq!(drain(&mut enumerator), expected);
    }

    #[test]
    fn walks_nested_directories() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a").join("b")).unwrap();
        std::fs::write(dir.path().join("a").join("b").join("x"), b"").unwrap();
        std::fs::write(dir.path().join("a").join("y"), b"").unwrap();
        std::fs::write(dir.path().join("z"), b"").unwrap();

        let mut enumerator = DirectoryEnumerator::spawn(dir.path(), Span::none()).unwrap();
        assert_eq!(
            drain(&mut enumerator),
            vec![
                dir.path().join("a").join("b").join("x"),
                dir.path().join("a").join("y"),
                dir.path().join("z"),
            ]
        );
    }

    #[test]
    fn empty_directory() {
        let dir = tempdir().unwrap();
        let mut enumerator = DirectoryEnumerator::spawn(dir.path(), Span::none()).unwrap();
        assert!(enumerator.next_file().unwrap().is_none());
    }

    #[test]
    fn missing_directory_is_a_recoverable_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");

        let mut enumerator = DirectoryEnumerator::spawn(&missing, Span::none()).unwrap();
        let err = enumerator.next_file().unwrap_err();
        assert!(matches!(err, CoreError::Walk { path, .. } if path == missing));
        assert!(enumerator.next_file().unwrap().is_none());
    }

    #[test]
    fn dropping_reader_stops_walker() {
        let dir = tempdir().unwrap();
        for i in 0..10 {
            std::fs::write(dir.path().join(format!("{i:02}")), b"").unwrap();
        }

        let mut enumerator = DirectoryEnumerator::spawn(dir.path(), Span::none()).unwrap();
        assert!(enumerator.next_file().unwrap().is_some());
        drop(enumerator);
    }

    #[test]
    fn listed_source_keeps_order() {
        let files = vec![PathBuf::from("b"), PathBuf::from("a")];
        let mut source = FileSource::Listed(files.clone().into_iter());
        assert_eq!(source.next_file().unwrap(), Some(files[0].clone()));
        assert_eq!(source.next_file().unwrap(), Some(files[1].clone()));
        assert_eq!(source.next_file().unwrap(), None);
    }
}
