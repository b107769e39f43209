//! Record iterator over a stream of segment files.

use super::{DirectoryEnumerator, FileSource, NodeIterator};
use crate::error::{CoreError, CoreResult};
use flate2::read::GzDecoder;
use nodeseg_codec::{read_frame, Payload, Sequenced};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span, Span};

/// The segment currently being decoded.
struct OpenSegment {
    path: PathBuf,
    decoder: GzDecoder<File>,
}

/// Decodes records one at a time across every file from a [`FileSource`].
///
/// Reaching the end of one file moves on to the next; the stream ends only
/// once the file source is exhausted too. The same iterator reads nodes or
/// decode-error records, depending on `T`.
///
/// Constructors position the iterator on the first record, so
/// [`valid`](NodeIterator::valid) is meaningful straight away.
pub struct SequencedIterator<T> {
    source: FileSource,
    segment: Option<OpenSegment>,
    current: Option<T>,
    records_read: u64,
    files_opened: u64,
    span: Span,
}

impl<T: Sequenced + Payload> SequencedIterator<T> {
    /// Opens every segment file under `dir`, in segment read order.
    ///
    /// # Errors
    ///
    /// Returns an error if the walker cannot start or the first record
    /// cannot be read.
    pub fn open(dir: impl AsRef<Path>) -> CoreResult<Self> {
        let dir = dir.as_ref();
        let span = info_span!("segment_reader", dir = %dir.display());
        Self::open_with_span(dir, span)
    }

    /// Like [`open`](Self::open), logging under the given span.
    ///
    /// # Errors
    ///
    /// Same as [`open`](Self::open).
    pub fn open_with_span(dir: impl AsRef<Path>, span: Span) -> CoreResult<Self> {
        let enumerator = DirectoryEnumerator::spawn(dir, span.clone())?;
        Self::with_source(FileSource::Walk(enumerator), span)
    }

    /// Reads the given files in order, without walking a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the first record cannot be read.
    pub fn from_files(files: Vec<PathBuf>) -> CoreResult<Self> {
        let span = info_span!("segment_reader", files = files.len());
        Self::with_source(FileSource::Listed(files.into_iter()), span)
    }

    fn with_source(source: FileSource, span: Span) -> CoreResult<Self> {
        let mut iter = Self {
            source,
            segment: None,
            current: None,
            records_read: 0,
            files_opened: 0,
            span,
        };
        iter.advance()?;
        Ok(iter)
    }

    /// Moves the current record out and advances.
    ///
    /// Returns `Ok(None)` at end of stream. If advancing fails, the record
    /// that was current is dropped along with the error.
    ///
    /// # Errors
    ///
    /// Returns an error if the next record cannot be read.
    pub fn pop(&mut self) -> CoreResult<Option<T>> {
        let Some(record) = self.current.take() else {
            return Ok(None);
        };
        self.advance()?;
        Ok(Some(record))
    }

    /// Records decoded so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Segment files opened so far.
    pub fn files_opened(&self) -> u64 {
        self.files_opened
    }

    /// Path of the segment being decoded, if any.
    pub fn current_file(&self) -> Option<&Path> {
        self.segment.as_ref().map(|segment| segment.path.as_path())
    }

    pub(crate) fn current_mut(&mut self) -> Option<&mut T> {
        self.current.as_mut()
    }

    fn open_segment(&mut self, path: PathBuf) -> CoreResult<OpenSegment> {
        info!(
            file = %path.file_name().unwrap_or_default().to_string_lossy(),
            "open file"
        );
        let file = File::open(&path).map_err(|e| CoreError::open_failure(&path, e))?;
        self.files_opened += 1;
        Ok(OpenSegment {
            path,
            decoder: GzDecoder::new(file),
        })
    }
}

impl<T: Sequenced + Payload> NodeIterator for SequencedIterator<T> {
    type Item = T;

    fn advance(&mut self) -> CoreResult<()> {
        let span = self.span.clone();
        let _enter = span.enter();

        loop {
            if self.segment.is_none() {
                let Some(path) = self.source.next_file()? else {
                    self.current = None;
                    return Ok(());
                };
                self.segment = Some(self.open_segment(path)?);
            }
            let Some(segment) = self.segment.as_mut() else {
                continue;
            };

            match read_frame::<_, T>(&mut segment.decoder)? {
                Some(record) => {
                    self.records_read += 1;
                    self.current = Some(record);
                    return Ok(());
                }
                None => {
                    debug!(path = %segment.path.display(), "end of segment");
                    self.segment = None;
                }
            }
        }
    }

    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }
}

impl<T> std::fmt::Debug for SequencedIterator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequencedIterator")
            .field("file", &self.segment.as_ref().map(|s| &s.path))
            .field("records_read", &self.records_read)
            .field("files_opened", &self.files_opened)
            .finish_non_exhaustive()
    }
}
