//! Error types for nodeseg core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while writing or reading segments.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Frame or payload codec error.
    ///
    /// Covers incomplete frames and malformed payloads.
    #[error("codec error: {0}")]
    Codec(#[from] nodeseg_codec::CodecError),

    /// I/O error outside of a segment flush.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Both the ordered segment name and its sequence-suffixed fallback exist.
    #[error("segment file already exists: {}", path.display())]
    FileExists {
        /// The fallback path that was found to exist.
        path: PathBuf,
    },

    /// Writing a segment file failed.
    #[error("failed to write segment {}: {source}", path.display())]
    WriteFailure {
        /// Segment path being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Opening a segment file for reading failed.
    #[error("failed to open segment {}: {source}", path.display())]
    OpenFailure {
        /// Segment path being opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Walking a segment directory failed.
    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Found a file where a directory was expected, or the reverse.
    #[error("unexpected directory layout at {}: {message}", path.display())]
    DirectoryShape {
        /// Offending path.
        path: PathBuf,
        /// What was expected there.
        message: String,
    },

    /// A changeset was advanced while its node stream was still draining.
    #[error("changeset iterator for store '{store}' advanced before its nodes were drained")]
    ExpectedPaused {
        /// Store key of the offending iterator (empty if unset).
        store: String,
    },

    /// Validation replayed a different number of records than were written.
    #[error("node count mismatch: wrote {expected}, read back {actual}")]
    CountMismatch {
        /// Records counted while writing.
        expected: u64,
        /// Records decoded on replay.
        actual: u64,
    },

    /// Validation was asked to check a write that produced no files.
    #[error("no files written")]
    NoFilesWritten,

    /// A background thread could not be started.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        /// Thread name.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The write loop aborted and the final flush failed as well.
    ///
    /// Neither error is dropped: `first` stopped the loop, `flush` came
    /// from the deferred final flush.
    #[error("write aborted ({first}); final flush also failed ({flush})")]
    FlushAfterAbort {
        /// Error that aborted the write loop.
        first: Box<CoreError>,
        /// Error from the final flush.
        flush: Box<CoreError>,
    },
}

impl CoreError {
    /// Creates a directory shape error.
    pub fn directory_shape(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::DirectoryShape {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a write failure error.
    pub fn write_failure(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::WriteFailure {
            path: path.into(),
            source,
        }
    }

    /// Creates an open failure error.
    pub fn open_failure(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::OpenFailure {
            path: path.into(),
            source,
        }
    }

    /// Creates a directory walk error.
    pub fn walk(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Walk {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the error is a frame cut short by end of stream.
    #[must_use]
    pub fn is_incomplete_frame(&self) -> bool {
        matches!(self, Self::Codec(e) if e.is_incomplete_frame())
    }
}
