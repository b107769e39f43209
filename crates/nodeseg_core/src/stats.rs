//! Write statistics and read-after-write validation.
//!
//! # Usage
//!
//! ```rust,ignore
//! let stats = writer.compact(nodes)?;
//! println!("{}", stats.report());
//! stats.validate::<Node>()?;
//! ```

use crate::error::{CoreError, CoreResult};
use crate::iter::{NodeIterator, SequencedIterator};
use nodeseg_codec::{Payload, Sequenced};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Statistics for one completed segment writer run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Stats {
    /// Segment files written, in write order.
    pub files_written: Vec<PathBuf>,
    /// Per-segment details, in write order.
    pub segments: Vec<SegmentSummary>,
    /// Serialized record bytes, before framing and compression.
    pub bytes_read: u64,
    /// Compressed bytes written to disk.
    pub bytes_written: u64,
    /// Records written.
    pub node_count: u64,
    /// Flush requests that found nothing buffered.
    pub wasted_flushes: u64,
}

/// One segment file produced by a writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentSummary {
    /// File path.
    pub path: PathBuf,
    /// Compressed size in bytes.
    pub bytes: u64,
    /// Records in the segment.
    pub nodes: u64,
    /// Lowest block in the segment.
    pub min_block: i64,
    /// Highest block in the segment.
    pub max_block: i64,
}

impl Stats {
    pub(crate) fn record_segment(&mut self, summary: SegmentSummary) {
        self.bytes_written += summary.bytes;
        self.files_written.push(summary.path.clone());
        self.segments.push(summary);
    }

    /// Renders a human-readable summary.
    #[must_use]
    pub fn report(&self) -> String {
        let mut out = String::from("compaction stats:\n");
        let _ = writeln!(out, "file count: {}", self.files_written.len());
        let _ = writeln!(out, "read: {}", pretty_byte_size(self.bytes_read));
        let _ = writeln!(out, "wrote: {}", pretty_byte_size(self.bytes_written));
        let _ = writeln!(out, "node count: {}", with_commas(self.node_count));
        if let Some(last) = self.files_written.last() {
            let _ = writeln!(out, "last file written: {}", last.display());
        }
        out
    }

    /// Replays every written file and checks the record count.
    ///
    /// Files are read directly in write order, independent of any directory
    /// listing. Returns the number of records read back.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NoFilesWritten`] if the write produced no files
    /// - [`CoreError::CountMismatch`] if the replayed count differs
    /// - any read or decode error hit while replaying
    pub fn validate<T: Sequenced + Payload>(&self) -> CoreResult<u64> {
        if self.files_written.is_empty() {
            return Err(CoreError::NoFilesWritten);
        }

        let mut iter = SequencedIterator::<T>::from_files(self.files_written.clone())?;
        while iter.valid() {
            iter.advance()?;
        }

        let actual = iter.records_read();
        if actual != self.node_count {
            return Err(CoreError::CountMismatch {
                expected: self.node_count,
                actual,
            });
        }
        Ok(actual)
    }
}

/// Formats a byte count with binary prefixes, e.g. `1.5KiB`.
#[must_use]
pub fn pretty_byte_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei", "Zi"] {
        if size.abs() < 1024.0 {
            return format!("{size:3.1}{unit}B");
        }
        size /= 1024.0;
    }
    format!("{size:.1}YiB")
}

/// Formats an integer with thousands separators, e.g. `1,000`.
#[must_use]
pub fn with_commas(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SegmentWriter, WriterConfig};
    use nodeseg_codec::{DecodeError, Node};
    use tempfile::tempdir;

    fn write(dir: &std::path::Path, count: i64, max_file_size: usize) -> Stats {
        let mut writer = SegmentWriter::new(WriterConfig::new(dir).max_file_size(max_file_size));
        writer
            .compact((0..count).map(|b| Node::set("test", vec![1u8; 20], vec![2u8; 200], b)))
            .unwrap()
    }

    #[test]
    fn byte_sizes() {
        assert_eq!(pretty_byte_size(0), "0.0B");
        assert_eq!(pretty_byte_size(512), "512.0B");
        assert_eq!(pretty_byte_size(1024), "1.0KiB");
        assert_eq!(pretty_byte_size(1536), "1.5KiB");
        assert_eq!(pretty_byte_size(100 * 1024 * 1024), "100.0MiB");
    }

    #[test]
    fn commas() {
        assert_eq!(with_commas(0), "0");
        assert_eq!(with_commas(999), "999");
        assert_eq!(with_commas(1000), "1,000");
        assert_eq!(with_commas(1_234_567), "1,234,567");
    }

    #[test]
    fn report_lists_last_file() {
        let dir = tempdir().unwrap();
        let stats = write(dir.path(), 1000, usize::MAX);
        let report = stats.report();

        assert!(report.starts_with("compaction stats:\n"));
        assert!(report.contains("file count: 1\n"));
        assert!(report.contains("node count: 1,000\n"));
        assert!(report.contains("00000000-00000999.pb.gz"));
    }

    #[test]
    fn report_without_files() {
        let report = Stats::default().report();
        assert!(report.contains("file count: 0\n"));
        assert!(!report.contains("last file written"));
    }

    #[test]
    fn validate_counts_all_segments() {
        let dir = tempdir().unwrap();
        let stats = write(dir.path(), 50, 1000);
        assert!(stats.files_written.len() > 1);
        assert_eq!(stats.validate::<Node>().unwrap(), 50);
    }

    #[test]
    fn validate_without_files() {
        let err = Stats::default().validate::<Node>().unwrap_err();
        assert!(matches!(err, CoreError::NoFilesWritten));
    }

    #[test]
    fn validate_detects_count_mismatch() {
        let dir = tempdir().unwrap();
        let mut stats = write(dir.path(), 10, usize::MAX);
        stats.node_count = 11;

        let err = stats.validate::<Node>().unwrap_err();
        assert!(matches!(
            err,
            CoreError::CountMismatch {
                expected: 11,
                actual: 10
            }
        ));
    }

    #[test]
    fn validate_detects_missing_file() {
        let dir = tempdir().unwrap();
        let stats = write(dir.path(), 50, 1000);
        std::fs::remove_file(&stats.files_written[1]).unwrap();

        let err = stats.validate::<Node>().unwrap_err();
        assert!(matches!(err, CoreError::OpenFailure { .. }));
    }

    #[test]
    fn validate_detects_truncated_file() {
        let dir = tempdir().unwrap();
        let stats = write(dir.path(), 10, usize::MAX);
        let path = &stats.files_written[0];
        let bytes = std::fs::read(path).unwrap();
        std::fs::write(path, &bytes[..bytes.len() / 2]).unwrap();

        assert!(stats.validate::<Node>().is_err());
    }

    #[test]
    fn validate_decode_error_segments() {
        let dir = tempdir().unwrap();
        let mut writer = SegmentWriter::new(WriterConfig::new(dir.path()));
        let stats = writer
            .compact((0..25).map(|b| {
                DecodeError::new("testing", Some(Node::set("test", vec![0u8; 4], vec![0u8; 4], b)))
            }))
            .unwrap();
        assert_eq!(stats.validate::<DecodeError>().unwrap(), 25);
    }
}
