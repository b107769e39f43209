//! Segment writer.
//!
//! Consumes a stream of records, frames each one into an in-memory gzip
//! stream and rotates to a new segment file once the uncompressed frame
//! bytes exceed [`WriterConfig::max_file_size`].
//!
//! Files are written in one shot with no write-then-rename step: a crash
//! during a flush can leave a truncated segment behind.

use crate::config::WriterConfig;
use crate::error::{CoreError, CoreResult};
use crate::segment::naming;
use crate::stats::{SegmentSummary, Stats};
use flate2::write::GzEncoder;
use flate2::Compression;
use nodeseg_codec::{write_frame, Payload, Sequenced, FRAME_HEADER_SIZE};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::Path;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, info_span, warn, Span};

/// Writes records into size-bounded, gzip-compressed segment files.
///
/// # Example
///
/// ```no_run
/// use nodeseg_codec::Node;
/// use nodeseg_core::{SegmentWriter, WriterConfig};
///
/// let mut writer = SegmentWriter::<Node>::new(WriterConfig::new("out/bank"));
/// let nodes = (0..10).map(|i| Node::set("bank", vec![i as u8], vec![0u8; 32], i));
/// let stats = writer.compact(nodes)?;
/// stats.validate::<Node>()?;
/// # Ok::<(), nodeseg_core::CoreError>(())
/// ```
pub struct SegmentWriter<T> {
    config: WriterConfig,
    encoder: GzEncoder<Vec<u8>>,
    /// Uncompressed frame bytes in the active segment.
    buffered: usize,
    /// Records in the active segment.
    nodes: u64,
    min_block: i64,
    max_block: i64,
    last_block: Option<i64>,
    file_seq: u64,
    stats: Stats,
    span: Span,
    _record: PhantomData<fn(&T)>,
}

impl<T: Sequenced + Payload> SegmentWriter<T> {
    /// Creates a writer for the given configuration.
    #[must_use]
    pub fn new(config: WriterConfig) -> Self {
        let span = info_span!("segment_writer", dir = %config.out_dir.display());
        Self {
            encoder: new_encoder(config.compression_level),
            buffered: 0,
            nodes: 0,
            min_block: i64::MAX,
            max_block: i64::MIN,
            last_block: None,
            file_seq: config.file_seq,
            stats: Stats::default(),
            span,
            config,
            _record: PhantomData,
        }
    }

    /// Replaces the span the writer logs under.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Returns the writer configuration.
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Returns the statistics accumulated so far.
    ///
    /// Still meaningful after a failed [`compact`](Self::compact): it lists
    /// every segment that did reach disk.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Returns the sequence number the next segment will use.
    pub fn file_seq(&self) -> u64 {
        self.file_seq
    }

    /// Returns the uncompressed bytes buffered for the active segment.
    pub fn buffered_bytes(&self) -> usize {
        self.buffered
    }

    /// Appends one record, flushing if the segment grows past the threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or a triggered
    /// flush fails.
    pub fn append(&mut self, record: &T) -> CoreResult<()> {
        let block = record.sequence();
        if self.config.ordered {
            if let Some(last) = self.last_block.filter(|&last| block < last) {
                let _enter = self.span.enter();
                warn!(block, last, "ordered input went backwards");
            }
        }

        let len = write_frame(&mut self.encoder, record)?;

        self.min_block = self.min_block.min(block);
        self.max_block = self.max_block.max(block);
        self.last_block = Some(block);
        self.buffered += FRAME_HEADER_SIZE + len;
        self.nodes += 1;
        self.stats.node_count += 1;
        self.stats.bytes_read += len as u64;

        if self.buffered > self.config.max_file_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Writes the active segment to disk, if it holds any records.
    ///
    /// # Errors
    ///
    /// - [`CoreError::FileExists`] if no free ordered name is left; the
    ///   buffered records are kept
    /// - [`CoreError::WriteFailure`] if compression or the file write fails;
    ///   the buffered records are lost
    pub fn flush(&mut self) -> CoreResult<()> {
        if self.nodes == 0 {
            self.stats.wasted_flushes += 1;
            return Ok(());
        }
        let span = self.span.clone();
        let _enter = span.enter();

        let dir = self.config.out_dir.clone();
        let path = if self.config.ordered {
            naming::ordered_path(&dir, self.min_block, self.max_block, self.file_seq)?
        } else {
            naming::unordered_path(&dir, self.config.worker_id, self.file_seq)
        };

        let encoder = std::mem::replace(
            &mut self.encoder,
            new_encoder(self.config.compression_level),
        );
        let summary = SegmentSummary {
            path: path.clone(),
            bytes: 0,
            nodes: self.nodes,
            min_block: self.min_block,
            max_block: self.max_block,
        };
        self.reset_segment();

        let bytes = encoder
            .finish()
            .map_err(|e| CoreError::write_failure(&path, e))?;
        write_segment(&dir, &path, &bytes, self.config.ordered)?;

        info!(
            file = %path.file_name().unwrap_or_default().to_string_lossy(),
            nodes = summary.nodes,
            bytes = bytes.len(),
            "wrote segment"
        );
        self.stats.record_segment(SegmentSummary {
            bytes: bytes.len() as u64,
            ..summary
        });
        self.file_seq += 1;
        Ok(())
    }

    /// Consumes `input` until it ends, then flushes the final segment.
    ///
    /// The final flush runs even if the loop aborts, so a partial segment
    /// may still reach disk after an error.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the loop, or the final flush error.
    /// If both fail, returns [`CoreError::FlushAfterAbort`] carrying both.
    pub fn compact<I>(&mut self, input: I) -> CoreResult<Stats>
    where
        I: IntoIterator<Item = T>,
    {
        let consumed = input
            .into_iter()
            .try_for_each(|record| self.append(&record));
        let flushed = self.flush();

        let _enter = self.span.enter();
        match (consumed, flushed) {
            (Ok(()), Ok(())) => {
                debug!(
                    files = self.stats.files_written.len(),
                    nodes = self.stats.node_count,
                    "compaction complete"
                );
                Ok(self.stats.clone())
            }
            (Err(first), Ok(())) => Err(first),
            (Ok(()), Err(flush)) => Err(flush),
            (Err(first), Err(flush)) => Err(CoreError::FlushAfterAbort {
                first: Box::new(first),
                flush: Box::new(flush),
            }),
        }
    }

    /// Flushes the final segment and returns the statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    pub fn finish(mut self) -> CoreResult<Stats> {
        self.flush()?;
        Ok(self.stats)
    }

    fn reset_segment(&mut self) {
        self.buffered = 0;
        self.nodes = 0;
        self.min_block = i64::MAX;
        self.max_block = i64::MIN;
    }
}

impl<T> SegmentWriter<T>
where
    T: Sequenced + Payload + Send + 'static,
{
    /// Runs a writer on its own thread, fed through a channel.
    ///
    /// Dropping every sender ends the input stream; the join handle then
    /// yields the result of [`compact`](Self::compact).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Spawn`] if the thread cannot be started.
    pub fn spawn(
        config: WriterConfig,
        capacity: usize,
    ) -> CoreResult<(flume::Sender<T>, JoinHandle<CoreResult<Stats>>)> {
        let (tx, rx) = flume::bounded(capacity);
        let mut writer = Self::new(config);
        let name = "segment-writer".to_string();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || writer.compact(rx))
            .map_err(|source| CoreError::Spawn { name, source })?;
        Ok((tx, handle))
    }
}

impl<T> std::fmt::Debug for SegmentWriter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentWriter")
            .field("out_dir", &self.config.out_dir)
            .field("ordered", &self.config.ordered)
            .field("buffered", &self.buffered)
            .field("file_seq", &self.file_seq)
            .finish_non_exhaustive()
    }
}

fn new_encoder(level: u32) -> GzEncoder<Vec<u8>> {
    GzEncoder::new(Vec::new(), Compression::new(level))
}

fn write_segment(dir: &Path, path: &Path, bytes: &[u8], create_new: bool) -> CoreResult<()> {
    fs::create_dir_all(dir).map_err(|e| CoreError::write_failure(dir, e))?;

    let mut options = OpenOptions::new();
    options.write(true);
    if create_new {
        options.create_new(true);
    } else {
        options.create(true).truncate(true);
    }

    let mut file = options.open(path).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => CoreError::FileExists {
            path: path.to_path_buf(),
        },
        _ => CoreError::write_failure(path, e),
    })?;
    file.write_all(bytes)
        .map_err(|e| CoreError::write_failure(path, e))
}
