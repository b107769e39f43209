//! Segment readers.
//!
//! Readers are pull based and stack on top of each other:
//!
//! ```text
//! DirectoryEnumerator     file paths, walked lazily on a background thread
//!   SequencedIterator     one decoded record per step, across all files
//!     StoreKeyedIterator  stamps the store key, pauses at a block boundary
//!       ChangesetIterator one store's records grouped by block
//!         MultiChangesetIterator
//!                         every store merged by ascending block
//! ```
//!
//! Access is strictly sequential. Each segment is one gzip stream and is
//! decoded from its start.

mod changeset;
mod enumerator;
mod merge;
mod sequenced;
mod store_keyed;

pub use changeset::{Changeset, ChangesetIterator};
pub use enumerator::DirectoryEnumerator;
pub(crate) use enumerator::FileSource;
pub use merge::MultiChangesetIterator;
pub use sequenced::SequencedIterator;
pub use store_keyed::{CursorState, StoreKeyedIterator};

use crate::error::CoreResult;

/// A cursor over decoded records.
///
/// `advance` moves to the next record, `valid` reports whether a record is
/// available and `current` borrows it.
///
/// ```no_run
/// use nodeseg_core::{NodeIterator, SequencedIterator};
/// use nodeseg_codec::Node;
///
/// let mut nodes = SequencedIterator::<Node>::open("out/bank")?;
/// while nodes.valid() {
///     if let Some(node) = nodes.current() {
///         println!("{} {:?}", node.block, node.key);
///     }
///     nodes.advance()?;
/// }
/// # Ok::<(), nodeseg_core::CoreError>(())
/// ```
pub trait NodeIterator {
    /// Record type yielded by the cursor.
    type Item;

    /// Moves to the next record.
    ///
    /// # Errors
    ///
    /// Returns an error if the next record cannot be read or decoded. The
    /// cursor does not move in that case.
    fn advance(&mut self) -> CoreResult<()>;

    /// Returns true if a current record is available.
    fn valid(&self) -> bool;

    /// Returns the current record.
    fn current(&self) -> Option<&Self::Item>;
}
