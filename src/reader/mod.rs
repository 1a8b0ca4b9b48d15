//! Record readers.
//!
//! Each file shape gets its own reader type, all implementing
//! [`RecordReader`] so the rest of the engine can stay shape-agnostic once
//! [`crate::shape`] has picked one. Every reader resynchronizes on a
//! malformed record rather than aborting outright, within a bounded scan.

mod fasta_only;
mod four_line;
mod multi_line;
mod single_line;
mod split;

pub use fasta_only::FastaOnlyReader;
pub use four_line::FourLineReader;
pub use multi_line::MultiLineReader;
pub use single_line::SingleLineReader;
pub use split::SplitReader;

use crate::error::{FatalStreamError, RecordError};

/// The lines scanned looking for the next defline before giving up.
pub const RESYNC_LINE_CAP: usize = 1000;

/// The maximum number of lines that may elapse between two deflines in
/// multi-line mode before the gap is considered unbounded.
pub const MULTI_LINE_GAP_CAP: usize = 20_000;

/// One ingested record: a defline plus its raw sequence and, where
/// applicable, raw quality text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub defline: String,
    pub seq:     String,
    pub qual:    Option<String>,
}

/// A source of records from one physical input file.
///
/// Implementors track end-of-file and spot count themselves; callers drive
/// the reader one [`RawRecord`] at a time via [`RecordReader::read`].
pub trait RecordReader {
    /// Reads the next record, or `None` at end of file.
    ///
    /// ## Errors
    ///
    /// Returns `Ok(Some(_), Some(warning))`-style recoverable problems as a
    /// [`RecordError`] alongside a best-effort record, or a
    /// [`FatalStreamError`] when resynchronization itself fails.
    fn read(&mut self) -> Result<Option<(RawRecord, Option<RecordError>)>, FatalStreamError>;

    /// Number of records yielded so far.
    fn spot_count(&self) -> usize;

    /// Whether the underlying stream has been exhausted.
    fn eof(&self) -> bool;

    /// Seeks the underlying stream back to the start and resets all local
    /// reader state, so the next [`RecordReader::read`] yields the first
    /// record again.
    ///
    /// ## Errors
    ///
    /// Returns a [`FatalStreamError::RestartFailed`] if the underlying
    /// stream cannot be seeked back to its start.
    fn restart(&mut self) -> Result<(), FatalStreamError>;
}
