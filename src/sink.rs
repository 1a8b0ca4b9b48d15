//! The column-oriented archive sink.
//!
//! The engine treats the archive writer as an external collaborator behind
//! the [`ColumnSink`] trait — production code plugs in a real column-store
//! writer, tests and CLI dry-run mode plug in [`RecordingSink`].

use crate::defline::Platform;
use crate::encoding::ResolvedEncoding;
use std::collections::BTreeMap;

/// One column's declared shape within a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub expression: String,
    pub elem_bits:  u32,
}

/// A table's full column layout, keyed by column name.
pub type TableDescriptor = BTreeMap<&'static str, ColumnSpec>;

/// Picks the target database schema name for a platform and encoding.
#[must_use]
pub fn select_database(platform: Platform, log_odds: bool, names_suppressed: bool) -> &'static str {
    match (platform, log_odds, names_suppressed) {
        (_, _, true) => "NCBI:SRA:GenericFastq:NoNames:db",
        (Platform::Nanopore, _, false) => "NCBI:SRA:GenericFastq:Nanopore:db",
        (Platform::Absolid, _, false) => "NCBI:SRA:GenericFastq:Absolid:db",
        (_, true, false) => "NCBI:SRA:GenericFastq:LogOdds:db",
        _ => "NCBI:SRA:GenericFastq:db",
    }
}

/// Picks the `QUALITY` column's expression string for an encoding.
#[must_use]
pub fn quality_expression(encoding: ResolvedEncoding) -> &'static str {
    match (encoding.offset.as_u8(), encoding.log_odds) {
        (33, false) => "phred_33",
        (64, false) => "phred_64",
        (64, true) => "log_odds_64",
        (0, true) => "log_odds",
        _ => "phred",
    }
}

/// One fully assembled spot's column values, ready to hand to a
/// [`ColumnSink`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpotRow {
    pub name:         String,
    pub sequence:     String,
    pub quality:      Vec<u8>,
    pub read_lens:    Vec<u32>,
    pub read_types:   Vec<u8>,
    pub spot_group:   String,
    /// Soft-clip margins per read, present when a sequence line carried
    /// lowercase runs at either end.
    pub clip_left:    Vec<u32>,
    pub clip_right:   Vec<u32>,
}

/// The archive-writing seam the spot assembler writes through.
pub trait ColumnSink {
    /// Opens a table with the given name and descriptor; called once before
    /// any [`ColumnSink::write`] calls.
    ///
    /// ## Errors
    ///
    /// Implementations report their own IO/backend failures as `String`.
    fn open(&mut self, database: &str, descriptor: &TableDescriptor) -> Result<(), String>;

    /// Writes one assembled spot.
    ///
    /// ## Errors
    ///
    /// Implementations report their own IO/backend failures as `String`.
    fn write(&mut self, row: &SpotRow) -> Result<(), String>;

    /// Finalizes and closes the table.
    ///
    /// ## Errors
    ///
    /// Implementations report their own IO/backend failures as `String`.
    fn close(&mut self) -> Result<(), String>;
}

/// An in-memory [`ColumnSink`] used by integration tests and the CLI's
/// dry-run mode.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub database:   Option<String>,
    pub descriptor: Option<TableDescriptor>,
    pub rows:       Vec<SpotRow>,
    pub closed:     bool,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ColumnSink for RecordingSink {
    fn open(&mut self, database: &str, descriptor: &TableDescriptor) -> Result<(), String> {
        self.database = Some(database.to_owned());
        self.descriptor = Some(descriptor.clone());
        Ok(())
    }

    fn write(&mut self, row: &SpotRow) -> Result<(), String> {
        if self.database.is_none() {
            return Err("write called before open".to_owned());
        }
        self.rows.push(row.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<(), String> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::QualityOffset;

    #[test]
    fn selects_nanopore_database() {
        assert_eq!(select_database(Platform::Nanopore, false, false), "NCBI:SRA:GenericFastq:Nanopore:db");
    }

    #[test]
    fn names_suppressed_takes_precedence() {
        assert_eq!(select_database(Platform::Nanopore, true, true), "NCBI:SRA:GenericFastq:NoNames:db");
    }

    #[test]
    fn quality_expression_picks_log_odds_64() {
        let enc = ResolvedEncoding { offset: QualityOffset::SixtyFour, log_odds: true, clip_quality: false };
        assert_eq!(quality_expression(enc), "log_odds_64");
    }

    #[test]
    fn recording_sink_requires_open_before_write() {
        let mut sink = RecordingSink::new();
        let row = SpotRow::default();
        assert!(sink.write(&row).is_err());
        sink.open("db", &TableDescriptor::new()).unwrap();
        assert!(sink.write(&row).is_ok());
        assert_eq!(sink.rows.len(), 1);
    }
}
