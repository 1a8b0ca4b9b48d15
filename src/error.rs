//! Error kinds for the ingestion engine, one `Display`+`Error` enum per
//! failure domain rather than a catch-all boxed error.

use std::{error::Error, fmt};

/// A configuration problem detected before any input is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    UnknownPlatform(String),
    InvalidOffset(String),
    IgnoreNamesWithOrphanReads,
    MismatchedReadCounts {
        read_lens_count:    usize,
        read_types_count:   Option<usize>,
        read_labels_count:  Option<usize>,
    },
    PairFilesRequireBoth,
    OffsetThirtyThreeWithLogOdds,
    EmptyInputSet,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPlatform(p) => write!(f, "unrecognized platform: {p}"),
            Self::InvalidOffset(o) => write!(f, "invalid quality offset: {o} (expected 0, 33, or 64)"),
            Self::IgnoreNamesWithOrphanReads => {
                write!(f, "--ignore-names/--discard-names cannot be combined with --orphan-reads")
            }
            Self::MismatchedReadCounts {
                read_lens_count,
                read_types_count,
                read_labels_count,
            } => write!(
                f,
                "--read-lens ({read_lens_count}), --read-types ({read_types_count:?}), and --read-labels \
                 ({read_labels_count:?}) must agree in count when more than one is given"
            ),
            Self::PairFilesRequireBoth => {
                write!(f, "--read1-pair-files and --read2-pair-files must be given together")
            }
            Self::OffsetThirtyThreeWithLogOdds => {
                write!(f, "quality offset 33 cannot be combined with log-odds quality")
            }
            Self::EmptyInputSet => write!(f, "no input files were given"),
        }
    }
}

impl Error for ConfigurationError {}

/// Could not determine a file's structural shape, or paired files disagree
/// in shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    NoRecognizableLeader { file: String },
    UnrecognizedGreaterThanFile { file: String },
    IncompatibleFileTypes { file_a: String, file_b: String },
    InterDeflineGapTooLarge { file: String, lines: usize },
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRecognizableLeader { file } => {
                write!(f, "{file}: first non-header byte is neither '@' nor '>'")
            }
            Self::UnrecognizedGreaterThanFile { file } => {
                write!(f, "{file}: '>'-led file could not be classified as FASTA or a seq/qual half")
            }
            Self::IncompatibleFileTypes { file_a, file_b } => {
                write!(f, "paired files {file_a} and {file_b} have incompatible file types")
            }
            Self::InterDeflineGapTooLarge { file, lines } => {
                write!(f, "{file}: {lines} lines elapsed between deflines in multi-line mode (cap is 20000)")
            }
        }
    }
}

impl Error for ShapeError {}

/// A recoverable per-record problem: counted, logged, and skipped rather
/// than fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    UnparseableDefline { file: String, line: usize },
    SeqQualLengthMismatch { file: String, seq_len: usize, qual_len: usize },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnparseableDefline { file, line } => {
                write!(f, "{file}:{line}: unparseable defline, resynchronizing")
            }
            Self::SeqQualLengthMismatch { file, seq_len, qual_len } => {
                write!(f, "{file}: sequence length {seq_len} did not match quality length {qual_len}, repaired")
            }
        }
    }
}

impl Error for RecordError {}

/// Cannot be recovered locally; terminates the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalStreamError {
    ResyncFailed { file: String, lines_scanned: usize },
    MultiLineGapExceeded { file: String },
    NumericQualityOutOfRange { file: String, value: i32 },
    SplitDeflineMismatch { seq_name: String, qual_name: String },
    RestartFailed { file: String },
}

impl fmt::Display for FatalStreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResyncFailed { file, lines_scanned } => {
                write!(f, "{file}: could not resynchronize within {lines_scanned} lines")
            }
            Self::MultiLineGapExceeded { file } => {
                write!(f, "{file}: exceeded the 20000-line cap between deflines")
            }
            Self::NumericQualityOutOfRange { file, value } => {
                write!(f, "{file}: numeric quality value {value} exceeds the magnitude-100 bound")
            }
            Self::SplitDeflineMismatch { seq_name, qual_name } => {
                write!(f, "split seq/qual deflines disagree on name: {seq_name} vs {qual_name}")
            }
            Self::RestartFailed { file } => write!(f, "{file}: could not seek back to the start of the stream"),
        }
    }
}

impl Error for FatalStreamError {}

/// The top-level error type returned by the engine's public entry points.
#[derive(Debug)]
pub enum IngestError {
    Configuration(ConfigurationError),
    Shape(ShapeError),
    Fatal(FatalStreamError),
    Exceeded { error_count: usize, max_error_count: usize },
    Io(std::io::Error),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(e) => write!(f, "{e}"),
            Self::Shape(e) => write!(f, "{e}"),
            Self::Fatal(e) => write!(f, "{e}"),
            Self::Exceeded { error_count, max_error_count } => {
                write!(f, "error count {error_count} exceeded the configured maximum {max_error_count}")
            }
            Self::Io(e) => write!(f, "{e}"),
        }
    }
}

impl Error for IngestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Configuration(e) => Some(e),
            Self::Shape(e) => Some(e),
            Self::Fatal(e) => Some(e),
            Self::Exceeded { .. } => None,
            Self::Io(e) => Some(e),
        }
    }
}

impl From<ConfigurationError> for IngestError {
    fn from(e: ConfigurationError) -> Self {
        Self::Configuration(e)
    }
}

impl From<ShapeError> for IngestError {
    fn from(e: ShapeError) -> Self {
        Self::Shape(e)
    }
}

impl From<FatalStreamError> for IngestError {
    fn from(e: FatalStreamError) -> Self {
        Self::Fatal(e)
    }
}

impl From<std::io::Error> for IngestError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
