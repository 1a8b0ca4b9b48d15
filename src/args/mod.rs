use crate::Cli;
use crate::error::ConfigurationError;
use clap::{Args, CommandFactory, ValueEnum, error::ErrorKind};
use std::path::PathBuf;

/// Aborts clap with a given error `message` due to a custom parsing error.
///
/// The subcommand should be specified as a lowercase string with `subcommand`
/// if available. This ensures the help message is as informative as possible.
/// If an invalid subcommand is passed, it will be ignored.
pub fn abort_clap(kind: ErrorKind, message: impl std::fmt::Display, subcommand: Option<&str>) -> ! {
    let mut command = Cli::command();

    if let Some(subcommand) = subcommand
        && let Some(c) = command.get_subcommands_mut().find(|c| c.get_name() == subcommand)
    {
        c.error(kind, message).exit();
    } else {
        command.error(kind, message).exit()
    }
}

/// The sequencing platform hint a caller may supply explicitly, overriding
/// the per-line classifier latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlatformArg {
    Illumina,
    Ls454,
    Nanopore,
    Helicos,
    Absolid,
    Pacbio,
    IonTorrent,
    Sanger,
}

/// The explicit quality offset a caller may supply, overriding inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OffsetArg {
    #[value(name = "0")]
    Zero,
    #[value(name = "33")]
    ThirtyThree,
    #[value(name = "64")]
    SixtyFour,
}

/// The full configuration surface for one ingestion run.
#[derive(Debug, Clone, Args)]
pub struct IngestArgs {
    /// FASTQ/FASTA input files, gzip-compressed inputs detected by `.gz` extension.
    pub inputs: Vec<PathBuf>,

    /// Explicit quality offset; inferred from a 100000-spot prescan when omitted.
    #[arg(long, value_enum)]
    pub offset: Option<OffsetArg>,

    /// Fixed per-read lengths, overriding each read's natural length.
    #[arg(long, value_delimiter = ',')]
    pub read_lens: Vec<u32>,

    /// Per-read technical/biological type tags, parallel to `--read-lens`.
    #[arg(long, value_delimiter = ',')]
    pub read_types: Vec<String>,

    /// Per-read display labels, parallel to `--read-lens`.
    #[arg(long, value_delimiter = ',')]
    pub read_labels: Vec<String>,

    /// Forces every spot into one read group, overriding per-defline barcodes.
    #[arg(long)]
    pub spot_group: Option<String>,

    /// Tolerates orphaned mates instead of requiring strict lockstep pairing.
    #[arg(long)]
    pub orphan_reads: bool,

    /// Treats ASCII quality as log-odds rather than phred, when offset is ambiguous.
    #[arg(long)]
    pub log_odds: bool,

    /// Replaces every spot name with its numeric index.
    #[arg(long, conflicts_with = "discard_names")]
    pub ignore_names: bool,

    /// Omits spot names entirely from the output.
    #[arg(long)]
    pub discard_names: bool,

    /// The read-1 half of an explicit pair-file mapping.
    #[arg(long, requires = "read2_pair_files")]
    pub read1_pair_files: Vec<PathBuf>,

    /// The read-2 half of an explicit pair-file mapping.
    #[arg(long, requires = "read1_pair_files")]
    pub read2_pair_files: Vec<PathBuf>,

    /// Locks defline classification to one platform instead of the full cascade.
    #[arg(long, value_enum)]
    pub platform: Option<PlatformArg>,

    /// Allows each defline to be reclassified independently instead of latching
    /// to the first file-wide match.
    #[arg(long)]
    pub mixed_deflines: bool,

    /// Overrides the inferred sink schema name.
    #[arg(long)]
    pub schema: Option<String>,

    /// Aborts the run once this many recoverable record errors have accumulated.
    #[arg(long, default_value_t = 500_000)]
    pub max_error_count: usize,

    /// Writes a run status document to this path in addition to stderr diagnostics.
    #[arg(long)]
    pub xml_log: Option<PathBuf>,

    /// The `id` attribute of the XML status document's root element.
    #[arg(long, default_value = "ingest")]
    pub log_id: String,
}

impl IngestArgs {
    /// Validates the configuration surface ahead of any IO, against the
    /// closed set of configuration-error rules below.
    ///
    /// ## Errors
    ///
    /// Returns the first [`ConfigurationError`] rule violated.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.inputs.is_empty() && self.read1_pair_files.is_empty() {
            return Err(ConfigurationError::EmptyInputSet);
        }

        if (self.ignore_names || self.discard_names) && self.orphan_reads {
            return Err(ConfigurationError::IgnoreNamesWithOrphanReads);
        }

        if (self.read1_pair_files.is_empty()) != (self.read2_pair_files.is_empty()) {
            return Err(ConfigurationError::PairFilesRequireBoth);
        }

        let counts: Vec<usize> = [
            (!self.read_lens.is_empty()).then(|| self.read_lens.len()),
            (!self.read_types.is_empty()).then(|| self.read_types.len()),
            (!self.read_labels.is_empty()).then(|| self.read_labels.len()),
        ]
        .into_iter()
        .flatten()
        .collect();
        if let Some(&first) = counts.first()
            && counts.iter().any(|&c| c != first)
        {
            return Err(ConfigurationError::MismatchedReadCounts {
                read_lens_count:   self.read_lens.len(),
                read_types_count:  (!self.read_types.is_empty()).then(|| self.read_types.len()),
                read_labels_count: (!self.read_labels.is_empty()).then(|| self.read_labels.len()),
            });
        }

        if matches!(self.offset, Some(OffsetArg::ThirtyThree)) && self.log_odds {
            return Err(ConfigurationError::OffsetThirtyThreeWithLogOdds);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> IngestArgs {
        IngestArgs {
            inputs: vec![PathBuf::from("a.fastq")],
            offset: None,
            read_lens: Vec::new(),
            read_types: Vec::new(),
            read_labels: Vec::new(),
            spot_group: None,
            orphan_reads: false,
            log_odds: false,
            ignore_names: false,
            discard_names: false,
            read1_pair_files: Vec::new(),
            read2_pair_files: Vec::new(),
            platform: None,
            mixed_deflines: false,
            schema: None,
            max_error_count: 500_000,
            xml_log: None,
            log_id: "ingest".to_owned(),
        }
    }

    #[test]
    fn rejects_empty_input_set() {
        let mut args = base_args();
        args.inputs.clear();
        assert_eq!(args.validate().unwrap_err(), ConfigurationError::EmptyInputSet);
    }

    #[test]
    fn rejects_ignore_names_with_orphan_reads() {
        let mut args = base_args();
        args.ignore_names = true;
        args.orphan_reads = true;
        assert_eq!(args.validate().unwrap_err(), ConfigurationError::IgnoreNamesWithOrphanReads);
    }

    #[test]
    fn rejects_one_sided_pair_files() {
        let mut args = base_args();
        args.read1_pair_files = vec![PathBuf::from("r1.fastq")];
        assert_eq!(args.validate().unwrap_err(), ConfigurationError::PairFilesRequireBoth);
    }

    #[test]
    fn rejects_mismatched_read_counts() {
        let mut args = base_args();
        args.read_lens = vec![100, 100];
        args.read_types = vec!["B".to_owned()];
        assert!(matches!(args.validate().unwrap_err(), ConfigurationError::MismatchedReadCounts { .. }));
    }

    #[test]
    fn accepts_well_formed_config() {
        let args = base_args();
        assert!(args.validate().is_ok());
    }
}
