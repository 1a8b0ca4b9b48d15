//! Spot assembly.
//!
//! Turns one or more validated reads that share a spot into the
//! [`crate::sink::SpotRow`] the column sink writes. Handles the three shapes
//! a spot can arrive in: a mate pair from two files, a single fragment read,
//! or several reads packed into one file.

use crate::defline::Defline;
use crate::sink::SpotRow;

/// Read-type tags a spot's constituent reads carry into the `READ_TYPE`
/// column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadType {
    Biological,
    Technical,
}

impl ReadType {
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Biological => 1,
            Self::Technical => 0,
        }
    }
}

/// One read's contribution to a spot.
#[derive(Debug, Clone)]
pub struct SpotReadInput {
    pub sequence:   String,
    pub quality:    Vec<u8>,
    pub read_type:  ReadType,
    pub clip_left:  u32,
    pub clip_right: u32,
}

/// Name-emission policy for a spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamePolicy {
    #[default]
    Keep,
    Ignore,
    Discard,
}

/// Settings that shape assembly but are not part of any one read.
#[derive(Debug, Clone, Default)]
pub struct AssemblyOptions {
    pub name_policy:       NamePolicy,
    /// Explicit per-read-position lengths from `--read-lens`, when the
    /// caller wants fixed-length reads rather than each read's natural
    /// length.
    pub fixed_read_lens:   Option<Vec<u32>>,
    pub read_labels:       Option<Vec<String>>,
}

/// Chooses the emitted spot name from a primary defline, honoring
/// `--ignore-names`/`--discard-names` and QIIME-label prefixing.
#[must_use]
pub fn emit_name(defline: &Defline, options: &AssemblyOptions, spot_index: usize) -> String {
    match options.name_policy {
        NamePolicy::Discard => String::new(),
        NamePolicy::Ignore => spot_index.to_string(),
        NamePolicy::Keep => match &defline.qiime_name {
            Some(label) => format!("{label}_{}", defline.name),
            None => defline.name.clone(),
        },
    }
}

/// Picks the spot group, preferring a non-empty barcode from either mate,
/// with the first read's group taking precedence when both are non-empty.
#[must_use]
pub fn resolve_spot_group(primary: &Defline, secondary: Option<&Defline>) -> String {
    if !primary.spot_group.is_empty() {
        primary.spot_group.clone()
    } else {
        secondary.map(|d| d.spot_group.clone()).unwrap_or_default()
    }
}

/// Assembles a spot from one or more ordered reads (a mate pair, a lone
/// fragment, or several reads packed from one file), applying the read-type
/// and optional fixed-length policy and writing the emitted name and spot
/// group.
#[must_use]
pub fn assemble_spot(name: String, spot_group: String, reads: &[SpotReadInput], options: &AssemblyOptions) -> SpotRow {
    let mut sequence = String::new();
    let mut quality = Vec::new();
    let mut read_lens = Vec::new();
    let mut read_types = Vec::new();
    let mut clip_left = Vec::new();
    let mut clip_right = Vec::new();

    for (i, read) in reads.iter().enumerate() {
        let len = options
            .fixed_read_lens
            .as_ref()
            .and_then(|lens| lens.get(i))
            .copied()
            .unwrap_or_else(|| u32::try_from(read.sequence.len()).unwrap_or(u32::MAX));

        sequence.push_str(&read.sequence);
        quality.extend_from_slice(&read.quality);
        read_lens.push(len);
        read_types.push(read.read_type.as_u8());
        clip_left.push(read.clip_left);
        clip_right.push(read.clip_right);
    }

    SpotRow { name, sequence, quality, read_lens, read_types, spot_group, clip_left, clip_right }
}

/// Builds the two-read input slice for a mate pair, in read-1/read-2 order.
#[must_use]
pub fn pair_reads(seq1: String, qual1: Vec<u8>, seq2: String, qual2: Vec<u8>) -> Vec<SpotReadInput> {
    vec![
        SpotReadInput { sequence: seq1, quality: qual1, read_type: ReadType::Biological, clip_left: 0, clip_right: 0 },
        SpotReadInput { sequence: seq2, quality: qual2, read_type: ReadType::Biological, clip_left: 0, clip_right: 0 },
    ]
}

/// Builds the single-read input slice for an unpaired fragment.
#[must_use]
pub fn fragment_read(seq: String, qual: Vec<u8>) -> Vec<SpotReadInput> {
    vec![SpotReadInput { sequence: seq, quality: qual, read_type: ReadType::Biological, clip_left: 0, clip_right: 0 }]
}

/// Merges a Nanopore template/complement spot with its optional 2D
/// consensus companion. When no companion exists, the third column-sink row
/// slot is padded with a zero-length read so every Nanopore spot presents
/// the same column shape.
#[must_use]
pub fn nanopore_reads(template: (String, Vec<u8>), complement: (String, Vec<u8>), consensus: Option<(String, Vec<u8>)>) -> Vec<SpotReadInput> {
    let (consensus_seq, consensus_qual) = consensus.unwrap_or_default();
    vec![
        SpotReadInput { sequence: template.0, quality: template.1, read_type: ReadType::Biological, clip_left: 0, clip_right: 0 },
        SpotReadInput { sequence: complement.0, quality: complement.1, read_type: ReadType::Biological, clip_left: 0, clip_right: 0 },
        SpotReadInput { sequence: consensus_seq, quality: consensus_qual, read_type: ReadType::Technical, clip_left: 0, clip_right: 0 },
    ]
}
