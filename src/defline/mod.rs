//! The defline classifier.
//!
//! A *defline* is the `@…`/`>…` header line introducing one FASTQ/FASTA
//! record. [`cascade::classify_cascade`] runs the ordered, disjoint cascade
//! of grammar matchers and returns a tagged [`Defline`], never panicking on
//! unrecognized input (it falls back to [`Variant::Undefined`]).

pub mod cascade;
pub mod pairing;

pub use pairing::is_paired_deflines;

use std::fmt;

/// The ~24 header grammars this engine recognizes, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Helicos,
    Absolid,
    IlluminaNew,
    IlluminaNewNoPrefix,
    IlluminaNewWithJunk,
    IlluminaNewDouble,
    IlluminaOld,
    IlluminaOldUnderscore,
    IlluminaOldWithJunkTail,
    IlluminaOldWithJunk2,
    IlluminaOldNoPrefix,
    QiimeIlluminaNew,
    QiimeIlluminaNewBc,
    QiimeIlluminaOld,
    QiimeIlluminaOldBc,
    Ls454,
    QiimeLs454,
    QiimeLs454Bc,
    Pacbio,
    IonTorrent,
    IlluminaOldBcRn,
    QiimeGeneric,
    Nanopore,
    ReadIdBarcode,
    SangerNewbler,
    Undefined,
}

impl Variant {
    /// The platform this header grammar belongs to, used for the column-sink
    /// database selection.
    #[must_use]
    pub fn platform(self) -> Platform {
        match self {
            Variant::Helicos => Platform::Helicos,
            Variant::Absolid => Platform::Absolid,
            Variant::IlluminaNew
            | Variant::IlluminaNewNoPrefix
            | Variant::IlluminaNewWithJunk
            | Variant::IlluminaNewDouble
            | Variant::IlluminaOld
            | Variant::IlluminaOldUnderscore
            | Variant::IlluminaOldWithJunkTail
            | Variant::IlluminaOldWithJunk2
            | Variant::IlluminaOldNoPrefix
            | Variant::QiimeIlluminaNew
            | Variant::QiimeIlluminaNewBc
            | Variant::QiimeIlluminaOld
            | Variant::QiimeIlluminaOldBc
            | Variant::IlluminaOldBcRn => Platform::Illumina,
            Variant::Ls454 | Variant::QiimeLs454 | Variant::QiimeLs454Bc => Platform::Ls454,
            Variant::Pacbio => Platform::Pacbio,
            Variant::IonTorrent => Platform::IonTorrent,
            Variant::QiimeGeneric => Platform::Undefined,
            Variant::Nanopore => Platform::Nanopore,
            Variant::ReadIdBarcode | Variant::SangerNewbler => Platform::Sanger,
            Variant::Undefined => Platform::Undefined,
        }
    }

    /// Whether this variant is one of the `QIIME_*` upgrades.
    #[must_use]
    pub fn is_qiime(self) -> bool {
        matches!(
            self,
            Variant::QiimeIlluminaNew
                | Variant::QiimeIlluminaNewBc
                | Variant::QiimeIlluminaOld
                | Variant::QiimeIlluminaOldBc
                | Variant::QiimeLs454
                | Variant::QiimeLs454Bc
                | Variant::QiimeGeneric
        )
    }
}

/// The sequencing platform a defline's variant implies, used to pick the
/// column-sink database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Illumina,
    Ls454,
    Nanopore,
    Helicos,
    Absolid,
    Pacbio,
    IonTorrent,
    Sanger,
    Undefined,
}

/// Nanopore read kind. All textual spellings ("2d", "twodirections", ...)
/// normalize to `TwoD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoreRead {
    Template,
    Complement,
    TwoD,
}

/// ABSOLiD tag type suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    F3,
    R3,
    F5Bc,
    Bc,
    F5P2,
    F5Rna,
    F5Dna,
}

impl TagType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TagType::F3 => "F3",
            TagType::R3 => "R3",
            TagType::F5Bc => "F5-BC",
            TagType::Bc => "BC",
            TagType::F5P2 => "F5-P2",
            TagType::F5Rna => "F5-RNA",
            TagType::F5Dna => "F5-DNA",
        }
    }
}

/// Sanger/Newbler direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Illumina-family positional fields (lane/tile/x/y, with an optional
/// instrument/flowcell prefix).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IlluminaFields {
    pub prefix: String,
    pub lane:   Option<u32>,
    pub tile:   Option<u32>,
    pub x:      Option<i64>,
    pub y:      Option<i64>,
}

/// The platform-specific payload of a [`Defline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformFields {
    Illumina(IlluminaFields),
    Ls454 { date_hash: String, region: String, xy: String },
    IonTorrent { run_id: String, row: i64, column: i64 },
    Nanopore { channel: Option<u32>, read_no: Option<u32>, pore_read: Option<PoreRead>, pore_file: Option<String> },
    Absolid { panel: String, tag_type: Option<TagType> },
    Helicos { flowcell: String, channel: String, field: String, camera: String, position: String },
    SangerNewbler { dir: Option<Direction> },
    None,
}

/// One classified header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defline {
    pub variant:       Variant,
    pub raw:           String,
    pub name:          String,
    pub read_num:      String,
    pub filter_flag:   u8,
    pub spot_group:    String,
    pub qiime_name:    Option<String>,
    pub platform_fields: PlatformFields,
}

impl Defline {
    /// Constructs an [`Undefined`](Variant::Undefined) defline from the
    /// first non-whitespace token of `raw`, the cascade's final fallback.
    #[must_use]
    pub fn undefined(raw: &str) -> Self {
        let body = raw.trim_start_matches(['@', '>']);
        let name = body.split_whitespace().next().unwrap_or_default().to_owned();
        Defline {
            variant: Variant::Undefined,
            raw: raw.to_owned(),
            name,
            read_num: String::new(),
            filter_flag: 0,
            spot_group: String::new(),
            qiime_name: None,
            platform_fields: PlatformFields::None,
        }
    }

    /// Normalizes a literal `"0"` spot group to empty, the sentinel several
    /// platforms use for "no spot group assigned".
    pub fn normalize_spot_group(&mut self) {
        if self.spot_group == "0" {
            self.spot_group.clear();
        }
    }
}

impl fmt::Display for Defline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
