//! The top-level ingestion driver, orchestrating shape detection, file
//! pairing, encoding inference, and spot assembly for one run.

use crate::args::{IngestArgs, OffsetArg, PlatformArg};
use crate::defline::cascade::classify_cascade;
use crate::defline::{Defline, PlatformFields, PoreRead, Platform, Variant};
use crate::encoding::{QualityOffset, QualityPrescan, resolve_encoding};
use crate::error::{IngestError, RecordError};
use crate::file_pairing::{SpotPairing, find_2d_companion, pair_strict, reconcile_orphans};
use crate::io::InputSource;
use crate::qual::{looks_numeric, validate_ascii_quality, validate_numeric_quality};
use crate::reader::{FourLineReader, MultiLineReader, RawRecord, RecordReader, SingleLineReader};
use crate::seq::validate_sequence;
use crate::shape::{FileShape, detect_shape};
use crate::sink::{ColumnSink, SpotRow, TableDescriptor, quality_expression, select_database};
use crate::spot::{AssemblyOptions, NamePolicy, ReadType, SpotReadInput, assemble_spot, emit_name, fragment_read, nanopore_reads, pair_reads, resolve_spot_group};
use crate::utils::get_seed;
use crate::{diag, xmllog::XmlLog};
use std::io::BufReader;
use std::path::Path;

/// A summary of one completed run, returned alongside whatever the
/// [`ColumnSink`] recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub spots_written:  usize,
    pub records_skipped: usize,
}

fn platform_arg_to_variant(platform: PlatformArg) -> Variant {
    match platform {
        PlatformArg::Illumina => Variant::IlluminaNew,
        PlatformArg::Ls454 => Variant::Ls454,
        PlatformArg::Nanopore => Variant::Nanopore,
        PlatformArg::Helicos => Variant::Helicos,
        PlatformArg::Absolid => Variant::Absolid,
        PlatformArg::Pacbio => Variant::Pacbio,
        PlatformArg::IonTorrent => Variant::IonTorrent,
        PlatformArg::Sanger => Variant::SangerNewbler,
    }
}

fn offset_arg_to_quality_offset(offset: OffsetArg) -> QualityOffset {
    match offset {
        OffsetArg::Zero => QualityOffset::Zero,
        OffsetArg::ThirtyThree => QualityOffset::ThirtyThree,
        OffsetArg::SixtyFour => QualityOffset::SixtyFour,
    }
}

fn name_policy(args: &IngestArgs) -> NamePolicy {
    if args.discard_names {
        NamePolicy::Discard
    } else if args.ignore_names {
        NamePolicy::Ignore
    } else {
        NamePolicy::Keep
    }
}

/// Opens a reader for `path` alone. For the `seqQual`-family shapes this is
/// a degraded fallback used only when no `.qual` sibling was found (see
/// [`find_qual_sibling`]): the sequence half is read as plain FASTA, with no
/// quality at all, rather than failing the whole run over a missing file.
fn open_reader(path: &Path, shape: FileShape) -> std::io::Result<Box<dyn RecordReader>> {
    let stream = InputSource::open(path)?;
    let buffered = BufReader::new(stream);
    let file = path.display().to_string();
    let reader: Box<dyn RecordReader> = match shape {
        // The eight-line-family shapes are handed to the reader without its
        // own duplicate-block discard: a repeated defline here is read1/read2
        // interleaved under the same name, which `assemble_eight_line` pairs
        // up, not a literal redundant duplicate to drop.
        FileShape::Normal | FileShape::EightLine => Box::new(FourLineReader::new(buffered, file, false)),
        FileShape::SingleLine => Box::new(SingleLineReader::new(buffered, file, false)),
        FileShape::MultiLine | FileShape::MultiLineEightLine => Box::new(MultiLineReader::new(buffered, file, true, false)),
        FileShape::Fasta | FileShape::SeqQual | FileShape::EightLineSeqQual | FileShape::EightLineFasta => Box::new(crate::reader::FastaOnlyReader::new(buffered, file, false)),
        FileShape::MultiLineFasta | FileShape::MultiLineSeqQual | FileShape::MultiLineEightLineSeqQual | FileShape::MultiLineEightLineFasta => Box::new(MultiLineReader::new(buffered, file, false, false)),
    };
    Ok(reader)
}

/// Looks for a `.qual` sibling of a FASTA-shaped input (same stem, `.qual`
/// extension), the conventional way a seq/qual split is named.
fn find_qual_sibling(path: &Path) -> Option<std::path::PathBuf> {
    let candidate = path.with_extension("qual");
    candidate.is_file().then_some(candidate)
}

fn detect_file_shape(path: &Path) -> Result<FileShape, IngestError> {
    let stream = InputSource::open(path)?;
    let buffered = BufReader::new(stream);
    let file = path.display().to_string();
    let (shape, _has_title) = detect_shape(buffered, &file)?;
    Ok(shape)
}

struct Classified {
    defline: Defline,
    record:  RawRecord,
}

fn classify_all(reader: &mut dyn RecordReader, file: &str, locked_variant: Option<Variant>, mixed_deflines: bool, errors: &mut Vec<RecordError>) -> Result<Vec<Classified>, IngestError> {
    let mut out = Vec::new();
    loop {
        match reader.read() {
            Ok(Some((record, warning))) => {
                if let Some(w) = warning {
                    errors.push(w);
                }
                let defline = if mixed_deflines || locked_variant.is_none() {
                    classify_cascade(&record.defline, None)
                } else {
                    crate::defline::cascade::classify_locked(&record.defline, locked_variant.unwrap(), None)
                        .unwrap_or_else(|| classify_cascade(&record.defline, None))
                };
                out.push(Classified { defline, record });
            }
            Ok(None) => break,
            Err(fatal) => {
                diag!("{file}: {fatal}");
                return Err(IngestError::Fatal(fatal));
            }
        }
    }
    Ok(out)
}

/// Normalizes one raw sequence line to uppercase (stripping the color-space
/// anchor when present) and returns its soft-clip margins alongside it,
/// folding them into `prescan` for [`resolve_encoding`]'s clip_quality-column
/// decision.
fn normalize_sequence(raw: &str, prescan: &mut QualityPrescan) -> (String, u32, u32) {
    let validated = validate_sequence(raw);
    let clip_left = u32::try_from(validated.clip_left).unwrap_or(u32::MAX);
    let clip_right = u32::try_from(validated.clip_right).unwrap_or(u32::MAX);
    prescan.observe_clip(clip_left, clip_right);
    (validated.sequence, clip_left, clip_right)
}

fn observe_quality(record: &RawRecord, prescan: &mut QualityPrescan) -> Vec<u8> {
    match record.qual.as_deref() {
        Some(q) if looks_numeric(q) => match validate_numeric_quality(q) {
            Ok(validated) => {
                let values = validated.numeric.unwrap_or_default();
                prescan.observe_numeric(validated.min, validated.max);
                values.iter().map(|&v| u8::try_from(v).unwrap_or(u8::MAX)).collect()
            }
            Err(_) => Vec::new(),
        },
        Some(q) => {
            let validated = validate_ascii_quality(q, record.seq.len());
            prescan.observe(validated.min, validated.max);
            validated.ascii.unwrap_or_default()
        }
        None => Vec::new(),
    }
}

fn push_paired_spot(l: &Classified, r: &Classified, options: &AssemblyOptions, args: &IngestArgs, spot_index: usize, prescan: &mut QualityPrescan) -> SpotRow {
    let q1 = observe_quality(&l.record, prescan);
    let q2 = observe_quality(&r.record, prescan);
    let (seq1, clip_left1, clip_right1) = normalize_sequence(&l.record.seq, prescan);
    let (seq2, clip_left2, clip_right2) = normalize_sequence(&r.record.seq, prescan);
    let mut reads = pair_reads(seq1, q1, seq2, q2);
    reads[0].clip_left = clip_left1;
    reads[0].clip_right = clip_right1;
    reads[1].clip_left = clip_left2;
    reads[1].clip_right = clip_right2;
    let name = emit_name(&l.defline, options, spot_index);
    let spot_group = args.spot_group.clone().unwrap_or_else(|| resolve_spot_group(&l.defline, Some(&r.defline)));
    assemble_spot(name, spot_group, &reads, options)
}

fn push_fragment_spot(c: &Classified, options: &AssemblyOptions, args: &IngestArgs, spot_index: usize, prescan: &mut QualityPrescan) -> SpotRow {
    let q = observe_quality(&c.record, prescan);
    let (seq, clip_left, clip_right) = normalize_sequence(&c.record.seq, prescan);
    let mut reads = fragment_read(seq, q);
    reads[0].clip_left = clip_left;
    reads[0].clip_right = clip_right;
    let name = emit_name(&c.defline, options, spot_index);
    let spot_group = args.spot_group.clone().unwrap_or_else(|| resolve_spot_group(&c.defline, None));
    assemble_spot(name, spot_group, &reads, options)
}

/// Pairs an within-file eight-line interleave (`read1, read2, read1, read2,
/// ...`): tries strict lockstep first, then reconciles whatever is left by
/// name before draining any truly unmatched records as fragment spots.
fn assemble_eight_line(classified: &[Classified], options: &AssemblyOptions, args: &IngestArgs, prescan: &mut QualityPrescan, rows: &mut Vec<SpotRow>) {
    let left_deflines: Vec<Defline> = classified.iter().step_by(2).map(|c| c.defline.clone()).collect();
    let right_deflines: Vec<Defline> = classified.iter().skip(1).step_by(2).map(|c| c.defline.clone()).collect();
    // `--orphan-reads` forces orphan-tolerant pairing: skip the strict
    // lockstep phase and send every record straight through the
    // name-indexed reconciliation pass instead.
    let (strict, left_orphan_pos, right_orphan_pos) = if args.orphan_reads {
        (Vec::new(), (0..left_deflines.len()).collect(), (0..right_deflines.len()).collect())
    } else {
        pair_strict(&left_deflines, &right_deflines)
    };

    let mut spot_index = 0usize;
    for pairing in &strict {
        if let SpotPairing::Strict { left, right } = pairing {
            let l = &classified[left * 2];
            let r = &classified[right * 2 + 1];
            rows.push(push_paired_spot(l, r, options, args, spot_index, prescan));
            spot_index += 1;
        }
    }

    let left_carriers: Vec<(usize, Defline)> = left_orphan_pos.iter().map(|&p| (p * 2, left_deflines[p].clone())).collect();
    let right_carriers: Vec<(usize, Defline)> = right_orphan_pos.iter().map(|&p| (p * 2 + 1, right_deflines[p].clone())).collect();
    let (reconciled, unmatched_left, unmatched_right) = reconcile_orphans(&left_carriers, &right_carriers, get_seed());

    for pairing in &reconciled {
        if let SpotPairing::Reconciled { left_index, right_index } = pairing {
            let l = &classified[*left_index];
            let r = &classified[*right_index];
            rows.push(push_paired_spot(l, r, options, args, spot_index, prescan));
            spot_index += 1;
        }
    }

    for idx in unmatched_left.into_iter().chain(unmatched_right) {
        rows.push(push_fragment_spot(&classified[idx], options, args, spot_index, prescan));
        spot_index += 1;
    }
}

/// Groups a Nanopore file's records by spot name, pairing each
/// template/complement entry with its 2D companion via
/// [`find_2d_companion`], and emits a merged spot per name. A 2D read with no
/// matching template/complement entry yields a single technical-type
/// consensus spot with no sequencing read at all, rather than padding in
/// empty template/complement reads.
fn assemble_nanopore(classified: &[Classified], options: &AssemblyOptions, args: &IngestArgs, prescan: &mut QualityPrescan, rows: &mut Vec<SpotRow>) {
    let mut by_name: std::collections::BTreeMap<String, (Option<usize>, Option<usize>)> = std::collections::BTreeMap::new();
    let mut two_d_reads: Vec<(usize, Defline)> = Vec::new();
    let mut spot_index = 0usize;

    for (idx, c) in classified.iter().enumerate() {
        let pore_read = match &c.defline.platform_fields {
            PlatformFields::Nanopore { pore_read, .. } => *pore_read,
            _ => None,
        };
        let Some(pore_read) = pore_read else {
            rows.push(push_fragment_spot(c, options, args, spot_index, prescan));
            spot_index += 1;
            continue;
        };
        match pore_read {
            PoreRead::Template => by_name.entry(c.defline.name.clone()).or_insert((None, None)).0 = Some(idx),
            PoreRead::Complement => by_name.entry(c.defline.name.clone()).or_insert((None, None)).1 = Some(idx),
            PoreRead::TwoD => two_d_reads.push((idx, c.defline.clone())),
        }
    }

    let mut consumed_two_d = vec![false; two_d_reads.len()];

    for (name, (template_idx, complement_idx)) in by_name {
        let twod_idx = find_2d_companion(&name, &two_d_reads);
        if let Some(two_d) = twod_idx {
            if let Some(pos) = two_d_reads.iter().position(|(idx, _)| *idx == two_d) {
                consumed_two_d[pos] = true;
            }
        }
        match (template_idx, complement_idx, twod_idx) {
            (None, None, None) => {}
            (template_idx, complement_idx, twod_idx) => {
                let mut clips = [(0u32, 0u32); 3];
                let template = template_idx
                    .map(|i| {
                        let (seq, cl, cr) = normalize_sequence(&classified[i].record.seq, prescan);
                        clips[0] = (cl, cr);
                        (seq, observe_quality(&classified[i].record, prescan))
                    })
                    .unwrap_or_default();
                let complement = complement_idx
                    .map(|i| {
                        let (seq, cl, cr) = normalize_sequence(&classified[i].record.seq, prescan);
                        clips[1] = (cl, cr);
                        (seq, observe_quality(&classified[i].record, prescan))
                    })
                    .unwrap_or_default();
                let consensus = twod_idx.map(|i| {
                    let (seq, cl, cr) = normalize_sequence(&classified[i].record.seq, prescan);
                    clips[2] = (cl, cr);
                    (seq, observe_quality(&classified[i].record, prescan))
                });
                let primary_defline = &classified[template_idx.or(complement_idx).expect("at least one of template/complement is present")].defline;
                let name = emit_name(primary_defline, options, spot_index);
                let spot_group = args.spot_group.clone().unwrap_or_else(|| resolve_spot_group(primary_defline, None));
                let mut reads = nanopore_reads(template, complement, consensus);
                for (read, (cl, cr)) in reads.iter_mut().zip(clips) {
                    read.clip_left = cl;
                    read.clip_right = cr;
                }
                rows.push(assemble_spot(name, spot_group, &reads, options));
                spot_index += 1;
            }
        }
    }

    for (pos, (idx, _)) in two_d_reads.iter().enumerate() {
        if consumed_two_d[pos] {
            continue;
        }
        let c = &classified[*idx];
        let q = observe_quality(&c.record, prescan);
        let (seq, clip_left, clip_right) = normalize_sequence(&c.record.seq, prescan);
        let reads = vec![SpotReadInput { sequence: seq, quality: q, read_type: ReadType::Technical, clip_left, clip_right }];
        let name = emit_name(&c.defline, options, spot_index);
        let spot_group = args.spot_group.clone().unwrap_or_else(|| resolve_spot_group(&c.defline, None));
        rows.push(assemble_spot(name, spot_group, &reads, options));
        spot_index += 1;
    }
}

/// Runs one ingestion, reading `args.inputs` (or the explicit pair-file
/// lists) and writing assembled spots to `sink`.
///
/// ## Errors
///
/// Returns [`IngestError`] for configuration problems, unreadable/unshaped
/// files, fatal stream errors, or once `max_error_count` recoverable errors
/// have accumulated.
pub fn run(args: &IngestArgs, sink: &mut dyn ColumnSink) -> Result<IngestReport, IngestError> {
    args.validate()?;

    let mut xml_log = match &args.xml_log {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            Some(XmlLog::open(file, args.log_id.clone())?)
        }
        None => None,
    };

    let result = run_inner(args, sink, &mut xml_log);

    if let Some(mut log) = xml_log {
        match &result {
            Ok(_) => {
                let _ = log.element("message", "info", "ingestion completed");
                let _ = log.close();
            }
            Err(e) => {
                let _ = log.fatal(&e.to_string());
            }
        }
    }

    result
}

fn run_inner(args: &IngestArgs, sink: &mut dyn ColumnSink, xml_log: &mut Option<XmlLog<std::fs::File>>) -> Result<IngestReport, IngestError> {
    let locked_variant = args.platform.map(platform_arg_to_variant);
    let name_policy = name_policy(args);
    let options = AssemblyOptions { name_policy, fixed_read_lens: (!args.read_lens.is_empty()).then(|| args.read_lens.clone()), read_labels: None };

    let mut errors = Vec::new();
    let mut prescan = QualityPrescan::new();
    let mut rows = Vec::new();

    if !args.read1_pair_files.is_empty() {
        for (p1, p2) in args.read1_pair_files.iter().zip(args.read2_pair_files.iter()) {
            let shape1 = detect_file_shape(p1)?;
            let shape2 = detect_file_shape(p2)?;
            let mut r1 = open_reader(p1, shape1)?;
            let mut r2 = open_reader(p2, shape2)?;
            let f1 = p1.display().to_string();
            let f2 = p2.display().to_string();

            let left = classify_all(r1.as_mut(), &f1, locked_variant, args.mixed_deflines, &mut errors)?;
            let right = classify_all(r2.as_mut(), &f2, locked_variant, args.mixed_deflines, &mut errors)?;

            for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
                rows.push(push_paired_spot(l, r, &options, args, i, &mut prescan));
            }
        }
    } else {
        for path in &args.inputs {
            let shape = detect_file_shape(path)?;
            let mut reader = match (shape, find_qual_sibling(path)) {
                (FileShape::SeqQual | FileShape::MultiLineSeqQual, Some(qual_path)) => {
                    let seq_stream = BufReader::new(InputSource::open(path)?);
                    let qual_stream = BufReader::new(InputSource::open(&qual_path)?);
                    Box::new(crate::reader::SplitReader::new(seq_stream, path.display().to_string(), qual_stream, qual_path.display().to_string())) as Box<dyn RecordReader>
                }
                _ => open_reader(path, shape)?,
            };
            let file = path.display().to_string();
            let classified = classify_all(reader.as_mut(), &file, locked_variant, args.mixed_deflines, &mut errors)?;

            let is_nanopore = classified.first().is_some_and(|c| c.defline.variant.platform() == Platform::Nanopore);
            if is_nanopore {
                assemble_nanopore(&classified, &options, args, &mut prescan, &mut rows);
            } else if shape.is_eight_line() {
                assemble_eight_line(&classified, &options, args, &mut prescan, &mut rows);
            } else {
                for (i, c) in classified.iter().enumerate() {
                    rows.push(push_fragment_spot(c, &options, args, i, &mut prescan));
                }
            }

            if errors.len() > args.max_error_count {
                return Err(IngestError::Exceeded { error_count: errors.len(), max_error_count: args.max_error_count });
            }
        }
    }

    let explicit_offset = args.offset.map(offset_arg_to_quality_offset);
    let explicit_log_odds = args.log_odds.then_some(true);
    let fixed_read_lens = !args.read_lens.is_empty();
    let encoding = resolve_encoding(explicit_offset, explicit_log_odds, &prescan, prescan.any_clipped(), fixed_read_lens)?;

    let platform = locked_variant.map(Variant::platform).unwrap_or(Platform::Undefined);
    let database = args.schema.as_deref().unwrap_or_else(|| select_database(platform, encoding.log_odds, args.discard_names));

    let mut descriptor = TableDescriptor::new();
    descriptor.insert("QUALITY", crate::sink::ColumnSpec { expression: quality_expression(encoding).to_owned(), elem_bits: 8 });
    descriptor.insert("READ", crate::sink::ColumnSpec { expression: "sequence".to_owned(), elem_bits: 2 });

    sink.open(database, &descriptor).map_err(|e| IngestError::Io(std::io::Error::other(e)))?;
    let spots_written = rows.len();
    for row in &rows {
        sink.write(row).map_err(|e| IngestError::Io(std::io::Error::other(e)))?;
    }
    sink.close().map_err(|e| IngestError::Io(std::io::Error::other(e)))?;

    if let Some(log) = xml_log {
        let _ = log.element("message", "info", &format!("{spots_written} spots assembled, {} recoverable errors", errors.len()));
    }

    Ok(IngestReport { spots_written, records_skipped: errors.len() })
}
