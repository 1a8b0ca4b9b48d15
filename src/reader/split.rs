use super::{FastaOnlyReader, RawRecord, RecordReader};
use crate::error::FatalStreamError;
use crate::qual::{looks_numeric, validate_numeric_quality};
use std::io::{BufRead, Seek};

/// The per-base count a quality line actually carries: the field count for a
/// whitespace-delimited numeric line, or the raw character count otherwise.
fn quality_base_count(raw: &str) -> usize {
    if looks_numeric(raw) {
        validate_numeric_quality(raw).map(|v| v.length).unwrap_or(0)
    } else {
        raw.len()
    }
}

/// The `seqQual` shape: sequence and quality live in two separate FASTA-like
/// files, matched positionally and cross-checked by name. The length check
/// counts numeric quality lines by field, not by character, so a `.qual`
/// sibling's space-separated scores are compared fairly against the
/// sequence's base count; decoding those scores happens downstream.
pub struct SplitReader<RS, RQ> {
    seq:        FastaOnlyReader<RS>,
    qual:       FastaOnlyReader<RQ>,
    spot_count: usize,
    eof:        bool,
}

impl<RS: BufRead + Seek, RQ: BufRead + Seek> SplitReader<RS, RQ> {
    #[must_use]
    pub fn new(seq_inner: RS, seq_file: impl Into<String>, qual_inner: RQ, qual_file: impl Into<String>) -> Self {
        Self {
            seq: FastaOnlyReader::new(seq_inner, seq_file, false),
            qual: FastaOnlyReader::new(qual_inner, qual_file, false),
            spot_count: 0,
            eof: false,
        }
    }

    fn name_of(defline: &str) -> &str {
        defline.trim_start_matches(['@', '>']).split_whitespace().next().unwrap_or_default()
    }
}

impl<RS: BufRead + Seek, RQ: BufRead + Seek> RecordReader for SplitReader<RS, RQ> {
    fn read(&mut self) -> Result<Option<(RawRecord, Option<crate::error::RecordError>)>, FatalStreamError> {
        if self.eof {
            return Ok(None);
        }
        let seq_rec = self.seq.read()?;
        let qual_rec = self.qual.read()?;

        match (seq_rec, qual_rec) {
            (None, None) => {
                self.eof = true;
                Ok(None)
            }
            (Some((s, _)), Some((q, _))) => {
                if Self::name_of(&s.defline) != Self::name_of(&q.defline) {
                    return Err(FatalStreamError::SplitDeflineMismatch {
                        seq_name:  Self::name_of(&s.defline).to_owned(),
                        qual_name: Self::name_of(&q.defline).to_owned(),
                    });
                }
                self.spot_count += 1;
                let qual_len = quality_base_count(&q.seq);
                let warning = (s.seq.len() != qual_len).then(|| crate::error::RecordError::SeqQualLengthMismatch {
                    file: Self::name_of(&s.defline).to_owned(),
                    seq_len: s.seq.len(),
                    qual_len,
                });
                Ok(Some((RawRecord { defline: s.defline, seq: s.seq, qual: Some(q.seq) }, warning)))
            }
            _ => {
                self.eof = true;
                Err(FatalStreamError::SplitDeflineMismatch { seq_name: "<eof>".to_owned(), qual_name: "<data>".to_owned() })
            }
        }
    }

    fn spot_count(&self) -> usize {
        self.spot_count
    }

    fn eof(&self) -> bool {
        self.eof
    }

    fn restart(&mut self) -> Result<(), FatalStreamError> {
        self.seq.restart()?;
        self.qual.restart()?;
        self.spot_count = 0;
        self.eof = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn zips_matching_seq_and_qual_files() {
        let seq = ">r1\nACGT\n>r2\nTT\n";
        let qual = ">r1\n40 40 40 40\n>r2\n30 30\n";
        let mut reader = SplitReader::new(Cursor::new(seq), "s.fasta", Cursor::new(qual), "q.qual");
        let (rec1, warning1) = reader.read().unwrap().unwrap();
        assert_eq!(rec1.seq, "ACGT");
        assert_eq!(rec1.qual.as_deref(), Some("40 40 40 40"));
        assert!(warning1.is_none(), "four numeric fields match a four-base sequence");
        assert!(reader.read().unwrap().is_some());
        assert!(reader.read().unwrap().is_none());
    }

    #[test]
    fn numeric_quality_mismatch_compares_field_count_not_text_length() {
        let seq = ">r1\nAC\n";
        let qual = ">r1\n40 40 40 40\n";
        let mut reader = SplitReader::new(Cursor::new(seq), "s.fasta", Cursor::new(qual), "q.qual");
        let (_, warning) = reader.read().unwrap().unwrap();
        match warning {
            Some(crate::error::RecordError::SeqQualLengthMismatch { seq_len, qual_len, .. }) => {
                assert_eq!(seq_len, 2);
                assert_eq!(qual_len, 4);
            }
            other => panic!("expected a length-mismatch warning, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_names_are_fatal() {
        let seq = ">r1\nACGT\n";
        let qual = ">different\n40 40 40 40\n";
        let mut reader = SplitReader::new(Cursor::new(seq), "s.fasta", Cursor::new(qual), "q.qual");
        assert!(reader.read().is_err());
    }
}
