use super::{MULTI_LINE_GAP_CAP, RawRecord, RecordReader};
use crate::error::{FatalStreamError, RecordError};
use std::io::{BufRead, Seek, SeekFrom};

/// A FASTQ/FASTA shape where sequence (and, for FASTQ, quality) wrap across
/// an unknown number of lines until the next defline. The gap
/// between two deflines is capped at [`MULTI_LINE_GAP_CAP`] lines.
pub struct MultiLineReader<R> {
    inner:       R,
    file:        String,
    has_quality: bool,
    eight_line:  bool,
    pending:     Option<String>,
    spot_count:  usize,
    eof:         bool,
}

impl<R: BufRead> MultiLineReader<R> {
    #[must_use]
    pub fn new(inner: R, file: impl Into<String>, has_quality: bool, eight_line: bool) -> Self {
        Self { inner, file: file.into(), has_quality, eight_line, pending: None, spot_count: 0, eof: false }
    }

    fn read_line(&mut self) -> Option<String> {
        let mut buf = String::new();
        let n = self.inner.read_line(&mut buf).unwrap_or(0);
        if n == 0 {
            return None;
        }
        while buf.ends_with(['\n', '\r']) {
            buf.pop();
        }
        Some(buf)
    }

    fn next_defline(&mut self) -> Option<String> {
        self.pending.take().or_else(|| self.read_line())
    }

    /// Accumulates lines until the next defline (leader byte matches
    /// `leader`) or EOF, returning the joined body and leaving the next
    /// defline in `pending`.
    fn accumulate_until_defline(&mut self, leader: u8) -> Result<String, FatalStreamError> {
        let mut body = String::new();
        let mut gap = 0usize;
        loop {
            let Some(line) = self.read_line() else { break };
            if line.as_bytes().first().copied() == Some(leader) {
                self.pending = Some(line);
                break;
            }
            body.push_str(&line);
            gap += 1;
            if gap > MULTI_LINE_GAP_CAP {
                return Err(FatalStreamError::MultiLineGapExceeded { file: self.file.clone() });
            }
        }
        Ok(body)
    }

    fn read_block(&mut self) -> Result<Option<(RawRecord, Option<RecordError>)>, FatalStreamError> {
        let Some(defline) = self.next_defline() else {
            self.eof = true;
            return Ok(None);
        };

        let seq_leader = if self.has_quality { b'+' } else { defline.as_bytes().first().copied().unwrap_or(b'@') };
        let seq = self.accumulate_until_defline(seq_leader)?;
        let qual = if self.has_quality {
            // A `+`-led separator line follows the sequence block, matching
            // the four-line shape's separator; discard it.
            let _plus = self.pending.take();
            let q = self.accumulate_until_defline(b'@')?;
            Some(q)
        } else {
            None
        };

        let warning = qual.as_ref().filter(|q| q.len() != seq.len()).map(|q| RecordError::SeqQualLengthMismatch {
            file: self.file.clone(),
            seq_len: seq.len(),
            qual_len: q.len(),
        });

        self.spot_count += 1;
        Ok(Some((RawRecord { defline, seq, qual }, warning)))
    }
}

impl<R: BufRead + Seek> RecordReader for MultiLineReader<R> {
    fn read(&mut self) -> Result<Option<(RawRecord, Option<RecordError>)>, FatalStreamError> {
        if self.eof {
            return Ok(None);
        }
        let record = self.read_block()?;
        if self.eight_line && record.is_some() {
            let _ = self.read_block()?;
        }
        Ok(record)
    }

    fn spot_count(&self) -> usize {
        self.spot_count
    }

    fn eof(&self) -> bool {
        self.eof
    }

    fn restart(&mut self) -> Result<(), FatalStreamError> {
        self.inner.seek(SeekFrom::Start(0)).map_err(|_| FatalStreamError::RestartFailed { file: self.file.clone() })?;
        self.pending = None;
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
    fn joins_wrapped_sequence_and_quality() {
        let data = "@r1\nACGT\nACGT\n+\nIIII\nIIII\n@r2\nTT\n+\n!!\n";
        let mut reader = MultiLineReader::new(Cursor::new(data), "t.fastq", true, false);
        let (rec1, _) = reader.read().unwrap().unwrap();
        assert_eq!(rec1.seq, "ACGTACGT");
        assert_eq!(rec1.qual.as_deref(), Some("IIIIIIII"));
        let (rec2, _) = reader.read().unwrap().unwrap();
        assert_eq!(rec2.seq, "TT");
        assert!(reader.read().unwrap().is_none());
    }

    #[test]
    fn fasta_multi_line_has_no_quality() {
        let data = ">r1\nACGTACGT\nACGT\n>r2\nTTTT\n";
        let mut reader = MultiLineReader::new(Cursor::new(data), "t.fasta", false, false);
        let (rec1, _) = reader.read().unwrap().unwrap();
        assert_eq!(rec1.seq, "ACGTACGTACGT");
        assert!(rec1.qual.is_none());
    }

    #[test]
    fn eight_line_skips_duplicate_block() {
        let data = "@r1\nACGT\n+\nIIII\n@r1\nACGT\n+\nIIII\n@r2\nTT\n+\n!!\n@r2\nTT\n+\n!!\n";
        let mut reader = MultiLineReader::new(Cursor::new(data), "t.fastq", true, true);
        let (rec1, _) = reader.read().unwrap().unwrap();
        assert_eq!(rec1.defline, "@r1");
        let (rec2, _) = reader.read().unwrap().unwrap();
        assert_eq!(rec2.defline, "@r2");
        assert!(reader.read().unwrap().is_none());
    }
}
