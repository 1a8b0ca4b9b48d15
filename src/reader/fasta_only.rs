use super::{RESYNC_LINE_CAP, RawRecord, RecordReader};
use crate::error::FatalStreamError;
use std::io::{BufRead, Seek, SeekFrom};

/// A two-line-per-record FASTA shape: defline, then a single sequence line,
/// never carrying quality.
pub struct FastaOnlyReader<R> {
    inner:      R,
    file:       String,
    eight_line: bool,
    spot_count: usize,
    eof:        bool,
}

impl<R: BufRead> FastaOnlyReader<R> {
    #[must_use]
    pub fn new(inner: R, file: impl Into<String>, eight_line: bool) -> Self {
        Self { inner, file: file.into(), eight_line, spot_count: 0, eof: false }
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

    fn read_block(&mut self) -> Result<Option<(RawRecord, Option<crate::error::RecordError>)>, FatalStreamError> {
        let Some(mut defline) = self.read_line() else {
            self.eof = true;
            return Ok(None);
        };

        let mut scanned = 0usize;
        while !defline.starts_with('>') {
            scanned += 1;
            if scanned > RESYNC_LINE_CAP {
                return Err(FatalStreamError::ResyncFailed { file: self.file.clone(), lines_scanned: scanned });
            }
            match self.read_line() {
                Some(line) => defline = line,
                None => {
                    self.eof = true;
                    return Ok(None);
                }
            }
        }

        let seq = self.read_line().unwrap_or_default();
        self.spot_count += 1;
        Ok(Some((RawRecord { defline, seq, qual: None }, None)))
    }
}

impl<R: BufRead + Seek> RecordReader for FastaOnlyReader<R> {
    fn read(&mut self) -> Result<Option<(RawRecord, Option<crate::error::RecordError>)>, FatalStreamError> {
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
    fn reads_fasta_records() {
        let data = ">r1\nACGT\n>r2\nTTTT\n";
        let mut reader = FastaOnlyReader::new(Cursor::new(data), "t.fasta", false);
        let (rec1, _) = reader.read().unwrap().unwrap();
        assert_eq!(rec1.seq, "ACGT");
        assert!(rec1.qual.is_none());
        let (rec2, _) = reader.read().unwrap().unwrap();
        assert_eq!(rec2.defline, ">r2");
        assert!(reader.read().unwrap().is_none());
    }

    #[test]
    fn restart_rewinds_to_the_start() {
        let data = ">r1\nACGT\n>r2\nTTTT\n";
        let mut reader = FastaOnlyReader::new(Cursor::new(data), "t.fasta", false);
        let (rec1, _) = reader.read().unwrap().unwrap();
        assert_eq!(rec1.defline, ">r1");
        reader.restart().unwrap();
        let (rec1_again, _) = reader.read().unwrap().unwrap();
        assert_eq!(rec1_again.defline, ">r1");
        assert_eq!(reader.spot_count(), 1);
    }

    #[test]
    fn eight_line_skips_duplicate_block() {
        let data = ">r1\nACGT\n>r1\nACGT\n>r2\nTTTT\n>r2\nTTTT\n";
        let mut reader = FastaOnlyReader::new(Cursor::new(data), "t.fasta", true);
        let (rec1, _) = reader.read().unwrap().unwrap();
        assert_eq!(rec1.defline, ">r1");
        let (rec2, _) = reader.read().unwrap().unwrap();
        assert_eq!(rec2.defline, ">r2");
        assert!(reader.read().unwrap().is_none());
    }
}
