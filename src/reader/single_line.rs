use super::{RESYNC_LINE_CAP, RawRecord, RecordReader};
use crate::error::{FatalStreamError, RecordError};
use std::io::{BufRead, Seek, SeekFrom};

/// The three-line-per-record shape: defline, sequence, quality, with no
/// `+`-led separator line.
pub struct SingleLineReader<R> {
    inner:      R,
    file:       String,
    eight_line: bool,
    spot_count: usize,
    eof:        bool,
}

impl<R: BufRead> SingleLineReader<R> {
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

    fn read_block(&mut self) -> Result<Option<(RawRecord, Option<RecordError>)>, FatalStreamError> {
        let Some(mut defline) = self.read_line() else {
            self.eof = true;
            return Ok(None);
        };

        let mut scanned = 0usize;
        while !defline.starts_with('@') {
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
        let qual = self.read_line().unwrap_or_default();

        let warning = if seq.len() != qual.len() {
            Some(RecordError::SeqQualLengthMismatch { file: self.file.clone(), seq_len: seq.len(), qual_len: qual.len() })
        } else {
            None
        };

        self.spot_count += 1;
        Ok(Some((RawRecord { defline, seq, qual: Some(qual) }, warning)))
    }
}

impl<R: BufRead + Seek> RecordReader for SingleLineReader<R> {
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
        self.spot_count = 0;
        self.eof = false;
        Ok(())
    }
}
