use super::{RESYNC_LINE_CAP, RawRecord, RecordReader};
use crate::error::{FatalStreamError, RecordError};
use std::io::{BufRead, Seek, SeekFrom};

/// The canonical four-line-per-record FASTQ shape: defline, sequence, a
/// `+`-led separator, quality. `eight_line` skips every second block, for
/// the doubled variant some instruments emit.
pub struct FourLineReader<R> {
    inner:      R,
    file:       String,
    eight_line: bool,
    spot_count: usize,
    eof:        bool,
}

impl<R: BufRead> FourLineReader<R> {
    #[must_use]
    pub fn new(inner: R, file: impl Into<String>, eight_line: bool) -> Self {
        Self { inner, file: file.into(), eight_line, spot_count: 0, eof: false }
    }

    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut buf = String::new();
        let n = self.inner.read_line(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        while buf.ends_with(['\n', '\r']) {
            buf.pop();
        }
        Ok(Some(buf))
    }

    fn read_block(&mut self) -> Result<Option<(RawRecord, Option<RecordError>)>, FatalStreamError> {
        let Some(defline) = self.read_line().map_err(|_| FatalStreamError::ResyncFailed { file: self.file.clone(), lines_scanned: 0 })? else {
            self.eof = true;
            return Ok(None);
        };
        if defline.is_empty() {
            self.eof = true;
            return Ok(None);
        }

        let mut scanned = 0usize;
        let mut defline = defline;
        while !defline.starts_with('@') {
            scanned += 1;
            if scanned > RESYNC_LINE_CAP {
                return Err(FatalStreamError::ResyncFailed { file: self.file.clone(), lines_scanned: scanned });
            }
            match self.read_line() {
                Ok(Some(line)) => defline = line,
                _ => {
                    self.eof = true;
                    return Ok(None);
                }
            }
        }

        let seq = self.read_line().ok().flatten().unwrap_or_default();
        let _plus = self.read_line().ok().flatten().unwrap_or_default();
        let qual = self.read_line().ok().flatten().unwrap_or_default();

        let warning = if scanned > 0 {
            Some(RecordError::UnparseableDefline { file: self.file.clone(), line: scanned })
        } else if seq.len() != qual.len() {
            Some(RecordError::SeqQualLengthMismatch { file: self.file.clone(), seq_len: seq.len(), qual_len: qual.len() })
        } else {
            None
        };

        self.spot_count += 1;
        Ok(Some((RawRecord { defline, seq, qual: Some(qual) }, warning)))
    }
}

impl<R: BufRead + Seek> RecordReader for FourLineReader<R> {
    fn read(&mut self) -> Result<Option<(RawRecord, Option<RecordError>)>, FatalStreamError> {
        if self.eof {
            return Ok(None);
        }
        let record = self.read_block()?;
        if self.eight_line && record.is_some() {
            // Discard the duplicate block paired with every primary one.
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
