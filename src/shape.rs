//! File-shape detection.
//!
//! Probes a small prefix of a file's lines to decide which of the closed set
//! of shapes it has, without fully parsing it. Detection never consumes the
//! stream irreversibly from the caller's point of view — callers re-open the
//! file to hand a fresh reader to [`crate::reader`].

use crate::error::ShapeError;
use std::io::BufRead;

/// The closed set of structural file shapes the engine recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileShape {
    Normal,
    SingleLine,
    EightLine,
    MultiLine,
    MultiLineEightLine,
    SeqQual,
    EightLineSeqQual,
    MultiLineSeqQual,
    MultiLineEightLineSeqQual,
    Fasta,
    EightLineFasta,
    MultiLineFasta,
    MultiLineEightLineFasta,
}

impl FileShape {
    #[must_use]
    pub fn is_fasta(self) -> bool {
        matches!(self, Self::Fasta | Self::EightLineFasta | Self::MultiLineFasta | Self::MultiLineEightLineFasta)
    }

    #[must_use]
    pub fn is_multi_line(self) -> bool {
        matches!(
            self,
            Self::MultiLine | Self::MultiLineEightLine | Self::MultiLineSeqQual | Self::MultiLineEightLineSeqQual | Self::MultiLineFasta | Self::MultiLineEightLineFasta
        )
    }

    #[must_use]
    pub fn is_eight_line(self) -> bool {
        matches!(
            self,
            Self::EightLine | Self::MultiLineEightLine | Self::EightLineSeqQual | Self::MultiLineEightLineSeqQual | Self::EightLineFasta | Self::MultiLineEightLineFasta
        )
    }

    #[must_use]
    pub fn has_quality(self) -> bool {
        !self.is_fasta()
    }
}

const PROBE_LINES: usize = 32;

struct Probe {
    lines:       Vec<String>,
    has_abi_title: bool,
}

fn probe<R: BufRead>(mut reader: R) -> std::io::Result<Probe> {
    let mut lines = Vec::new();
    let mut has_abi_title = false;
    for _ in 0..PROBE_LINES {
        let mut buf = String::new();
        if reader.read_line(&mut buf)? == 0 {
            break;
        }
        while buf.ends_with(['\n', '\r']) {
            buf.pop();
        }
        if lines.is_empty() && buf.starts_with("# Title:") {
            has_abi_title = true;
            continue;
        }
        if !buf.is_empty() || !lines.is_empty() {
            lines.push(buf);
        }
    }
    Ok(Probe { lines, has_abi_title })
}

/// Detects the structural shape of `reader`'s content, which is assumed to
/// belong to `file` (used only for error context).
///
/// ## Errors
///
/// Returns [`ShapeError::NoRecognizableLeader`] when the first non-blank
/// line is neither `@`- nor `>`-led, and
/// [`ShapeError::UnrecognizedGreaterThanFile`] when a `>`-led file cannot be
/// classified as FASTA or one half of a seq/qual split.
pub fn detect_shape<R: BufRead>(reader: R, file: &str) -> Result<(FileShape, bool), ShapeError> {
    let probe = probe(reader).map_err(|_| ShapeError::NoRecognizableLeader { file: file.to_owned() })?;
    let Some(first) = probe.lines.first() else {
        return Err(ShapeError::NoRecognizableLeader { file: file.to_owned() });
    };

    if first.starts_with('@') {
        Ok((classify_fastq(&probe.lines), probe.has_abi_title))
    } else if first.starts_with('>') {
        classify_fasta_or_split(&probe.lines, file).map(|s| (s, probe.has_abi_title))
    } else {
        Err(ShapeError::NoRecognizableLeader { file: file.to_owned() })
    }
}

fn count_until_next_at(lines: &[String], start: usize) -> usize {
    lines[start + 1..].iter().take_while(|l| !l.starts_with('@')).count()
}

fn classify_fastq(lines: &[String]) -> FileShape {
    let gap_after_first = count_until_next_at(lines, 0);

    // Canonical four-line record: defline, seq, '+', qual.
    if lines.len() >= 4 && lines.get(2).is_some_and(|l| l.starts_with('+')) {
        let duplicate_follows = lines.get(4).is_some_and(|l| l == &lines[0]);
        return if duplicate_follows { FileShape::EightLine } else { FileShape::Normal };
    }

    // Three-line record: defline, seq, qual, no separator.
    if gap_after_first == 2 && lines.get(3).is_some_and(|l| l.starts_with('@')) {
        return FileShape::SingleLine;
    }

    FileShape::MultiLine
}

fn classify_fasta_or_split(lines: &[String], file: &str) -> Result<FileShape, ShapeError> {
    let gap_after_first = count_until_next_at(lines, 0);

    if gap_after_first == 1 {
        if lines.get(2).is_some_and(|l| l.starts_with('>')) {
            return Ok(FileShape::Fasta);
        }
    }

    // A multi-line (or single-line, collapsed to the same reader) FASTA
    // when the body is composed of IUPAC bases only, versus a qual-half
    // when it is whitespace-delimited small integers.
    let body_is_numeric = lines
        .get(1)
        .is_some_and(|l| l.split_whitespace().all(|tok| tok.parse::<i32>().is_ok()) && l.contains(char::is_whitespace));

    if body_is_numeric {
        Ok(FileShape::SeqQual)
    } else if lines.get(1).is_some_and(|l| !l.is_empty()) {
        Ok(FileShape::MultiLineFasta)
    } else {
        Err(ShapeError::UnrecognizedGreaterThanFile { file: file.to_owned() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn detects_normal_fastq() {
        let data = "@r1\nACGT\n+\nIIII\n@r2\nTTTT\n+\n!!!!\n";
        let (shape, _) = detect_shape(Cursor::new(data), "t.fastq").unwrap();
        assert_eq!(shape, FileShape::Normal);
    }

    #[test]
    fn detects_single_line_fastq() {
        let data = "@r1\nACGT\nIIII\n@r2\nTTTT\n!!!!\n";
        let (shape, _) = detect_shape(Cursor::new(data), "t.fastq").unwrap();
        assert_eq!(shape, FileShape::SingleLine);
    }

    #[test]
    fn detects_multi_line_fastq() {
        let data = "@r1\nACGT\nACGT\n+\nIIII\nIIII\n@r2\nTT\n+\n!!\n";
        let (shape, _) = detect_shape(Cursor::new(data), "t.fastq").unwrap();
        assert_eq!(shape, FileShape::MultiLine);
    }

    #[test]
    fn detects_fasta() {
        let data = ">r1\nACGT\n>r2\nTTTT\n";
        let (shape, _) = detect_shape(Cursor::new(data), "t.fasta").unwrap();
        assert_eq!(shape, FileShape::Fasta);
    }

    #[test]
    fn detects_seq_qual_half() {
        let data = ">r1\n40 40 40 40\n>r2\n30 30\n";
        let (shape, _) = detect_shape(Cursor::new(data), "t.qual").unwrap();
        assert_eq!(shape, FileShape::SeqQual);
    }

    #[test]
    fn rejects_unrecognized_leader() {
        let data = "not a defline at all\n";
        assert!(detect_shape(Cursor::new(data), "t.txt").is_err());
    }

    #[test]
    fn strips_abi_title_line() {
        let data = "# Title: some sample\n@r1\nACGT\n+\nIIII\n";
        let (shape, has_title) = detect_shape(Cursor::new(data), "t.fastq").unwrap();
        assert_eq!(shape, FileShape::Normal);
        assert!(has_title);
    }
}
