//! Quality-string validation.
//!
//! Distinguishes ASCII-encoded quality strings from whitespace-delimited
//! numeric ones, tracks the observed min/max for later encoding inference,
//! and applies the narrow double-quote-stripping repair for a specific,
//! exactly-two-character length mismatch.

/// How a raw quality line was encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityForm {
    /// One byte per base, to be offset-decoded later.
    Ascii,
    /// Whitespace-separated signed integers, one per base.
    Numeric,
}

/// The result of validating one raw quality line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuality {
    pub form:      QualityForm,
    /// For [`QualityForm::Ascii`], the raw bytes (post quote-stripping). For
    /// [`QualityForm::Numeric`], the parsed per-base values.
    pub ascii:     Option<Vec<u8>>,
    pub numeric:   Option<Vec<i32>>,
    pub min:       i32,
    pub max:       i32,
    pub length:    usize,
    /// `true` when a pair of wrapping double quotes was stripped because
    /// doing so closed an exactly-two-character length mismatch against the
    /// paired sequence. This is a narrow repair, not a detected quoting
    /// convention — it only fires when it exactly explains the mismatch.
    pub dequoted:  bool,
}

/// Parses a raw quality line that is ASCII-encoded.
#[must_use]
pub fn validate_ascii_quality(raw: &str, seq_len: usize) -> ValidatedQuality {
    let stripped = raw.len() == seq_len + 2 && raw.starts_with('"') && raw.ends_with('"');
    let body = if stripped { &raw[1..raw.len() - 1] } else { raw };
    let bytes = body.as_bytes().to_vec();
    let (min, max) = bytes.iter().fold((i32::MAX, i32::MIN), |(lo, hi), &b| (lo.min(i32::from(b)), hi.max(i32::from(b))));
    let length = bytes.len();
    ValidatedQuality {
        form: QualityForm::Ascii,
        ascii: Some(bytes),
        numeric: None,
        min: if length == 0 { 0 } else { min },
        max: if length == 0 { 0 } else { max },
        length,
        dequoted: stripped,
    }
}

/// Parses a raw quality line that is whitespace-delimited numeric.
///
/// ## Errors
///
/// Returns `Err` with the offending value when any field's magnitude
/// exceeds 100, since that is no longer plausible quality data.
pub fn validate_numeric_quality(raw: &str) -> Result<ValidatedQuality, i32> {
    let mut values = Vec::new();
    for token in raw.split_whitespace() {
        let Ok(v) = token.parse::<i32>() else { continue };
        if v.abs() > 100 {
            return Err(v);
        }
        values.push(v);
    }
    let (min, max) = values.iter().fold((i32::MAX, i32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let length = values.len();
    let (min, max) = if length == 0 { (0, 0) } else { (min, max) };
    Ok(ValidatedQuality { form: QualityForm::Numeric, ascii: None, numeric: Some(values), min, max, length, dequoted: false })
}

/// Detects whether a raw quality line looks numeric (whitespace-delimited
/// digit runs) rather than a packed ASCII string, by checking whether it
/// contains any interior whitespace.
#[must_use]
pub fn looks_numeric(raw: &str) -> bool {
    raw.trim().split_whitespace().count() > 1 || (raw.trim().parse::<i32>().is_ok() && raw.trim().len() > 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_quality_tracks_min_max() {
        let v = validate_ascii_quality("!~#", 3);
        assert_eq!(v.form, QualityForm::Ascii);
        assert_eq!(v.min, i32::from(b'!'));
        assert_eq!(v.max, i32::from(b'~'));
        assert!(!v.dequoted);
    }

    #[test]
    fn quote_stripped_only_on_exact_two_char_mismatch() {
        let v = validate_ascii_quality("\"III\"", 3);
        assert!(v.dequoted);
        assert_eq!(v.length, 3);
    }

    #[test]
    fn quote_not_stripped_when_mismatch_is_not_exactly_two() {
        let v = validate_ascii_quality("\"III\"", 1);
        assert!(!v.dequoted);
        assert_eq!(v.length, 5);
    }

    #[test]
    fn numeric_quality_parses_space_delimited() {
        let v = validate_numeric_quality("10 20 30 5").unwrap();
        assert_eq!(v.form, QualityForm::Numeric);
        assert_eq!(v.numeric.as_deref(), Some(&[10, 20, 30, 5][..]));
        assert_eq!(v.min, 5);
        assert_eq!(v.max, 30);
    }

    #[test]
    fn numeric_quality_rejects_out_of_range() {
        assert_eq!(validate_numeric_quality("10 20 150").unwrap_err(), 150);
    }

    #[test]
    fn looks_numeric_detects_whitespace_separated() {
        assert!(looks_numeric("10 20 30"));
        assert!(!looks_numeric("IIIIII"));
    }
}
