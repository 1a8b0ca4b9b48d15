//! A dependency-free XML status-log writer.
//!
//! NCBI's loader tools traditionally report run status as a small XML
//! document rather than structured log lines; `--xml-log` asks for the same
//! here. No XML crate is pulled in for this — the document shape is fixed
//! and small enough to hand-write safely.

use std::io::{self, Write};

/// Writes the `<Log>` status document incrementally so a fatal error can
/// still close it out with a trailing `<error/>` element.
pub struct XmlLog<W: Write> {
    out:     W,
    log_id:  String,
    closed:  bool,
}

impl<W: Write> XmlLog<W> {
    /// Opens the log, writing the root element's header.
    ///
    /// ## Errors
    ///
    /// Propagates any IO error writing the header.
    pub fn open(mut out: W, log_id: impl Into<String>) -> io::Result<Self> {
        let log_id = log_id.into();
        writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        writeln!(out, "<Log id=\"{}\">", xml_escape(&log_id))?;
        Ok(Self { out, log_id, closed: false })
    }

    /// Appends a simple status element, e.g. `<message severity="info">…</message>`.
    ///
    /// ## Errors
    ///
    /// Propagates any IO error writing the element.
    pub fn element(&mut self, tag: &str, severity: &str, text: &str) -> io::Result<()> {
        writeln!(self.out, "  <{tag} severity=\"{severity}\">{}</{tag}>", xml_escape(text))
    }

    /// Appends a terminal `<error/>` element and closes the log. Every
    /// fatal failure in a run surfaces here.
    ///
    /// ## Errors
    ///
    /// Propagates any IO error writing the element.
    pub fn fatal(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "  <error message=\"{}\"/>", xml_escape(message))?;
        self.close()
    }

    /// Closes the root element, idempotently.
    ///
    /// ## Errors
    ///
    /// Propagates any IO error writing the closing tag.
    pub fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        writeln!(self.out, "</Log>")?;
        self.closed = true;
        Ok(())
    }

    #[must_use]
    pub fn log_id(&self) -> &str {
        &self.log_id
    }
}

impl<W: Write> Drop for XmlLog<W> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn xml_escape(s: &str) -> String {
    s.chars().fold(String::with_capacity(s.len()), |mut acc, c| {
        match c {
            '&' => acc.push_str("&amp;"),
            '<' => acc.push_str("&lt;"),
            '>' => acc.push_str("&gt;"),
            '"' => acc.push_str("&quot;"),
            _ => acc.push(c),
        }
        acc
    })
}

/// Writes one `module_path!()`-prefixed diagnostic line to stderr. Ambient
/// logging only; no `tracing`/`log` dependency.
#[macro_export]
macro_rules! diag {
    ($($arg:tt)*) => {
        eprintln!("[{}] {}", module_path!(), format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_well_formed_document() {
        let mut buf = Vec::new();
        {
            let mut log = XmlLog::open(&mut buf, "run-1").unwrap();
            log.element("message", "info", "starting").unwrap();
            log.close().unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("<Log id=\"run-1\">"));
        assert!(text.contains("</Log>"));
    }

    #[test]
    fn escapes_special_characters() {
        let mut buf = Vec::new();
        {
            let mut log = XmlLog::open(&mut buf, "a&b").unwrap();
            log.close().unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("a&amp;b"));
    }

    #[test]
    fn fatal_closes_the_log() {
        let mut buf = Vec::new();
        {
            let mut log = XmlLog::open(&mut buf, "run-2").unwrap();
            log.fatal("boom").unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("<error message=\"boom\"/>"));
        assert!(text.trim_end().ends_with("</Log>"));
    }
}
