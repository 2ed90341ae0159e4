//! Log redaction for patient data.
//!
//! Formatted log lines pass through [`SanitizingMakeWriter`] before reaching
//! their sink. Clinical measurements written as `name=value` or
//! `name: value` have their value replaced, and common identifiers (UUIDs,
//! emails, SSN- and MRN-like numbers) are masked.
//!
//! Lines longer than `GLYCORISK_SANITIZE_MAX_BYTES` (default 16 KiB) are
//! truncated before scanning.

use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

const MAX_BYTES_ENV: &str = "GLYCORISK_SANITIZE_MAX_BYTES";
const DEFAULT_MAX_BYTES: usize = 16 * 1024;

static REDACTOR: OnceLock<Redactor> = OnceLock::new();

struct Rule {
    regex: Regex,
    replacement: &'static str,
}

struct Redactor {
    any: RegexSet,
    rules: Vec<Rule>,
}

const RULES: [(&str, &str); 5] = [
    // Clinical measurements keep their name, lose their value.
    (
        r"(?i)\b(hba1c(?:_percent|_level)?|(?:blood_)?glucose(?:_mgdl|_level)?|bmi|age)(\s*[:=]\s*)-?\d+(?:\.\d+)?",
        "${1}${2}[REDACTED]",
    ),
    (
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
        "[REDACTED-UUID]",
    ),
    (r"\b\d{3}-\d{2}-\d{4}\b", "[REDACTED-SSN]"),
    (r"\bMRN[:\s]?\d{6,10}\b", "[REDACTED-MRN]"),
    (
        r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
];

fn redactor() -> &'static Redactor {
    REDACTOR.get_or_init(|| {
        let any = RegexSet::new(RULES.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let rules = RULES
            .iter()
            .map(|(pattern, replacement)| Rule {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();
        Redactor { any, rules }
    })
}

fn max_bytes() -> usize {
    std::env::var(MAX_BYTES_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_MAX_BYTES)
}

fn truncate_to_char_boundary(input: &str, max: usize) -> (&str, bool) {
    if input.len() <= max {
        return (input, false);
    }
    let mut end = max;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Redact clinical values and identifiers from a string.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_bytes())
}

fn sanitize_with_limit(input: &str, max: usize) -> String {
    let redactor = redactor();
    let (prefix, truncated) = truncate_to_char_boundary(input, max);

    let mut out = prefix.to_string();
    for idx in redactor.any.matches(prefix).into_iter() {
        let rule = &redactor.rules[idx];
        out = rule.regex.replace_all(&out, rule.replacement).into_owned();
    }
    if truncated {
        out.push_str(" [TRUNCATED]");
    }
    out
}

/// A `tracing_subscriber` writer factory that redacts each formatted line.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W: std::io::Write> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn write_sanitized(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        self.inner.write_all(sanitize(&text).as_bytes())
    }

    fn flush_complete_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_sanitized(&line)?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A line that never ends is flushed once it outgrows the scan limit.
        if self.buffer.len() > max_bytes().saturating_mul(2) {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
            self.inner.write_all(b"\n")?;
            return Ok(buf.len());
        }

        self.flush_complete_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_complete_lines()?;
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
        }
        self.inner.flush()
    }
}

impl<W: std::io::Write> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        let _ = std::io::Write::flush(self);
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter {
            inner: self.inner.make_writer(),
            buffer: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_redacts_measurements() {
        let out = sanitize("input hba1c=7.2 glucose: 160 bmi=31.0 age=45 tier=HIGH");
        assert_eq!(
            out,
            "input hba1c=[REDACTED] glucose: [REDACTED] bmi=[REDACTED] age=[REDACTED] tier=HIGH"
        );
    }

    #[test]
    fn test_redacts_canonical_field_names() {
        let out = sanitize("hba1c_percent=6.1, blood_glucose_mgdl=120");
        assert!(!out.contains("6.1"));
        assert!(!out.contains("120"));
    }

    #[test]
    fn test_redacts_identifiers() {
        let out = sanitize("patient 550e8400-e29b-41d4-a716-446655440000 ssn 123-45-6789 MRN:12345678 a@b.org");
        assert!(out.contains("[REDACTED-UUID]"));
        assert!(out.contains("[REDACTED-SSN]"));
        assert!(out.contains("[REDACTED-MRN]"));
        assert!(out.contains("[REDACTED-EMAIL]"));
    }

    #[test]
    fn test_plain_text_untouched() {
        let line = "Assessment complete: combined=HIGH, model=LOW, tier=HIGH (HbA1c)";
        assert_eq!(sanitize(line), line);
    }

    #[test]
    fn test_truncation() {
        let out = sanitize_with_limit("héllo world", 2);
        assert_eq!(out, "h [TRUNCATED]");
    }

    #[test]
    fn test_writer_sanitizes_lines() {
        let make = SanitizingMakeWriter::new(|| Vec::<u8>::new());
        let mut writer = make.make_writer();
        writer.write_all(b"glucose=180\npartial bmi=").unwrap();
        writer.write_all(b"40\n").unwrap();
        assert_eq!(
            String::from_utf8(writer.inner.clone()).unwrap(),
            "glucose=[REDACTED]\npartial bmi=[REDACTED]\n"
        );
    }
}
