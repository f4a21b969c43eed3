//! Format parsers: raw text in, typed snapshot out.
//!
//! Parsers are pure functions. They never touch the host, so every format is
//! tested from captured text. Shared rules:
//!
//! - empty or whitespace-only input fails with `EmptyInput`
//! - header lines are skipped by count, never matched by wording
//! - a malformed optional token reads as 0, a malformed mandatory token fails
//! - KiB to bytes and pages to bytes are exact integer multiplications

pub mod cpu;
pub mod environment;
pub mod load;
pub mod memory;
pub mod network;
pub mod process;
pub mod storage;
pub mod uptime;

use std::str::FromStr;

use crate::error::ParseError;

/// Returns the input unless it is empty or whitespace only.
pub(crate) fn non_empty<'a>(input: &'a str, format: &str) -> Result<&'a str, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::empty(format));
    }
    Ok(input)
}

/// Strips surrounding whitespace plus `{ }` or `[ ]` decoration.
pub(crate) fn strip_decoration(input: &str) -> &str {
    input
        .trim()
        .trim_start_matches(['{', '['])
        .trim_end_matches(['}', ']'])
        .trim()
}

/// Non-blank lines after skipping `header_lines` leading lines.
pub(crate) fn data_lines(input: &str, header_lines: usize) -> impl Iterator<Item = &str> {
    input
        .trim()
        .lines()
        .skip(header_lines)
        .map(str::trim)
        .filter(|l| !l.is_empty())
}

/// Multiplies without wrapping; overflow is reported as a malformed field.
pub(crate) fn scaled(
    value: u64,
    factor: u64,
    format: &str,
    field: &str,
) -> Result<u64, ParseError> {
    value
        .checked_mul(factor)
        .ok_or_else(|| ParseError::malformed(format, field, &value.to_string()))
}

/// Whitespace-separated tokens of one record, with arity-checked access.
pub(crate) struct Fields<'a> {
    format: &'a str,
    tokens: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    pub(crate) fn split(format: &'a str, line: &'a str) -> Self {
        Self {
            format,
            tokens: line.split_whitespace().collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Fails with `MissingField` naming `field` unless at least `count` tokens exist.
    pub(crate) fn expect_at_least(&self, count: usize, field: &str) -> Result<(), ParseError> {
        if self.tokens.len() < count {
            return Err(ParseError::missing(self.format, field));
        }
        Ok(())
    }

    pub(crate) fn text(&self, index: usize) -> Option<&'a str> {
        self.tokens.get(index).copied()
    }

    /// Mandatory numeric token: absent is `MissingField`, unparsable is `MalformedField`.
    pub(crate) fn required<T: FromStr>(&self, index: usize, field: &str) -> Result<T, ParseError> {
        let token = self
            .text(index)
            .ok_or_else(|| ParseError::missing(self.format, field))?;
        token
            .parse()
            .map_err(|_| ParseError::malformed(self.format, field, token))
    }

    /// Optional numeric token: absent or unparsable reads as the default.
    pub(crate) fn optional<T: FromStr + Default>(&self, index: usize) -> T {
        self.text(index)
            .and_then(|t| t.parse().ok())
            .unwrap_or_default()
    }

    pub(crate) fn tokens(&self) -> &[&'a str] {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_rejects_whitespace() {
        assert_eq!(non_empty(" \n\t", "x"), Err(ParseError::empty("x")));
        assert_eq!(non_empty("1", "x"), Ok("1"));
    }

    #[test]
    fn test_strip_decoration() {
        assert_eq!(strip_decoration("{ 0.57 0.80 0.85 }\n"), "0.57 0.80 0.85");
        assert_eq!(strip_decoration("[1 2]"), "1 2");
        assert_eq!(strip_decoration("0.57 0.80 0.85"), "0.57 0.80 0.85");
    }

    #[test]
    fn test_data_lines_skip_headers_by_count() {
        let text = "header one\nheader two\n\n  row1  \nrow2\n";
        let rows: Vec<&str> = data_lines(text, 2).collect();
        assert_eq!(rows, vec!["row1", "row2"]);
    }

    #[test]
    fn test_fields_required_and_optional() {
        let f = Fields::split("test", "a 12 x");
        assert_eq!(f.len(), 3);
        assert_eq!(f.required::<u64>(1, "n"), Ok(12));
        assert_eq!(
            f.required::<u64>(2, "n"),
            Err(ParseError::malformed("test", "n", "x"))
        );
        assert_eq!(f.required::<u64>(5, "n"), Err(ParseError::missing("test", "n")));
        assert_eq!(f.optional::<u64>(2), 0);
        assert_eq!(f.optional::<u64>(9), 0);
        assert!(f.expect_at_least(4, "fourth").is_err());
    }

    #[test]
    fn test_scaled_detects_overflow() {
        assert_eq!(scaled(2, 1024, "f", "x"), Ok(2048));
        assert!(scaled(u64::MAX, 2, "f", "x").is_err());
    }
}
