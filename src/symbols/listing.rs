//! Symbol listing parser.
//!
//! The listing is produced outside this crate (`nm` on the unstripped
//! library, plus a section lookup) and written as text, one entry per line:
//!
//! ```text
//! # offset  size  section                 name
//! 0x1a2b00  0x40  .text._ZN3FooC2Ev       _ZN3FooC2Ev
//! 1a2c00    18    -                       memcpy_neon
//! ```
//!
//! Offsets and sizes are hexadecimal, with or without a `0x` prefix.
//! A `-` section means the symbol's section is unknown. Entries keep the
//! section as written; the symbol table maps unknown sections to `.text`.

use super::table::RawSymbolEntry;
use crate::utils::error::SymbolError;
use log::debug;
use std::path::Path;

/// Parse a symbol listing into raw entries
///
/// **Public** - main entry point for listing parsing
///
/// # Errors
/// * `SymbolError::MalformedEntry` - A line is missing fields or has a bad number
pub fn parse_symbol_listing(text: &str) -> Result<Vec<RawSymbolEntry>, SymbolError> {
    let mut entries = Vec::new();

    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        entries.push(parse_listing_line(line, index + 1)?);
    }

    debug!("Parsed {} symbol listing entries", entries.len());
    Ok(entries)
}

/// Read and parse a symbol listing file
///
/// **Public** - used by commands to load the listing for a library
pub fn load_symbol_listing(path: impl AsRef<Path>) -> Result<Vec<RawSymbolEntry>, SymbolError> {
    let path = path.as_ref();
    debug!("Reading symbol listing from: {}", path.display());

    let text = std::fs::read_to_string(path).map_err(|source| SymbolError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;

    parse_symbol_listing(&text)
}

/// Parse one non-empty listing line
///
/// **Private** - internal helper for parse_symbol_listing
fn parse_listing_line(line: &str, line_no: usize) -> Result<RawSymbolEntry, SymbolError> {
    let malformed = |reason: String| SymbolError::MalformedEntry {
        line: line_no,
        reason,
    };

    let (offset_str, rest) = next_field(line).ok_or_else(|| malformed("missing size".into()))?;
    let (size_str, rest) = next_field(rest).ok_or_else(|| malformed("missing section".into()))?;
    let (section, name) = next_field(rest).ok_or_else(|| malformed("missing name".into()))?;

    let offset = parse_hex(offset_str)
        .ok_or_else(|| malformed(format!("invalid offset '{}'", offset_str)))?;
    let size =
        parse_hex(size_str).ok_or_else(|| malformed(format!("invalid size '{}'", size_str)))?;

    Ok(RawSymbolEntry {
        name: name.to_string(),
        section: section.to_string(),
        offset,
        size,
    })
}

/// Split off the first whitespace-delimited field
fn next_field(s: &str) -> Option<(&str, &str)> {
    let (field, rest) = s.split_once(char::is_whitespace)?;
    let rest = rest.trim_start();
    if rest.is_empty() {
        None
    } else {
        Some((field, rest))
    }
}

fn parse_hex(value: &str) -> Option<u64> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u64::from_str_radix(digits, 16).ok()
}
