//! Cygprofile dump parser.
//!
//! A dump is plain text with one instrumentation offset per line, in the
//! order the instrumentation recorded them. Offsets are decimal, or
//! hexadecimal with a `0x` prefix. Blank lines are ignored.

use crate::utils::error::ParseError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// How many duplicated offsets to name in the duplicate warning
const MAX_REPORTED_DUPLICATES: usize = 5;

/// A single offset observed in a dump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTraceEvent {
    /// Offset relative to the load base
    pub offset: u64,

    /// 1-based line number in the dump
    pub line: usize,
}

/// One parsed dump: first-touch ordered, duplicates removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDump {
    /// Run this dump belongs to
    pub run_id: String,

    /// Phase tag (0 = startup, 1 = interaction)
    pub phase: u32,

    /// Offsets in first-touch order, each at most once
    pub ordered_offsets: Vec<u64>,

    /// Number of repeated offsets dropped while parsing
    #[serde(default)]
    pub duplicate_count: usize,
}

impl ProfileDump {
    /// Build a dump from already deduplicated offsets
    pub fn new(run_id: &str, phase: u32, ordered_offsets: Vec<u64>) -> Self {
        Self {
            run_id: run_id.to_string(),
            phase,
            ordered_offsets,
            duplicate_count: 0,
        }
    }

    /// Whether the raw dump repeated an offset (a broken instrumentation build)
    pub fn has_duplicates(&self) -> bool {
        self.duplicate_count > 0
    }

    pub fn len(&self) -> usize {
        self.ordered_offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_offsets.is_empty()
    }
}

/// Parse raw dump bytes into a ProfileDump
///
/// **Public** - main entry point for dump parsing
///
/// # Arguments
/// * `raw_bytes` - Contents of one dump file
/// * `run_id` - Run the dump belongs to
/// * `phase` - Phase tag of the dump
///
/// # Returns
/// The dump with duplicates removed. `has_duplicates()` tells whether any
/// were found; each one is also logged.
///
/// # Errors
/// * `ParseError::InvalidUtf8` - Dump is not text
/// * `ParseError::MalformedLine` - A line is not an offset
pub fn parse_dump(raw_bytes: &[u8], run_id: &str, phase: u32) -> Result<ProfileDump, ParseError> {
    debug!("Parsing dump for run '{}', phase {}", run_id, phase);

    let text = std::str::from_utf8(raw_bytes).map_err(|source| ParseError::InvalidUtf8 {
        run_id: run_id.to_string(),
        source,
    })?;

    // Step 1: Read raw events
    let events = parse_events(text, run_id)?;

    // Step 2: Keep first occurrences
    let (ordered_offsets, duplicates) = dedupe_first_touch(&events);
    warn_about_duplicates(run_id, phase, &duplicates);

    debug!(
        "Parsed {} offsets ({} duplicates) for run '{}', phase {}",
        ordered_offsets.len(),
        duplicates.len(),
        run_id,
        phase
    );

    Ok(ProfileDump {
        run_id: run_id.to_string(),
        phase,
        ordered_offsets,
        duplicate_count: duplicates.len(),
    })
}

/// Log repeated offsets found in a dump
///
/// **Public** - duplicates mean the instrumentation did not record only
/// the first call of each function
///
/// # Returns
/// True if any duplicates were reported
pub fn warn_about_duplicates(run_id: &str, phase: u32, duplicates: &[RawTraceEvent]) -> bool {
    if duplicates.is_empty() {
        return false;
    }

    let shown: Vec<String> = duplicates
        .iter()
        .take(MAX_REPORTED_DUPLICATES)
        .map(|event| format!("{:#x} (line {})", event.offset, event.line))
        .collect();

    warn!(
        "Dump for run '{}', phase {} has {} duplicate offsets, first: {}",
        run_id,
        phase,
        duplicates.len(),
        shown.join(", ")
    );

    true
}

/// Parse an offset from hex or decimal string
pub fn parse_offset(value: &str) -> Option<u64> {
    if let Some(hex_str) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u64::from_str_radix(hex_str, 16).ok()
    } else {
        value.parse::<u64>().ok()
    }
}

/// Parse every non-blank line into an event
///
/// **Private** - internal helper for parse_dump
fn parse_events(text: &str, run_id: &str) -> Result<Vec<RawTraceEvent>, ParseError> {
    let mut events = Vec::new();

    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let offset = parse_offset(line).ok_or_else(|| ParseError::MalformedLine {
            run_id: run_id.to_string(),
            line: index + 1,
            content: line.to_string(),
        })?;

        events.push(RawTraceEvent {
            offset,
            line: index + 1,
        });
    }

    Ok(events)
}

/// Split events into first occurrences and repeats
///
/// **Private** - internal helper for parse_dump
fn dedupe_first_touch(events: &[RawTraceEvent]) -> (Vec<u64>, Vec<RawTraceEvent>) {
    let mut seen = std::collections::HashSet::with_capacity(events.len());
    let mut ordered = Vec::with_capacity(events.len());
    let mut duplicates = Vec::new();

    for event in events {
        if seen.insert(event.offset) {
            ordered.push(event.offset);
        } else {
            duplicates.push(*event);
        }
    }

    (ordered, duplicates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dump_decimal_and_hex() {
        let dump = parse_dump(b"16\n0x20\n\n48\n", "run1", 0).unwrap();
        assert_eq!(dump.ordered_offsets, vec![16, 32, 48]);
        assert!(!dump.has_duplicates());
    }

    #[test]
    fn test_duplicates_keep_first_position() {
        let dump = parse_dump(b"3\n1\n3\n2\n1\n", "run1", 1).unwrap();
        assert_eq!(dump.ordered_offsets, vec![3, 1, 2]);
        assert_eq!(dump.duplicate_count, 2);
        assert!(dump.has_duplicates());
    }

    #[test]
    fn test_malformed_line_names_line() {
        let err = parse_dump(b"1\n2\nbogus\n", "run7", 0).unwrap_err();
        match err {
            ParseError::MalformedLine {
                run_id,
                line,
                content,
            } => {
                assert_eq!(run_id, "run7");
                assert_eq!(line, 3);
                assert_eq!(content, "bogus");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_utf8() {
        let result = parse_dump(&[0x31, 0xff, 0x0a], "run1", 0);
        assert!(matches!(result, Err(ParseError::InvalidUtf8 { .. })));
    }

    #[test]
    fn test_empty_dump() {
        let dump = parse_dump(b"", "run1", 0).unwrap();
        assert!(dump.is_empty());
    }

    #[test]
    fn test_warn_about_duplicates_returns_flag() {
        assert!(!warn_about_duplicates("r", 0, &[]));
        let events = [RawTraceEvent { offset: 4, line: 2 }];
        assert!(warn_about_duplicates("r", 0, &events));
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("1000"), Some(1000));
        assert_eq!(parse_offset("0x3e8"), Some(1000));
        assert_eq!(parse_offset("3e8"), None);
        assert_eq!(parse_offset("-1"), None);
    }
}
