//! Dump parsing and grouping.
//!
//! This module handles:
//! - Parsing raw cygprofile dumps into first-touch ordered offsets
//! - Reporting duplicate offsets
//! - Grouping dumps into runs and phases

pub mod dump;
pub mod manager;

// Re-export main types
pub use dump::{parse_dump, parse_offset, warn_about_duplicates, ProfileDump, RawTraceEvent};
pub use manager::{parse_dump_file_name, ProfileManager, RejectedDump};
