//! Output writers for orderfiles and reports.
//!
//! This module handles writing data to disk:
//! - Orderfiles (one section per line)
//! - JSON phased analysis reports
//! - Terminal summaries

pub mod json;
pub mod orderfile;
pub mod schema;
pub mod terminal;

use crate::utils::error::OutputError;
use log::debug;
use std::path::Path;

// Re-export main functions
pub use json::{read_report, write_report};
pub use orderfile::{read_orderfile, write_orderfile};
pub use schema::{PhasedReport, SectionCounts};
pub use terminal::render_terminal_summary;

/// Validate that output path is writable, creating parent directories
///
/// **Private** - shared by the writers in this module
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    // Check if we're trying to overwrite a directory
    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    Ok(())
}
