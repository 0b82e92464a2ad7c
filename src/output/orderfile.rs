//! Orderfile writer.
//!
//! An orderfile lists one section name per line, in the order the linker
//! should place them (`--section-ordering-file` or equivalent).

use super::validate_output_path;
use crate::resolver::OrderedSectionList;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write a section list as an orderfile
///
/// **Public** - main entry point for orderfile output
///
/// # Arguments
/// * `sections` - Resolved sections in placement order
/// * `output_path` - Path to output orderfile
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::InvalidPath` - Path is invalid
pub fn write_orderfile(
    sections: &OrderedSectionList,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing orderfile to: {}", output_path.display());

    validate_output_path(output_path)?;

    if let Some(ext) = output_path.extension() {
        if ext != "orderfile" {
            debug!("File does not have .orderfile extension: {}", output_path.display());
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let mut writer = BufWriter::new(file);

    for section in sections.iter() {
        writeln!(writer, "{}", section).map_err(OutputError::WriteFailed)?;
    }

    writer.flush().map_err(OutputError::WriteFailed)?;

    info!("Orderfile written ({} sections)", sections.len());

    Ok(())
}

/// Read an orderfile back into a section list
///
/// **Public** - useful for tests and for comparing orderfiles
pub fn read_orderfile(input_path: impl AsRef<Path>) -> Result<OrderedSectionList, OutputError> {
    let text = std::fs::read_to_string(input_path).map_err(OutputError::WriteFailed)?;

    let sections = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    Ok(OrderedSectionList { sections })
}
