//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building the symbol table
#[derive(Error, Debug)]
pub enum SymbolError {
    #[error("Failed to read symbol listing {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed symbol listing line {line}: {reason}")]
    MalformedEntry { line: usize, reason: String },

    #[error("Symbol table is empty")]
    EmptyTable,
}

/// Errors that can occur during dump parsing
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read dump {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Dump for run '{run_id}' is not valid UTF-8: {source}")]
    InvalidUtf8 {
        run_id: String,
        source: std::str::Utf8Error,
    },

    #[error("Dump for run '{run_id}', line {line}: invalid offset '{content}'")]
    MalformedLine {
        run_id: String,
        line: usize,
        content: String,
    },

    #[error("Not a cygprofile dump file name: {0}")]
    InvalidFileName(String),
}

/// Errors that abort phased analysis
#[derive(Error, Debug)]
pub enum PhasedError {
    #[error("Stability analysis requires at least 2 runs, found {0}")]
    NotEnoughRuns(usize),

    #[error("Phased analysis requires exactly phases {{0, 1}}, found {0:?}")]
    UnexpectedPhases(BTreeSet<u32>),

    #[error("Run pairs dumps from different runs: startup '{startup}', interaction '{interaction}'")]
    RunIdMismatch {
        startup: String,
        interaction: String,
    },

    #[error("Run '{run_id}' expects phase {expected} dump, got phase {found}")]
    WrongPhase {
        run_id: String,
        expected: u32,
        found: u32,
    },
}

/// Errors that can occur while loading stability thresholds
#[derive(Error, Debug)]
pub enum ThresholdError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Threshold TOML parse error: {0}")]
    ParseFailed(#[from] toml::de::Error),

    #[error("Threshold for {bucket} must be positive, got {value}")]
    NonPositive { bucket: String, value: f64 },
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
