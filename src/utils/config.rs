//! Configuration and constants for the CLI.

/// Current report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// Phase tags written by the instrumentation runtime
pub const STARTUP_PHASE: u32 = 0;
pub const INTERACTION_PHASE: u32 = 1;

// Dump file naming: "<prefix>-<run>.txt_<phase>", or "<prefix>-<run>.txt" when unphased
pub const DUMP_FILE_PREFIX: &str = "cygprofile-";
pub const DUMP_FILE_MARKER: &str = ".txt";

/// Section used for symbols whose own section cannot be determined
pub const SHARED_TEXT_SECTION: &str = ".text";

/// Placeholder for an unknown section in a symbol listing
pub const UNKNOWN_SECTION_MARKER: &str = "-";

// Default symbol listing location, relative to the instrumented build directory
pub const SYMBOL_LISTING_DIR: &str = "lib.unstripped";
pub const SYMBOL_LISTING_EXTENSION: &str = "symbols";

/// Functions are padded up to this alignment by the compiler.
/// Instrumentation offsets inside the padding still belong to the function.
pub const DEFAULT_FUNCTION_ALIGNMENT: u64 = 16;

// Default stability thresholds (union size / intersection size), tuned empirically
pub const DEFAULT_STARTUP_THRESHOLD: f64 = 1.5;
pub const DEFAULT_COMMON_THRESHOLD: f64 = 1.75;
pub const DEFAULT_INTERACTION_THRESHOLD: f64 = 2.5;

// Orderfile names written in phased mode
pub const STARTUP_ORDERFILE: &str = "startup.orderfile";
pub const COMMON_ORDERFILE: &str = "common.orderfile";
pub const INTERACTION_ORDERFILE: &str = "interaction.orderfile";
pub const COMBINED_ORDERFILE: &str = "combined.orderfile";
pub const REPORT_FILE: &str = "stability.json";
