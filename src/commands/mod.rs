//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod generate;
pub mod models;
pub mod phased;
pub mod utils;

// Re-export main command functions
pub use generate::execute_generate;
pub use models::{default_symbol_listing, GenerateArgs, PhasedArgs, ProfileInputs};
pub use phased::{execute_phased, validate_args};
pub use utils::{display_schema, display_version, validate_report_file};
