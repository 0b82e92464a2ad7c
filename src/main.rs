//! Cygprofile Orderfile CLI
//!
//! Turns cygprofile instrumentation dumps into linker orderfiles,
//! optionally split into startup, common and interaction phases.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use cygprofile_orderfile::commands::{
    display_schema, display_version, execute_generate, execute_phased, validate_report_file,
    GenerateArgs, PhasedArgs, ProfileInputs,
};
use cygprofile_orderfile::resolver::ResolverConfig;
use cygprofile_orderfile::utils::config::DEFAULT_FUNCTION_ALIGNMENT;

/// Cygprofile Orderfile - linker orderfiles from instrumentation dumps
#[derive(Parser, Debug)]
#[command(name = "cygprofile-orderfile")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Inputs shared by generate and phased
#[derive(Args, Debug)]
struct InputArgs {
    /// Directory containing cygprofile-<run>.txt_<phase> dumps
    #[arg(long)]
    profile_directory: PathBuf,

    /// Build directory of the instrumented library
    #[arg(long)]
    instrumented_build_dir: PathBuf,

    /// Library file name, e.g. libchrome.so
    #[arg(long)]
    library_name: String,

    /// Symbol listing (defaults to <build-dir>/lib.unstripped/<library>.symbols)
    #[arg(long)]
    symbol_listing: Option<PathBuf>,

    /// Function alignment in bytes for inexact offset matching
    #[arg(long, default_value_t = DEFAULT_FUNCTION_ALIGNMENT)]
    function_alignment: u64,
}

impl From<InputArgs> for ProfileInputs {
    fn from(args: InputArgs) -> Self {
        Self {
            profile_directory: args.profile_directory,
            instrumented_build_dir: args.instrumented_build_dir,
            library_name: args.library_name,
            symbol_listing: args.symbol_listing,
            resolver: ResolverConfig {
                function_alignment: args.function_alignment,
            },
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a single orderfile from all dumps
    Generate {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output path for the orderfile
        #[arg(short, long, default_value = "orderfile.txt")]
        output: PathBuf,
    },

    /// Generate startup/common/interaction orderfiles and check stability
    Phased {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output directory for the orderfiles
        #[arg(short, long, default_value = "orderfiles")]
        output: PathBuf,

        /// Stability thresholds TOML file
        #[arg(long)]
        thresholds: Option<PathBuf>,

        /// Exit with an error when the profile is unstable
        #[arg(long)]
        strict: bool,

        /// Output path for the JSON report (defaults to <output>/stability.json)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Print stability summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate a stability report JSON file
    ValidateReport {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Generate { inputs, output } => {
            execute_generate(GenerateArgs {
                inputs: inputs.into(),
                output,
            })?;
        }

        Commands::Phased {
            inputs,
            output,
            thresholds,
            strict,
            report,
            summary,
        } => {
            execute_phased(PhasedArgs {
                inputs: inputs.into(),
                output_dir: output,
                thresholds,
                strict,
                report,
                print_summary: summary,
            })?;
        }

        Commands::ValidateReport { file } => {
            validate_report_file(file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
