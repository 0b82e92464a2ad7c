use super::models::ProfileInputs;
use crate::output::read_report;
use crate::parser::ProfileManager;
use crate::phased::format_ratio;
use crate::symbols::{load_symbol_listing, SymbolTable};
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::PathBuf;

/// Validate shared command inputs
///
/// **Public** - can be called before a command runs for early validation
pub fn validate_inputs(inputs: &ProfileInputs) -> Result<()> {
    if inputs.library_name.trim().is_empty() {
        anyhow::bail!("Library name cannot be empty");
    }

    if !inputs.profile_directory.is_dir() {
        anyhow::bail!(
            "Profile directory does not exist: {}",
            inputs.profile_directory.display()
        );
    }

    // The build dir only matters when the listing location is derived from it
    if inputs.symbol_listing.is_none() && !inputs.instrumented_build_dir.is_dir() {
        anyhow::bail!(
            "Instrumented build directory does not exist: {}",
            inputs.instrumented_build_dir.display()
        );
    }

    Ok(())
}

/// Load and build the symbol table of the instrumented library
///
/// **Public** - shared by generate and phased
pub fn load_symbol_table(inputs: &ProfileInputs) -> Result<SymbolTable> {
    let path = inputs.symbol_listing_path();
    info!("Loading symbols for {} from {}", inputs.library_name, path.display());

    let entries = load_symbol_listing(&path)
        .with_context(|| format!("Failed to load symbol listing {}", path.display()))?;
    let table = SymbolTable::build(entries).context("Failed to build symbol table")?;

    debug!("Symbol table holds {} symbols", table.len());
    Ok(table)
}

/// Discover and parse the dumps of a profiling session
///
/// **Public** - shared by generate and phased
pub fn load_profiles(inputs: &ProfileInputs) -> Result<ProfileManager> {
    let manager = ProfileManager::from_directory(&inputs.profile_directory).with_context(|| {
        format!(
            "Failed to read profile directory {}",
            inputs.profile_directory.display()
        )
    })?;

    if manager.is_empty() {
        anyhow::bail!(
            "No valid cygprofile dumps found in {}",
            inputs.profile_directory.display()
        );
    }

    Ok(manager)
}

/// Validate a phased report JSON file
pub fn validate_report_file(file_path: PathBuf) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let report = read_report(&file_path)
        .with_context(|| format!("Failed to read report {}", file_path.display()))?;

    println!("✓ Valid report JSON");
    println!("  Version: {}", report.version);
    println!("  Library: {}", report.library_name);
    println!("  Runs: {}", report.runs.len());
    println!("  Excluded Runs: {}", report.excluded_runs.len());
    println!("  Rejected Dumps: {}", report.rejected_dumps.len());
    println!(
        "  Ratios: startup {}, common {}, interaction {}",
        format_ratio(report.stability.startup.ratio),
        format_ratio(report.stability.common.ratio),
        format_ratio(report.stability.interaction.ratio)
    );
    println!("  Verdict: {}", report.verdict.status);
    println!("  Sections: {}", report.section_counts.combined);

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Cygprofile Orderfile Report Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string          - Schema version (e.g., '1.0.0')");
        println!("  library_name: string     - Instrumented library");
        println!("  runs: array              - Run ids used, in discovery order");
        println!("  excluded_runs: array     - Runs missing a phase dump");
        println!("  rejected_dumps: array    - Dump files that failed to parse");
        println!("    path: string           - Dump file path");
        println!("    reason: string         - Parse error");
        println!("  stability: object        - Cross-run stability");
        println!("    run_count: number      - Number of runs compared");
        println!("    startup|common|interaction: object");
        println!("      union_count: number        - Offsets seen in any run");
        println!("      intersection_count: number - Offsets seen in every run");
        println!("      union_size: number         - Bytes of code seen in any run");
        println!("      intersection_size: number  - Bytes of code seen in every run");
        println!("      ratio: number?             - union_size / intersection_size");
        println!("  verdict: object          - Threshold check");
        println!("    stable: bool           - Every bucket within its threshold");
        println!("    status: string         - PASSED or FAILED");
        println!("    violations: array      - Failing buckets");
        println!("  section_counts: object   - Sections per orderfile");
        println!("  generated_at: string     - ISO 8601 timestamp");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Cygprofile Orderfile v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Generates phase-aware linker orderfiles from cygprofile instrumentation dumps.");
}
