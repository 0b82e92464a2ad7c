//! Generate command implementation.
//!
//! The generate command builds a single-phase orderfile:
//! 1. Loads the symbol listing
//! 2. Parses every dump in the profile directory
//! 3. Merges the dumps and resolves offsets to sections
//! 4. Writes the orderfile

use super::models::GenerateArgs;
use super::utils::{load_profiles, load_symbol_table, validate_inputs};
use crate::output::write_orderfile;
use crate::resolver::OffsetResolver;
use anyhow::{Context, Result};
use log::{debug, info};
use std::time::Instant;

/// Execute the generate command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Missing or malformed symbol listing
/// * No usable dumps in the profile directory
/// * File write errors
/// * Rejected dumps (after the orderfile is written)
///
/// # Example
/// ```ignore
/// let args = GenerateArgs {
///     inputs: ProfileInputs {
///         profile_directory: PathBuf::from("/tmp/profiles"),
///         instrumented_build_dir: PathBuf::from("out/instrumented"),
///         library_name: "libchrome.so".to_string(),
///         ..Default::default()
///     },
///     output: PathBuf::from("orderfile.txt"),
/// };
///
/// execute_generate(args)?;
/// ```
pub fn execute_generate(args: GenerateArgs) -> Result<()> {
    let start_time = Instant::now();

    validate_inputs(&args.inputs)?;

    // Step 1: Symbols
    info!("Step 1/4: Loading symbol listing...");
    let table = load_symbol_table(&args.inputs)?;

    // Step 2: Dumps
    info!("Step 2/4: Parsing profile dumps...");
    let manager = load_profiles(&args.inputs)?;
    debug!(
        "Parsed {} dumps from {} runs ({} rejected)",
        manager.dumps().len(),
        manager.run_ids().len(),
        manager.rejected().len()
    );

    // Step 3: Resolve
    info!("Step 3/4: Resolving offsets...");
    let offsets = manager.merged_offsets();
    let resolver = OffsetResolver::with_config(&table, args.inputs.resolver);
    let (sections, stats) = resolver.resolve_with_stats(&offsets);

    info!(
        "Resolved {} offsets: {} exact, {} inexact, {} unresolved",
        offsets.len(),
        stats.exact_matches,
        stats.inexact_matches,
        stats.unresolved.len()
    );
    debug!("{} emitted sections are shared by several symbols", stats.shared_sections);

    // Step 4: Write
    info!("Step 4/4: Writing orderfile...");
    write_orderfile(&sections, &args.output).context("Failed to write orderfile")?;
    info!("✓ Orderfile written to: {}", args.output.display());

    info!("Generate completed in {:.2}s", start_time.elapsed().as_secs_f64());

    if !manager.rejected().is_empty() {
        anyhow::bail!(
            "{} dump file(s) were rejected, orderfile may be incomplete",
            manager.rejected().len()
        );
    }

    Ok(())
}
