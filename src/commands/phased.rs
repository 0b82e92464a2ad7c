//! Phased command implementation.
//!
//! The phased command:
//! 1. Loads stability thresholds
//! 2. Loads the symbol listing
//! 3. Parses and pairs the startup/interaction dumps of each run
//! 4. Partitions offsets and checks cross-run stability
//! 5. Writes the four orderfiles and the JSON report

use super::models::PhasedArgs;
use super::utils::{load_profiles, load_symbol_table, validate_inputs};
use crate::output::{render_terminal_summary, write_orderfile, write_report, PhasedReport};
use crate::phased::{load_thresholds, Bucket, PhasedAnalyzer, StabilityThresholds};
use crate::utils::config::{
    COMBINED_ORDERFILE, COMMON_ORDERFILE, INTERACTION_ORDERFILE, REPORT_FILE, STARTUP_ORDERFILE,
};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Instant;

/// Execute the phased command
///
/// **Public** - main entry point called from main.rs
///
/// All outputs are written before any failure is reported, so an
/// unstable or partial profile can still be inspected.
///
/// # Errors
/// * Missing or malformed symbol listing or threshold file
/// * Dumps that are not exactly phases {0, 1}, or fewer than two runs
/// * File write errors
/// * Rejected dumps or excluded runs (after outputs are written)
/// * Unstable profile, when `strict` is set
pub fn execute_phased(args: PhasedArgs) -> Result<()> {
    let start_time = Instant::now();

    validate_args(&args)?;

    // Step 1: Thresholds
    info!("Step 1/5: Loading stability thresholds...");
    let thresholds = match &args.thresholds {
        Some(path) => load_thresholds(path)
            .with_context(|| format!("Failed to load thresholds {}", path.display()))?,
        None => StabilityThresholds::default(),
    };
    debug!("Thresholds: {:?}", thresholds);

    // Step 2: Symbols
    info!("Step 2/5: Loading symbol listing...");
    let table = load_symbol_table(&args.inputs)?;

    // Step 3: Dumps
    info!("Step 3/5: Parsing profile dumps...");
    let manager = load_profiles(&args.inputs)?;
    let runs = manager.runs().context("Profile dumps are not phased")?;
    let excluded_runs = manager.incomplete_runs();
    info!("Using {} complete runs", runs.len());

    // Step 4: Analyze
    info!("Step 4/5: Analyzing phases and stability...");
    let run_ids: Vec<String> = runs.iter().map(|r| r.run_id.clone()).collect();
    let analyzer = PhasedAnalyzer::with_config(&table, runs, args.inputs.resolver);
    let analysis = analyzer
        .analyze(&thresholds)
        .context("Failed to analyze phased profile")?;
    info!("Stability: {}", analysis.stability.summary());

    // Step 5: Write outputs
    info!("Step 5/5: Writing orderfiles and report...");
    for (bucket, file_name) in [
        (Bucket::Startup, STARTUP_ORDERFILE),
        (Bucket::Common, COMMON_ORDERFILE),
        (Bucket::Interaction, INTERACTION_ORDERFILE),
    ] {
        write_orderfile(analysis.orderfile.phase(bucket), args.output_dir.join(file_name))
            .with_context(|| format!("Failed to write {} orderfile", bucket))?;
    }
    write_orderfile(
        &analysis.orderfile.combined(),
        args.output_dir.join(COMBINED_ORDERFILE),
    )
    .context("Failed to write combined orderfile")?;

    let report = PhasedReport::new(
        &args.inputs.library_name,
        run_ids,
        excluded_runs,
        manager.rejected().to_vec(),
        &analysis,
    );
    let report_path = report_path(&args);
    write_report(&report, &report_path).context("Failed to write stability report")?;
    info!("✓ Report written to: {}", report_path.display());

    if args.print_summary {
        println!("{}", render_terminal_summary(&report));
    }

    info!("Phased analysis completed in {:.2}s", start_time.elapsed().as_secs_f64());

    check_outcome(&report, args.strict)
}

/// Validate phased arguments
///
/// **Public** - can be called before execute_phased for early validation
pub fn validate_args(args: &PhasedArgs) -> Result<()> {
    validate_inputs(&args.inputs)?;

    if args.output_dir.is_file() {
        anyhow::bail!(
            "Output must be a directory, found a file: {}",
            args.output_dir.display()
        );
    }

    if let Some(path) = &args.thresholds {
        if !path.is_file() {
            anyhow::bail!("Threshold file does not exist: {}", path.display());
        }
    }

    Ok(())
}

/// Report location, explicit or inside the output directory
///
/// **Private** - internal helper for execute_phased
fn report_path(args: &PhasedArgs) -> PathBuf {
    args.report
        .clone()
        .unwrap_or_else(|| args.output_dir.join(REPORT_FILE))
}

/// Turn the report into the command's exit status
///
/// **Private** - internal helper for execute_phased
fn check_outcome(report: &PhasedReport, strict: bool) -> Result<()> {
    let mut problems = Vec::new();

    if !report.rejected_dumps.is_empty() {
        problems.push(format!("{} dump file(s) rejected", report.rejected_dumps.len()));
    }

    if !report.excluded_runs.is_empty() {
        problems.push(format!(
            "run(s) missing a phase: {}",
            report.excluded_runs.join(", ")
        ));
    }

    if !report.verdict.stable {
        let buckets: Vec<String> = report
            .verdict
            .violations
            .iter()
            .map(|v| v.bucket.to_string())
            .collect();

        if strict {
            problems.push(format!("unstable profile ({})", buckets.join(", ")));
        } else {
            warn!(
                "Profile is unstable ({}), orderfiles written anyway",
                buckets.join(", ")
            );
        }
    }

    if !problems.is_empty() {
        anyhow::bail!("Phased orderfile generation failed: {}", problems.join("; "));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::models::ProfileInputs;
    use crate::output::SectionCounts;
    use crate::parser::RejectedDump;
    use crate::phased::{
        BucketStability, StabilityReport, StabilityVerdict, StabilityViolation, ViolationKind,
    };

    fn bucket() -> BucketStability {
        BucketStability {
            union_count: 1,
            intersection_count: 1,
            union_size: 16,
            intersection_size: 16,
            ratio: Some(1.0),
        }
    }

    fn report(stable: bool) -> PhasedReport {
        let violations = if stable {
            vec![]
        } else {
            vec![StabilityViolation {
                bucket: Bucket::Interaction,
                kind: ViolationKind::ExceedsThreshold,
                threshold: 2.5,
                actual: Some(3.0),
            }]
        };

        PhasedReport {
            version: "1.0.0".to_string(),
            library_name: "libchrome.so".to_string(),
            runs: vec!["a".to_string(), "b".to_string()],
            excluded_runs: vec![],
            rejected_dumps: vec![],
            stability: StabilityReport {
                run_count: 2,
                startup: bucket(),
                common: bucket(),
                interaction: bucket(),
            },
            verdict: StabilityVerdict {
                stable,
                status: if stable { "PASSED" } else { "FAILED" }.to_string(),
                violations,
            },
            section_counts: SectionCounts::default(),
            generated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_outcome_stable() {
        assert!(check_outcome(&report(true), true).is_ok());
    }

    #[test]
    fn test_outcome_unstable_only_fails_when_strict() {
        assert!(check_outcome(&report(false), false).is_ok());
        assert!(check_outcome(&report(false), true).is_err());
    }

    #[test]
    fn test_outcome_excluded_run_fails() {
        let mut report = report(true);
        report.excluded_runs = vec!["c".to_string()];

        let err = check_outcome(&report, false).unwrap_err();
        assert!(err.to_string().contains("c"));
    }

    #[test]
    fn test_outcome_rejected_dump_fails() {
        let mut report = report(true);
        report.rejected_dumps = vec![RejectedDump {
            path: PathBuf::from("cygprofile-x.txt_0"),
            reason: "bad line".to_string(),
        }];

        assert!(check_outcome(&report, false).is_err());
    }

    #[test]
    fn test_report_path_defaults_to_output_dir() {
        let args = PhasedArgs {
            output_dir: PathBuf::from("out"),
            ..Default::default()
        };
        assert_eq!(report_path(&args), PathBuf::from("out").join(REPORT_FILE));
    }

    #[test]
    fn test_validate_args_output_is_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, "").unwrap();

        let mut args = PhasedArgs {
            inputs: ProfileInputs {
                profile_directory: dir.path().to_path_buf(),
                library_name: "libchrome.so".to_string(),
                symbol_listing: Some(dir.path().join("lib.symbols")),
                ..Default::default()
            },
            output_dir: dir.path().join("out"),
            ..Default::default()
        };
        assert!(validate_args(&args).is_ok());

        args.output_dir = file;
        assert!(validate_args(&args).is_err());
    }
}
