//! Terminal output rendering for phased reports.
//!
//! Provides a human-readable stability summary with the verdict
//! highlighted.

use super::schema::PhasedReport;
use crate::phased::{format_ratio, Bucket, ViolationKind};
use colored::*;

/// Render a human-readable summary of a phased report for the terminal
pub fn render_terminal_summary(report: &PhasedReport) -> String {
    let mut out = String::new();

    out.push_str(&render_header(report));
    out.push_str(&render_stability(report));
    out.push_str(&render_sections(report));
    out.push_str(&render_problems(report));
    out.push_str(&render_status(report));

    out
}

fn render_header(report: &PhasedReport) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&"Phased Orderfile Summary".bold().to_string());
    out.push_str("\n---------------------------------------------------\n");
    out.push_str(&format!("Library: {}\n", report.library_name));
    out.push_str(&format!("Runs:    {}\n", report.runs.len()));
    out.push_str("---------------------------------------------------\n\n");
    out
}

fn render_stability(report: &PhasedReport) -> String {
    let mut out = String::from("Stability (union/intersection):\n");

    for bucket in Bucket::ALL {
        let stability = report.stability.bucket(bucket);
        let violation = report.verdict.violations.iter().find(|v| v.bucket == bucket);

        let ratio = format_ratio(stability.ratio);
        let ratio = match violation {
            Some(v) if v.kind == ViolationKind::Undefined => ratio.red(),
            Some(_) => ratio.red().bold(),
            None => ratio.green(),
        };

        let threshold = violation
            .map(|v| format!(" (threshold {:.3})", v.threshold))
            .unwrap_or_default();

        out.push_str(&format!(
            "  {:<12} {} [{} of {} offsets in every run]{}\n",
            bucket.name(),
            ratio,
            stability.intersection_count,
            stability.union_count,
            threshold
        ));
    }
    out
}

fn render_sections(report: &PhasedReport) -> String {
    let counts = &report.section_counts;
    format!(
        "\nSections: {} startup, {} common, {} interaction ({} total)\n",
        counts.startup, counts.common, counts.interaction, counts.combined
    )
}

fn render_problems(report: &PhasedReport) -> String {
    let mut out = String::new();

    if !report.excluded_runs.is_empty() {
        out.push_str(&format!(
            "{} {}\n",
            "Excluded runs:".yellow(),
            report.excluded_runs.join(", ")
        ));
    }

    for rejected in &report.rejected_dumps {
        out.push_str(&format!(
            "{} {}: {}\n",
            "Rejected dump:".yellow(),
            rejected.path.display(),
            rejected.reason
        ));
    }
    out
}

fn render_status(report: &PhasedReport) -> String {
    let mut out = String::new();
    out.push_str("\n---------------------------------------------------\n");
    let status_msg = if report.verdict.stable {
        "STATUS: PASSED".green().bold()
    } else {
        format!(
            "STATUS: UNSTABLE PROFILE ({} violations)",
            report.verdict.violations.len()
        )
        .red()
        .bold()
    };
    out.push_str(&status_msg.to_string());
    out.push('\n');
    out
}
