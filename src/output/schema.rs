//! Output JSON schema for phased analysis reports.
//!
//! This module defines the structure of the report written next to the
//! phased orderfiles. Schema is versioned to allow future evolution.

use crate::parser::RejectedDump;
use crate::phased::{Bucket, PhasedAnalysis, StabilityReport, StabilityVerdict};
use crate::utils::config::SCHEMA_VERSION;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Top-level report structure written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhasedReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// Library the orderfile was generated for
    pub library_name: String,

    /// Runs that took part in the analysis, in discovery order
    pub runs: Vec<String>,

    /// Runs dropped because a phase dump was missing
    #[serde(default)]
    pub excluded_runs: Vec<String>,

    /// Dump files that failed to parse
    #[serde(default)]
    pub rejected_dumps: Vec<RejectedDump>,

    /// Cross-run stability per bucket
    pub stability: StabilityReport,

    /// Threshold verdict
    pub verdict: StabilityVerdict,

    /// Number of sections written per orderfile
    pub section_counts: SectionCounts,

    /// Timestamp when report was generated
    pub generated_at: String,
}

/// Section counts of each orderfile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionCounts {
    pub startup: usize,
    pub common: usize,
    pub interaction: usize,
    pub combined: usize,
}

impl PhasedReport {
    /// Build a report from a finished analysis
    ///
    /// **Public** - used by the phased command
    pub fn new(
        library_name: &str,
        runs: Vec<String>,
        excluded_runs: Vec<String>,
        rejected_dumps: Vec<RejectedDump>,
        analysis: &PhasedAnalysis,
    ) -> Self {
        let orderfile = &analysis.orderfile;
        let section_counts = SectionCounts {
            startup: orderfile.phase(Bucket::Startup).len(),
            common: orderfile.phase(Bucket::Common).len(),
            interaction: orderfile.phase(Bucket::Interaction).len(),
            combined: orderfile.combined().len(),
        };

        Self {
            version: SCHEMA_VERSION.to_string(),
            library_name: library_name.to_string(),
            runs,
            excluded_runs,
            rejected_dumps,
            stability: analysis.stability.clone(),
            verdict: analysis.verdict.clone(),
            section_counts,
            generated_at: Utc::now().to_rfc3339(),
        }
    }
}
