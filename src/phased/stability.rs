//! Cross-run stability of the phase buckets.
//!
//! For each bucket, the per-run offset sets are united and intersected.
//! The ratio of their sizes is 1.0 when every run saw the same code, and
//! grows as runs disagree. Sizes are byte sizes of the reached symbols, so
//! a few large hot functions are not outweighed by many tiny cold ones.

use super::analyzer::{Bucket, OrderfilePhaseOffsets};
use crate::resolver::primary_symbol_size;
use crate::symbols::SymbolTable;
use crate::utils::error::PhasedError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Union/intersection statistics of one bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketStability {
    /// Distinct offsets seen in any run
    pub union_count: usize,

    /// Distinct offsets seen in every run
    pub intersection_count: usize,

    /// Total symbol bytes of the union
    pub union_size: u64,

    /// Total symbol bytes of the intersection
    pub intersection_size: u64,

    /// union_size / intersection_size; null when the intersection is empty
    pub ratio: Option<f64>,
}

impl BucketStability {
    /// True when no run had anything in this bucket
    pub fn is_empty(&self) -> bool {
        self.union_count == 0
    }
}

/// Stability of the three buckets across runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityReport {
    pub run_count: usize,
    pub startup: BucketStability,
    pub common: BucketStability,
    pub interaction: BucketStability,
}

impl StabilityReport {
    pub fn bucket(&self, bucket: Bucket) -> &BucketStability {
        match bucket {
            Bucket::Startup => &self.startup,
            Bucket::Common => &self.common,
            Bucket::Interaction => &self.interaction,
        }
    }

    /// Human-readable summary for logging
    pub fn summary(&self) -> String {
        let parts: Vec<String> = Bucket::ALL
            .iter()
            .map(|&b| format!("{}: {}", b, format_ratio(self.bucket(b).ratio)))
            .collect();
        format!("Runs: {} | {}", self.run_count, parts.join(" | "))
    }
}

/// Format an optional ratio, "undefined" when absent
pub fn format_ratio(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) => format!("{:.3}", r),
        None => "undefined".to_string(),
    }
}

/// Compute the stability of each bucket across runs
///
/// **Public** - main entry point for stability analysis
///
/// # Arguments
/// * `symbols` - Table used to size reached offsets
/// * `per_run` - Phase buckets of each run
///
/// # Errors
/// * `PhasedError::NotEnoughRuns` - One run is trivially "stable", so fewer
///   than two is refused
pub fn compute_stability(
    symbols: &SymbolTable,
    per_run: &[OrderfilePhaseOffsets],
) -> Result<StabilityReport, PhasedError> {
    if per_run.len() < 2 {
        return Err(PhasedError::NotEnoughRuns(per_run.len()));
    }

    let report = StabilityReport {
        run_count: per_run.len(),
        startup: bucket_stability(symbols, per_run, Bucket::Startup),
        common: bucket_stability(symbols, per_run, Bucket::Common),
        interaction: bucket_stability(symbols, per_run, Bucket::Interaction),
    };

    debug!("Stability: {}", report.summary());
    Ok(report)
}

/// Union/intersection of one bucket across runs
///
/// **Private** - internal helper for compute_stability
fn bucket_stability(
    symbols: &SymbolTable,
    per_run: &[OrderfilePhaseOffsets],
    bucket: Bucket,
) -> BucketStability {
    let sets: Vec<BTreeSet<u64>> = per_run
        .iter()
        .map(|p| p.bucket(bucket).iter().copied().collect())
        .collect();

    let union: BTreeSet<u64> = sets.iter().flatten().copied().collect();
    let intersection: BTreeSet<u64> = match sets.split_first() {
        Some((first, rest)) => first
            .iter()
            .copied()
            .filter(|o| rest.iter().all(|set| set.contains(o)))
            .collect(),
        None => BTreeSet::new(),
    };

    let union_size = offsets_size(symbols, &union);
    let intersection_size = offsets_size(symbols, &intersection);

    let ratio = if intersection.is_empty() {
        None
    } else {
        Some(union_size as f64 / intersection_size as f64)
    };

    BucketStability {
        union_count: union.len(),
        intersection_count: intersection.len(),
        union_size,
        intersection_size,
        ratio,
    }
}

/// Total primary symbol size of a set of reached offsets
///
/// Zero-size symbols weigh one byte so a reached symbol always counts.
fn offsets_size(symbols: &SymbolTable, offsets: &BTreeSet<u64>) -> u64 {
    offsets
        .iter()
        .map(|&o| primary_symbol_size(symbols, o).max(1))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phased::analyzer::partition_phase_offsets;
    use crate::symbols::RawSymbolEntry;

    fn table() -> SymbolTable {
        SymbolTable::build(vec![
            RawSymbolEntry::new("big", ".text.big", 0x1000, 0x400),
            RawSymbolEntry::new("small_a", ".text.small_a", 0x2000, 0x10),
            RawSymbolEntry::new("small_b", ".text.small_b", 0x2010, 0x10),
        ])
        .unwrap()
    }

    fn startup_only(offsets: &[u64]) -> OrderfilePhaseOffsets {
        OrderfilePhaseOffsets {
            startup: offsets.to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn test_one_run_is_refused() {
        let result = compute_stability(&table(), &[startup_only(&[0x1000])]);
        assert!(matches!(result, Err(PhasedError::NotEnoughRuns(1))));
    }

    #[test]
    fn test_identical_runs_are_perfectly_stable() {
        let runs = vec![startup_only(&[0x1000, 0x2000]), startup_only(&[0x2000, 0x1000])];
        let report = compute_stability(&table(), &runs).unwrap();
        assert_eq!(report.startup.ratio, Some(1.0));
    }

    #[test]
    fn test_ratio_is_size_weighted() {
        // Runs disagree only on a small symbol
        let runs = vec![
            startup_only(&[0x1000, 0x2000]),
            startup_only(&[0x1000, 0x2010]),
        ];
        let report = compute_stability(&table(), &runs).unwrap();

        assert_eq!(report.startup.union_size, 0x420);
        assert_eq!(report.startup.intersection_size, 0x400);
        assert_eq!(report.startup.ratio, Some(0x420 as f64 / 0x400 as f64));
    }

    #[test]
    fn test_empty_intersection_is_undefined() {
        let runs = vec![startup_only(&[0x1000]), startup_only(&[0x2000])];
        let report = compute_stability(&table(), &runs).unwrap();

        assert_eq!(report.startup.intersection_count, 0);
        assert_eq!(report.startup.ratio, None);
        assert!(!report.startup.is_empty());
        // Nothing in interaction for either run
        assert!(report.interaction.is_empty());
        assert_eq!(report.interaction.ratio, None);
    }

    #[test]
    fn test_zero_size_symbols_keep_ratio_defined() {
        let table = SymbolTable::build(vec![
            RawSymbolEntry::new("label", ".text.label", 0x10, 0),
            RawSymbolEntry::new("stub", ".text.stub", 0x20, 0),
        ])
        .unwrap();
        let runs = vec![startup_only(&[0x10, 0x20]), startup_only(&[0x10])];

        let report = compute_stability(&table, &runs).unwrap();

        assert_eq!(report.startup.intersection_count, 1);
        assert_eq!(report.startup.union_size, 2);
        assert_eq!(report.startup.intersection_size, 1);
        assert_eq!(report.startup.ratio, Some(2.0));
    }

    #[test]
    fn test_report_from_partitions() {
        let runs = vec![
            partition_phase_offsets(&[0x1000, 0x2000], &[0x2000, 0x2010]),
            partition_phase_offsets(&[0x1000], &[0x2000, 0x2010]),
        ];
        let report = compute_stability(&table(), &runs).unwrap();

        assert_eq!(report.run_count, 2);
        assert_eq!(report.startup.ratio, Some(1.0));
        assert_eq!(report.interaction.union_count, 2);
        assert_eq!(report.interaction.intersection_count, 1);
    }

    #[test]
    fn test_undefined_ratio_serializes_as_null() {
        let runs = vec![startup_only(&[0x1000]), startup_only(&[0x2000])];
        let report = compute_stability(&table(), &runs).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["startup"]["ratio"].is_null());
    }

    #[test]
    fn test_format_ratio() {
        assert_eq!(format_ratio(Some(1.5)), "1.500");
        assert_eq!(format_ratio(None), "undefined");
    }
}
