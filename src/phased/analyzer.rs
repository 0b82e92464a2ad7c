//! Cross-run phase classification.
//!
//! Each run has a startup dump and an interaction dump. Reached offsets
//! are split into code used only at startup, code used in both phases, and
//! code used only during interaction. Those buckets become the three
//! orderfile phases.

use super::stability::{compute_stability, StabilityReport};
use super::threshold::{check_stability, StabilityThresholds, StabilityVerdict};
use crate::parser::ProfileDump;
use crate::resolver::{reached_offsets, OffsetResolver, OrderedSectionList, ResolverConfig};
use crate::symbols::SymbolTable;
use crate::utils::config::{INTERACTION_PHASE, STARTUP_PHASE};
use crate::utils::error::PhasedError;
use indexmap::IndexSet;
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Orderfile phase bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Startup,
    Common,
    Interaction,
}

impl Bucket {
    /// All buckets in orderfile order
    pub const ALL: [Bucket; 3] = [Bucket::Startup, Bucket::Common, Bucket::Interaction];

    pub fn name(self) -> &'static str {
        match self {
            Bucket::Startup => "startup",
            Bucket::Common => "common",
            Bucket::Interaction => "interaction",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The startup and interaction dumps of one profiling run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub run_id: String,
    pub startup: ProfileDump,
    pub interaction: ProfileDump,
}

impl Run {
    /// Pair two dumps into a run
    ///
    /// # Errors
    /// * `PhasedError::WrongPhase` - A dump carries the wrong phase tag
    /// * `PhasedError::RunIdMismatch` - The dumps come from different runs
    pub fn new(startup: ProfileDump, interaction: ProfileDump) -> Result<Self, PhasedError> {
        for (dump, expected) in [(&startup, STARTUP_PHASE), (&interaction, INTERACTION_PHASE)] {
            if dump.phase != expected {
                return Err(PhasedError::WrongPhase {
                    run_id: dump.run_id.clone(),
                    expected,
                    found: dump.phase,
                });
            }
        }

        if startup.run_id != interaction.run_id {
            return Err(PhasedError::RunIdMismatch {
                startup: startup.run_id,
                interaction: interaction.run_id,
            });
        }

        Ok(Self {
            run_id: startup.run_id.clone(),
            startup,
            interaction,
        })
    }
}

/// Per-run (or combined) offsets of each orderfile phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderfilePhaseOffsets {
    /// Offsets reached only during startup
    pub startup: Vec<u64>,

    /// Offsets reached in both phases, startup order first
    pub common: Vec<u64>,

    /// Offsets reached only during interaction
    pub interaction: Vec<u64>,
}

impl OrderfilePhaseOffsets {
    pub fn bucket(&self, bucket: Bucket) -> &[u64] {
        match bucket {
            Bucket::Startup => &self.startup,
            Bucket::Common => &self.common,
            Bucket::Interaction => &self.interaction,
        }
    }

    /// Every offset across the three buckets
    pub fn all_offsets(&self) -> HashSet<u64> {
        Bucket::ALL
            .iter()
            .flat_map(|&b| self.bucket(b).iter().copied())
            .collect()
    }
}

/// Split two reached-offset sequences into the three phase buckets
///
/// **Public** - pure set partition, order taken from the inputs
///
/// Common offsets are ordered by first appearance scanning the startup
/// sequence, then the interaction sequence.
pub fn partition_phase_offsets(startup: &[u64], interaction: &[u64]) -> OrderfilePhaseOffsets {
    let startup_set: HashSet<u64> = startup.iter().copied().collect();
    let interaction_set: HashSet<u64> = interaction.iter().copied().collect();

    let common: IndexSet<u64> = startup
        .iter()
        .filter(|o| interaction_set.contains(*o))
        .chain(interaction.iter().filter(|o| startup_set.contains(*o)))
        .copied()
        .collect();

    OrderfilePhaseOffsets {
        startup: ordered_unique(startup.iter().filter(|o| !interaction_set.contains(*o))),
        common: common.into_iter().collect(),
        interaction: ordered_unique(interaction.iter().filter(|o| !startup_set.contains(*o))),
    }
}

/// Ordered union of each bucket across runs, in run order
///
/// **Public** - an offset that lands in several combined buckets is kept
/// only in the earliest (startup, then common, then interaction)
pub fn combine_phase_offsets(per_run: &[OrderfilePhaseOffsets]) -> OrderfilePhaseOffsets {
    let mut placed: HashSet<u64> = HashSet::new();
    let mut combined = OrderfilePhaseOffsets::default();

    for bucket in Bucket::ALL {
        let ordered: IndexSet<u64> = per_run
            .iter()
            .flat_map(|p| p.bucket(bucket).iter().copied())
            .collect();

        let kept: Vec<u64> = ordered.into_iter().filter(|o| placed.insert(*o)).collect();
        match bucket {
            Bucket::Startup => combined.startup = kept,
            Bucket::Common => combined.common = kept,
            Bucket::Interaction => combined.interaction = kept,
        }
    }

    combined
}

fn ordered_unique<'a>(offsets: impl Iterator<Item = &'a u64>) -> Vec<u64> {
    offsets
        .copied()
        .collect::<IndexSet<u64>>()
        .into_iter()
        .collect()
}

/// Section lists for the three orderfile phases
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhasedOrderfile {
    pub startup: OrderedSectionList,
    pub common: OrderedSectionList,
    pub interaction: OrderedSectionList,
}

impl PhasedOrderfile {
    pub fn phase(&self, bucket: Bucket) -> &OrderedSectionList {
        match bucket {
            Bucket::Startup => &self.startup,
            Bucket::Common => &self.common,
            Bucket::Interaction => &self.interaction,
        }
    }

    /// Startup, common, then interaction sections in one list
    pub fn combined(&self) -> OrderedSectionList {
        let sections: IndexSet<&str> = Bucket::ALL
            .iter()
            .flat_map(|&b| self.phase(b).iter())
            .collect();
        OrderedSectionList {
            sections: sections.into_iter().map(str::to_string).collect(),
        }
    }
}

/// Everything phased analysis produces, computed once
#[derive(Debug, Clone)]
pub struct PhasedAnalysis {
    pub per_run: Vec<OrderfilePhaseOffsets>,
    pub combined: OrderfilePhaseOffsets,
    pub stability: StabilityReport,
    pub verdict: StabilityVerdict,
    pub orderfile: PhasedOrderfile,
}

/// Phase analysis over complete runs and a shared symbol table
pub struct PhasedAnalyzer<'a> {
    symbols: &'a SymbolTable,
    runs: Vec<Run>,
    config: ResolverConfig,
}

impl<'a> PhasedAnalyzer<'a> {
    pub fn new(symbols: &'a SymbolTable, runs: Vec<Run>) -> Self {
        Self::with_config(symbols, runs, ResolverConfig::default())
    }

    pub fn with_config(symbols: &'a SymbolTable, runs: Vec<Run>, config: ResolverConfig) -> Self {
        Self {
            symbols,
            runs,
            config,
        }
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Phase buckets of one run, over reached symbol offsets
    ///
    /// **Public** - per-run partition
    pub fn compute_phase_offsets(&self, run: &Run) -> OrderfilePhaseOffsets {
        let startup = reached_offsets(self.symbols, &run.startup.ordered_offsets, &self.config);
        let interaction =
            reached_offsets(self.symbols, &run.interaction.ordered_offsets, &self.config);

        let phases = partition_phase_offsets(&startup, &interaction);
        debug!(
            "Run '{}': {} startup, {} common, {} interaction offsets",
            run.run_id,
            phases.startup.len(),
            phases.common.len(),
            phases.interaction.len()
        );
        phases
    }

    /// Phase buckets of every run, computed in parallel, in run order
    pub fn all_phase_offsets(&self) -> Vec<OrderfilePhaseOffsets> {
        self.runs
            .par_iter()
            .map(|run| self.compute_phase_offsets(run))
            .collect()
    }

    /// Cross-run stability of each bucket
    ///
    /// # Errors
    /// * `PhasedError::NotEnoughRuns` - Fewer than two runs
    pub fn compute_stability(&self) -> Result<StabilityReport, PhasedError> {
        compute_stability(self.symbols, &self.all_phase_offsets())
    }

    /// Whether every bucket is within its threshold
    ///
    /// # Errors
    /// * `PhasedError::NotEnoughRuns` - Fewer than two runs
    pub fn is_stable_profile(&self, thresholds: &StabilityThresholds) -> Result<bool, PhasedError> {
        let report = self.compute_stability()?;
        Ok(check_stability(&report, thresholds).stable)
    }

    /// Resolve combined phase offsets into section lists
    ///
    /// **Public** - a section emitted in an earlier phase is not repeated
    pub fn phase_sections(&self, combined: &OrderfilePhaseOffsets) -> PhasedOrderfile {
        let resolver = OffsetResolver::with_config(self.symbols, self.config);
        let mut emitted: HashSet<String> = HashSet::new();

        let mut resolve_bucket = |bucket: Bucket| {
            let list = resolver.resolve(combined.bucket(bucket));
            let sections = list
                .sections
                .into_iter()
                .filter(|s| emitted.insert(s.clone()))
                .collect();
            OrderedSectionList { sections }
        };

        PhasedOrderfile {
            startup: resolve_bucket(Bucket::Startup),
            common: resolve_bucket(Bucket::Common),
            interaction: resolve_bucket(Bucket::Interaction),
        }
    }

    /// Phase buckets merged across every run
    pub fn combined_phase_offsets(&self) -> OrderfilePhaseOffsets {
        combine_phase_offsets(&self.all_phase_offsets())
    }

    /// Section lists for the three orderfile phases
    pub fn orderfile_phases(&self) -> PhasedOrderfile {
        self.phase_sections(&self.combined_phase_offsets())
    }

    /// Run the whole phased analysis once
    ///
    /// **Public** - main entry point for the phased command
    ///
    /// # Errors
    /// * `PhasedError::NotEnoughRuns` - Fewer than two runs
    pub fn analyze(&self, thresholds: &StabilityThresholds) -> Result<PhasedAnalysis, PhasedError> {
        info!("Analyzing {} runs", self.runs.len());

        let per_run = self.all_phase_offsets();
        let stability = compute_stability(self.symbols, &per_run)?;
        let verdict = check_stability(&stability, thresholds);
        let combined = combine_phase_offsets(&per_run);
        let orderfile = self.phase_sections(&combined);

        Ok(PhasedAnalysis {
            per_run,
            combined,
            stability,
            verdict,
            orderfile,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partition_basic() {
        let phases = partition_phase_offsets(&[1, 2, 3], &[3, 4]);
        assert_eq!(phases.startup, vec![1, 2]);
        assert_eq!(phases.common, vec![3]);
        assert_eq!(phases.interaction, vec![4]);
    }

    #[test]
    fn test_common_follows_startup_order() {
        let phases = partition_phase_offsets(&[5, 7, 9], &[9, 8, 7, 5]);
        assert_eq!(phases.common, vec![5, 7, 9]);
        assert_eq!(phases.interaction, vec![8]);
    }

    #[test]
    fn test_run_rejects_mismatched_ids() {
        let result = Run::new(
            ProfileDump::new("a", 0, vec![1]),
            ProfileDump::new("b", 1, vec![2]),
        );
        assert!(matches!(result, Err(PhasedError::RunIdMismatch { .. })));
    }

    #[test]
    fn test_run_rejects_wrong_phase() {
        let result = Run::new(
            ProfileDump::new("a", 1, vec![1]),
            ProfileDump::new("a", 1, vec![2]),
        );
        assert!(matches!(
            result,
            Err(PhasedError::WrongPhase { expected: 0, .. })
        ));
    }

    #[test]
    fn test_combine_keeps_earliest_bucket() {
        let run1 = partition_phase_offsets(&[1, 2, 3], &[3, 4]);
        let run2 = partition_phase_offsets(&[1, 4], &[2, 4, 5]);

        let combined = combine_phase_offsets(&[run1, run2]);

        // run2 has 2 in interaction and 4 in common; startup and common win
        assert_eq!(combined.startup, vec![1, 2]);
        assert_eq!(combined.common, vec![3, 4]);
        assert_eq!(combined.interaction, vec![5]);
    }

    #[test]
    fn test_bucket_display() {
        assert_eq!(Bucket::Common.to_string(), "common");
        assert_eq!(Bucket::ALL.len(), 3);
    }
}
