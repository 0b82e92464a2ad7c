//! Phased orderfile analysis and stability checking.
//!
//! This module pairs startup and interaction dumps into runs, splits each
//! run's code into startup/common/interaction buckets, and checks that the
//! buckets agree across runs before the orderfile is trusted.
//!
//! # Example
//! ```ignore
//! use cygprofile_orderfile::phased::{PhasedAnalyzer, StabilityThresholds};
//!
//! let runs = manager.runs()?;
//! let analyzer = PhasedAnalyzer::new(&table, runs);
//! let analysis = analyzer.analyze(&StabilityThresholds::default())?;
//! if !analysis.verdict.stable {
//!     log::warn!("Profile is unstable");
//! }
//! ```

mod analyzer;
mod stability;
mod threshold;

// Public API exports
pub use analyzer::{
    combine_phase_offsets, partition_phase_offsets, Bucket, OrderfilePhaseOffsets,
    PhasedAnalysis, PhasedAnalyzer, PhasedOrderfile, Run,
};
pub use stability::{compute_stability, format_ratio, BucketStability, StabilityReport};
pub use threshold::{
    check_stability, is_stable_profile, load_thresholds, StabilityThresholds,
    StabilityVerdict, StabilityViolation, ViolationKind,
};
