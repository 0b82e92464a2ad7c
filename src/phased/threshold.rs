//! Stability threshold configuration and verdicts.
//!
//! Loads per-bucket thresholds from TOML and checks a stability report
//! against them. A breach fails the verdict but is not an error; callers
//! decide whether to discard, re-profile or continue.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::analyzer::Bucket;
use super::stability::{format_ratio, StabilityReport};
use crate::utils::config::{
    DEFAULT_COMMON_THRESHOLD, DEFAULT_INTERACTION_THRESHOLD, DEFAULT_STARTUP_THRESHOLD,
};
use crate::utils::error::ThresholdError;
use log::{info, warn};

/// Maximum allowed union/intersection ratio per bucket
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StabilityThresholds {
    pub startup: f64,
    pub common: f64,
    pub interaction: f64,
}

impl Default for StabilityThresholds {
    fn default() -> Self {
        Self {
            startup: DEFAULT_STARTUP_THRESHOLD,
            common: DEFAULT_COMMON_THRESHOLD,
            interaction: DEFAULT_INTERACTION_THRESHOLD,
        }
    }
}

impl StabilityThresholds {
    pub fn for_bucket(&self, bucket: Bucket) -> f64 {
        match bucket {
            Bucket::Startup => self.startup,
            Bucket::Common => self.common,
            Bucket::Interaction => self.interaction,
        }
    }

    /// Check that every threshold is a positive number
    ///
    /// # Errors
    /// * `ThresholdError::NonPositive` - Names the offending bucket
    pub fn validate(&self) -> Result<(), ThresholdError> {
        for bucket in Bucket::ALL {
            let value = self.for_bucket(bucket);
            if value.is_nan() || value <= 0.0 {
                return Err(ThresholdError::NonPositive {
                    bucket: bucket.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Why a bucket failed its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Ratio above the threshold
    ExceedsThreshold,

    /// Runs saw code in this bucket but none of it in every run
    Undefined,
}

/// One bucket that failed its threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityViolation {
    pub bucket: Bucket,
    pub kind: ViolationKind,
    pub threshold: f64,
    pub actual: Option<f64>,
}

/// Pass/fail result of a stability check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityVerdict {
    pub stable: bool,
    pub status: String,
    pub violations: Vec<StabilityViolation>,
}

/// Load thresholds from a TOML file
///
/// # Arguments
/// * `path` - Path to the TOML configuration file
///
/// # Returns
/// Parsed thresholds; missing keys take their defaults
///
/// # Errors
/// * `ThresholdError::IoError` - If file cannot be read
/// * `ThresholdError::ParseFailed` - If TOML is invalid
/// * `ThresholdError::NonPositive` - If a threshold is zero or negative
///
/// # Example
/// ```ignore
/// // stability.toml:
/// //   startup = 1.4
/// //   interaction = 3.0
/// let thresholds = load_thresholds("stability.toml")?;
/// ```
pub fn load_thresholds(path: impl AsRef<Path>) -> Result<StabilityThresholds, ThresholdError> {
    let contents = fs::read_to_string(path)?;
    let thresholds: StabilityThresholds = toml::from_str(&contents)?;
    thresholds.validate()?;
    Ok(thresholds)
}

/// Check a stability report against thresholds
///
/// **Public** - each failing bucket is logged with its ratio
///
/// An undefined ratio is never compared with the threshold. A bucket
/// that is empty in every run passes. A bucket with code but an empty
/// intersection fails.
pub fn check_stability(
    report: &StabilityReport,
    thresholds: &StabilityThresholds,
) -> StabilityVerdict {
    let mut violations = Vec::new();

    for bucket in Bucket::ALL {
        let stability = report.bucket(bucket);
        let threshold = thresholds.for_bucket(bucket);

        match stability.ratio {
            Some(ratio) if ratio > threshold => {
                warn!(
                    "Unstable {} phase: ratio {:.3} exceeds threshold {:.3}",
                    bucket, ratio, threshold
                );
                violations.push(StabilityViolation {
                    bucket,
                    kind: ViolationKind::ExceedsThreshold,
                    threshold,
                    actual: Some(ratio),
                });
            }
            Some(_) => {}
            None if stability.is_empty() => {
                info!("No {} offsets in any run, skipping stability check", bucket);
            }
            None => {
                warn!(
                    "Unstable {} phase: {} offsets seen but none in every run (ratio {})",
                    bucket,
                    stability.union_count,
                    format_ratio(None)
                );
                violations.push(StabilityViolation {
                    bucket,
                    kind: ViolationKind::Undefined,
                    threshold,
                    actual: None,
                });
            }
        }
    }

    create_verdict(violations)
}

/// Whether every bucket is within its threshold
pub fn is_stable_profile(report: &StabilityReport, thresholds: &StabilityThresholds) -> bool {
    check_stability(report, thresholds).stable
}

/// Create verdict based on violations
fn create_verdict(violations: Vec<StabilityViolation>) -> StabilityVerdict {
    let stable = violations.is_empty();
    StabilityVerdict {
        stable,
        status: if stable { "PASSED" } else { "FAILED" }.to_string(),
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phased::stability::BucketStability;

    fn bucket(union_count: usize, intersection_count: usize, ratio: Option<f64>) -> BucketStability {
        BucketStability {
            union_count,
            intersection_count,
            union_size: 0,
            intersection_size: 0,
            ratio,
        }
    }

    fn report(startup: Option<f64>, common: Option<f64>, interaction: Option<f64>) -> StabilityReport {
        StabilityReport {
            run_count: 2,
            startup: bucket(1, 1, startup),
            common: bucket(1, 1, common),
            interaction: bucket(1, 1, interaction),
        }
    }

    #[test]
    fn test_default_thresholds() {
        let thresholds = StabilityThresholds::default();
        assert_eq!(thresholds.startup, 1.5);
        assert_eq!(thresholds.common, 1.75);
        assert_eq!(thresholds.interaction, 2.5);
    }

    #[test]
    fn test_all_within_thresholds() {
        let verdict = check_stability(
            &report(Some(1.0), Some(1.7), Some(2.5)),
            &StabilityThresholds::default(),
        );
        assert!(verdict.stable);
        assert_eq!(verdict.status, "PASSED");
    }

    #[test]
    fn test_breach_names_bucket() {
        let verdict = check_stability(
            &report(Some(1.2), Some(1.9), Some(1.0)),
            &StabilityThresholds::default(),
        );

        assert!(!verdict.stable);
        assert_eq!(verdict.status, "FAILED");
        assert_eq!(verdict.violations.len(), 1);
        assert_eq!(verdict.violations[0].bucket, Bucket::Common);
        assert_eq!(verdict.violations[0].actual, Some(1.9));
        assert_eq!(verdict.violations[0].threshold, 1.75);
    }

    #[test]
    fn test_undefined_ratio_with_code_fails() {
        let mut report = report(Some(1.0), Some(1.0), Some(1.0));
        report.interaction = bucket(3, 0, None);

        let verdict = check_stability(&report, &StabilityThresholds::default());

        assert!(!verdict.stable);
        assert_eq!(verdict.violations[0].kind, ViolationKind::Undefined);
        assert_eq!(verdict.violations[0].actual, None);
    }

    #[test]
    fn test_empty_bucket_passes() {
        let mut report = report(Some(1.0), Some(1.0), Some(1.0));
        report.interaction = bucket(0, 0, None);

        assert!(is_stable_profile(&report, &StabilityThresholds::default()));
    }

    #[test]
    fn test_validate_rejects_non_positive() {
        let thresholds = StabilityThresholds {
            common: 0.0,
            ..Default::default()
        };
        match thresholds.validate() {
            Err(ThresholdError::NonPositive { bucket, .. }) => assert_eq!(bucket, "common"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_load_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stability.toml");
        fs::write(&path, "startup = 1.2\n").unwrap();

        let thresholds = load_thresholds(&path).unwrap();
        assert_eq!(thresholds.startup, 1.2);
        assert_eq!(thresholds.common, 1.75);
    }
}
