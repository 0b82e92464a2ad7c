//! Groups parsed dumps by run and phase.
//!
//! Dump files follow the naming used by the instrumentation runtime:
//! `cygprofile-<run>.txt_<phase>`. A file without the `_<phase>` suffix is
//! an unphased dump and counts as phase 0. Files without the `cygprofile-`
//! prefix are not dumps.

use super::dump::{parse_dump, ProfileDump};
use crate::phased::Run;
use crate::utils::config::{
    DUMP_FILE_MARKER, DUMP_FILE_PREFIX, INTERACTION_PHASE, STARTUP_PHASE,
};
use crate::utils::error::{ParseError, PhasedError};
use indexmap::IndexSet;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// A dump file that could not be parsed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedDump {
    pub path: PathBuf,
    pub reason: String,
}

/// All dumps of a profiling session, in discovery order
#[derive(Debug, Clone, Default)]
pub struct ProfileManager {
    dumps: Vec<ProfileDump>,
    rejected: Vec<RejectedDump>,
}

/// Split a dump file name into (run id, phase)
///
/// **Public** - used for discovery and by tests
///
/// # Errors
/// * `ParseError::InvalidFileName` - Missing prefix or `.txt` marker, empty run, or bad phase
pub fn parse_dump_file_name(file_name: &str) -> Result<(String, u32), ParseError> {
    let invalid = || ParseError::InvalidFileName(file_name.to_string());

    let marker = file_name.rfind(DUMP_FILE_MARKER).ok_or_else(invalid)?;
    let stem = &file_name[..marker];
    let suffix = &file_name[marker + DUMP_FILE_MARKER.len()..];

    let phase = if suffix.is_empty() {
        STARTUP_PHASE
    } else {
        suffix
            .strip_prefix('_')
            .and_then(|digits| digits.parse::<u32>().ok())
            .ok_or_else(invalid)?
    };

    let run_id = stem.strip_prefix(DUMP_FILE_PREFIX).ok_or_else(invalid)?;
    if run_id.is_empty() {
        return Err(invalid());
    }

    Ok((run_id.to_string(), phase))
}

impl ProfileManager {
    /// Create a manager from already parsed dumps
    ///
    /// **Public** - a second dump for the same (run, phase) is ignored
    pub fn new(dumps: Vec<ProfileDump>) -> Self {
        let mut seen: BTreeSet<(String, u32)> = BTreeSet::new();
        let mut kept = Vec::with_capacity(dumps.len());

        for dump in dumps {
            if seen.insert((dump.run_id.clone(), dump.phase)) {
                kept.push(dump);
            } else {
                warn!(
                    "Ignoring second dump for run '{}', phase {}",
                    dump.run_id, dump.phase
                );
            }
        }

        Self {
            dumps: kept,
            rejected: Vec::new(),
        }
    }

    /// Read and parse dump files in parallel
    ///
    /// **Public** - a file that fails to parse is rejected on its own,
    /// the rest of the batch is kept
    pub fn from_files(paths: &[PathBuf]) -> Self {
        let results: Vec<Result<ProfileDump, ParseError>> =
            paths.par_iter().map(|path| read_dump_file(path)).collect();

        let mut dumps = Vec::new();
        let mut rejected = Vec::new();
        for (path, result) in paths.iter().zip(results) {
            match result {
                Ok(dump) => dumps.push(dump),
                Err(e) => {
                    warn!("Rejecting dump {}: {}", path.display(), e);
                    rejected.push(RejectedDump {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut manager = Self::new(dumps);
        manager.rejected = rejected;
        manager
    }

    /// Discover and parse every dump file in a directory
    ///
    /// **Public** - main entry point for commands
    ///
    /// Files are visited in name order, so discovery order is stable.
    ///
    /// # Errors
    /// * `ParseError::ReadFailed` - Directory cannot be listed
    pub fn from_directory(dir: impl AsRef<Path>) -> Result<Self, ParseError> {
        let dir = dir.as_ref();
        let read_failed = |source| ParseError::ReadFailed {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(read_failed)? {
            let path = entry.map_err(read_failed)?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match parse_dump_file_name(name) {
                Ok(_) => paths.push(path),
                Err(_) => debug!("Skipping non-dump file: {}", path.display()),
            }
        }
        paths.sort();

        info!("Found {} dump files in {}", paths.len(), dir.display());
        Ok(Self::from_files(&paths))
    }

    pub fn dumps(&self) -> &[ProfileDump] {
        &self.dumps
    }

    pub fn rejected(&self) -> &[RejectedDump] {
        &self.rejected
    }

    pub fn is_empty(&self) -> bool {
        self.dumps.is_empty()
    }

    /// Run ids in discovery order
    pub fn run_ids(&self) -> Vec<&str> {
        self.dumps
            .iter()
            .map(|d| d.run_id.as_str())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct phase tags present
    pub fn get_phases(&self) -> BTreeSet<u32> {
        self.dumps.iter().map(|d| d.phase).collect()
    }

    /// Check that the phases are exactly {startup, interaction}
    ///
    /// # Errors
    /// * `PhasedError::UnexpectedPhases` - Any other phase set
    pub fn require_phased(&self) -> Result<(), PhasedError> {
        let phases = self.get_phases();
        if phases != BTreeSet::from([STARTUP_PHASE, INTERACTION_PHASE]) {
            return Err(PhasedError::UnexpectedPhases(phases));
        }
        Ok(())
    }

    /// Runs that are missing their startup or interaction dump
    pub fn incomplete_runs(&self) -> Vec<String> {
        self.run_ids()
            .into_iter()
            .filter(|run| {
                self.find(run, STARTUP_PHASE).is_none()
                    || self.find(run, INTERACTION_PHASE).is_none()
            })
            .map(str::to_string)
            .collect()
    }

    /// One dump per complete run for `phase`, in run discovery order
    ///
    /// **Public** - runs missing either phase are excluded with a warning
    pub fn get_run_group_offsets(&self, phase: u32) -> Vec<&ProfileDump> {
        self.complete_run_ids()
            .into_iter()
            .filter_map(|run| self.find(run, phase))
            .collect()
    }

    /// Pair startup and interaction dumps into runs
    ///
    /// **Public** - input to the phased analyzer
    ///
    /// # Errors
    /// * `PhasedError::UnexpectedPhases` - Phases are not exactly {0, 1}
    pub fn runs(&self) -> Result<Vec<Run>, PhasedError> {
        self.require_phased()?;

        self.complete_run_ids()
            .into_iter()
            .filter_map(|run| {
                let startup = self.find(run, STARTUP_PHASE)?;
                let interaction = self.find(run, INTERACTION_PHASE)?;
                Some(Run::new(startup.clone(), interaction.clone()))
            })
            .collect()
    }

    /// Ordered union of all dumps, for single-phase orderfiles
    ///
    /// **Public** - dumps are visited by (phase, discovery order)
    pub fn merged_offsets(&self) -> Vec<u64> {
        let mut ordered: Vec<&ProfileDump> = self.dumps.iter().collect();
        // Stable sort keeps discovery order within a phase
        ordered.sort_by_key(|d| d.phase);

        let merged: IndexSet<u64> = ordered
            .iter()
            .flat_map(|d| d.ordered_offsets.iter().copied())
            .collect();
        merged.into_iter().collect()
    }

    fn find(&self, run_id: &str, phase: u32) -> Option<&ProfileDump> {
        self.dumps
            .iter()
            .find(|d| d.run_id == run_id && d.phase == phase)
    }

    /// Run ids having both phases, logging the ones that do not
    fn complete_run_ids(&self) -> Vec<&str> {
        self.run_ids()
            .into_iter()
            .filter(|run| {
                let has_startup = self.find(run, STARTUP_PHASE).is_some();
                let has_interaction = self.find(run, INTERACTION_PHASE).is_some();
                if !has_startup || !has_interaction {
                    warn!(
                        "Excluding run '{}': missing {} dump",
                        run,
                        if has_startup { "interaction" } else { "startup" }
                    );
                }
                has_startup && has_interaction
            })
            .collect()
    }
}

/// Read one dump file, taking run and phase from its name
///
/// **Private** - internal helper for from_files
fn read_dump_file(path: &Path) -> Result<ProfileDump, ParseError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ParseError::InvalidFileName(path.display().to_string()))?;
    let (run_id, phase) = parse_dump_file_name(name)?;

    let raw_bytes = std::fs::read(path).map_err(|source| ParseError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;

    parse_dump(&raw_bytes, &run_id, phase)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dump(run: &str, phase: u32, offsets: &[u64]) -> ProfileDump {
        ProfileDump::new(run, phase, offsets.to_vec())
    }

    #[test]
    fn test_parse_dump_file_name() {
        assert_eq!(
            parse_dump_file_name("cygprofile-run1.txt_0").unwrap(),
            ("run1".to_string(), 0)
        );
        assert_eq!(
            parse_dump_file_name("cygprofile-1234-5678.txt_1").unwrap(),
            ("1234-5678".to_string(), 1)
        );
        assert_eq!(
            parse_dump_file_name("cygprofile-single.txt").unwrap(),
            ("single".to_string(), 0)
        );
        assert!(parse_dump_file_name("notes.md").is_err());
        assert!(parse_dump_file_name("README.txt").is_err());
        assert!(parse_dump_file_name("run1.txt_0").is_err());
        assert!(parse_dump_file_name("cygprofile-run1.txt_x").is_err());
        assert!(parse_dump_file_name("cygprofile-.txt_0").is_err());
    }

    #[test]
    fn test_second_dump_for_same_phase_is_ignored() {
        let manager = ProfileManager::new(vec![dump("a", 0, &[1]), dump("a", 0, &[2])]);
        assert_eq!(manager.dumps().len(), 1);
        assert_eq!(manager.dumps()[0].ordered_offsets, vec![1]);
    }

    #[test]
    fn test_get_phases_and_require_phased() {
        let phased = ProfileManager::new(vec![dump("a", 0, &[1]), dump("a", 1, &[2])]);
        assert!(phased.require_phased().is_ok());

        let extra = ProfileManager::new(vec![
            dump("a", 0, &[1]),
            dump("a", 1, &[2]),
            dump("a", 2, &[3]),
        ]);
        assert!(matches!(
            extra.require_phased(),
            Err(PhasedError::UnexpectedPhases(_))
        ));
    }

    #[test]
    fn test_run_group_offsets_skip_incomplete_runs() {
        let manager = ProfileManager::new(vec![
            dump("a", 0, &[1]),
            dump("b", 0, &[2]),
            dump("a", 1, &[3]),
            dump("c", 1, &[4]),
        ]);

        let startup = manager.get_run_group_offsets(0);
        assert_eq!(startup.len(), 1);
        assert_eq!(startup[0].run_id, "a");
        assert_eq!(manager.incomplete_runs(), vec!["b", "c"]);
    }

    #[test]
    fn test_merged_offsets_orders_by_phase() {
        let manager = ProfileManager::new(vec![
            dump("a", 1, &[9, 1]),
            dump("a", 0, &[1, 2]),
            dump("b", 0, &[3, 2]),
        ]);

        assert_eq!(manager.merged_offsets(), vec![1, 2, 3, 9]);
    }
}
