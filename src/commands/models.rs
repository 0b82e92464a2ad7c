use crate::resolver::ResolverConfig;
use crate::utils::config::{SYMBOL_LISTING_DIR, SYMBOL_LISTING_EXTENSION};
use std::path::{Path, PathBuf};

/// Inputs shared by the generate and phased commands
#[derive(Debug, Clone, Default)]
pub struct ProfileInputs {
    /// Directory holding the cygprofile dump files
    pub profile_directory: PathBuf,

    /// Build directory of the instrumented library
    pub instrumented_build_dir: PathBuf,

    /// Library file name, e.g. `libchrome.so`
    pub library_name: String,

    /// Symbol listing override (None = default location in the build dir)
    pub symbol_listing: Option<PathBuf>,

    /// Resolver tuning
    pub resolver: ResolverConfig,
}

impl ProfileInputs {
    /// Symbol listing to load, explicit or derived from the build dir
    pub fn symbol_listing_path(&self) -> PathBuf {
        self.symbol_listing.clone().unwrap_or_else(|| {
            default_symbol_listing(&self.instrumented_build_dir, &self.library_name)
        })
    }
}

/// Default symbol listing location: `<build>/lib.unstripped/<library>.symbols`
///
/// **Public** - also used by main.rs help text and tests
pub fn default_symbol_listing(build_dir: &Path, library_name: &str) -> PathBuf {
    build_dir
        .join(SYMBOL_LISTING_DIR)
        .join(format!("{}.{}", library_name, SYMBOL_LISTING_EXTENSION))
}

/// Arguments for the generate command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    pub inputs: ProfileInputs,

    /// Output path for the orderfile
    pub output: PathBuf,
}

impl Default for GenerateArgs {
    fn default() -> Self {
        Self {
            inputs: ProfileInputs::default(),
            output: PathBuf::from("orderfile.txt"),
        }
    }
}

/// Arguments for the phased command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct PhasedArgs {
    pub inputs: ProfileInputs,

    /// Directory receiving the four orderfiles
    pub output_dir: PathBuf,

    /// Threshold TOML file (None = built-in defaults)
    pub thresholds: Option<PathBuf>,

    /// Fail the command when the profile is unstable
    pub strict: bool,

    /// Report path override (None = `stability.json` in the output dir)
    pub report: Option<PathBuf>,

    /// Print the stability summary to stdout
    pub print_summary: bool,
}

impl Default for PhasedArgs {
    fn default() -> Self {
        Self {
            inputs: ProfileInputs::default(),
            output_dir: PathBuf::from("orderfiles"),
            thresholds: None,
            strict: false,
            report: None,
            print_summary: false,
        }
    }
}
