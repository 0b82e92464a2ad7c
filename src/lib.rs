//! Cygprofile Orderfile
//!
//! Linker orderfile generation from cygprofile instrumentation dumps,
//! with startup/interaction phase splitting and cross-run stability
//! checks.
//!
//! This crate provides the core implementation for the
//! `cygprofile-orderfile` CLI tool.
//!
//! ## Getting Started
//!
//! ```bash
//! cygprofile-orderfile phased \
//!     --profile-directory /tmp/profiles \
//!     --instrumented-build-dir out/instrumented \
//!     --library-name libchrome.so \
//!     --output orderfiles
//! ```
//!
//! ## Pipeline
//!
//! 1. [`symbols`] builds the alias-aware symbol table
//! 2. [`parser`] reads the per-run, per-phase dumps
//! 3. [`resolver`] maps offsets to linker sections
//! 4. [`phased`] splits offsets into phases and checks stability
//! 5. [`output`] writes orderfiles and the JSON report

pub mod commands;
pub mod output;
pub mod parser;
pub mod phased;
pub mod resolver;
pub mod symbols;
pub mod utils;
