//! Symbol table construction.
//!
//! This module handles:
//! - Parsing the toolchain symbol listing
//! - Merging duplicate entries and ctor/dtor aliases
//! - Indexing symbols by name, offset and section

pub mod alias;
pub mod listing;
pub mod table;

// Re-export main types
pub use alias::{canonical_ctor_dtor_key, is_likely_same_ctor_dtor};
pub use listing::{load_symbol_listing, parse_symbol_listing};
pub use table::{RawSymbolEntry, Symbol, SymbolTable};
