//! Offset to symbol matching policy.
//!
//! An offset matches exactly when a symbol starts there. Otherwise it
//! matches the closest preceding symbol whose extent, rounded up to the
//! function alignment, contains it. Instrumentation can fire a few bytes
//! into a function, and functions are padded to alignment. A small symbol
//! nested inside a larger one does not hide the larger one past its end.

use crate::symbols::{Symbol, SymbolTable};
use crate::utils::config::DEFAULT_FUNCTION_ALIGNMENT;
use indexmap::IndexSet;
use log::warn;
use serde::{Deserialize, Serialize};

/// Resolver tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Function alignment in bytes; 0 or 1 disables padding tolerance
    pub function_alignment: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            function_alignment: DEFAULT_FUNCTION_ALIGNMENT,
        }
    }
}

/// Round `size` up to a multiple of `alignment`
pub fn align_up(size: u64, alignment: u64) -> u64 {
    if alignment <= 1 {
        size
    } else {
        size.div_ceil(alignment).saturating_mul(alignment)
    }
}

/// Find the symbols an instrumentation offset belongs to
///
/// **Public** - the single matching policy used everywhere
///
/// # Returns
/// Every symbol starting at the matched address, ordered by name.
/// Empty if the offset is outside all symbols.
pub fn symbols_at_offset<'a>(
    table: &'a SymbolTable,
    offset: u64,
    config: &ResolverConfig,
) -> Vec<&'a Symbol> {
    let exact = table.symbols_starting_at(offset);
    if !exact.is_empty() {
        return exact;
    }

    // No symbol starting further back than this can reach the offset
    let reach = align_up(table.max_symbol_size(), config.function_alignment);

    for start in table.starts_at_or_before(offset) {
        if offset - start >= reach {
            break;
        }

        let candidates = table.symbols_starting_at(start);
        let extent = candidates.iter().map(|s| s.size).max().unwrap_or(0);
        let end = start.saturating_add(align_up(extent, config.function_alignment));

        if offset < end {
            return candidates;
        }
    }

    Vec::new()
}

/// Map raw offsets to the start offsets of their symbols
///
/// **Public** - phase analysis compares symbols, not raw offsets
///
/// Order-preserving and deduplicated. Offsets matching no symbol are
/// dropped and logged.
pub fn reached_offsets(table: &SymbolTable, offsets: &[u64], config: &ResolverConfig) -> Vec<u64> {
    let mut reached: IndexSet<u64> = IndexSet::with_capacity(offsets.len());
    let mut unresolved = 0usize;

    for &offset in offsets {
        match symbols_at_offset(table, offset, config).first() {
            Some(symbol) => {
                reached.insert(symbol.offset);
            }
            None => unresolved += 1,
        }
    }

    if unresolved > 0 {
        warn!(
            "{} of {} offsets matched no symbol and were dropped",
            unresolved,
            offsets.len()
        );
    }

    reached.into_iter().collect()
}

/// Size of the largest symbol starting at a reached offset
pub fn primary_symbol_size(table: &SymbolTable, offset: u64) -> u64 {
    table
        .symbols_starting_at(offset)
        .iter()
        .map(|s| s.size)
        .max()
        .unwrap_or(0)
}
