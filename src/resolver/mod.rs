//! Offset to section resolution.
//!
//! Turns a first-touch ordered offset sequence into an ordered,
//! deduplicated list of section names for the linker orderfile.
//!
//! # Example
//! ```ignore
//! let resolver = OffsetResolver::new(&table);
//! let sections = resolver.resolve(&dump.ordered_offsets);
//! write_orderfile(&sections, "chrome.orderfile")?;
//! ```

mod lookup;

pub use lookup::{align_up, primary_symbol_size, reached_offsets, symbols_at_offset, ResolverConfig};

use crate::symbols::SymbolTable;
use indexmap::IndexSet;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// How many unresolved offsets to name in the summary warning
const MAX_REPORTED_UNRESOLVED: usize = 10;

/// Deduplicated section names in first-touch order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedSectionList {
    pub sections: Vec<String>,
}

impl OrderedSectionList {
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(String::as_str)
    }

    /// Orderfile text: one section per line
    pub fn to_orderfile_text(&self) -> String {
        let mut text = String::new();
        for section in &self.sections {
            text.push_str(section);
            text.push('\n');
        }
        text
    }
}

/// Counters collected while resolving one offset sequence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveStats {
    /// Offsets that matched a symbol start
    pub exact_matches: usize,

    /// Offsets that fell inside a symbol (prologue or padding)
    pub inexact_matches: usize,

    /// Offsets that matched nothing and were dropped
    pub unresolved: Vec<u64>,

    /// Emitted sections that back more than one symbol
    pub shared_sections: usize,
}

/// Resolves offsets against a shared, read-only symbol table
pub struct OffsetResolver<'a> {
    symbols: &'a SymbolTable,
    config: ResolverConfig,
}

impl<'a> OffsetResolver<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self::with_config(symbols, ResolverConfig::default())
    }

    pub fn with_config(symbols: &'a SymbolTable, config: ResolverConfig) -> Self {
        Self { symbols, config }
    }

    pub fn symbols(&self) -> &'a SymbolTable {
        self.symbols
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve offsets into an ordered section list
    ///
    /// **Public** - main entry point for orderfile generation
    pub fn resolve(&self, ordered_offsets: &[u64]) -> OrderedSectionList {
        self.resolve_with_stats(ordered_offsets).0
    }

    /// Resolve offsets and report how each one matched
    ///
    /// **Public** - same output as `resolve`, plus diagnostics
    ///
    /// # Algorithm
    /// 1. Find the symbols at each offset (exact, then inexact)
    /// 2. Expand each symbol to its sections, in sorted order
    /// 3. Append sections not seen before
    ///
    /// The output depends only on the table and the input order.
    pub fn resolve_with_stats(&self, ordered_offsets: &[u64]) -> (OrderedSectionList, ResolveStats) {
        let mut seen: IndexSet<&str> = IndexSet::new();
        let mut stats = ResolveStats::default();

        for &offset in ordered_offsets {
            let matched = symbols_at_offset(self.symbols, offset, &self.config);

            let Some(first) = matched.first() else {
                stats.unresolved.push(offset);
                continue;
            };
            if first.offset == offset {
                stats.exact_matches += 1;
            } else {
                stats.inexact_matches += 1;
            }

            for symbol in matched.iter().copied() {
                for section in &symbol.sections {
                    if seen.insert(section.as_str())
                        && self.symbols.section_symbol_count(section) > 1
                    {
                        stats.shared_sections += 1;
                    }
                }
            }
        }

        if !stats.unresolved.is_empty() {
            let shown: Vec<String> = stats
                .unresolved
                .iter()
                .take(MAX_REPORTED_UNRESOLVED)
                .map(|offset| format!("{:#x}", offset))
                .collect();
            warn!(
                "{} of {} offsets matched no symbol (stripped or mismatched binary?), dropped: {}",
                stats.unresolved.len(),
                ordered_offsets.len(),
                shown.join(", ")
            );
        }

        debug!(
            "Resolved {} offsets to {} sections ({} exact, {} inexact, {} shared)",
            ordered_offsets.len(),
            seen.len(),
            stats.exact_matches,
            stats.inexact_matches,
            stats.shared_sections
        );

        let sections = seen.into_iter().map(str::to_string).collect();
        (OrderedSectionList { sections }, stats)
    }
}
