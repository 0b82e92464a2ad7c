//! Symbol table with alias-merged sections and an offset index.
//!
//! Built once per binary and read-only afterwards. The resolver and the
//! phased analyzer share it by reference across worker threads.

use super::alias::{canonical_ctor_dtor_key, is_likely_same_ctor_dtor};
use crate::utils::config::{SHARED_TEXT_SECTION, UNKNOWN_SECTION_MARKER};
use crate::utils::error::SymbolError;
use indexmap::IndexMap;
use log::{debug, warn};
use std::collections::{BTreeSet, HashMap};

/// One entry of the toolchain symbol listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSymbolEntry {
    pub name: String,
    pub section: String,
    pub offset: u64,
    pub size: u64,
}

impl RawSymbolEntry {
    pub fn new(name: &str, section: &str, offset: u64, size: u64) -> Self {
        Self {
            name: name.to_string(),
            section: section.to_string(),
            offset,
            size,
        }
    }
}

/// A resolved symbol
///
/// `sections` is never empty. Symbols in an alias group keep their own
/// offset and size, but all carry the group's union of sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Mangled name
    pub name: String,

    /// Start offset relative to the load base
    pub offset: u64,

    /// Size in bytes
    pub size: u64,

    /// Object-file sections backing this symbol
    pub sections: BTreeSet<String>,
}

/// Symbols of one binary, indexed by name, offset and section
#[derive(Debug, Clone)]
pub struct SymbolTable {
    /// Symbols in first-appearance order of the listing
    symbols: Vec<Symbol>,

    by_name: HashMap<String, usize>,

    /// Indices into `symbols`, sorted by (offset, name)
    by_offset: Vec<usize>,

    by_section: HashMap<String, Vec<usize>>,

    /// Symbol index -> index into `alias_groups`
    alias_of: HashMap<usize, usize>,

    alias_groups: Vec<Vec<usize>>,

    /// Largest symbol size, bounds how far back a containing symbol can start
    max_size: u64,
}

impl SymbolTable {
    /// Build a symbol table from raw listing entries
    ///
    /// **Public** - main constructor
    ///
    /// Entries sharing a name are merged into one symbol with the union
    /// of their sections. Ctor/dtor variants are then grouped and every
    /// member of a group gets the group's union of sections.
    ///
    /// # Errors
    /// * `SymbolError::EmptyTable` - No entries were supplied
    pub fn build(
        raw_entries: impl IntoIterator<Item = RawSymbolEntry>,
    ) -> Result<Self, SymbolError> {
        // Step 1: Merge entries by name
        let mut symbols: Vec<Symbol> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();

        for entry in raw_entries {
            let section = normalize_section(&entry.section);

            if let Some(&index) = by_name.get(&entry.name) {
                let existing = &mut symbols[index];
                if existing.offset != entry.offset {
                    warn!(
                        "Symbol {} listed at offsets {:#x} and {:#x}, keeping {:#x}",
                        entry.name, existing.offset, entry.offset, existing.offset
                    );
                }
                existing.size = existing.size.max(entry.size);
                existing.sections.insert(section);
                continue;
            }

            by_name.insert(entry.name.clone(), symbols.len());
            symbols.push(Symbol {
                name: entry.name,
                offset: entry.offset,
                size: entry.size,
                sections: BTreeSet::from([section]),
            });
        }

        if symbols.is_empty() {
            return Err(SymbolError::EmptyTable);
        }

        // Step 2: Merge ctor/dtor alias sections
        let (alias_groups, alias_of) = merge_ctor_dtor_aliases(&mut symbols);

        // Step 3: Build offset and section indexes
        let mut by_offset: Vec<usize> = (0..symbols.len()).collect();
        by_offset.sort_by(|&a, &b| {
            (symbols[a].offset, &symbols[a].name).cmp(&(symbols[b].offset, &symbols[b].name))
        });

        let mut by_section: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, symbol) in symbols.iter().enumerate() {
            for section in &symbol.sections {
                by_section.entry(section.clone()).or_default().push(index);
            }
        }

        let max_size = symbols.iter().map(|s| s.size).max().unwrap_or(0);

        debug!(
            "Built symbol table: {} symbols, {} sections, {} alias groups",
            symbols.len(),
            by_section.len(),
            alias_groups.len()
        );

        Ok(Self {
            symbols,
            by_name,
            by_offset,
            by_section,
            alias_of,
            alias_groups,
            max_size,
        })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// All symbols, in listing order
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Look up a symbol by mangled name
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.by_name.get(name).map(|&index| &self.symbols[index])
    }

    /// Sections backing a symbol, including those of its ctor/dtor aliases
    pub fn sections_for(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.lookup(name).map(|symbol| &symbol.sections)
    }

    /// Members of the alias group containing `name`, or just the symbol itself
    pub fn alias_group(&self, name: &str) -> Vec<&Symbol> {
        let Some(&index) = self.by_name.get(name) else {
            return Vec::new();
        };

        match self.alias_of.get(&index) {
            Some(&group) => self.alias_groups[group]
                .iter()
                .map(|&member| &self.symbols[member])
                .collect(),
            None => vec![&self.symbols[index]],
        }
    }

    /// Symbols backed by a section. Shared sections map to several symbols.
    pub fn symbols_in_section(&self, section: &str) -> Vec<&Symbol> {
        self.by_section
            .get(section)
            .map(|indices| indices.iter().map(|&i| &self.symbols[i]).collect())
            .unwrap_or_default()
    }

    /// Number of symbols backed by a section
    pub fn section_symbol_count(&self, section: &str) -> usize {
        self.by_section.get(section).map_or(0, Vec::len)
    }

    /// Size of the largest symbol in the table
    pub fn max_symbol_size(&self) -> u64 {
        self.max_size
    }

    /// Symbols starting exactly at `offset`, ordered by name
    pub fn symbols_starting_at(&self, offset: u64) -> Vec<&Symbol> {
        let first = self
            .by_offset
            .partition_point(|&i| self.symbols[i].offset < offset);

        self.by_offset[first..]
            .iter()
            .map(|&i| &self.symbols[i])
            .take_while(|symbol| symbol.offset == offset)
            .collect()
    }

    /// Start offset of the nearest symbol at or before `offset`
    pub fn nearest_start_at_or_before(&self, offset: u64) -> Option<u64> {
        let end = self
            .by_offset
            .partition_point(|&i| self.symbols[i].offset <= offset);

        end.checked_sub(1)
            .map(|last| self.symbols[self.by_offset[last]].offset)
    }

    /// Distinct symbol start offsets at or before `offset`, nearest first
    pub fn starts_at_or_before(&self, offset: u64) -> impl Iterator<Item = u64> + '_ {
        let end = self
            .by_offset
            .partition_point(|&i| self.symbols[i].offset <= offset);

        let mut previous = None;
        self.by_offset[..end]
            .iter()
            .rev()
            .map(|&i| self.symbols[i].offset)
            .filter(move |&start| previous.replace(start) != Some(start))
    }
}

/// Map an empty or unknown section to the shared text section
fn normalize_section(section: &str) -> String {
    if section.is_empty() || section == UNKNOWN_SECTION_MARKER {
        SHARED_TEXT_SECTION.to_string()
    } else {
        section.to_string()
    }
}

/// Group ctor/dtor variants and give each member the group's sections
///
/// **Private** - internal helper for SymbolTable::build
fn merge_ctor_dtor_aliases(symbols: &mut [Symbol]) -> (Vec<Vec<usize>>, HashMap<usize, usize>) {
    let mut candidates: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (index, symbol) in symbols.iter().enumerate() {
        if let Some(key) = canonical_ctor_dtor_key(&symbol.name) {
            candidates.entry(key).or_default().push(index);
        }
    }

    let mut groups = Vec::new();
    let mut alias_of = HashMap::new();

    for members in candidates.into_values().filter(|m| m.len() > 1) {
        let canonical = members[0];
        for &other in &members[1..] {
            debug_assert!(is_likely_same_ctor_dtor(
                &symbols[canonical].name,
                &symbols[other].name
            ));
            warn!(
                "Merging sections of likely ctor/dtor aliases {} and {}",
                symbols[canonical].name, symbols[other].name
            );
        }

        let union: BTreeSet<String> = members
            .iter()
            .flat_map(|&i| symbols[i].sections.iter().cloned())
            .collect();
        for &member in &members {
            symbols[member].sections = union.clone();
            alias_of.insert(member, groups.len());
        }
        groups.push(members);
    }

    (groups, alias_of)
}
