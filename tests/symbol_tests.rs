use cygprofile_orderfile::symbols::{
    is_likely_same_ctor_dtor, load_symbol_listing, parse_symbol_listing, RawSymbolEntry,
    SymbolTable,
};
use cygprofile_orderfile::utils::error::SymbolError;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

fn sections(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Ctor/dtor alias merging
// ============================================================================

#[test]
fn test_ctor_variants_share_sections() {
    let table = SymbolTable::build(vec![
        RawSymbolEntry::new("_ZN3FooC1Ev", ".text._ZN3FooC1Ev", 0x100, 0x20),
        RawSymbolEntry::new("_ZN3FooC2Ev", ".text._ZN3FooC2Ev", 0x140, 0x20),
        RawSymbolEntry::new("_ZN3BarC2Ev", ".text._ZN3BarC2Ev", 0x180, 0x20),
    ])
    .unwrap();

    let expected = sections(&[".text._ZN3FooC1Ev", ".text._ZN3FooC2Ev"]);
    assert_eq!(table.sections_for("_ZN3FooC1Ev"), Some(&expected));
    assert_eq!(table.sections_for("_ZN3FooC2Ev"), Some(&expected));

    // Unrelated constructor is left alone
    assert_eq!(
        table.sections_for("_ZN3BarC2Ev"),
        Some(&sections(&[".text._ZN3BarC2Ev"]))
    );
}

#[test]
fn test_alias_members_keep_their_offsets() {
    let table = SymbolTable::build(vec![
        RawSymbolEntry::new("_ZN3FooD1Ev", ".text._ZN3FooD1Ev", 0x200, 0x10),
        RawSymbolEntry::new("_ZN3FooD2Ev", ".text._ZN3FooD2Ev", 0x240, 0x18),
    ])
    .unwrap();

    assert_eq!(table.lookup("_ZN3FooD1Ev").unwrap().offset, 0x200);
    assert_eq!(table.lookup("_ZN3FooD2Ev").unwrap().offset, 0x240);

    let group: Vec<&str> = table
        .alias_group("_ZN3FooD2Ev")
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(group, vec!["_ZN3FooD1Ev", "_ZN3FooD2Ev"]);
}

#[test]
fn test_alias_predicate() {
    assert!(is_likely_same_ctor_dtor("_ZN3FooC1Ev", "_ZN3FooC2Ev"));
    assert!(is_likely_same_ctor_dtor("_ZN3FooD2Ev", "_ZN3FooD1Ev"));
    assert!(!is_likely_same_ctor_dtor("_ZN3FooC1Ev", "_ZN3FooD1Ev"));
    assert!(!is_likely_same_ctor_dtor("_ZN3FooC1Ev", "_ZN3BarC1Ev"));
    assert!(!is_likely_same_ctor_dtor("main", "main"));
}

// ============================================================================
// Lookups
// ============================================================================

#[test]
fn test_lookup_unknown_symbol() {
    let table =
        SymbolTable::build(vec![RawSymbolEntry::new("main", ".text.main", 0x10, 0x8)]).unwrap();

    assert!(table.lookup("missing").is_none());
    assert!(table.sections_for("missing").is_none());
    assert!(table.alias_group("missing").is_empty());
}

#[test]
fn test_shared_section_reverse_map() {
    let table = SymbolTable::build(vec![
        RawSymbolEntry::new("a", ".text.hot", 0x10, 0x8),
        RawSymbolEntry::new("b", ".text.hot", 0x20, 0x8),
        RawSymbolEntry::new("c", ".text.c", 0x30, 0x8),
    ])
    .unwrap();

    assert_eq!(table.symbols_in_section(".text.hot").len(), 2);
    assert_eq!(table.symbols_in_section(".text.c").len(), 1);
    assert!(table.symbols_in_section(".text.none").is_empty());
}

#[test]
fn test_offset_index_is_sorted() {
    let table = SymbolTable::build(vec![
        RawSymbolEntry::new("late", ".text.late", 0x300, 0x8),
        RawSymbolEntry::new("early", ".text.early", 0x100, 0x8),
    ])
    .unwrap();

    assert_eq!(table.nearest_start_at_or_before(0x0ff), None);
    assert_eq!(table.nearest_start_at_or_before(0x200), Some(0x100));
    assert_eq!(table.nearest_start_at_or_before(0x300), Some(0x300));
}

// ============================================================================
// Listing files
// ============================================================================

#[test]
fn test_listing_to_table() {
    let listing = "\
# offset size section name
0x100 0x20 .text._ZN3FooC1Ev _ZN3FooC1Ev
0x140 0x20 .text._ZN3FooC2Ev _ZN3FooC2Ev

180 10 - memcpy_neon
";
    let entries = parse_symbol_listing(listing).unwrap();
    assert_eq!(entries.len(), 3);

    let table = SymbolTable::build(entries).unwrap();
    assert_eq!(table.sections_for("memcpy_neon"), Some(&sections(&[".text"])));
    assert_eq!(table.lookup("memcpy_neon").unwrap().offset, 0x180);
}

#[test]
fn test_malformed_listing_names_line() {
    let result = parse_symbol_listing("0x100 0x20 .text.a a\nnot-a-number 0x20 .text.b b\n");

    match result {
        Err(SymbolError::MalformedEntry { line, .. }) => assert_eq!(line, 2),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_missing_listing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_symbol_listing(dir.path().join("libmissing.so.symbols"));
    assert!(matches!(result, Err(SymbolError::ReadFailed { .. })));
}
