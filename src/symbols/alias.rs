//! Constructor/destructor alias detection over mangled names.
//!
//! Under the Itanium C++ ABI a class may get both a complete-object
//! (`C1`/`D1`) and a base-object (`C2`/`D2`) variant of the same
//! constructor or destructor. Both variants come from the same source
//! function, so they are grouped and share sections.
//!
//! This is a text heuristic. Two unrelated names can match the pattern, so
//! every merge is logged by the caller.

use regex::Regex;
use std::sync::OnceLock;

/// Matches the last `C1E`/`C2E`/`D1E`/`D2E` marker in a mangled name
fn ctor_dtor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*[CD])[12](E.*)$").expect("ctor/dtor pattern is valid"))
}

/// Name with the ctor/dtor variant digit blanked out
///
/// **Public** - used by the symbol table to group aliases
///
/// # Returns
/// `None` when the name carries no ctor/dtor variant marker
pub fn canonical_ctor_dtor_key(name: &str) -> Option<String> {
    let caps = ctor_dtor_re().captures(name)?;
    Some(format!("{}*{}", &caps[1], &caps[2]))
}

/// Check whether two mangled names are likely the same ctor/dtor
///
/// **Public** - isolated predicate so it can be swapped for an ABI-aware check
///
/// True when the names differ only in the variant digit of a
/// `C1`/`C2` or `D1`/`D2` marker. Identical names are not aliases.
pub fn is_likely_same_ctor_dtor(name_a: &str, name_b: &str) -> bool {
    if name_a == name_b {
        return false;
    }

    match (canonical_ctor_dtor_key(name_a), canonical_ctor_dtor_key(name_b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
