//! Identifier rules for module and function names.
//!
//! Names are Unicode identifiers (UAX#31). Module names may be dotted
//! (`stats.linalg`); each segment is an identifier, so a module name can
//! never smuggle a path separator or `..` into the loader.

use std::path::PathBuf;

/// Check that `s` is a single identifier.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };

    // First char: XID_Start or underscore
    if !(unicode_ident::is_xid_start(first) || first == '_') {
        return false;
    }

    chars.all(unicode_ident::is_xid_continue)
}

/// Check that `s` is a dotted sequence of identifiers.
pub fn is_module_name(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(is_identifier)
}

/// Relative file path for a module name, without extension: `a.b` -> `a/b`.
pub fn module_relative_path(name: &str) -> PathBuf {
    name.split('.').collect()
}
