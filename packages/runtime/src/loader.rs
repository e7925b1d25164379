//! Locating WASM modules on the search path.

use std::path::{Path, PathBuf};

use crate::ident;

/// File extensions tried for each module, in order.
pub const MODULE_EXTENSIONS: [&str; 2] = ["wasm", "wat"];

/// Finds module files under a list of directories.
///
/// The first directory containing a match wins; within a directory, a
/// `.wasm` binary is preferred over `.wat` text.
#[derive(Debug, Clone, Default)]
pub struct ModuleLoader {
    search_paths: Vec<PathBuf>,
}

impl ModuleLoader {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Find the file backing module `name`, if any.
    ///
    /// Invalid module names never match anything.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        if !ident::is_module_name(name) {
            return None;
        }

        let relative = ident::module_relative_path(name);
        self.search_paths
            .iter()
            .find_map(|dir| Self::locate_in(dir, &relative))
    }

    fn locate_in(dir: &Path, relative: &Path) -> Option<PathBuf> {
        MODULE_EXTENSIONS
            .iter()
            .map(|ext| dir.join(relative).with_extension(ext))
            .find(|candidate| candidate.is_file())
    }
}
