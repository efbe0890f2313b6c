//! Package install-location lookup
//!
//! A package-qualified include such as `(cult_cargo)genesis/wsclean.yml`
//! resolves `genesis/wsclean.yml` against the install location of the
//! package `cult_cargo`. Locations come from explicit registrations first,
//! then from search roots: a package named `p` lives at `<root>/p` for the
//! first root where that directory exists.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Resolves package names to directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageRegistry {
    registered: BTreeMap<String, PathBuf>,
    search_roots: Vec<PathBuf>,
}

impl PackageRegistry {
    /// Create an empty registry that resolves nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an explicit install location for `name`.
    pub fn register(&mut self, name: impl Into<String>, dir: impl Into<PathBuf>) {
        self.registered.insert(name.into(), dir.into());
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_package(mut self, name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.register(name, dir);
        self
    }

    /// Add a directory whose subdirectories are packages.
    pub fn add_search_root(&mut self, root: impl Into<PathBuf>) {
        self.search_roots.push(root.into());
    }

    /// Install location of `name`, if the package can be found.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        if let Some(dir) = self.registered.get(name) {
            return dir.is_dir().then(|| dir.clone());
        }
        self.search_roots
            .iter()
            .map(|root| root.join(name))
            .find(|candidate| candidate.is_dir())
    }

    /// Resolve `relative` inside package `name`.
    ///
    /// Returns the joined path only when the package is found; the file
    /// itself may still be missing.
    pub fn resolve(&self, name: &str, relative: &Path) -> Option<PathBuf> {
        self.locate(name).map(|dir| dir.join(relative))
    }

    /// Explicitly registered packages, in name order.
    pub fn registered(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.registered
            .iter()
            .map(|(name, dir)| (name.as_str(), dir.as_path()))
    }

    /// Configured search roots.
    pub fn search_roots(&self) -> &[PathBuf] {
        &self.search_roots
    }
}
