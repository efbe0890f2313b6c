//! # Loader Configuration
//!
//! `LoaderConfig` holds the settings that used to be process-wide state in
//! tools of this kind: the include-search roots, the cache location and the
//! package registry. It is built once at the entry point and handed to the
//! [`Loader`](crate::loader::Loader), which passes it down to the resolver
//! and the cache store.
//!
//! [`LoaderConfig::from_env`] is the only function in the crate that reads
//! the process environment.

use std::env;
use std::path::PathBuf;

use crate::defaults;
use crate::packages::PackageRegistry;

/// Explicit configuration for a [`Loader`](crate::loader::Loader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Roots searched, in order, for bare relative include paths after the
    /// including file's own directory.
    pub include_paths: Vec<PathBuf>,
    /// Cache directory; `None` disables the persistent cache.
    pub cache_dir: Option<PathBuf>,
    /// Package-name lookup for package-qualified includes.
    pub packages: PackageRegistry,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            include_paths: defaults::default_include_paths(),
            cache_dir: None,
            packages: PackageRegistry::new(),
        }
    }
}

impl LoaderConfig {
    /// Configuration with default include roots and no cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the process-wide default configuration from the environment.
    ///
    /// - `RECIPE_CONFIG_CACHE` overrides the cache directory, otherwise the
    ///   user cache directory is used.
    /// - `RECIPE_CONFIG_NO_CACHE` disables caching.
    /// - `RECIPE_CONFIG_INCLUDE_PATH` appends include roots after `.`.
    /// - `RECIPE_CONFIG_PACKAGE_PATH` adds package search roots.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.cache_dir = if env::var_os(defaults::NO_CACHE_ENV).is_some() {
            None
        } else {
            Some(
                env::var_os(defaults::CACHE_ENV)
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from)
                    .unwrap_or_else(defaults::default_cache_root),
            )
        };

        if let Some(paths) = env::var_os(defaults::INCLUDE_PATH_ENV) {
            config
                .include_paths
                .extend(env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()));
        }

        if let Some(paths) = env::var_os(defaults::PACKAGE_PATH_ENV) {
            for root in env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()) {
                config.packages.add_search_root(root);
            }
        }

        config
    }

    /// Use `dir` as the cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Disable the persistent cache.
    pub fn without_cache(mut self) -> Self {
        self.cache_dir = None;
        self
    }

    /// Append an include-search root.
    pub fn with_include_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_paths.push(dir.into());
        self
    }

    /// Replace the package registry.
    pub fn with_packages(mut self, packages: PackageRegistry) -> Self {
        self.packages = packages;
        self
    }

    /// Include roots rendered as strings, for cache keys.
    pub(crate) fn include_path_keys(&self) -> Vec<String> {
        self.include_paths
            .iter()
            .map(|p| format!("include-root={}", p.display()))
            .collect()
    }
}
