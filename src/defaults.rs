//! Default values for recipe-config.
//!
//! This module provides centralized default values and environment variable
//! names, ensuring the library and the CLI agree on them.

use std::path::PathBuf;

/// Overrides the cache directory.
pub const CACHE_ENV: &str = "RECIPE_CONFIG_CACHE";

/// Disables the persistent cache when set to any value.
pub const NO_CACHE_ENV: &str = "RECIPE_CONFIG_NO_CACHE";

/// OS path-list of extra include-search roots.
pub const INCLUDE_PATH_ENV: &str = "RECIPE_CONFIG_INCLUDE_PATH";

/// OS path-list of directories whose subdirectories are packages.
pub const PACKAGE_PATH_ENV: &str = "RECIPE_CONFIG_PACKAGE_PATH";

/// Upper bound on substitution passes per node, and on nested `_use` bases.
pub const MAX_SUBSTITUTIONS: usize = 20;

/// Identity of this engine; cache entries written by any other identity are
/// discarded.
pub const ENGINE_VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

/// Returns the default cache root directory.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/recipe-config` (XDG Base Directory)
/// - macOS: `~/Library/Caches/recipe-config`
/// - Windows: `{FOLDERID_LocalAppData}\recipe-config`
///
/// Falls back to `.recipe-config-cache` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `--cache-root` CLI flag or the
/// `RECIPE_CONFIG_CACHE` environment variable.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".recipe-config-cache"))
        .join("recipe-config")
}

/// Default include-search roots.
pub fn default_include_paths() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cache_root_returns_path() {
        let cache_root = default_cache_root();
        assert!(cache_root.ends_with("recipe-config"));
    }

    #[test]
    fn test_default_cache_root_is_absolute_or_fallback() {
        let cache_root = default_cache_root();
        assert!(
            cache_root.is_absolute() || cache_root.starts_with(".recipe-config-cache"),
            "Expected absolute path or fallback, got: {:?}",
            cache_root
        );
    }

    #[test]
    fn test_engine_version_names_crate() {
        assert!(ENGINE_VERSION.starts_with("recipe-config "));
    }
}
