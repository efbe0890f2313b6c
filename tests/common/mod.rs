//! Shared test utilities for integration and E2E tests.
//!
//! This module provides a fixture directory for configuration files, a
//! parser that counts how often documents are actually parsed (to observe
//! cache hits), and helpers for building loaders over the fixture.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = RecipeFixture::new().with_file("recipe.yml", "a: 1\n");
//!     let (tree, _) = fixture.loader().load(fixture.file("recipe.yml"), LoadOptions::new()).unwrap();
//! }
//! ```

use assert_fs::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use recipe_config::config::LoaderConfig;
use recipe_config::error::Result;
use recipe_config::loader::Loader;
use recipe_config::parser::{DocumentParser, YamlParser};
use recipe_config::tree::ConfigTree;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use recipe_config::loader::{LoadOptions, Loader, NestedOptions, SectionName};

    #[allow(unused_imports)]
    pub use super::{touch_forward, yaml, CountingParser, RecipeFixture};
}

/// Parse YAML text into a tree.
#[allow(dead_code)]
pub fn yaml(text: &str) -> ConfigTree {
    serde_yaml::from_str(text).expect("valid YAML in test")
}

/// Move a file's mtime `seconds` into the future.
#[allow(dead_code)]
pub fn touch_forward(path: &Path, seconds: u64) {
    File::options()
        .write(true)
        .open(path)
        .expect("Failed to open file")
        .set_modified(SystemTime::now() + Duration::from_secs(seconds))
        .expect("Failed to set mtime");
}

/// A YAML parser that counts its invocations.
#[derive(Clone, Default)]
pub struct CountingParser {
    count: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl CountingParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents parsed so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl DocumentParser for CountingParser {
    fn parse(&self, path: &Path) -> Result<ConfigTree> {
        self.count.fetch_add(1, Ordering::SeqCst);
        YamlParser.parse(path)
    }
}

/// A temporary directory of configuration files, with its own cache root.
pub struct RecipeFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl RecipeFixture {
    /// Create a new fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a file with the given relative path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.write(path, content);
        self
    }

    /// Write (or overwrite) a file and return its absolute path.
    pub fn write(&self, path: &str, content: &str) -> PathBuf {
        let child = self.temp_dir.child(path);
        child.write_str(content).expect("Failed to write file");
        child.path().to_path_buf()
    }

    /// Absolute path of a fixture file.
    pub fn file(&self, path: &str) -> PathBuf {
        self.temp_dir.path().join(path)
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Cache directory private to this fixture.
    pub fn cache_dir(&self) -> PathBuf {
        self.temp_dir.path().join(".cache")
    }

    /// Loader without a persistent cache.
    pub fn loader(&self) -> Loader {
        Loader::new(LoaderConfig::new())
    }

    /// Loader caching under [`cache_dir`](Self::cache_dir), parsing with
    /// `parser`.
    pub fn cached_loader(&self, parser: &CountingParser) -> Loader {
        Loader::new(LoaderConfig::new().with_cache_dir(self.cache_dir()))
            .with_parser(Box::new(parser.clone()))
    }

    /// A command for the `recipe-config` binary using this fixture's cache.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("recipe-config");
        cmd.current_dir(self.path())
            .env("RECIPE_CONFIG_CACHE", self.cache_dir())
            .env_remove("RECIPE_CONFIG_NO_CACHE")
            .env_remove("RECIPE_CONFIG_INCLUDE_PATH")
            .env_remove("RECIPE_CONFIG_PACKAGE_PATH");
        cmd
    }
}

impl Default for RecipeFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_writes_files() {
        let fixture = RecipeFixture::new().with_file("cabs/a.yml", "a: 1\n");
        assert!(fixture.file("cabs/a.yml").exists());
    }

    #[test]
    fn test_counting_parser_counts() {
        let fixture = RecipeFixture::new().with_file("a.yml", "a: 1\n");
        let parser = CountingParser::new();
        parser.parse(&fixture.file("a.yml")).unwrap();
        parser.parse(&fixture.file("a.yml")).unwrap();
        assert_eq!(parser.count(), 2);
    }
}
