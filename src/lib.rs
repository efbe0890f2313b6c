//! # Recipe Configuration Library
//!
//! This library assembles hierarchical pipeline configuration from YAML
//! documents. Documents compose through two directives, resolved recursively:
//!
//! - `_include` pulls in other files (optionally flagged `[optional]` or
//!   `[warn]`, optionally qualified by a package as `(pkg)path.yml`)
//! - `_use` reuses named sections of the document itself or of caller-supplied
//!   source trees
//!
//! Every load also produces a dependency ledger recording each file consulted.
//! The ledger drives an on-disk cache, so loading unchanged configuration a
//! second time skips parsing and resolution entirely.
//!
//! ## Quick Example
//!
//! ```
//! use recipe_config::config::LoaderConfig;
//! use recipe_config::loader::{LoadOptions, Loader};
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::write(dir.path().join("base.yml"), "threads: 4\nimage: wsclean\n").unwrap();
//! std::fs::write(
//!     dir.path().join("recipe.yml"),
//!     "_include: base.yml\nthreads: 8\n",
//! )
//! .unwrap();
//!
//! let loader = Loader::new(LoaderConfig::new());
//! let (tree, deps) = loader
//!     .load(dir.path().join("recipe.yml"), LoadOptions::new())
//!     .unwrap();
//!
//! assert_eq!(tree["threads"].as_u64(), Some(8));
//! assert_eq!(tree["image"].as_str(), Some("wsclean"));
//! assert_eq!(deps.len(), 2);
//! ```
//!
//! ## Core Concepts
//!
//! - **Tree (`tree`)**: the configuration model (`serde_yaml::Value`) and the
//!   merge, flatten and path-lookup operations resolution is built from.
//! - **Resolver (`resolver`)**: removes `_include`, `_use`, `_flatten` and
//!   `_flatten_sep` from a tree. A node's own keys always win over included
//!   and reused content.
//! - **Ledger (`deps`)**: every file consulted, with mtime, content hash and
//!   git metadata, plus every optional include that could not be found.
//! - **Cache (`cache`)**: resolved trees keyed by their input paths, checked
//!   for staleness against the ledger.
//! - **Loader (`loader`)**: `load` for one file, `load_nested` for a list of
//!   files assembled into named sections, optionally checked against a
//!   `schema`.
//!
//! Settings that would otherwise be process-wide (include-search roots, cache
//! location, package locations) live in [`config::LoaderConfig`] and are
//! passed to the loader explicitly.

pub mod cache;
pub mod config;
pub mod defaults;
pub mod deps;
pub mod directive;
pub mod error;
pub mod git;
pub mod loader;
pub mod packages;
pub mod parser;
pub mod path;
mod resolver;
pub mod schema;
pub mod tree;

#[cfg(test)]
mod tree_proptest;
