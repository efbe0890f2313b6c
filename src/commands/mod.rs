//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `recipe-config` command-line tool. Each subcommand is defined in its own
//! file with an `Args` struct derived using `clap` and an `execute` function
//! that calls into the `recipe_config` library.
//!
//! Options shared by every command that loads configuration live here in
//! [`LoaderArgs`], together with the output rendering they share.

pub mod cache;
pub mod completions;
pub mod deps;
pub mod nested;
pub mod resolve;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use recipe_config::config::LoaderConfig;
use recipe_config::defaults::CACHE_ENV;
use recipe_config::loader::Loader;
use recipe_config::tree::ConfigTree;

/// Loader settings accepted by every command that resolves configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct LoaderArgs {
    /// The root directory for the configuration cache.
    ///
    /// If not provided, it defaults to the system's cache directory
    /// (e.g., `~/.cache/recipe-config` on Linux).
    #[arg(long, value_name = "DIR", env = CACHE_ENV)]
    pub cache_root: Option<PathBuf>,

    /// Neither read nor write the cache
    #[arg(long)]
    pub no_cache: bool,

    /// Extra directory searched for relative includes (repeatable)
    #[arg(short = 'I', long = "include-dir", value_name = "DIR")]
    pub include_dirs: Vec<PathBuf>,

    /// Install location of a package, as NAME=DIR (repeatable)
    #[arg(long = "package", value_name = "NAME=DIR", value_parser = parse_package)]
    pub packages: Vec<(String, PathBuf)>,
}

impl LoaderArgs {
    /// Environment defaults with the command-line flags applied on top.
    pub fn loader_config(&self) -> LoaderConfig {
        let mut config = LoaderConfig::from_env();
        if let Some(root) = &self.cache_root {
            config = config.with_cache_dir(root);
        }
        if self.no_cache {
            config = config.without_cache();
        }
        for dir in &self.include_dirs {
            config = config.with_include_path(dir);
        }
        for (name, dir) in &self.packages {
            config.packages.register(name, dir);
        }
        config
    }

    pub fn loader(&self) -> Loader {
        Loader::new(self.loader_config())
    }
}

fn parse_package(value: &str) -> std::result::Result<(String, PathBuf), String> {
    match value.split_once('=') {
        Some((name, dir)) if !name.trim().is_empty() && !dir.trim().is_empty() => {
            Ok((name.trim().to_string(), PathBuf::from(dir.trim())))
        }
        _ => Err(format!("expected NAME=DIR, got '{}'", value)),
    }
}

/// Output format for resolved trees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// Render a resolved tree for printing.
pub fn render(tree: &ConfigTree, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => serde_yaml::to_string(tree).context("Failed to render YAML"),
        OutputFormat::Json => serde_json::to_string_pretty(tree)
            .map(|mut json| {
                json.push('\n');
                json
            })
            .context("Failed to render JSON (mapping keys must be strings)"),
    }
}
