//! # Resolve Command Implementation
//!
//! This module implements the `resolve` subcommand, which loads one
//! configuration file, resolves its `_include` and `_use` directives and
//! prints the result.
//!
//! Files passed with `--use` are resolved first and searched, in order, for
//! `_use` names the file does not define itself.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use recipe_config::loader::LoadOptions;

use super::{render, LoaderArgs, OutputFormat};

/// Resolve a configuration file and print the result
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Configuration file to resolve
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// File searched for `_use` names after FILE itself (repeatable)
    #[arg(long = "use", value_name = "FILE")]
    pub use_files: Vec<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Write the dependency ledger to this file
    #[arg(long, value_name = "FILE")]
    pub deps_out: Option<PathBuf>,

    /// Record each loaded file's absolute path under this top-level key
    #[arg(long, value_name = "NAME")]
    pub include_path_field: Option<String>,

    #[command(flatten)]
    pub loader: LoaderArgs,
}

/// Execute the `resolve` command.
pub fn execute(args: ResolveArgs) -> Result<()> {
    let loader = args.loader.loader();

    let mut sources = Vec::new();
    let mut source_deps = Vec::new();
    for file in &args.use_files {
        let (tree, deps) = loader
            .load(file, LoadOptions::new())
            .with_context(|| format!("Failed to load {}", file.display()))?;
        sources.push(tree);
        source_deps.push(deps);
    }

    let mut options = LoadOptions::new();
    if !args.use_files.is_empty() {
        options = options.use_sources(sources);
    }
    if let Some(field) = &args.include_path_field {
        options = options.include_path_field(field);
    }

    let (tree, mut deps) = loader
        .load(&args.file, options)
        .with_context(|| format!("Failed to resolve {}", args.file.display()))?;
    for extra in &source_deps {
        deps.update(extra);
    }

    print!("{}", render(&tree, args.format)?);

    if let Some(deps_out) = &args.deps_out {
        deps.save(deps_out)
            .with_context(|| format!("Failed to write {}", deps_out.display()))?;
    }

    Ok(())
}
