//! # Nested Command Implementation
//!
//! This module implements the `nested` subcommand, which loads a list of
//! files as named sections of one mapping. Inputs may be plain paths or glob
//! patterns; a single pattern is loaded with its matches accounted under the
//! pattern's base directory in the ledger.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use recipe_config::loader::{NestedOptions, SectionName};
use recipe_config::schema::Schema;

use super::{render, LoaderArgs, OutputFormat};

/// Load files as named sections and print the assembled mapping
#[derive(Args, Debug)]
pub struct NestedArgs {
    /// Files or glob patterns to load, in order
    #[arg(value_name = "FILE_OR_GLOB", required = true)]
    pub inputs: Vec<String>,

    /// Name each section by this field, falling back to the file name
    #[arg(long, value_name = "FIELD")]
    pub name_field: Option<String>,

    /// YAML file of defaults merged into every section
    #[arg(long, value_name = "FILE")]
    pub schema: Option<PathBuf>,

    /// Reject section fields the schema does not define
    #[arg(long, requires = "schema")]
    pub strict: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Write the dependency ledger to this file
    #[arg(long, value_name = "FILE")]
    pub deps_out: Option<PathBuf>,

    #[command(flatten)]
    pub loader: LoaderArgs,
}

fn is_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

/// Execute the `nested` command.
pub fn execute(args: NestedArgs) -> Result<()> {
    let loader = args.loader.loader();

    let mut options = NestedOptions::new();
    if let Some(field) = &args.name_field {
        options = options.name(SectionName::Field(field.clone()));
    }
    if let Some(schema_path) = &args.schema {
        let mut schema = Schema::from_file(schema_path)
            .with_context(|| format!("Failed to load schema {}", schema_path.display()))?;
        if args.strict {
            schema = schema.strict();
        }
        options = options.schema(schema);
    }

    let (tree, deps) = match args.inputs.as_slice() {
        [pattern] if is_pattern(pattern) => loader
            .load_nested_glob(pattern, options)
            .with_context(|| format!("Failed to load sections from {}", pattern))?,
        inputs => {
            let paths = expand(inputs)?;
            loader
                .load_nested(&paths, options)
                .context("Failed to load sections")?
        }
    };

    print!("{}", render(&tree, args.format)?);

    if let Some(deps_out) = &args.deps_out {
        deps.save(deps_out)
            .with_context(|| format!("Failed to write {}", deps_out.display()))?;
    }

    Ok(())
}

/// Expand glob inputs in place, keeping plain paths as given.
fn expand(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if !is_pattern(input) {
            paths.push(Path::new(input).to_path_buf());
            continue;
        }
        let mut matches: Vec<PathBuf> = glob::glob(input)
            .with_context(|| format!("Invalid pattern '{}'", input))?
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .collect();
        matches.sort();
        paths.extend(matches);
    }
    Ok(paths)
}
