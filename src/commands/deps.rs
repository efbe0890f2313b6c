//! # Deps Command Implementation
//!
//! This module implements the `deps` subcommand, which resolves a
//! configuration file and displays its dependency ledger as a tree.
//!
//! Files accounted under another entry (for example the matches of a
//! wildcard, collapsed under their directory) are shown beneath it. Optional
//! includes that could not be found are listed under a separate heading.
//!
//! This command is a safe, read-only operation apart from cache updates.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use ptree::{print_tree, TreeItem};

use recipe_config::deps::{Dependencies, DependencyRecord};
use recipe_config::loader::LoadOptions;

use super::LoaderArgs;

/// Display the dependency ledger of a configuration file
#[derive(Args, Debug)]
pub struct DepsArgs {
    /// Configuration file to resolve
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Maximum depth to display in the tree.
    ///
    /// If not specified, displays the full tree.
    #[arg(long, value_name = "NUM")]
    pub depth: Option<usize>,

    #[command(flatten)]
    pub loader: LoaderArgs,
}

/// Execute the `deps` command.
pub fn execute(args: DepsArgs) -> Result<()> {
    let (_, deps) = args
        .loader
        .loader()
        .load(&args.file, LoadOptions::new())
        .with_context(|| format!("Failed to resolve {}", args.file.display()))?;

    let tree = build_tree(&args.file, &deps, args.depth.unwrap_or(usize::MAX));
    print_tree(&tree).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
    Ok(())
}

/// Build the display tree for a ledger.
fn build_tree(file: &Path, deps: &Dependencies, max_depth: usize) -> TreeNode {
    let mut children: Vec<TreeNode> = deps
        .iter()
        .filter(|(_, record)| record.origin.is_none())
        .map(|(path, record)| build_node(deps, path, record, max_depth, 1))
        .collect();

    let failures: Vec<TreeNode> = deps
        .failures()
        .map(|failure| {
            let mut label = format!(
                "{} (from {})",
                failure.path.display(),
                failure.origin.display()
            );
            if let Some(package) = &failure.package {
                label.push_str(&format!(" [package {}]", package));
            }
            TreeNode::leaf(label)
        })
        .collect();
    if !failures.is_empty() {
        children.push(TreeNode {
            label: "missing optional includes".to_string(),
            children: if max_depth >= 1 { failures } else { vec![] },
        });
    }

    TreeNode {
        label: file.display().to_string(),
        children,
    }
}

fn build_node(
    deps: &Dependencies,
    path: &Path,
    record: &DependencyRecord,
    max_depth: usize,
    current_depth: usize,
) -> TreeNode {
    let children = if current_depth >= max_depth {
        vec![]
    } else {
        deps.iter()
            .filter(|(child, child_record)| {
                *child != path && child_record.origin.as_deref() == Some(path)
            })
            .map(|(child, child_record)| {
                build_node(deps, child, child_record, max_depth, current_depth + 1)
            })
            .collect()
    };

    TreeNode {
        label: describe(path, record),
        children,
    }
}

fn describe(path: &Path, record: &DependencyRecord) -> String {
    if record.missing {
        return format!("{} (missing)", path.display());
    }
    let mut details = Vec::new();
    if let Some(mtime) = &record.mtime_str {
        details.push(mtime.clone());
    }
    if let Some(git) = &record.git {
        details.push(format!("{} {}", git.branch, git.describe).trim().to_string());
    }
    if let Some(engine) = record.attrs.get("engine") {
        details.push(engine.clone());
    }
    if details.is_empty() {
        path.display().to_string()
    } else {
        format!("{} ({})", path.display(), details.join(", "))
    }
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(label: String) -> Self {
        Self {
            label,
            children: vec![],
        }
    }
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}
