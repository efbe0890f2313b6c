//! Document parsing
//!
//! Turning structured text into a [`ConfigTree`] is a collaborator of the
//! loader rather than part of it. [`DocumentParser`] is the seam; the
//! default [`YamlParser`] reads YAML with `serde_yaml`. Tests substitute
//! their own parsers to observe how often the loader actually parses.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::tree::{empty_map, ConfigTree};

/// Reads one document into a configuration tree.
pub trait DocumentParser {
    /// Parse the document at `path`.
    fn parse(&self, path: &Path) -> Result<ConfigTree>;
}

/// The default parser: YAML via `serde_yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

impl YamlParser {
    /// Parse YAML text. `origin` names the document in errors.
    pub fn parse_str(text: &str, origin: &str) -> Result<ConfigTree> {
        let blank = text.lines().all(|line| {
            let line = line.trim();
            line.is_empty() || line.starts_with('#') || line == "---"
        });
        if blank {
            return Ok(empty_map());
        }

        let tree: ConfigTree = serde_yaml::from_str(text).map_err(|e| Error::Parse {
            file: origin.to_string(),
            message: e.to_string(),
        })?;
        // An empty document is an empty section, not a null.
        Ok(if tree.is_null() { empty_map() } else { tree })
    }
}

impl DocumentParser for YamlParser {
    fn parse(&self, path: &Path) -> Result<ConfigTree> {
        let text = fs::read_to_string(path).map_err(|e| Error::Parse {
            file: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse_str(&text, &path.display().to_string())
    }
}
