//! Path utilities: dotted section names and filesystem paths.
//!
//! Dotted names like `cabs.wsclean.inputs` or `steps[0].params` are parsed
//! into a sequence of [`PathSegment`]s, which the tree functions use to walk
//! and rewrite configuration trees.

use std::path::{Component, Path, PathBuf};

use glob::Pattern;

use crate::error::{Error, Result};

/// A segment in a dotted section name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A named key for accessing map members
    Key(String),
    /// A numeric index for accessing sequence elements
    Index(usize),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(idx) => write!(f, "[{}]", idx),
        }
    }
}

/// Parse a dotted name into segments.
///
/// Supports:
/// - Dot notation: `foo.bar.baz`
/// - Bracket notation: `foo["bar"]` or `foo['bar']`
/// - Sequence indices: `foo[0]` or `items[1].name`
/// - Escaped characters: `foo\.bar` (literal dot)
///
/// # Examples
///
/// ```
/// use recipe_config::path::{parse_path, PathSegment};
///
/// let segments = parse_path("steps[0].cab");
/// assert_eq!(segments.len(), 3);
/// assert_eq!(segments[1], PathSegment::Index(0));
/// ```
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    if path.trim().is_empty() {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();
    let mut escaped = false;

    while let Some(ch) = chars.next() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }

        match ch {
            '\\' => {
                escaped = true;
            }
            '.' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }

                match chars.peek().copied() {
                    Some(quote) if quote == '"' || quote == '\'' => {
                        chars.next();
                        let mut key = String::new();
                        let mut bracket_escaped = false;

                        while let Some(ch) = chars.next() {
                            if bracket_escaped {
                                key.push(ch);
                                bracket_escaped = false;
                            } else if ch == '\\' {
                                bracket_escaped = true;
                            } else if ch == quote {
                                if chars.peek() == Some(&']') {
                                    chars.next();
                                    break;
                                }
                                key.push(ch);
                            } else {
                                key.push(ch);
                            }
                        }

                        segments.push(PathSegment::Key(key));
                    }
                    _ => {
                        let mut bracket_content = String::new();
                        for next_ch in chars.by_ref() {
                            if next_ch == ']' {
                                break;
                            }
                            bracket_content.push(next_ch);
                        }

                        let trimmed = bracket_content.trim();
                        if let Ok(idx) = trimmed.parse::<usize>() {
                            segments.push(PathSegment::Index(idx));
                        } else if !trimmed.is_empty() {
                            segments.push(PathSegment::Key(trimmed.to_string()));
                        }
                    }
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        segments.push(PathSegment::Key(current));
    }

    segments
}

/// Extend a dotted location label with a map key.
pub fn child_location(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Extend a dotted location label with a sequence index.
pub fn index_location(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// Match a path against a glob pattern
pub fn glob_match(pattern: &str, path: &Path) -> Result<bool> {
    let pattern = Pattern::new(pattern).map_err(Error::Glob)?;
    Ok(pattern.matches_path(path))
}

/// Make `path` absolute and lexically normalized.
///
/// `.` components are dropped and `..` pops the previous component. Symlinks
/// are left alone so the ledger records the path the user referred to.
pub fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// The longest leading part of a glob pattern that contains no wildcards.
///
/// Used to find the directory a wildcard expansion was rooted at.
pub fn glob_base_dir(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    for component in Path::new(pattern).components() {
        let text = component.as_os_str().to_string_lossy();
        if text.contains(['*', '?', '[']) {
            return base;
        }
        base.push(component.as_os_str());
    }
    base.parent().map(Path::to_path_buf).unwrap_or_default()
}
