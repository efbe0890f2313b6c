//! # Error Handling
//!
//! This module defines the centralized error type for `recipe-config`. It uses
//! the `thiserror` library to build a single `Error` enum covering every
//! failure the loader can report to its caller.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Each variant carries enough context (dotted
//!   location, owning file, offending file) to point a user at the problem.
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! The variants fall into a few families:
//!
//! - Resolution errors: malformed directives, unresolved `_use` names,
//!   missing non-optional includes, runaway substitution and include cycles.
//!   These all share the `Resolution` variant so callers can branch on a
//!   single kind.
//! - Schema errors raised while assembling nested sections.
//! - Parse errors from the document parser.
//! - Wrapped I/O, YAML, JSON and glob errors.
//!
//! Optional-include failures are not errors: they are recorded in the
//! dependency ledger. Cache faults are never raised from `load`; the loader
//! degrades to recomputing from source.

use thiserror::Error;

/// Main error type for recipe-config operations
#[derive(Error, Debug)]
pub enum Error {
    /// A directive could not be resolved.
    ///
    /// `location` is the dotted path of the node being resolved and `file`
    /// is the document that owns it.
    #[error("{file}: error resolving '{}': {message}", if location.is_empty() { "<root>" } else { location.as_str() })]
    Resolution {
        location: String,
        file: String,
        message: String,
    },

    /// A loaded section does not satisfy the schema it was merged into.
    #[error("Schema error in {file}: {message}")]
    Schema { file: String, message: String },

    /// A document could not be parsed into a configuration tree.
    #[error("Failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    /// An explicit cache management operation failed.
    #[error("Cache operation error: {message}")]
    Cache { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

impl Error {
    /// Build a resolution error for `location` inside `file`.
    pub fn resolution(
        location: impl Into<String>,
        file: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Resolution {
            location: location.into(),
            file: file.into(),
            message: message.into(),
        }
    }

    /// Build a schema error naming the offending file.
    pub fn schema(file: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Schema {
            file: file.into(),
            message: message.into(),
        }
    }

    /// True for the resolution error kind.
    pub fn is_resolution(&self) -> bool {
        matches!(self, Error::Resolution { .. })
    }

    /// True for the schema error kind.
    pub fn is_schema(&self) -> bool {
        matches!(self, Error::Schema { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
