//! Error types for patch parsing and matching.

use thiserror::Error;

/// Failure to locate an operation's search block in the working buffer.
///
/// Match failures are ordinary values, never panics. The applier collects
/// them per operation and renders them into `ApplyResult::errors`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("no match found for search block: \"{preview}\"")]
    NoMatch { preview: String },

    #[error("{candidates} fuzzy match candidates for search block: \"{preview}\"")]
    AmbiguousMatch { candidates: usize, preview: String },

    #[error("search block contains no matchable characters")]
    EmptySearchBlock,
}

/// Failure to parse a structured edit script.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("expected a yaml sequence of patch items, got {found}")]
    UnexpectedShape { found: &'static str },
}

pub type Result<T> = std::result::Result<T, ParseError>;
