//! Error types for the brain.
//!
//! Only [`BrainError`] ever reaches the caller of
//! [`Brain::process`](crate::brain::Brain::process). Tag-level failures are
//! [`TagError`]s: they are logged and replaced by empty text so one bad tag
//! never costs the whole response.

use thiserror::Error;

/// Errors that abort the current turn.
///
/// Both variants come from the two termination guards; everything else the
/// evaluator runs into is absorbed locally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrainError {
    /// `srai` / `sr` redirected deeper than `max_srai_depth`.
    #[error("srai recursion limit of {limit} exceeded")]
    RecursionLimitExceeded { limit: usize },

    /// A `condition` looped more than `max_loop_iterations` times in one turn.
    #[error("condition loop limit of {limit} exceeded")]
    LoopLimitExceeded { limit: usize },
}

/// Errors raised by a single template tag and absorbed by the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    /// `map` named a function that is not registered.
    #[error("unknown map function: {0}")]
    UnknownFunction(String),

    /// A category pattern normalized to nothing.
    #[error("empty pattern {pattern:?}")]
    EmptyPattern { pattern: String },

    /// A `learn` block did not produce a usable category.
    #[error("malformed learn category: {0}")]
    MalformedLearnCategory(String),
}

/// Errors from loading configuration and resource files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A resource file was readable but unusable.
    #[error("Resource error in {path}: {message}")]
    Resource { path: String, message: String },
}
