//! Error types for nbcontent.
//!
//! Library crates use [`NbContentError`] and [`CompileError`] via `thiserror`.
//! The CLI wraps these with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for configuration and I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum NbContentError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (invalid option value, unsupported format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Failure of one sub-pipeline invocation (a single cell or output).
///
/// The walker never propagates these: an `Err` degrades the affected cell or
/// output to an empty subtree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// The markdown event stream could not be lowered.
    #[error("markdown error: {0}")]
    Markdown(String),

    /// The leading YAML block is not valid YAML or not representable as JSON.
    #[error("frontmatter error: {0}")]
    Frontmatter(String),

    /// Raw HTML in a markdown cell swallowed part of the markdown around it.
    #[error("html error: {0}")]
    Html(String),

    /// The document nests deeper than the configured limit.
    #[error("nesting depth exceeds limit of {limit}")]
    TooDeep { limit: usize },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NbContentError>;

/// Result of a single sub-pipeline invocation.
pub type CompileResult<T> = std::result::Result<T, CompileError>;

impl NbContentError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
