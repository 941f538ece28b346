//! Shared types, error model, and configuration for nbcontent.
//!
//! This crate is the foundation depended on by all other nbcontent crates.
//! It provides:
//! - [`NbContentError`] and [`CompileError`]: the error model
//! - The notebook input model ([`Notebook`], [`Cell`], [`Output`])
//! - The output model ([`Node`], [`Frontmatter`], [`ParsedContent`])
//! - Configuration ([`AppConfig`], [`CompileOptions`], config loading)

pub mod config;
pub mod error;
pub mod notebook;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CompileOptions, DEFAULT_MAX_NESTING_DEPTH, DefaultsConfig, MarkdownConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from, validate_config,
};
pub use error::{CompileError, CompileResult, NbContentError, Result};
pub use notebook::{Cell, MIME_HTML, MIME_PLAIN, Notebook, Output, TextLines};
pub use types::{Body, ContentType, Frontmatter, Node, ParsedContent, RESERVED_KEYS};
