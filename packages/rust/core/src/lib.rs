//! Notebook content transformer for nbcontent.
//!
//! This crate ties the input classifier, the cell walker, and the container
//! renderers together behind the [`Transformer`] contract.

pub mod classify;
pub mod render;
pub mod transformer;
pub mod walker;

pub use classify::{Classified, classify};
pub use transformer::{NOTEBOOK_EXTENSIONS, NotebookTransformer, TRANSFORMER_NAME, Transformer};
pub use walker::{Compilers, WalkOutput, walk};
