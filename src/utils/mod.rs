//! Shared utilities.
//!
//! - [`exec`]: external command execution (PHP dev server)
//! - [`mime`]: MIME type detection for the dev server
//! - [`path`]: path normalization and display helpers

pub mod exec;
pub mod mime;
pub mod path;

pub use path::{normalize_path, relative_display};
