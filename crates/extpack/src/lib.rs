//! Packaging helpers for desktop-shell extensions: a deterministic JSON
//! canonicalizer and an allow-list validator for built archives.

pub mod archive;
pub mod canonical;
pub mod config;
pub mod errors;
pub mod format;
pub mod pipeline;
pub mod schema;
pub mod version;
pub mod walk;

pub use errors::PackError;
