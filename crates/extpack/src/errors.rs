use crate::schema::Report;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("failed to read JSON source: {path}: {source}")]
    ReadSource {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse JSON source: {path}: {message}")]
    ParseJson { path: PathBuf, message: String },
    #[error("failed to rewrite JSON source: {path}: {message}")]
    WriteSource { path: PathBuf, message: String },
    #[error("failed to walk project tree at {path}: {message}")]
    Walk { path: PathBuf, message: String },
    #[error(
        "archive schema not found: {0} (expected a JSON document with `allowed_files` and `allowed_directories`; fix: create it or set [archive].schema_path in extpack.toml)"
    )]
    SchemaMissing(PathBuf),
    #[error("failed to read archive schema: {path}: {source}")]
    ReadSchema {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse archive schema: {path}: {message}")]
    ParseSchema { path: PathBuf, message: String },
    #[error("failed to read archive listing: {path}: {message}")]
    ReadArchive { path: PathBuf, message: String },
    #[error("{0}")]
    SchemaMismatch(Report),
    #[error("invalid extension manifest: {path}: {message}")]
    ReadManifest { path: PathBuf, message: String },
    #[error("failed to read extpack config: {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse extpack config TOML: {path}: {message}")]
    ParseConfig { path: PathBuf, message: String },
    #[error("invalid exclude glob {pattern:?}: {message}")]
    InvalidGlob { pattern: String, message: String },
}

impl PackError {
    pub fn code(&self) -> &'static str {
        match self {
            PackError::ReadSource { .. } => "source.read_failed",
            PackError::ParseJson { .. } => "source.parse_failed",
            PackError::WriteSource { .. } => "source.write_failed",
            PackError::Walk { .. } => "walk.failed",
            PackError::SchemaMissing(_) => "schema.missing",
            PackError::ReadSchema { .. } => "schema.read_failed",
            PackError::ParseSchema { .. } => "schema.parse_failed",
            PackError::ReadArchive { .. } => "archive.read_failed",
            PackError::SchemaMismatch(_) => "archive.schema_mismatch",
            PackError::ReadManifest { .. } => "version.manifest_invalid",
            PackError::ReadConfig { .. } => "config.read_failed",
            PackError::ParseConfig { .. } => "config.parse_failed",
            PackError::InvalidGlob { .. } => "config.invalid_glob",
        }
    }
}
