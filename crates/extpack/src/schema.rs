use crate::errors::PackError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;

/// Flat allow-list of archive contents. Paths are relative, case-sensitive and
/// carry no trailing slash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Schema {
    pub allowed_files: BTreeSet<String>,
    pub allowed_directories: BTreeSet<String>,
}

impl Schema {
    pub fn new<F, D>(files: F, directories: D) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            allowed_files: files.into_iter().map(Into::into).collect(),
            allowed_directories: directories.into_iter().map(Into::into).collect(),
        }
    }
}

pub fn load_schema(path: &Path) -> Result<Schema, PackError> {
    if !path.is_file() {
        return Err(PackError::SchemaMissing(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path).map_err(|e| PackError::ReadSchema {
        path: path.to_path_buf(),
        source: e,
    })?;
    let schema: Schema = serde_json::from_str(&raw).map_err(|e| PackError::ParseSchema {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let slashed = schema
        .allowed_files
        .iter()
        .map(|p| ("allowed_files", p))
        .chain(schema.allowed_directories.iter().map(|p| ("allowed_directories", p)))
        .find(|(_, p)| p.ends_with('/'));
    if let Some((field, entry)) = slashed {
        return Err(PackError::ParseSchema {
            path: path.to_path_buf(),
            message: format!("`{field}` entry \"{entry}\" must not end with '/'"),
        });
    }
    Ok(schema)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryKind {
    File,
    Directory,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => f.write_str("File"),
            EntryKind::Directory => f.write_str("Directory"),
        }
    }
}

/// Splits a listing entry into its kind and its path without the trailing separator.
pub fn classify(entry: &str) -> (EntryKind, &str) {
    match entry.strip_suffix('/') {
        Some(dir) => (EntryKind::Directory, dir),
        None => (EntryKind::File, entry),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unexpected {
    pub kind: EntryKind,
    pub path: String,
}

/// Every discrepancy between a listing and a schema: declared files never seen
/// (sorted) and entries the schema does not allow (listing order).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub missing: Vec<String>,
    pub unexpected: Vec<Unexpected>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "archive does not match schema: {} missing, {} unexpected",
            self.missing.len(),
            self.unexpected.len()
        )?;
        for path in &self.missing {
            write!(f, "\n  expected but absent: {path}")?;
        }
        for u in &self.unexpected {
            write!(f, "\n  unexpected {}: {}", u.kind, u.path)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validated {
    pub files: usize,
    pub directories: usize,
}

/// Reconciles an archive listing against `schema`.
///
/// Succeeds iff the listed files are exactly `allowed_files` and every listed
/// directory is in `allowed_directories`. Declared directories need not appear.
pub fn validate<S: AsRef<str>>(entries: &[S], schema: &Schema) -> Result<Validated, Report> {
    let mut report = Report::default();
    let mut found: BTreeSet<&str> = BTreeSet::new();
    let mut directories = 0usize;

    for entry in entries {
        let (kind, path) = classify(entry.as_ref());
        let allowed = match kind {
            EntryKind::Directory => {
                directories += 1;
                schema.allowed_directories.contains(path)
            }
            EntryKind::File => {
                let ok = schema.allowed_files.contains(path);
                if ok {
                    found.insert(path);
                }
                ok
            }
        };
        if !allowed {
            report.unexpected.push(Unexpected {
                kind,
                path: path.to_string(),
            });
        }
    }

    report.missing = schema
        .allowed_files
        .iter()
        .filter(|f| !found.contains(f.as_str()))
        .cloned()
        .collect();

    if report.is_empty() {
        Ok(Validated {
            files: found.len(),
            directories,
        })
    } else {
        Err(report)
    }
}
