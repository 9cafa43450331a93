use crate::canonical::canonicalize;
use crate::errors::PackError;
use crate::walk::{Exclusions, SourceTree, collect_json_files};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatMode {
    /// Rewrite files whose canonical form differs.
    Write,
    /// Report differing files, never write.
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatOutcome {
    Unchanged,
    Changed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatSummary {
    pub checked: usize,
    pub changed: Vec<String>,
}

fn write_file_atomic(path: &Path, bytes: &[u8]) -> Result<(), PackError> {
    let write_err = |message: String| PackError::WriteSource {
        path: path.to_path_buf(),
        message,
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| write_err("invalid path (missing file name)".to_string()))?
        .to_string_lossy()
        .to_string();
    let permissions = fs::metadata(path)
        .map_err(|e| write_err(format!("failed to stat: {e}")))?
        .permissions();
    let tmp = path.with_file_name(format!("{file_name}.tmp"));
    // Any failure past this point must not leave the tmp file behind.
    let abandon = |message: String| {
        if tmp.is_file() {
            let _ = fs::remove_file(&tmp);
        }
        write_err(message)
    };
    fs::write(&tmp, bytes)
        .map_err(|e| abandon(format!("failed to write {}: {e}", tmp.display())))?;
    fs::set_permissions(&tmp, permissions)
        .map_err(|e| abandon(format!("failed to set mode on {}: {e}", tmp.display())))?;
    fs::rename(&tmp, path)
        .map_err(|e| abandon(format!("failed to replace with {}: {e}", tmp.display())))
}

/// Canonicalizes one JSON file; in [`FormatMode::Write`] the file is replaced only
/// when its bytes differ from the canonical text.
pub fn format_file(path: &Path, mode: FormatMode) -> Result<FormatOutcome, PackError> {
    let raw = fs::read(path).map_err(|e| PackError::ReadSource {
        path: path.to_path_buf(),
        source: e,
    })?;
    let text = std::str::from_utf8(&raw).map_err(|e| PackError::ParseJson {
        path: path.to_path_buf(),
        message: format!("not valid UTF-8: {e}"),
    })?;
    let canonical = canonicalize(text).map_err(|e| PackError::ParseJson {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if canonical.as_bytes() == raw.as_slice() {
        return Ok(FormatOutcome::Unchanged);
    }
    if mode == FormatMode::Write {
        write_file_atomic(path, canonical.as_bytes())?;
    }
    Ok(FormatOutcome::Changed)
}

/// Runs [`format_file`] over every JSON file of `tree` in path order, calling
/// `on_change` with the relative path of each file that changed (or would change).
///
/// The first failure aborts the run; files already rewritten stay rewritten.
pub fn format_tree<T: SourceTree + ?Sized>(
    root: &Path,
    tree: &T,
    exclusions: &Exclusions,
    mode: FormatMode,
    on_change: &mut dyn FnMut(&str),
) -> Result<FormatSummary, PackError> {
    let mut summary = FormatSummary::default();
    for rel in collect_json_files(tree, exclusions)? {
        let outcome = format_file(&root.join(&rel), mode)?;
        summary.checked += 1;
        tracing::debug!(file = %rel, ?outcome, "canonicalized");
        if outcome == FormatOutcome::Changed {
            on_change(&rel);
            summary.changed.push(rel);
        }
    }
    Ok(summary)
}
