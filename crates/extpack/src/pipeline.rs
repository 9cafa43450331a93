use crate::archive::{ListingSource, read_listing};
use crate::config::PackConfig;
use crate::errors::PackError;
use crate::format::{FormatMode, FormatSummary, format_tree};
use crate::schema::{Validated, load_schema, validate};
use crate::version::{VersionReport, check_version};
use crate::walk::FsTree;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveCheck {
    pub validated: Validated,
    pub sha256: Option<String>,
}

impl ArchiveCheck {
    pub fn confirmation(&self) -> String {
        let mut line = format!(
            "archive matches schema: {} files, {} directories",
            self.validated.files, self.validated.directories
        );
        if let Some(sha) = &self.sha256 {
            line.push_str(&format!(" (sha256 {sha})"));
        }
        line
    }
}

#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub version: Option<VersionReport>,
    pub rewritten: FormatSummary,
    pub archive: ArchiveCheck,
}

/// Canonicalizes every JSON file below `project_root` per the config's exclusions.
pub fn format_project(
    project_root: &Path,
    cfg: &PackConfig,
    mode: FormatMode,
    on_change: &mut dyn FnMut(&str),
) -> Result<FormatSummary, PackError> {
    let exclusions = cfg.format.exclusions()?;
    format_tree(
        project_root,
        &FsTree::new(project_root),
        &exclusions,
        mode,
        on_change,
    )
}

/// Reads the listing and validates it against the project's schema document.
pub fn validate_archive(
    project_root: &Path,
    cfg: &PackConfig,
    source: &ListingSource,
) -> Result<ArchiveCheck, PackError> {
    let schema = load_schema(&cfg.schema_path(project_root))?;
    let listing = read_listing(source)?;
    let validated = validate(&listing.entries, &schema).map_err(PackError::SchemaMismatch)?;
    Ok(ArchiveCheck {
        validated,
        sha256: listing.sha256,
    })
}

/// Version step, format step, validate step; in that order.
///
/// The version step never fails the run. The format step stops at the first bad
/// file and the validate step runs exactly once.
pub async fn run_check(
    project_root: &Path,
    cfg: &PackConfig,
    source: &ListingSource,
    offline: bool,
    on_change: &mut dyn FnMut(&str),
) -> Result<PipelineSummary, PackError> {
    let version = match check_version(project_root, &cfg.version, offline).await {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::warn!(code = e.code(), error = %e, "version step skipped");
            None
        }
    };
    let rewritten = format_project(project_root, cfg, FormatMode::Write, on_change)?;
    tracing::info!(
        checked = rewritten.checked,
        rewritten = rewritten.changed.len(),
        "format step done"
    );
    let archive = validate_archive(project_root, cfg, source)?;
    Ok(PipelineSummary {
        version,
        rewritten,
        archive,
    })
}
