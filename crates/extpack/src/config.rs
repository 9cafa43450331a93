use crate::errors::PackError;
use crate::walk::Exclusions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "extpack.toml";
pub const PROJECT_ROOT_ENV: &str = "EXTPACK_PROJECT_ROOT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackConfig {
    #[serde(default)]
    pub format: FormatConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub version: VersionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatConfig {
    /// Directory names the JSON walk never descends into, at any depth.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionConfig {
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,
    #[serde(default = "default_uuid_field")]
    pub uuid_field: String,
    #[serde(default = "default_version_field")]
    pub version_field: String,
    /// `{uuid}` is replaced by the manifest's uuid.
    #[serde(default = "default_remote_url")]
    pub remote_url: String,
    #[serde(default = "default_version_field")]
    pub remote_version_field: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_exclude_dirs() -> Vec<String> {
    [".git", "node_modules", "backup"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("archive-schema.json")
}

fn default_manifest_path() -> String {
    "metadata.json".to_string()
}

fn default_uuid_field() -> String {
    "uuid".to_string()
}

fn default_version_field() -> String {
    "version".to_string()
}

fn default_remote_url() -> String {
    "https://extensions.gnome.org/extension-info/?uuid={uuid}".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: default_exclude_dirs(),
            exclude_globs: vec![],
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            schema_path: default_schema_path(),
        }
    }
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            manifest_path: default_manifest_path(),
            uuid_field: default_uuid_field(),
            version_field: default_version_field(),
            remote_url: default_remote_url(),
            remote_version_field: default_version_field(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl FormatConfig {
    pub fn exclusions(&self) -> Result<Exclusions, PackError> {
        Exclusions::new(&self.exclude_dirs, &self.exclude_globs)
    }
}

impl PackConfig {
    pub fn schema_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.archive.schema_path)
    }
}

/// Loads `extpack.toml` from `project_root`; an absent file yields defaults.
pub fn load_config(project_root: &Path) -> Result<PackConfig, PackError> {
    let path = project_root.join(CONFIG_FILE_NAME);
    if !path.is_file() {
        return Ok(PackConfig::default());
    }
    let raw = std::fs::read_to_string(&path).map_err(|e| PackError::ReadConfig {
        path: path.clone(),
        source: e,
    })?;
    toml::from_str(&raw).map_err(|e| PackError::ParseConfig {
        path,
        message: e.to_string(),
    })
}

/// `--project-root`, else `$EXTPACK_PROJECT_ROOT`, else `.`.
pub fn resolve_project_root(flag: Option<PathBuf>) -> PathBuf {
    flag.filter(|p| !p.as_os_str().is_empty())
        .or_else(|| {
            std::env::var(PROJECT_ROOT_ENV)
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from("."))
}
