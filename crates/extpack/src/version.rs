//! Local manifest version vs. the version published upstream.
//!
//! The remote side is best-effort: every lookup failure becomes
//! [`RemoteVersion::Unknown`] and packaging carries on.

use crate::config::VersionConfig;
use crate::errors::PackError;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalManifest {
    pub uuid: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteVersion {
    Found(String),
    Unknown,
}

impl fmt::Display for RemoteVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteVersion::Found(v) => f.write_str(v),
            RemoteVersion::Unknown => f.write_str("N/A"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionStatus {
    InSync,
    LocalAhead,
    LocalBehind,
    Unknown,
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VersionStatus::InSync => "in_sync",
            VersionStatus::LocalAhead => "local_ahead",
            VersionStatus::LocalBehind => "local_behind",
            VersionStatus::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionReport {
    pub local: LocalManifest,
    pub remote: RemoteVersion,
    pub status: VersionStatus,
}

impl fmt::Display for VersionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "local={} published={} status={}",
            self.local.version, self.remote, self.status
        )
    }
}

fn version_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

pub fn read_local_version(
    project_root: &Path,
    cfg: &VersionConfig,
) -> Result<LocalManifest, PackError> {
    let path = project_root.join(&cfg.manifest_path);
    let invalid = |message: String| PackError::ReadManifest {
        path: path.clone(),
        message,
    };
    let raw = std::fs::read_to_string(&path).map_err(|e| invalid(e.to_string()))?;
    let doc: Value = serde_json::from_str(&raw).map_err(|e| invalid(e.to_string()))?;
    let version = doc
        .get(&cfg.version_field)
        .and_then(version_text)
        .ok_or_else(|| invalid(format!("missing or non-scalar `{}` field", cfg.version_field)))?;
    let uuid = doc
        .get(&cfg.uuid_field)
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(LocalManifest { uuid, version })
}

/// Extracts `field` from a published-version JSON payload.
pub fn parse_published_version(body: &[u8], field: &str) -> Result<String, String> {
    let doc: Value =
        serde_json::from_slice(body).map_err(|e| format!("invalid JSON payload: {e}"))?;
    doc.get(field)
        .and_then(version_text)
        .ok_or_else(|| format!("payload has no usable `{field}` field"))
}

#[cfg(feature = "remote")]
async fn fetch_url_bytes(url: &str, timeout_secs: u64) -> Result<Vec<u8>, String> {
    const MAX_REMOTE_BYTES: usize = 1024 * 1024;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| format!("failed to build HTTP client: {e}"))?;
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("failed to fetch {url}: {e}"))?;
    let response = response
        .error_for_status()
        .map_err(|e| format!("lookup failed for {url}: {e}"))?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| format!("failed to read body from {url}: {e}"))?;
    if bytes.len() > MAX_REMOTE_BYTES {
        return Err(format!(
            "payload too large from {url}: {} bytes (max {MAX_REMOTE_BYTES})",
            bytes.len()
        ));
    }
    Ok(bytes.to_vec())
}

#[cfg(not(feature = "remote"))]
async fn fetch_url_bytes(url: &str, _timeout_secs: u64) -> Result<Vec<u8>, String> {
    Err(format!(
        "remote version lookup is unavailable in lite build ({url})"
    ))
}

pub fn published_version_url(cfg: &VersionConfig, uuid: &str) -> String {
    cfg.remote_url.replace("{uuid}", uuid)
}

/// Looks up the published version; never fails.
pub async fn lookup_published_version(cfg: &VersionConfig, uuid: &str) -> RemoteVersion {
    let url = published_version_url(cfg, uuid);
    let result = match fetch_url_bytes(&url, cfg.timeout_secs).await {
        Ok(body) => parse_published_version(&body, &cfg.remote_version_field),
        Err(e) => Err(e),
    };
    match result {
        Ok(v) => RemoteVersion::Found(v),
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "published version unavailable; continuing");
            RemoteVersion::Unknown
        }
    }
}

fn dotted_numbers(s: &str) -> Option<Vec<u64>> {
    s.split('.').map(|p| p.parse::<u64>().ok()).collect()
}

fn compare_versions(local: &str, remote: &str) -> Option<Ordering> {
    if local == remote {
        return Some(Ordering::Equal);
    }
    let (a, b) = (dotted_numbers(local)?, dotted_numbers(remote)?);
    let len = a.len().max(b.len());
    let pad = |v: &[u64]| -> Vec<u64> {
        let mut v = v.to_vec();
        v.resize(len, 0);
        v
    };
    Some(pad(&a).cmp(&pad(&b)))
}

pub fn reconcile(local: &LocalManifest, remote: &RemoteVersion) -> VersionStatus {
    let RemoteVersion::Found(published) = remote else {
        return VersionStatus::Unknown;
    };
    match compare_versions(&local.version, published) {
        Some(Ordering::Equal) => VersionStatus::InSync,
        Some(Ordering::Greater) => VersionStatus::LocalAhead,
        Some(Ordering::Less) => VersionStatus::LocalBehind,
        None => VersionStatus::Unknown,
    }
}

/// Reads the local manifest and, unless `offline`, the published version.
pub async fn check_version(
    project_root: &Path,
    cfg: &VersionConfig,
    offline: bool,
) -> Result<VersionReport, PackError> {
    let local = read_local_version(project_root, cfg)?;
    let remote = match (&local.uuid, offline) {
        (Some(uuid), false) => lookup_published_version(cfg, uuid).await,
        (None, false) => {
            tracing::warn!(
                field = %cfg.uuid_field,
                "manifest has no uuid; skipping published version lookup"
            );
            RemoteVersion::Unknown
        }
        (_, true) => RemoteVersion::Unknown,
    };
    let status = reconcile(&local, &remote);
    Ok(VersionReport {
        local,
        remote,
        status,
    })
}
