use crate::errors::PackError;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

const STDIN_MARKER: &str = "-";

/// Where an archive listing comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingSource {
    /// A built `.zip` package; entries are read from its central directory.
    Zip(std::path::PathBuf),
    /// One entry per line, e.g. `unzip -Z1` output. `-` reads stdin.
    Text(std::path::PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub entries: Vec<String>,
    /// Present when the listing was read from an archive file.
    pub sha256: Option<String>,
}

pub fn read_listing(source: &ListingSource) -> Result<Listing, PackError> {
    match source {
        ListingSource::Zip(path) => Ok(Listing {
            entries: list_zip_entries(path)?,
            sha256: Some(sha256_file(path)?),
        }),
        ListingSource::Text(path) => {
            let raw = if path.as_os_str() == STDIN_MARKER {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .map_err(|e| PackError::ReadArchive {
                        path: path.clone(),
                        message: format!("failed to read stdin: {e}"),
                    })?;
                buf
            } else {
                fs::read_to_string(path).map_err(|e| PackError::ReadArchive {
                    path: path.clone(),
                    message: e.to_string(),
                })?
            };
            Ok(Listing {
                entries: parse_listing(&raw),
                sha256: None,
            })
        }
    }
}

/// Splits a text listing into entries, dropping blank lines and `\r`.
pub fn parse_listing(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Entry names of a zip archive in stored order; directories keep their trailing `/`.
pub fn list_zip_entries(path: &Path) -> Result<Vec<String>, PackError> {
    let read_err = |message: String| PackError::ReadArchive {
        path: path.to_path_buf(),
        message,
    };
    let file = fs::File::open(path).map_err(|e| read_err(format!("failed to open: {e}")))?;
    let mut archive =
        ZipArchive::new(file).map_err(|e| read_err(format!("failed to read zip archive: {e}")))?;

    let mut entries = Vec::with_capacity(archive.len());
    for idx in 0..archive.len() {
        let entry = archive
            .by_index_raw(idx)
            .map_err(|e| read_err(format!("failed to read zip entry index {idx}: {e}")))?;
        entries.push(entry.name().to_string());
    }
    tracing::debug!(archive = %path.display(), entries = entries.len(), "listed archive");
    Ok(entries)
}

pub fn sha256_file(path: &Path) -> Result<String, PackError> {
    let read_err = |message: String| PackError::ReadArchive {
        path: path.to_path_buf(),
        message,
    };
    let mut file = fs::File::open(path).map_err(|e| read_err(format!("failed to open: {e}")))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| read_err(format!("failed to read: {e}")))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, dirs: &[&str], files: &[(&str, &str)]) {
        let file = fs::File::create(path).expect("create zip");
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        for d in dirs {
            zip.add_directory(*d, options).expect("add dir");
        }
        for (name, body) in files {
            zip.start_file(*name, options).expect("start file");
            zip.write_all(body.as_bytes()).expect("write body");
        }
        zip.finish().expect("finish zip");
    }

    #[test]
    fn zip_listing_keeps_order_and_directory_markers() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ext.zip");
        write_zip(
            &path,
            &["schemas/"],
            &[("metadata.json", "{}\n"), ("extension.js", "")],
        );

        let listing = read_listing(&ListingSource::Zip(path)).expect("listing");
        assert_eq!(
            listing.entries,
            ["schemas/", "metadata.json", "extension.js"]
        );
        let sha = listing.sha256.expect("sha256");
        assert_eq!(sha.len(), 64);
    }

    #[test]
    fn not_a_zip_is_a_read_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ext.zip");
        fs::write(&path, "not a zip").expect("write");
        let err = list_zip_entries(&path).expect_err("bad zip");
        assert_eq!(err.code(), "archive.read_failed");
    }

    #[test]
    fn text_listing_ignores_blank_lines_and_carriage_returns() {
        assert_eq!(
            parse_listing("a.js\r\n\nlibrary/\r\n  \nmetadata.json"),
            ["a.js", "library/", "metadata.json"]
        );
    }

    #[test]
    fn sha256_matches_known_digest() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("x");
        fs::write(&path, "abc").expect("write");
        assert_eq!(
            sha256_file(&path).expect("sha"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
