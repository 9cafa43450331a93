use crate::errors::PackError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Dir,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
}

/// A directory tree the JSON walk can enumerate one level at a time.
///
/// `rel` is a `/`-separated path relative to the tree root; `""` is the root.
pub trait SourceTree {
    fn list_dir(&self, rel: &str) -> Result<Vec<Node>, PackError>;
}

/// Directory names never descended into, plus optional globs on relative file paths.
#[derive(Debug, Clone)]
pub struct Exclusions {
    dir_names: BTreeSet<String>,
    globs: Option<GlobSet>,
}

impl Exclusions {
    pub fn new(dir_names: &[String], globs: &[String]) -> Result<Self, PackError> {
        let globs = if globs.is_empty() {
            None
        } else {
            let mut b = GlobSetBuilder::new();
            for p in globs {
                let g = Glob::new(p).map_err(|e| PackError::InvalidGlob {
                    pattern: p.clone(),
                    message: e.to_string(),
                })?;
                b.add(g);
            }
            Some(b.build().map_err(|e| PackError::InvalidGlob {
                pattern: globs.join(","),
                message: e.to_string(),
            })?)
        };
        Ok(Self {
            dir_names: dir_names.iter().cloned().collect(),
            globs,
        })
    }

    pub fn dir_names(names: &[&str]) -> Self {
        Self {
            dir_names: names.iter().map(|s| s.to_string()).collect(),
            globs: None,
        }
    }

    fn skips_dir(&self, name: &str) -> bool {
        self.dir_names.contains(name)
    }

    fn skips_file(&self, rel: &str) -> bool {
        self.globs.as_ref().is_some_and(|g| g.is_match(rel))
    }
}

fn is_json_name(name: &str) -> bool {
    Path::new(name).extension().and_then(|s| s.to_str()) == Some("json")
}

fn join_rel(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// Every `.json` file in `tree` outside excluded directories, as sorted relative paths.
pub fn collect_json_files<T: SourceTree + ?Sized>(
    tree: &T,
    exclusions: &Exclusions,
) -> Result<Vec<String>, PackError> {
    let mut out: Vec<String> = vec![];
    let mut pending: Vec<String> = vec![String::new()];
    while let Some(dir) = pending.pop() {
        for node in tree.list_dir(&dir)? {
            let rel = join_rel(&dir, &node.name);
            match node.kind {
                NodeKind::Dir => {
                    if exclusions.skips_dir(&node.name) {
                        tracing::debug!(dir = %rel, "skipping excluded directory");
                        continue;
                    }
                    pending.push(rel);
                }
                NodeKind::File => {
                    if is_json_name(&node.name) && !exclusions.skips_file(&rel) {
                        out.push(rel);
                    }
                }
            }
        }
    }
    out.sort();
    Ok(out)
}

/// The real filesystem below `root`. Symlinks are neither followed nor listed.
#[derive(Debug, Clone)]
pub struct FsTree {
    root: PathBuf,
}

impl FsTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SourceTree for FsTree {
    fn list_dir(&self, rel: &str) -> Result<Vec<Node>, PackError> {
        let dir = if rel.is_empty() {
            self.root.clone()
        } else {
            self.root.join(rel)
        };
        let mut nodes: Vec<Node> = vec![];
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| PackError::Walk {
                path: dir.clone(),
                message: e.to_string(),
            })?;
            let kind = if entry.file_type().is_dir() {
                NodeKind::Dir
            } else if entry.file_type().is_file() {
                NodeKind::File
            } else {
                continue;
            };
            nodes.push(Node {
                name: entry.file_name().to_string_lossy().to_string(),
                kind,
            });
        }
        Ok(nodes)
    }
}

/// An in-memory tree built from a list of relative file paths.
#[derive(Debug, Clone, Default)]
pub struct MemTree {
    files: BTreeSet<String>,
}

impl MemTree {
    pub fn from_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
        }
    }
}

impl SourceTree for MemTree {
    fn list_dir(&self, rel: &str) -> Result<Vec<Node>, PackError> {
        let prefix = if rel.is_empty() {
            String::new()
        } else {
            format!("{rel}/")
        };
        let mut children: BTreeMap<String, NodeKind> = BTreeMap::new();
        for file in self.files.iter().filter(|f| f.starts_with(&prefix)) {
            let rest = &file[prefix.len()..];
            match rest.split_once('/') {
                Some((dir, _)) => {
                    children.insert(dir.to_string(), NodeKind::Dir);
                }
                None => {
                    children.entry(rest.to_string()).or_insert(NodeKind::File);
                }
            }
        }
        Ok(children
            .into_iter()
            .map(|(name, kind)| Node { name, kind })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_exclusions() -> Exclusions {
        Exclusions::dir_names(&[".git", "node_modules", "backup"])
    }

    #[test]
    fn walk_skips_excluded_directories_at_any_depth() {
        let tree = MemTree::from_files([
            "metadata.json",
            "package.json",
            "extension.js",
            ".git/config.json",
            "node_modules/x/package.json",
            "src/schemas/prefs.json",
            "src/node_modules/y.json",
            "backup/metadata.json",
        ]);
        let files = collect_json_files(&tree, &default_exclusions()).expect("walk");
        assert_eq!(
            files,
            ["metadata.json", "package.json", "src/schemas/prefs.json"]
        );
    }

    #[test]
    fn exclusion_matches_whole_directory_names_only() {
        let tree = MemTree::from_files(["backups/a.json", "my.git/b.json", "git/c.json"]);
        let files = collect_json_files(&tree, &default_exclusions()).expect("walk");
        assert_eq!(files, ["backups/a.json", "git/c.json", "my.git/b.json"]);
    }

    #[test]
    fn only_json_extension_is_selected() {
        let tree = MemTree::from_files(["a.json5", "b.JSON", "c.json", "d.json.bak", "json"]);
        let files = collect_json_files(&tree, &default_exclusions()).expect("walk");
        assert_eq!(files, ["c.json"]);
    }

    #[test]
    fn exclude_globs_apply_to_relative_file_paths() {
        let ex = Exclusions::new(
            &[".git".to_string()],
            &["dist/**".to_string(), "**/*.lock.json".to_string()],
        )
        .expect("exclusions");
        let tree = MemTree::from_files(["dist/metadata.json", "a/deps.lock.json", "a/b.json"]);
        let files = collect_json_files(&tree, &ex).expect("walk");
        assert_eq!(files, ["a/b.json"]);
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let err = Exclusions::new(&[], &["a/[".to_string()]).expect_err("invalid glob");
        assert_eq!(err.code(), "config.invalid_glob");
    }

    #[test]
    fn fs_tree_lists_real_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir_all(dir.path().join("schemas")).expect("mkdir");
        std::fs::create_dir_all(dir.path().join("node_modules/pkg")).expect("mkdir");
        std::fs::write(dir.path().join("metadata.json"), "{}").expect("write");
        std::fs::write(dir.path().join("schemas/a.json"), "{}").expect("write");
        std::fs::write(dir.path().join("node_modules/pkg/package.json"), "{}").expect("write");

        let files =
            collect_json_files(&FsTree::new(dir.path()), &default_exclusions()).expect("walk");
        assert_eq!(files, ["metadata.json", "schemas/a.json"]);
    }
}
