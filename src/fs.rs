use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Filesystem primitives the indexer and parser consume.
///
/// `read_dir` returns direct children sorted by name and reports only
/// directories and regular files.
pub trait VaultFs: std::fmt::Debug {
    fn is_dir(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn read_dir(&self, dir: &Path) -> Result<Vec<DirEntry>>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl VaultFs for OsFs {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        let mut out = Vec::new();
        for entry in walkdir::WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| Error::io(dir, e.into()))?;
            let ft = entry.file_type();
            if !ft.is_dir() && !ft.is_file() {
                continue;
            }
            out.push(DirEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                path: entry.path().to_path_buf(),
                is_dir: ft.is_dir(),
            });
        }
        Ok(out)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| Error::io(path, e))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        std::fs::canonicalize(path).map_err(|e| Error::io(path, e))
    }
}

/// In-memory tree keyed by absolute path. Directories are implied by the
/// files beneath them; empty ones can be added with [`MemoryFs::with_dir`].
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert_file(path, content);
        self
    }

    pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        let path = normalize_lexically(&path.into());
        self.add_ancestors(&path);
        self.dirs.insert(path);
        self
    }

    pub fn insert_file(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        let path = normalize_lexically(&path.into());
        if let Some(parent) = path.parent() {
            self.add_ancestors(&parent.to_path_buf());
            self.dirs.insert(parent.to_path_buf());
        }
        self.files.insert(path, content.into());
    }

    pub fn remove_file(&mut self, path: &Path) -> Option<String> {
        self.files.remove(&normalize_lexically(path))
    }

    fn add_ancestors(&mut self, path: &Path) {
        for a in path.ancestors().skip(1) {
            self.dirs.insert(a.to_path_buf());
        }
    }
}

impl VaultFs for MemoryFs {
    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(&normalize_lexically(path))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(&normalize_lexically(path))
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        let dir = normalize_lexically(dir);
        if !self.dirs.contains(&dir) {
            return Err(Error::io(
                &dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory"),
            ));
        }

        let mut children: BTreeMap<String, bool> = BTreeMap::new();
        for d in &self.dirs {
            if d.parent() == Some(dir.as_path()) {
                if let Some(name) = d.file_name() {
                    children.insert(name.to_string_lossy().to_string(), true);
                }
            }
        }
        for f in self.files.keys() {
            if f.parent() == Some(dir.as_path()) {
                if let Some(name) = f.file_name() {
                    children
                        .entry(name.to_string_lossy().to_string())
                        .or_insert(false);
                }
            }
        }

        Ok(children
            .into_iter()
            .map(|(name, is_dir)| DirEntry {
                path: dir.join(&name),
                name,
                is_dir,
            })
            .collect())
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.files
            .get(&normalize_lexically(path))
            .cloned()
            .ok_or_else(|| {
                Error::io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
                )
            })
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        let path = normalize_lexically(path);
        if self.dirs.contains(&path) || self.files.contains_key(&path) {
            Ok(path)
        } else {
            Err(Error::io(
                &path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such path"),
            ))
        }
    }
}

/// Resolve `.` and `..` without touching the filesystem.
pub(crate) fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in path.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
