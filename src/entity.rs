use std::path::{Path, PathBuf};

use crate::VaultConfig;

/// Stable handle to an indexed entity, valid for the lifetime of its vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub(crate) usize);

impl EntityId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileKind {
    Note,
    Image,
    Audio,
    Video,
    Pdf,
    Other,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Note => "note",
            FileKind::Image => "image",
            FileKind::Audio => "audio",
            FileKind::Video => "video",
            FileKind::Pdf => "pdf",
            FileKind::Other => "other",
        }
    }

    pub(crate) fn from_extension(cfg: &VaultConfig, ext: &str) -> Self {
        let has = |list: &[String]| list.iter().any(|e| e.eq_ignore_ascii_case(ext));
        if has(&cfg.note_extensions) {
            FileKind::Note
        } else if has(&cfg.image_extensions) {
            FileKind::Image
        } else if has(&cfg.audio_extensions) {
            FileKind::Audio
        } else if has(&cfg.video_extensions) {
            FileKind::Video
        } else if has(&cfg.pdf_extensions) {
            FileKind::Pdf
        } else {
            FileKind::Other
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file in the vault, or a placeholder for a note that a link refers to
/// but which does not exist on disk yet.
///
/// `name` is the short display name: the stem for notes, the full file
/// name for everything else. `long_name` is the vault-relative path in
/// the same form (extension stripped for notes only).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entity {
    name: String,
    long_name: String,
    path: Option<PathBuf>,
    kind: FileKind,
}

impl Entity {
    pub(crate) fn from_path(cfg: &VaultConfig, root: &Path, abs: PathBuf) -> Self {
        let ext = abs.extension().and_then(|s| s.to_str()).unwrap_or("");
        let kind = FileKind::from_extension(cfg, ext);
        let rel = abs.strip_prefix(root).unwrap_or(&abs);
        let rel = if kind == FileKind::Note {
            rel.with_extension("")
        } else {
            rel.to_path_buf()
        };

        let long_name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let name = rel
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| long_name.clone());

        Self {
            name,
            long_name,
            path: Some(abs),
            kind,
        }
    }

    /// A not-yet-created note. Returns `None` for an empty name, since an
    /// entity needs either a path or a name.
    pub fn placeholder(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            long_name: name.to_string(),
            path: None,
            kind: FileKind::Note,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn long_name(&self) -> &str {
        &self.long_name
    }

    /// Absolute filesystem path; `None` for placeholders.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn is_note(&self) -> bool {
        self.kind == FileKind::Note
    }

    pub fn exists(&self) -> bool {
        self.path.is_some()
    }

    /// Lower-cased extension without the dot. Placeholders are notes, so `md`.
    pub fn extension(&self) -> String {
        match &self.path {
            Some(p) => p
                .extension()
                .map(|s| s.to_string_lossy().to_lowercase())
                .unwrap_or_default(),
            None => "md".to_string(),
        }
    }

    /// Containing folder; placeholders live in the vault root.
    pub fn parent<'a>(&'a self, vault_root: &'a Path) -> &'a Path {
        self.path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(vault_root)
    }

    /// Whether the entity lives in `folder` or any of its subfolders.
    pub fn in_folder(&self, folder: &Path) -> bool {
        self.path
            .as_deref()
            .and_then(Path::parent)
            .is_some_and(|p| p.starts_with(folder))
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(p) => write!(f, "{} [{}]", self.name, p.display()),
            None => write!(f, "{} [not created]", self.name),
        }
    }
}
