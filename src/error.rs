use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not a vault (missing config folder): {0}")]
    VaultNotFound(PathBuf),

    #[error("vault settings unreadable at {path}: {reason}")]
    SettingsUnreadable { path: PathBuf, reason: String },

    #[error("vault uses plain markdown links; refusing to parse note: {0}")]
    PlainLinkModeUnsupported(String),

    #[error("path escapes vault: {0}")]
    PathEscapesVault(PathBuf),

    #[error("ambiguous name {name:?}; candidates: {}", candidates.join(", "))]
    AmbiguousName {
        name: String,
        candidates: Vec<String>,
    },

    #[error("note does not exist on disk: {0}")]
    NoteMissing(String),

    #[error("empty name")]
    EmptyName,

    #[error("not a note: {0}")]
    NotANote(String),

    #[error("frontmatter yaml parse error in {path}: {source}")]
    Frontmatter {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config toml parse error: {0}")]
    ConfigToml(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
