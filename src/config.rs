use std::path::Path;

use serde::Deserialize;

use crate::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Vault-internal configuration folder; its presence marks a vault.
    pub config_dir: String,
    /// Settings file inside `config_dir`.
    pub settings_file: String,
    /// Directory names to skip anywhere in the tree.
    pub ignore_dirs: Vec<String>,
    /// File extensions (without dot) that are considered notes.
    pub note_extensions: Vec<String>,
    pub image_extensions: Vec<String>,
    pub audio_extensions: Vec<String>,
    pub video_extensions: Vec<String>,
    pub pdf_extensions: Vec<String>,
    /// Render block comments as HTML comment markers instead of dropping them.
    pub keep_comments: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            config_dir: ".obsidian".into(),
            settings_file: "app.json".into(),
            ignore_dirs: vec![".obsidian".into(), ".trash".into(), ".git".into()],
            note_extensions: vec!["md".into()],
            image_extensions: ["png", "jpg", "jpeg", "gif", "bmp", "svg"]
                .into_iter()
                .map(String::from)
                .collect(),
            audio_extensions: ["mp3", "wav", "m4a", "ogg", "3gp", "flac"]
                .into_iter()
                .map(String::from)
                .collect(),
            video_extensions: ["mp4", "webm", "ogv", "mov", "mkv"]
                .into_iter()
                .map(String::from)
                .collect(),
            pdf_extensions: vec!["pdf".into()],
            keep_comments: true,
        }
    }
}

impl VaultConfig {
    /// Parse a (possibly partial) TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::ConfigToml(e.to_string()))
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&text)
    }

    pub(crate) fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignore_dirs.iter().any(|d| d == name)
    }
}
