use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::fs::VaultFs;
use crate::{Error, Result, VaultConfig};

/// The vault's own settings file (`.obsidian/app.json` by default).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultSettings {
    /// When set, links are written as plain markdown and the wiki dialect
    /// is not in use.
    #[serde(rename = "useMarkdownLinks", default)]
    pub use_markdown_links: bool,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

pub(crate) fn load_settings(fs: &dyn VaultFs, root: &Path, cfg: &VaultConfig) -> Result<VaultSettings> {
    let marker = root.join(&cfg.config_dir);
    if !fs.is_dir(&marker) {
        return Err(Error::VaultNotFound(root.to_path_buf()));
    }

    let path = marker.join(&cfg.settings_file);
    let text = fs
        .read_to_string(&path)
        .map_err(|e| Error::SettingsUnreadable {
            path: path.clone(),
            reason: e.to_string(),
        })?;
    serde_json::from_str(&text).map_err(|e| Error::SettingsUnreadable {
        path,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;

    fn load(fs: &MemoryFs) -> Result<VaultSettings> {
        load_settings(fs, Path::new("/v"), &VaultConfig::default())
    }

    #[test]
    fn link_mode_defaults_to_wiki() {
        let fs = MemoryFs::new().with_file("/v/.obsidian/app.json", r#"{"spellcheck": true}"#);
        let s = load(&fs).unwrap();
        assert!(!s.use_markdown_links);
        assert_eq!(s.other.get("spellcheck"), Some(&serde_json::Value::Bool(true)));
    }

    #[test]
    fn markdown_link_mode_is_read() {
        let fs = MemoryFs::new().with_file("/v/.obsidian/app.json", r#"{"useMarkdownLinks": true}"#);
        assert!(load(&fs).unwrap().use_markdown_links);
    }

    #[test]
    fn missing_marker_is_not_a_vault() {
        let fs = MemoryFs::new().with_file("/v/a.md", "");
        assert!(matches!(load(&fs), Err(Error::VaultNotFound(_))));
    }

    #[test]
    fn unreadable_settings() {
        let fs = MemoryFs::new().with_file("/v/.obsidian/app.json", "{not json");
        assert!(matches!(load(&fs), Err(Error::SettingsUnreadable { .. })));

        let fs = MemoryFs::new().with_dir("/v/.obsidian");
        assert!(matches!(load(&fs), Err(Error::SettingsUnreadable { .. })));
    }
}
