use std::path::Path;

use obvault::{Error, FileKind, Vault, VaultConfig};

fn write(root: &Path, rel: &str, content: &str) -> anyhow::Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

#[test]
fn open_walks_breadth_first_and_skips_hidden_trees() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let root = temp.path().join("vault");
    write(&root, ".obsidian/app.json", "{}")?;
    write(&root, ".trash/old.md", "")?;
    write(&root, ".hidden.md", "")?;
    write(&root, "top.md", "")?;
    write(&root, "a/deep/inner.md", "")?;
    write(&root, "a/one.md", "")?;
    write(&root, "b/pic.png", "")?;
    write(&root, "b/song.mp3", "")?;
    write(&root, "b/doc.pdf", "")?;
    write(&root, "b/run.sh", "")?;

    let vault = Vault::open(&root)?;
    assert_eq!(vault.name(), "vault");

    let names: Vec<_> = vault.entities().map(|(_, e)| e.long_name().to_string()).collect();
    assert_eq!(
        names,
        vec![
            "top",
            "a/one",
            "b/doc.pdf",
            "b/pic.png",
            "b/run.sh",
            "b/song.mp3",
            "a/deep/inner"
        ]
    );
    assert_eq!(vault.folders().len(), 3);
    assert_eq!(vault.list_notes().count(), 3);

    let kinds: Vec<_> = vault
        .list_entities(None)
        .map(|(_, e)| e.kind())
        .filter(|k| *k != FileKind::Note)
        .collect();
    assert_eq!(
        kinds,
        vec![FileKind::Pdf, FileKind::Image, FileKind::Other, FileKind::Audio]
    );
    Ok(())
}

#[test]
fn every_file_is_counted_once() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let root = temp.path().join("vault");
    write(&root, ".obsidian/app.json", "{}")?;
    for rel in ["x.md", "p/x.md", "q/x.md", "q/y.md", "r/x.png.md", "s/x.png", "t/z.txt"] {
        write(&root, rel, "")?;
    }

    let vault = Vault::open(&root)?;
    let stats = vault.stats();
    assert_eq!(stats.files, 7);

    let unique = vault
        .entities()
        .filter(|(_, e)| vault.find(e.name()).is_ok())
        .count();
    assert_eq!(unique + stats.duplicated_files, stats.files);
    assert_eq!(stats.duplicate_groups, 2);
    Ok(())
}

#[test]
fn opening_requires_the_config_folder() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    write(temp.path(), "note.md", "")?;

    let err = Vault::open(temp.path()).unwrap_err();
    assert!(matches!(err, Error::VaultNotFound(_)));

    let err = Vault::open(temp.path().join("missing")).unwrap_err();
    assert!(matches!(err, Error::VaultNotFound(_)));
    Ok(())
}

#[test]
fn unreadable_settings_fail_the_open() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    std::fs::create_dir_all(temp.path().join(".obsidian"))?;
    let err = Vault::open(temp.path()).unwrap_err();
    assert!(matches!(err, Error::SettingsUnreadable { .. }));

    write(temp.path(), ".obsidian/app.json", "[not, an, object")?;
    let err = Vault::open(temp.path()).unwrap_err();
    assert!(matches!(err, Error::SettingsUnreadable { .. }));
    Ok(())
}

#[test]
fn config_file_extends_ignored_folders() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let root = temp.path();
    write(root, ".obsidian/app.json", r#"{"useMarkdownLinks": false, "theme": "dark"}"#)?;
    write(root, "keep/a.md", "")?;
    write(root, "archive/b.md", "")?;
    write(root, "obv.toml", "ignore_dirs = [\"archive\"]\n")?;

    let cfg = VaultConfig::from_toml_file(&root.join("obv.toml"))?;
    let vault = Vault::with_config(root, cfg)?;
    let notes: Vec<_> = vault.list_notes().map(|(_, e)| e.long_name().to_string()).collect();
    assert_eq!(notes, vec!["keep/a"]);
    assert!(!vault.uses_markdown_links());
    assert_eq!(
        vault.settings().other.get("theme").and_then(|v| v.as_str()),
        Some("dark")
    );
    Ok(())
}

#[test]
fn folder_filter_is_recursive() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let root = temp.path();
    write(root, ".obsidian/app.json", "{}")?;
    write(root, "proj/a.md", "")?;
    write(root, "proj/sub/b.md", "")?;
    write(root, "other/c.md", "")?;

    let vault = Vault::open(root)?;
    let folder = vault.root().join("proj");
    let mut inside: Vec<_> = vault
        .list_notes()
        .filter(|(_, e)| e.in_folder(&folder))
        .map(|(_, e)| e.name().to_string())
        .collect();
    inside.sort();
    assert_eq!(inside, vec!["a", "b"]);
    Ok(())
}
