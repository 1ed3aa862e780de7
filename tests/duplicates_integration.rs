use std::path::Path;

use obvault::{Error, Resolution, Vault};

fn write(root: &Path, rel: &str, content: &str) -> anyhow::Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

fn long_name(vault: &Vault, res: &Resolution) -> Option<String> {
    res.entity_id()
        .and_then(|id| vault.entity(id))
        .map(|e| e.long_name().to_string())
}

#[test]
fn same_short_name_in_two_folders_forms_a_group() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let root = temp.path();
    write(root, ".obsidian/app.json", "{}")?;
    write(root, "inbox/Note.md", "")?;
    write(root, "archive/Note.md", "")?;

    let vault = Vault::open(root)?;
    match vault.lookup("Note")? {
        Resolution::Ambiguous { name, candidates } => {
            assert_eq!(name, "Note");
            assert_eq!(candidates.len(), 2);
        }
        other => panic!("expected a duplicate group, got {other:?}"),
    }

    assert_eq!(long_name(&vault, &vault.lookup("inbox/Note")?).as_deref(), Some("inbox/Note"));
    assert_eq!(
        long_name(&vault, &vault.lookup("archive/Note")?).as_deref(),
        Some("archive/Note")
    );

    let groups = vault.same_names();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups["Note"].len(), 2);
    Ok(())
}

#[test]
fn note_and_image_can_share_a_short_name() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let root = temp.path();
    write(root, ".obsidian/app.json", "{}")?;
    write(root, "notes/x.png.md", "about the picture")?;
    write(root, "media/x.png", "")?;

    let vault = Vault::open(root)?;
    assert!(vault.lookup("x.png")?.is_ambiguous());
    assert_eq!(long_name(&vault, &vault.lookup("notes/x.png")?).as_deref(), Some("notes/x.png"));
    assert_eq!(long_name(&vault, &vault.lookup("media/x.png")?).as_deref(), Some("media/x.png"));

    let err = vault.find("x.png").unwrap_err();
    match err {
        Error::AmbiguousName { candidates, .. } => {
            let mut c = candidates;
            c.sort();
            assert_eq!(c, vec!["media/x.png", "notes/x.png"]);
        }
        other => panic!("expected AmbiguousName, got {other:?}"),
    }
    Ok(())
}

#[test]
fn root_member_of_a_group_is_reachable_by_path() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let root = temp.path();
    write(root, ".obsidian/app.json", "{}")?;
    write(root, "Index.md", "")?;
    write(root, "sub/Index.md", "")?;

    let vault = Vault::open(root)?;
    assert_eq!(long_name(&vault, &vault.resolve("/Index", None)?).as_deref(), Some("Index"));
    assert_eq!(long_name(&vault, &vault.resolve("sub/Index", None)?).as_deref(), Some("sub/Index"));
    Ok(())
}

#[test]
fn context_folder_picks_a_group_member() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let root = temp.path();
    write(root, ".obsidian/app.json", "{}")?;
    write(root, "a/Todo.md", "")?;
    write(root, "a/Plan.md", "[[Todo]]")?;
    write(root, "b/Todo.md", "")?;
    write(root, "c/Loose.md", "")?;

    let vault = Vault::open(root)?;
    let plan = vault.find("Plan")?;
    let loose = vault.find("Loose")?;

    assert_eq!(long_name(&vault, &vault.resolve_from("Todo", plan)?).as_deref(), Some("a/Todo"));
    assert!(vault.resolve_from("Todo", loose)?.is_ambiguous());
    assert!(vault.resolve("Todo", Some(plan))?.is_ambiguous());
    Ok(())
}
