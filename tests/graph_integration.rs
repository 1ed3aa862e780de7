use std::collections::BTreeSet;
use std::path::Path;

use obvault::{Error, TagMatch, Vault};

fn write(root: &Path, rel: &str, content: &str) -> anyhow::Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

fn sample_vault(root: &Path) -> anyhow::Result<()> {
    write(root, ".obsidian/app.json", "{}")?;
    write(root, "Deep.md", "Only here: #a/b/c\n")?;
    write(root, "Sibling.md", "---\ntags: [a/b/e]\n---\n")?;
    write(root, "Hub.md", "# Hub\n[[Deep]] [[Sibling|sib]] [[Deep#Part]] [[Someday]]\n")?;
    write(root, "notes/Reader.md", "Read [[Hub]] and ![[Deep]] and [[Someday]].\n")?;
    write(root, "notes/Self.md", "[[#Top]] and [[Self]]\n")?;
    Ok(())
}

#[test]
fn nested_tags_register_every_level() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    sample_vault(temp.path())?;

    let mut vault = Vault::open(temp.path())?;
    vault.ensure_all_parsed()?;
    let deep = vault.find("Deep")?;
    let sibling = vault.find("Sibling")?;

    let tags = vault.tag_index();
    for level in ["a", "a/b", "a/b/c"] {
        assert!(tags.contains(level, deep), "missing {level}");
    }
    assert!(tags.get("a/b/d").is_none());
    assert!(!tags.contains("a/b/e", deep));
    assert_eq!(tags.get("a/b"), Some(&BTreeSet::from([deep, sibling])));
    Ok(())
}

#[test]
fn tag_queries_combine_with_and_or() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    sample_vault(temp.path())?;

    let mut vault = Vault::open(temp.path())?;
    let deep = vault.find("Deep")?;
    let sibling = vault.find("Sibling")?;

    assert_eq!(vault.notes_with_tags(&["a/b/c", "a/b/e"], TagMatch::All)?, BTreeSet::new());
    assert_eq!(
        vault.notes_with_tags(&["a/b/c", "a/b/e"], TagMatch::Any)?,
        BTreeSet::from([deep, sibling])
    );
    assert_eq!(vault.notes_with_tags(&["#a", "a/b"], TagMatch::All)?.len(), 2);
    Ok(())
}

#[test]
fn tag_index_grows_only_as_notes_are_parsed() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    sample_vault(temp.path())?;

    let mut vault = Vault::open(temp.path())?;
    assert!(vault.tag_index().is_empty());

    let deep = vault.find("Deep")?;
    vault.parse(deep)?;
    assert_eq!(vault.tag_index().len(), 3);
    assert_eq!(vault.stats().parsed_notes, 1);

    vault.ensure_all_parsed()?;
    assert_eq!(vault.tag_index().len(), 4);
    assert_eq!(vault.ensure_all_parsed()?, 0);
    Ok(())
}

#[test]
fn backlinks_cover_links_embeds_and_placeholders() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    sample_vault(temp.path())?;

    let mut vault = Vault::open(temp.path())?;
    let hub = vault.find("Hub")?;
    let reader = vault.find("Reader")?;
    let own = vault.find("Self")?;

    assert_eq!(vault.backlinks("Deep")?, BTreeSet::from([hub, reader]));
    assert_eq!(vault.backlinks("Hub")?, BTreeSet::from([reader]));
    assert_eq!(vault.backlinks("Someday")?, BTreeSet::from([hub, reader]));
    assert!(vault.backlinks("Reader")?.is_empty());
    // `[[#Top]]` stays inside the note; `[[Self]]` names it.
    assert_eq!(vault.backlinks("Self")?, BTreeSet::from([own]));

    let occurrences = vault.backlink_links("Deep")?;
    assert_eq!(occurrences.len(), 3);
    assert!(occurrences.iter().any(|b| b.link.embed));
    assert!(occurrences.iter().any(|b| b.link.section() == Some("Part")));
    Ok(())
}

#[test]
fn backlinks_need_an_unambiguous_name() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let root = temp.path();
    write(root, ".obsidian/app.json", "{}")?;
    write(root, "x/Same.md", "")?;
    write(root, "y/Same.md", "")?;
    write(root, "y/Linker.md", "[[Same]]")?;

    let mut vault = Vault::open(root)?;
    assert!(matches!(vault.backlinks("Same"), Err(Error::AmbiguousName { .. })));

    let linker = vault.find("Linker")?;
    assert_eq!(vault.backlinks("y/Same")?, BTreeSet::from([linker]));
    assert!(vault.backlinks("x/Same")?.is_empty());
    Ok(())
}

#[test]
fn links_leaving_the_vault_are_rejected() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let root = temp.path();
    write(root, ".obsidian/app.json", "{}")?;
    write(root, "sub/Start.md", "[[../../outside]]")?;

    let vault = Vault::open(root)?;
    let start = vault.find("Start")?;
    let err = vault.resolve("../../outside", Some(start)).unwrap_err();
    assert!(matches!(err, Error::PathEscapesVault(_)));
    Ok(())
}
