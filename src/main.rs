use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use obvault::{FileKind, Resolution, TagMatch, Vault, VaultConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Note,
    Image,
    Audio,
    Video,
    Pdf,
    Other,
}

impl From<KindArg> for FileKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Note => FileKind::Note,
            KindArg::Image => FileKind::Image,
            KindArg::Audio => FileKind::Audio,
            KindArg::Video => FileKind::Video,
            KindArg::Pdf => FileKind::Pdf,
            KindArg::Other => FileKind::Other,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "obv", version, about = "Obsidian vault indexer and link/tag graph CLI")]
struct Cli {
    /// Path to the Obsidian vault.
    #[arg(long, env = "OBSIDIAN_VAULT", global = true)]
    vault: Option<PathBuf>,

    /// TOML file overriding the indexer configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List notes (or other files) by folder, kind and tag.
    Ls {
        /// Include every file, not only notes.
        #[arg(long)]
        all: bool,
        /// Only files of this kind.
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        /// Only notes carrying this tag; repeatable.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Match any of the given tags instead of all of them.
        #[arg(long)]
        any: bool,
        /// Folder (relative to the vault root) to list recursively.
        folder: Option<PathBuf>,
    },
    /// Print folder/file/duplicate counts.
    Stat {
        /// List every group of files sharing a short name.
        #[arg(long)]
        same_names: bool,
        /// Parse every note and report the tag count.
        #[arg(long)]
        tags: bool,
    },
    /// Parse every note and print each tag with its note count.
    Tags,
    /// Notes linking to NAME.
    Backlinks { name: String },
    /// Resolve a wiki-link label.
    Resolve {
        label: String,
        /// Note the link is written in.
        #[arg(long)]
        from: Option<String>,
    },
    /// Parse one note and print its marks.
    Parse {
        name: String,
        /// Also print the rendered HTML.
        #[arg(long)]
        html: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut vault = open_vault(cli.vault, cli.config.as_deref())?;

    match cli.command {
        Command::Ls {
            all,
            kind,
            tags,
            any,
            folder,
        } => handle_ls(&mut vault, all, kind, &tags, any, folder)?,
        Command::Stat { same_names, tags } => handle_stat(&mut vault, same_names, tags)?,
        Command::Tags => handle_tags(&mut vault)?,
        Command::Backlinks { name } => {
            for id in vault.backlinks(&name)? {
                if let Some(e) = vault.entity(id) {
                    println!("{}", e.long_name());
                }
            }
        }
        Command::Resolve { label, from } => handle_resolve(&vault, &label, from.as_deref())?,
        Command::Parse { name, html } => handle_parse(&mut vault, &name, html)?,
    }

    Ok(())
}

fn open_vault(vault: Option<PathBuf>, config: Option<&Path>) -> anyhow::Result<Vault> {
    let root = require_vault(vault)?;
    let cfg = match config {
        Some(path) => VaultConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => VaultConfig::default(),
    };
    Vault::with_config(&root, cfg).with_context(|| format!("opening vault {}", root.display()))
}

fn require_vault(vault: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    vault.ok_or_else(|| anyhow::anyhow!("--vault is required (or set OBSIDIAN_VAULT)"))
}

fn handle_ls(
    vault: &mut Vault,
    all: bool,
    kind: Option<KindArg>,
    tags: &[String],
    any: bool,
    folder: Option<PathBuf>,
) -> anyhow::Result<()> {
    let kind = match (kind, all) {
        (Some(k), _) => Some(k.into()),
        (None, true) => None,
        (None, false) => Some(FileKind::Note),
    };
    let tagged = if tags.is_empty() {
        None
    } else {
        let mode = if any { TagMatch::Any } else { TagMatch::All };
        Some(vault.notes_with_tags(tags, mode)?)
    };
    let folder = folder.map(|f| vault.root().join(f));

    for (id, e) in vault.list_entities(kind) {
        if folder.as_deref().is_some_and(|f| !e.in_folder(f)) {
            continue;
        }
        if tagged.as_ref().is_some_and(|set| !set.contains(&id)) {
            continue;
        }
        println!("{}", e.long_name());
    }
    Ok(())
}

fn handle_stat(vault: &mut Vault, same_names: bool, tags: bool) -> anyhow::Result<()> {
    if tags {
        vault.ensure_all_parsed()?;
    }
    let s = vault.stats();

    println!("vault: {}", vault.name());
    println!("  folders: {}", s.folders);
    println!("  files: {}", s.files);
    println!("  notes: {}", s.notes);
    println!("  duplicate names: {}", s.duplicate_groups);
    if tags {
        println!("  tags: {}", s.tags);
    }
    if vault.uses_markdown_links() {
        println!("  link mode: markdown (notes cannot be parsed)");
    }

    println!("\nby extension:");
    for (ext, n) in vault.count_by_extension() {
        let ext = if ext.is_empty() { "(none)" } else { ext.as_str() };
        println!("  {ext}: {n}");
    }

    if same_names {
        println!("\nsame names:");
        for (name, members) in vault.same_names() {
            println!("  {name}");
            for e in members {
                println!("    - {}", e.long_name());
            }
        }
    }
    Ok(())
}

fn handle_tags(vault: &mut Vault) -> anyhow::Result<()> {
    vault.ensure_all_parsed()?;
    for (tag, notes) in vault.tag_index().tags() {
        println!("{}\t#{tag}", notes.len());
    }
    Ok(())
}

fn handle_resolve(vault: &Vault, label: &str, from: Option<&str>) -> anyhow::Result<()> {
    let res = match from {
        Some(from) => {
            let from = vault.find(from)?;
            vault.resolve_from(label, from)?
        }
        None => vault.resolve(label, None)?,
    };

    match res {
        Resolution::Entity(id) => {
            let e = vault
                .entity(id)
                .ok_or_else(|| anyhow::anyhow!("stale entity id {}", id.index()))?;
            println!("{}\t{}", e.long_name(), e.kind());
        }
        Resolution::Ambiguous { name, candidates } => {
            println!("ambiguous: {name}");
            for id in candidates {
                if let Some(e) = vault.entity(id) {
                    println!("  - {}", e.long_name());
                }
            }
        }
        Resolution::Placeholder(e) => println!("{}\tnot created", e.name()),
    }
    Ok(())
}

fn handle_parse(vault: &mut Vault, name: &str, html: bool) -> anyhow::Result<()> {
    let res = vault.parse_name(name)?;

    println!("note: {}", res.path.display());
    if !res.frontmatter.is_empty() {
        let keys: Vec<&str> = res.frontmatter.keys().map(String::as_str).collect();
        println!("frontmatter: {}", keys.join(", "));
    }
    for h in &res.headings {
        println!("heading\t{}\t{}", h.level, h.text);
    }
    for tag in res.all_tags() {
        println!("tag\t#{tag}");
    }
    for link in &res.links {
        let kind = if link.embed { "embed" } else { "link" };
        println!("{kind}\t{}", link.raw);
    }
    for url in &res.urls {
        println!("url\t{url}");
    }
    for c in &res.comments {
        println!("comment\t{}", c.replace('\n', " "));
    }
    if html {
        println!("\n{}", res.html);
    }
    Ok(())
}
