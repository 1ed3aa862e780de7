use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::fs::{OsFs, VaultFs};
use crate::graph::{self, Backlink, BacklinkTarget, TagIndex, TagMatch};
use crate::index::{self, NameIndex};
use crate::link_resolve::{Resolution, Resolver};
use crate::parse::{NoteParser, ParseResult};
use crate::settings::{self, VaultSettings};
use crate::{Entity, EntityId, Error, FileKind, Link, Result, VaultConfig};

/// Counts reported by [`Vault::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VaultStats {
    pub folders: usize,
    pub files: usize,
    pub notes: usize,
    pub duplicate_groups: usize,
    pub duplicated_files: usize,
    pub parsed_notes: usize,
    pub tags: usize,
}

/// An indexed vault. The file tree is walked once when the vault is
/// opened; notes are parsed on demand and folded into the tag index.
#[derive(Debug)]
pub struct Vault {
    root: PathBuf,
    name: String,
    cfg: VaultConfig,
    settings: VaultSettings,
    fs: Box<dyn VaultFs>,
    folders: Vec<PathBuf>,
    entities: Vec<Entity>,
    names: NameIndex,
    parser: NoteParser,
    parsed: BTreeMap<EntityId, ParseResult>,
    tags: TagIndex,
}

impl Vault {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(root, VaultConfig::default())
    }

    pub fn with_config(root: impl Into<PathBuf>, cfg: VaultConfig) -> Result<Self> {
        Self::with_fs(root, cfg, OsFs)
    }

    /// Open against any filesystem, e.g. [`crate::MemoryFs`] in tests.
    pub fn with_fs(
        root: impl Into<PathBuf>,
        cfg: VaultConfig,
        fs: impl VaultFs + 'static,
    ) -> Result<Self> {
        let root = root.into();
        if !fs.is_dir(&root) {
            return Err(Error::VaultNotFound(root));
        }
        let root = fs.canonicalize(&root)?;
        let settings = settings::load_settings(&fs, &root, &cfg)?;
        let name = root
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        if settings.use_markdown_links {
            warn!(vault = %root.display(), "vault uses plain markdown links; notes cannot be parsed");
        }

        let walk = index::walk(&fs, &cfg, &root)?;
        let entities: Vec<Entity> = walk
            .files
            .into_iter()
            .map(|p| Entity::from_path(&cfg, &root, p))
            .collect();
        let names = NameIndex::build(&entities);

        info!(
            vault = %root.display(),
            folders = walk.folders.len(),
            files = entities.len(),
            duplicate_groups = names.duplicates().len(),
            "vault indexed"
        );

        Ok(Self {
            parser: NoteParser::new(&cfg),
            root,
            name,
            cfg,
            settings,
            fs: Box::new(fs),
            folders: walk.folders,
            entities,
            names,
            parsed: BTreeMap::new(),
            tags: TagIndex::default(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name of the vault folder.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &VaultConfig {
        &self.cfg
    }

    pub fn settings(&self) -> &VaultSettings {
        &self.settings
    }

    pub fn uses_markdown_links(&self) -> bool {
        self.settings.use_markdown_links
    }

    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }

    /// Every indexed file, in traversal order.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.entities.iter().filter_map(Entity::path)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(ix, e)| (EntityId(ix), e))
    }

    pub fn list_entities(&self, kind: Option<FileKind>) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities()
            .filter(move |(_, e)| kind.is_none_or(|k| e.kind() == k))
    }

    pub fn list_notes(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.list_entities(Some(FileKind::Note))
    }

    /// Duplicate-name groups keyed by the shared short name.
    pub fn same_names(&self) -> BTreeMap<&str, Vec<&Entity>> {
        self.names
            .duplicates()
            .iter()
            .map(|(name, ids)| {
                let members = ids.iter().map(|id| &self.entities[id.0]).collect();
                (name.as_str(), members)
            })
            .collect()
    }

    /// File counts per lower-cased extension; files without one count as "".
    pub fn count_by_extension(&self) -> BTreeMap<String, usize> {
        let mut out = BTreeMap::new();
        for e in &self.entities {
            *out.entry(e.extension()).or_insert(0) += 1;
        }
        out
    }

    pub fn stats(&self) -> VaultStats {
        let dups = self.names.duplicates();
        VaultStats {
            folders: self.folders.len(),
            files: self.entities.len(),
            notes: self.list_notes().count(),
            duplicate_groups: dups.len(),
            duplicated_files: dups.values().map(Vec::len).sum(),
            parsed_notes: self.parsed.len(),
            tags: self.tags.len(),
        }
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver {
            root: &self.root,
            cfg: &self.cfg,
            entities: &self.entities,
            names: &self.names,
        }
    }

    /// Look a name up without a linking note. Accepts short names, vault
    /// paths (`work/Project`) and note file names (`Project.md`); the result
    /// is a placeholder only when nothing on disk matches.
    pub fn lookup(&self, name: &str) -> Result<Resolution> {
        self.resolver().lookup(name)
    }

    /// Resolve a raw wiki-link label (`target#anchor|alias`). `from` is the
    /// note the link is written in; it anchors empty and `./` targets.
    pub fn resolve(&self, label: &str, from: Option<EntityId>) -> Result<Resolution> {
        self.resolver().resolve_link(&Link::parse(label), from)
    }

    /// Like [`Vault::resolve`], then settle a duplicate group by the
    /// folder of `from`.
    pub fn resolve_from(&self, label: &str, from: EntityId) -> Result<Resolution> {
        self.resolver().resolve_from(&Link::parse(label).target, from)
    }

    /// Exactly one existing entity, or an error naming why not.
    pub fn find(&self, name: &str) -> Result<EntityId> {
        match self.lookup(name)? {
            Resolution::Entity(id) => Ok(id),
            Resolution::Ambiguous { name, candidates } => Err(Error::AmbiguousName {
                candidates: self.resolver().candidate_names(&candidates),
                name,
            }),
            Resolution::Placeholder(e) => Err(Error::NoteMissing(e.name().to_string())),
        }
    }

    /// Parse a note once and fold its tags into the tag index. Later calls
    /// return the cached result until [`Vault::invalidate`].
    pub fn parse(&mut self, id: EntityId) -> Result<&ParseResult> {
        let entity = self
            .entities
            .get(id.0)
            .ok_or_else(|| Error::NoteMissing(format!("#{}", id.0)))?;
        if !entity.is_note() {
            return Err(Error::NotANote(entity.long_name().to_string()));
        }
        if self.settings.use_markdown_links {
            return Err(Error::PlainLinkModeUnsupported(entity.long_name().to_string()));
        }
        if self.parsed.contains_key(&id) {
            return Ok(&self.parsed[&id]);
        }

        let path = entity
            .path()
            .ok_or_else(|| Error::NoteMissing(entity.long_name().to_string()))?;
        let text = match self.fs.read_to_string(path) {
            Ok(text) => text,
            Err(Error::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NoteMissing(entity.long_name().to_string()));
            }
            Err(err) => return Err(err),
        };
        let result = self.parser.parse_text(path, &text)?;

        let tags = result.all_tags();
        let added = self.tags.register_note(id, tags.iter().map(String::as_str));
        debug!(
            note = entity.long_name(),
            tags = tags.len(),
            links = result.links.len(),
            comments = result.comments.len(),
            new_memberships = added,
            "parsed note"
        );

        Ok(self.parsed.entry(id).or_insert(result))
    }

    /// Parse by name; see [`Vault::find`].
    pub fn parse_name(&mut self, name: &str) -> Result<&ParseResult> {
        let id = self.find(name)?;
        self.parse(id)
    }

    pub fn parsed(&self, id: EntityId) -> Option<&ParseResult> {
        self.parsed.get(&id)
    }

    pub fn is_parsed(&self, id: EntityId) -> bool {
        self.parsed.contains_key(&id)
    }

    /// Parse every note not parsed yet; returns how many were parsed now.
    ///
    /// A note that fails on its own (bad front-matter, vanished file) is
    /// logged and skipped. Plain markdown link mode fails the whole call.
    pub fn ensure_all_parsed(&mut self) -> Result<usize> {
        if self.settings.use_markdown_links {
            return Err(Error::PlainLinkModeUnsupported(self.name.clone()));
        }
        let pending: Vec<EntityId> = self
            .list_notes()
            .map(|(id, _)| id)
            .filter(|id| !self.parsed.contains_key(id))
            .collect();

        let mut parsed = 0;
        for id in pending {
            match self.parse(id) {
                Ok(_) => parsed += 1,
                Err(err) => warn!(note = self.entities[id.0].long_name(), error = %err, "note skipped"),
            }
        }
        Ok(parsed)
    }

    /// Drop one cached parse. Tag memberships it contributed stay.
    pub fn invalidate(&mut self, id: EntityId) -> bool {
        self.parsed.remove(&id).is_some()
    }

    /// Drop every cached parse and the whole tag index.
    pub fn reset_index(&mut self) {
        self.parsed.clear();
        self.tags.clear();
    }

    /// Tag memberships of the notes parsed so far.
    pub fn tag_index(&self) -> &TagIndex {
        &self.tags
    }

    pub fn notes_with_tags<S: AsRef<str>>(
        &mut self,
        tags: &[S],
        mode: TagMatch,
    ) -> Result<BTreeSet<EntityId>> {
        self.ensure_all_parsed()?;
        Ok(self.tags.notes_matching(tags, mode))
    }

    /// Notes linking to `name`, which may also name a note that does not
    /// exist yet. Parses every note first.
    pub fn backlinks(&mut self, name: &str) -> Result<BTreeSet<EntityId>> {
        Ok(self
            .backlink_links(name)?
            .into_iter()
            .map(|b| b.source)
            .collect())
    }

    /// Every link occurrence behind [`Vault::backlinks`], grouped by source.
    pub fn backlink_links(&mut self, name: &str) -> Result<Vec<Backlink>> {
        let target = match self.lookup(name)? {
            Resolution::Entity(id) => BacklinkTarget::Entity(id),
            Resolution::Placeholder(e) => BacklinkTarget::Placeholder(e.name().to_string()),
            Resolution::Ambiguous { name, candidates } => {
                return Err(Error::AmbiguousName {
                    candidates: self.resolver().candidate_names(&candidates),
                    name,
                });
            }
        };
        self.ensure_all_parsed()?;

        let parsed = self.parsed.iter().map(|(id, r)| (*id, r));
        Ok(graph::scan_backlinks(&self.resolver(), parsed, &target))
    }
}
