use std::path::{Path, PathBuf};

use crate::fs::normalize_lexically;
use crate::index::{NameHit, NameIndex};
use crate::{Entity, EntityId, Error, Link, Result, VaultConfig};

/// Outcome of looking up a name or following a link.
///
/// A duplicate group is not an error: the caller decides, usually by the
/// folder of the note the link was written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Entity(EntityId),
    Ambiguous {
        name: String,
        candidates: Vec<EntityId>,
    },
    /// A note the vault does not contain yet.
    Placeholder(Entity),
}

impl Resolution {
    pub fn entity_id(&self) -> Option<EntityId> {
        match self {
            Resolution::Entity(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Resolution::Ambiguous { .. })
    }
}

/// Read-only view over a vault's identity space.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Resolver<'a> {
    pub root: &'a Path,
    pub cfg: &'a VaultConfig,
    pub entities: &'a [Entity],
    pub names: &'a NameIndex,
}

impl<'a> Resolver<'a> {
    /// A name typed without a linking note: short name, duplicate group,
    /// vault path, then the name without its note extension. Only when all
    /// of these miss is the result a placeholder.
    pub(crate) fn lookup(&self, name: &str) -> Result<Resolution> {
        self.resolve(name, None)
    }

    /// Follow the target part of a link written in `from`. An empty target
    /// is the note itself.
    pub(crate) fn resolve(&self, target: &str, from: Option<EntityId>) -> Result<Resolution> {
        let target = target.trim();
        if target.is_empty() {
            return match from {
                Some(id) => Ok(Resolution::Entity(id)),
                None => Err(Error::EmptyName),
            };
        }

        if let Some(res) = self.hit(target) {
            return Ok(res);
        }

        if target.contains('/') {
            if let Some(res) = self.resolve_path(target, from)? {
                return Ok(res);
            }
        } else if let Some(stem) = self.strip_note_extension(target) {
            if let Some(res) = self.hit(stem) {
                return Ok(res);
            }
        }

        self.placeholder(target)
    }

    pub(crate) fn resolve_link(&self, link: &Link, from: Option<EntityId>) -> Result<Resolution> {
        self.resolve(&link.target, from)
    }

    /// [`Resolver::resolve`], then settle a duplicate group by the folder
    /// of `from` when exactly one member lives there.
    pub(crate) fn resolve_from(&self, target: &str, from: EntityId) -> Result<Resolution> {
        let res = self.resolve(target, Some(from))?;
        Ok(self.prefer_context(res, from))
    }

    pub(crate) fn prefer_context(&self, res: Resolution, from: EntityId) -> Resolution {
        let Resolution::Ambiguous { name, candidates } = res else {
            return res;
        };
        let Some(ctx) = self.entities.get(from.0) else {
            return Resolution::Ambiguous { name, candidates };
        };
        let folder = ctx.parent(self.root);

        let same_dir: Vec<EntityId> = candidates
            .iter()
            .copied()
            .filter(|id| self.entities[id.0].parent(self.root) == folder)
            .collect();
        match same_dir.as_slice() {
            [only] => Resolution::Entity(*only),
            _ => Resolution::Ambiguous { name, candidates },
        }
    }

    /// Long names of a duplicate group, for error reporting.
    pub(crate) fn candidate_names(&self, candidates: &[EntityId]) -> Vec<String> {
        candidates
            .iter()
            .map(|id| self.entities[id.0].long_name().to_string())
            .collect()
    }

    fn hit(&self, name: &str) -> Option<Resolution> {
        match self.names.get(name) {
            NameHit::Unique(id) => Some(Resolution::Entity(id)),
            NameHit::Group(group) => Some(Resolution::Ambiguous {
                name: name.to_string(),
                candidates: group.to_vec(),
            }),
            NameHit::Absent => None,
        }
    }

    /// `./x` and `../x` are relative to the folder of `from`; anything else
    /// is relative to the vault root, with a leading `/` rebased onto it.
    fn resolve_path(&self, target: &str, from: Option<EntityId>) -> Result<Option<Resolution>> {
        let base: PathBuf = match from.and_then(|id| self.entities.get(id.0)) {
            Some(ctx) if target.starts_with("./") || target.starts_with("../") => {
                ctx.parent(self.root).to_path_buf()
            }
            _ => self.root.to_path_buf(),
        };
        let abs = normalize_lexically(&base.join(target.trim_start_matches('/')));
        if !abs.starts_with(self.root) {
            return Err(Error::PathEscapesVault(abs));
        }

        let rel = abs
            .strip_prefix(self.root)
            .map_err(|_| Error::PathEscapesVault(abs.clone()))?;
        let long = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if let NameHit::Unique(id) = self.names.get(&long) {
            return Ok(Some(Resolution::Entity(id)));
        }
        if let Some(stem) = self.strip_note_extension(&long) {
            if let NameHit::Unique(id) = self.names.get(stem) {
                return Ok(Some(Resolution::Entity(id)));
            }
        }

        if rel.as_os_str().is_empty() {
            return Ok(None);
        }
        let Some(short) = abs.file_name().map(|s| s.to_string_lossy().to_string()) else {
            return Ok(None);
        };
        let short = self
            .strip_note_extension(&short)
            .map(str::to_string)
            .unwrap_or(short);
        let folder = abs.parent().unwrap_or(self.root);

        Ok(match self.names.get(&short) {
            NameHit::Unique(id) => Some(Resolution::Entity(id)),
            NameHit::Group(group) => {
                let member = group
                    .iter()
                    .copied()
                    .find(|id| self.entities[id.0].parent(self.root) == folder);
                Some(match member {
                    Some(id) => Resolution::Entity(id),
                    None => Resolution::Ambiguous {
                        name: short,
                        candidates: group.to_vec(),
                    },
                })
            }
            NameHit::Absent => None,
        })
    }

    fn strip_note_extension<'s>(&self, name: &'s str) -> Option<&'s str> {
        let (stem, ext) = name.rsplit_once('.')?;
        let is_note = self
            .cfg
            .note_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext));
        (is_note && !stem.is_empty()).then_some(stem)
    }

    fn placeholder(&self, name: &str) -> Result<Resolution> {
        let name = self.strip_note_extension(name).unwrap_or(name);
        Entity::placeholder(name)
            .map(Resolution::Placeholder)
            .ok_or(Error::EmptyName)
    }
}
