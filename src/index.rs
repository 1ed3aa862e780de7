use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::{Path, PathBuf};

use tracing::{trace, warn};

use crate::fs::VaultFs;
use crate::{Entity, EntityId, Result, VaultConfig};

/// Folders and regular files of a vault in breadth-first order.
#[derive(Debug, Clone, Default)]
pub(crate) struct Walk {
    pub folders: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
}

/// Breadth-first traversal from `root`. Dot-entries and configured ignore
/// directories are skipped together with everything beneath them.
pub(crate) fn walk(fs: &dyn VaultFs, cfg: &VaultConfig, root: &Path) -> Result<Walk> {
    let mut out = Walk::default();
    let mut queue = VecDeque::from([root.to_path_buf()]);

    while let Some(dir) = queue.pop_front() {
        for entry in fs.read_dir(&dir)? {
            if entry.name.starts_with('.') {
                trace!(path = %entry.path.display(), "skipping hidden entry");
                continue;
            }
            if entry.is_dir {
                if cfg.is_ignored_dir(&entry.name) {
                    trace!(path = %entry.path.display(), "skipping ignored directory");
                    continue;
                }
                out.folders.push(entry.path.clone());
                queue.push_back(entry.path);
            } else {
                out.files.push(entry.path);
            }
        }
    }

    Ok(out)
}

/// What a bare name maps to in the [`NameIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NameHit<'a> {
    Unique(EntityId),
    Group(&'a [EntityId]),
    Absent,
}

/// Name-addressable view over the entity arena.
///
/// Every entity is either in `primary` under its short name, or in
/// `duplicates` under its short name and additionally in `qualified`
/// under its long name.
#[derive(Debug, Clone, Default)]
pub(crate) struct NameIndex {
    primary: HashMap<String, EntityId>,
    qualified: HashMap<String, EntityId>,
    duplicates: BTreeMap<String, Vec<EntityId>>,
}

impl NameIndex {
    pub(crate) fn build(entities: &[Entity]) -> Self {
        let mut idx = Self::default();
        for (ix, entity) in entities.iter().enumerate() {
            idx.insert(EntityId(ix), entities, entity);
        }
        idx
    }

    fn insert(&mut self, id: EntityId, entities: &[Entity], entity: &Entity) {
        let name = entity.name();

        if let Some(group) = self.duplicates.get_mut(name) {
            group.push(id);
            self.insert_qualified(id, entity);
            return;
        }

        match self.primary.remove(name) {
            Some(first) => {
                // Second sighting: demote the short name, re-key the first member.
                let first_entity = &entities[first.0];
                warn!(
                    name,
                    first = first_entity.long_name(),
                    second = entity.long_name(),
                    "duplicate name"
                );
                self.duplicates.insert(name.to_string(), vec![first, id]);
                self.insert_qualified(first, first_entity);
                self.insert_qualified(id, entity);
            }
            None => {
                self.primary.insert(name.to_string(), id);
            }
        }
    }

    fn insert_qualified(&mut self, id: EntityId, entity: &Entity) {
        if let Some(prev) = self.qualified.get(entity.long_name()) {
            warn!(
                long_name = entity.long_name(),
                kept = prev.0,
                dropped = id.0,
                "two entries share a path-qualified name; keeping the first"
            );
            return;
        }
        self.qualified.insert(entity.long_name().to_string(), id);
    }

    pub(crate) fn get(&self, name: &str) -> NameHit<'_> {
        if let Some(id) = self.primary.get(name) {
            return NameHit::Unique(*id);
        }
        if let Some(group) = self.duplicates.get(name) {
            return NameHit::Group(group);
        }
        if let Some(id) = self.qualified.get(name) {
            return NameHit::Unique(*id);
        }
        NameHit::Absent
    }

    pub(crate) fn duplicates(&self) -> &BTreeMap<String, Vec<EntityId>> {
        &self.duplicates
    }

    #[cfg(test)]
    pub(crate) fn primary_len(&self) -> usize {
        self.primary.len()
    }
}
