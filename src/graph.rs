use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::link_resolve::{Resolution, Resolver};
use crate::parse::ParseResult;
use crate::{EntityId, Link};

/// How [`TagIndex::notes_matching`] combines several tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagMatch {
    /// Notes carrying every tag.
    #[default]
    All,
    /// Notes carrying at least one tag.
    Any,
}

/// Flat tag → notes membership. A note tagged `a/b/c` is registered under
/// `a`, `a/b` and `a/b/c`, so any level answers with one lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagIndex {
    tags: BTreeMap<String, BTreeSet<EntityId>>,
}

impl TagIndex {
    pub fn get(&self, tag: &str) -> Option<&BTreeSet<EntityId>> {
        self.tags.get(normalize_tag(tag)?.as_str())
    }

    pub fn contains(&self, tag: &str, note: EntityId) -> bool {
        self.get(tag).is_some_and(|set| set.contains(&note))
    }

    pub fn tags(&self) -> impl Iterator<Item = (&str, &BTreeSet<EntityId>)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Register `note` under every tag and each of its ancestors. Returns
    /// how many memberships were new; registering again adds nothing.
    pub(crate) fn register_note<'t>(
        &mut self,
        note: EntityId,
        tags: impl IntoIterator<Item = &'t str>,
    ) -> usize {
        let mut added = 0;
        for tag in tags {
            let Some(tag) = normalize_tag(tag) else {
                continue;
            };
            for prefix in ancestors(&tag) {
                if self.tags.entry(prefix.to_string()).or_default().insert(note) {
                    added += 1;
                }
            }
        }
        added
    }

    pub(crate) fn clear(&mut self) {
        self.tags.clear();
    }

    /// An empty query matches nothing.
    pub fn notes_matching<S: AsRef<str>>(&self, tags: &[S], mode: TagMatch) -> BTreeSet<EntityId> {
        let mut sets = tags.iter().map(|t| self.get(t.as_ref()));
        let Some(first) = sets.next() else {
            return BTreeSet::new();
        };
        let mut out = first.cloned().unwrap_or_default();
        for set in sets {
            match (mode, set) {
                (TagMatch::All, Some(s)) => out.retain(|id| s.contains(id)),
                (TagMatch::All, None) => out.clear(),
                (TagMatch::Any, Some(s)) => out.extend(s.iter().copied()),
                (TagMatch::Any, None) => {}
            }
        }
        out
    }
}

/// Drop a leading `#` and stray separators: `#a//b/` becomes `a/b`.
pub(crate) fn normalize_tag(tag: &str) -> Option<String> {
    let tag = tag.trim();
    let tag = tag.strip_prefix('#').unwrap_or(tag);
    let joined = tag
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    (!joined.is_empty()).then_some(joined)
}

fn ancestors(tag: &str) -> impl Iterator<Item = &str> {
    tag.match_indices('/')
        .map(|(ix, _)| &tag[..ix])
        .chain(std::iter::once(tag))
}

/// What a back-link query asks about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BacklinkTarget {
    Entity(EntityId),
    /// A note that does not exist yet, by name.
    Placeholder(String),
}

/// One link in `source` that resolves to the queried target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backlink {
    pub source: EntityId,
    pub link: Link,
}

/// Re-resolve every link of every parsed note against the current name
/// state. Links into the same document (`[[#Heading]]`) are not back-links.
pub(crate) fn scan_backlinks<'p>(
    resolver: &Resolver<'_>,
    parsed: impl IntoIterator<Item = (EntityId, &'p ParseResult)>,
    target: &BacklinkTarget,
) -> Vec<Backlink> {
    let mut out = Vec::new();
    for (source, result) in parsed {
        for link in &result.links {
            if link.points_to_self() {
                continue;
            }
            let res = match resolver.resolve_from(&link.target, source) {
                Ok(res) => res,
                Err(err) => {
                    debug!(link = %link.target, error = %err, "skipping unresolvable link");
                    continue;
                }
            };
            let hit = match (&res, target) {
                (Resolution::Entity(id), BacklinkTarget::Entity(want)) => id == want,
                (Resolution::Placeholder(e), BacklinkTarget::Placeholder(want)) => e.name() == want,
                _ => false,
            };
            if hit {
                out.push(Backlink {
                    source,
                    link: link.clone(),
                });
            }
        }
    }
    out.sort_by_key(|b| b.source);
    out
}
