mod config;
mod entity;
mod error;
mod fs;
mod graph;
mod index;
mod link_resolve;
mod links;
mod parse;
mod settings;
mod vault;

pub use crate::config::VaultConfig;
pub use crate::entity::{Entity, EntityId, FileKind};
pub use crate::error::{Error, Result};
pub use crate::fs::{DirEntry, MemoryFs, OsFs, VaultFs};
pub use crate::graph::{Backlink, BacklinkTarget, TagIndex, TagMatch};
pub use crate::link_resolve::Resolution;
pub use crate::links::{EmbedSize, Link};
pub use crate::parse::{
    DialectOutput, DialectProcessor, Frontmatter, Heading, NoteParser, ParseResult, ParseSession,
};
pub use crate::settings::VaultSettings;
pub use crate::vault::{Vault, VaultStats};
