mod dialect;
mod frontmatter;
mod rules;

use std::path::{Path, PathBuf};

pub use dialect::{DialectOutput, DialectProcessor, Heading, ParseSession};
pub use frontmatter::Frontmatter;

use crate::{Link, Result, VaultConfig};

/// Everything extracted from one note. Body tags and front-matter tags are
/// kept apart; the vault merges them when it indexes the note.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    pub path: PathBuf,
    /// Body text with the front-matter block removed.
    pub content: String,
    pub frontmatter: Frontmatter,
    pub tags: Vec<String>,
    pub links: Vec<Link>,
    pub comments: Vec<String>,
    pub headings: Vec<Heading>,
    pub urls: Vec<String>,
    pub html: String,
}

impl ParseResult {
    pub fn link_labels(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(|l| l.raw.as_str())
    }

    pub fn frontmatter_tags(&self) -> Vec<String> {
        frontmatter::frontmatter_tags(&self.frontmatter)
    }

    /// Body tags followed by front-matter tags, first occurrence wins.
    pub fn all_tags(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for tag in self.tags.iter().cloned().chain(self.frontmatter_tags()) {
            if !out.contains(&tag) {
                out.push(tag);
            }
        }
        out
    }
}

/// Front-matter split plus one run of the dialect pipeline. Pure: it never
/// touches the vault's indexes.
#[derive(Debug, Default)]
pub struct NoteParser {
    dialect: DialectProcessor,
}

impl NoteParser {
    pub fn new(cfg: &VaultConfig) -> Self {
        Self {
            dialect: DialectProcessor::new(cfg.keep_comments),
        }
    }

    pub fn parse_text(&self, path: &Path, text: &str) -> Result<ParseResult> {
        let (frontmatter, body) = frontmatter::parse_frontmatter(path, text)?;
        let DialectOutput { session, html } = self.dialect.process(body);

        Ok(ParseResult {
            path: path.to_path_buf(),
            content: body.to_string(),
            frontmatter,
            tags: session.tags,
            links: session.links,
            comments: session.comments,
            headings: session.headings,
            urls: session.urls,
            html,
        })
    }
}
