//! The individual dialect rules. Each one matches a single class of mark,
//! records it in the [`ParseSession`] and returns the HTML that replaces
//! the matched span.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::dialect::{ParseSession, Stash, escape_html};
use crate::Link;

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^%{2,}(.*?)%{2,}").unwrap());

// At least one space after the marker run; `#tag` is not a heading.
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6}) +(.*?)(?: +#+)? *$").unwrap());

static WIKI_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!?\[\[(.*?)\]\]").unwrap());

// Generic markdown constructs that must reach the renderer untouched:
// `[text](url)` links and images, entities, and backslash escapes.
static PASSTHROUGH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!?\[[^\[\]\x02\x03]*\]\([^()\s\x02\x03]*\)|&#?[A-Za-z0-9]+;|\\[#%\[\]!`]").unwrap()
});

// A `%` only continues a URL when the next character is not another `%`,
// so a closing `%%` comment marker stays outside.
static AUTOLINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"<?([A-Za-z][A-Za-z0-9+.\-]*://(?:[^<>\s%\x02\x03]|%[^<>\s%\x02\x03])+)>?",
    )
    .unwrap()
});

static INLINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%%([^%]*%?[^%]*)%%").unwrap());

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#([^#\s\x02\x03]+)").unwrap());

/// A rule applied to one inline segment of text. Rules run in a fixed
/// order; spans claimed by an earlier rule are invisible to later ones.
pub(crate) trait InlineRule: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn pattern(&self) -> &Regex;

    /// Record the mark and return the replacement HTML (empty to drop the span).
    fn handle(&self, caps: &Captures<'_>, session: &mut ParseSession, stash: &Stash) -> String;
}

/// `%%` ... `%%` spanning lines, starting at the beginning of a line.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BlockComment {
    pub keep: bool,
}

impl BlockComment {
    pub(crate) fn run(&self, mut text: String, session: &mut ParseSession, stash: &mut Stash) -> String {
        loop {
            let (start, end, source, comment) = {
                let Some(caps) = BLOCK_COMMENT.captures(&text) else {
                    break;
                };
                let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
                    break;
                };
                (
                    whole.start(),
                    whole.end(),
                    stash.restore_source(whole.as_str()),
                    stash.restore_source(body.as_str().trim()),
                )
            };
            let html = if self.keep {
                format!(
                    "<!-- obsidian comment begin\n{}\nobsidian comment end -->",
                    comment.replace("--", "- -")
                )
            } else {
                String::new()
            };
            let placeholder = stash.push(&source, html);
            if !comment.is_empty() {
                session.comments.push(comment);
            }
            text = format!("{}\n{}\n{}", &text[..start], placeholder, &text[end..]);
        }
        text
    }
}

/// ATX heading line; returns `(level, text)`.
pub(crate) fn heading(line: &str) -> Option<(u8, String)> {
    let caps = HEADING.captures(line)?;
    let level = caps.get(1)?.as_str().len() as u8;
    let text = caps.get(2)?.as_str().trim();
    (!text.is_empty()).then(|| (level, text.to_string()))
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct WikiLinkRule;

impl InlineRule for WikiLinkRule {
    fn name(&self) -> &'static str {
        "wiki_link"
    }

    fn pattern(&self) -> &Regex {
        &WIKI_LINK
    }

    fn handle(&self, caps: &Captures<'_>, session: &mut ParseSession, _stash: &Stash) -> String {
        let label = caps.get(1).map_or("", |m| m.as_str());
        if label.trim().is_empty() {
            return String::new();
        }
        let embed = caps.get(0).is_some_and(|m| m.as_str().starts_with('!'));
        let link = Link::from_label(label, embed);

        let mut href = format!("/{}/", url_label(&link.target));
        if let Some(anchor) = &link.anchor {
            href.push('#');
            href.push_str(anchor);
        }
        let html = format!(
            "<a class=\"link\" href=\"{}\"{}>{}</a>",
            escape_html(&href),
            if embed { " embed=\"true\"" } else { "" },
            escape_html(link.display_text())
        );
        session.links.push(link);
        html
    }
}

/// Collapse runs of spaces (and spaces around underscores) into `_`.
fn url_label(label: &str) -> String {
    static SPACES: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"( +_)|(_ +)|( +)").unwrap());
    SPACES.replace_all(label, "_").into_owned()
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PassthroughRule;

impl InlineRule for PassthroughRule {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn pattern(&self) -> &Regex {
        &PASSTHROUGH
    }

    fn handle(&self, caps: &Captures<'_>, _session: &mut ParseSession, _stash: &Stash) -> String {
        caps.get(0).map_or_else(String::new, |m| m.as_str().to_string())
    }
}

/// Bare `scheme://...` URL; the surrounding `<>` is optional.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AutoLinkRule;

impl InlineRule for AutoLinkRule {
    fn name(&self) -> &'static str {
        "autolink"
    }

    fn pattern(&self) -> &Regex {
        &AUTOLINK
    }

    fn handle(&self, caps: &Captures<'_>, session: &mut ParseSession, _stash: &Stash) -> String {
        let url = caps.get(1).map_or("", |m| m.as_str());
        session.urls.push(url.to_string());
        let url = escape_html(url);
        format!("<a href=\"{url}\">{url}</a>")
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct InlineCommentRule;

impl InlineRule for InlineCommentRule {
    fn name(&self) -> &'static str {
        "inline_comment"
    }

    fn pattern(&self) -> &Regex {
        &INLINE_COMMENT
    }

    fn handle(&self, caps: &Captures<'_>, session: &mut ParseSession, stash: &Stash) -> String {
        let body = caps.get(1).map_or("", |m| m.as_str());
        let comment = stash.restore_source(body.trim());
        if !comment.is_empty() {
            session.comments.push(comment);
        }
        String::new()
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TagRule;

impl InlineRule for TagRule {
    fn name(&self) -> &'static str {
        "tag"
    }

    fn pattern(&self) -> &Regex {
        &TAG
    }

    fn handle(&self, caps: &Captures<'_>, session: &mut ParseSession, _stash: &Stash) -> String {
        let label = caps.get(1).map_or("", |m| m.as_str()).trim();
        if label.is_empty() {
            return String::new();
        }
        session.tags.push(label.to_string());
        let label = escape_html(label);
        format!("<a class=\"tag\" href=\"/tags/{label}/\">{label}</a>")
    }
}
