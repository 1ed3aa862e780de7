use std::sync::LazyLock;

use pulldown_cmark::{Options, Parser, html};
use regex::{Captures, Regex};
use tracing::trace;

use super::rules::{
    self, AutoLinkRule, BlockComment, InlineCommentRule, InlineRule, PassthroughRule, TagRule,
    WikiLinkRule,
};
use crate::Link;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x02(\d+)\x03").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// Marks accumulated while one block of text runs through the rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseSession {
    pub tags: Vec<String>,
    pub links: Vec<Link>,
    pub comments: Vec<String>,
    pub headings: Vec<Heading>,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectOutput {
    pub session: ParseSession,
    pub html: String,
}

/// Spans already claimed by a rule. The text keeps an opaque
/// `\x02N\x03` token in their place so later rules cannot re-match them.
#[derive(Debug, Default)]
pub(crate) struct Stash {
    items: Vec<Stashed>,
}

#[derive(Debug)]
struct Stashed {
    source: String,
    html: String,
}

impl Stash {
    pub(crate) fn push(&mut self, source: &str, html: String) -> String {
        let ix = self.items.len();
        self.items.push(Stashed {
            source: source.to_string(),
            html,
        });
        format!("\u{2}{ix}\u{3}")
    }

    /// Put the original text back in place of every token.
    pub(crate) fn restore_source(&self, text: &str) -> String {
        self.restore(text, false)
    }

    fn restore_html(&self, text: &str) -> String {
        self.restore(text, true)
    }

    fn restore(&self, text: &str, as_html: bool) -> String {
        PLACEHOLDER
            .replace_all(text, |caps: &Captures<'_>| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|ix| self.items.get(ix))
                    .map(|s| if as_html { s.html.clone() } else { s.source.clone() })
                    .unwrap_or_default()
            })
            .into_owned()
    }
}

/// The dialect pipeline: the block comment pre-pass, headings, then the
/// inline rules in precedence order, then a plain markdown render.
#[derive(Debug)]
pub struct DialectProcessor {
    block_comment: BlockComment,
    inline: Vec<Box<dyn InlineRule>>,
}

impl Default for DialectProcessor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DialectProcessor {
    pub fn new(keep_comments: bool) -> Self {
        Self {
            block_comment: BlockComment {
                keep: keep_comments,
            },
            // Links first so their brackets and anchors are never read as
            // comments or tags; tags last.
            inline: vec![
                Box::new(WikiLinkRule),
                Box::new(PassthroughRule),
                Box::new(AutoLinkRule),
                Box::new(InlineCommentRule),
                Box::new(TagRule),
            ],
        }
    }

    pub fn process(&self, text: &str) -> DialectOutput {
        let mut session = ParseSession::default();
        let mut stash = Stash::default();

        // Fenced blocks go first so no rule, block comments included, can
        // reach into them.
        let text = stash_fences(text, &mut stash);
        let text = self.block_comment.run(text, &mut session, &mut stash);

        let mut lines = Vec::new();
        for line in text.split('\n') {
            if let Some((level, heading)) = rules::heading(line) {
                session.headings.push(Heading {
                    level,
                    text: stash.restore_source(&heading),
                });
            }
            lines.push(self.process_line(line, &mut session, &mut stash));
        }

        let markdown = stash.restore_html(&lines.join("\n"));
        DialectOutput {
            session,
            html: render_html(&markdown),
        }
    }

    fn process_line(&self, line: &str, session: &mut ParseSession, stash: &mut Stash) -> String {
        let mut out = String::with_capacity(line.len());
        for (is_code, segment) in split_code_spans(line) {
            if is_code {
                out.push_str(segment);
            } else {
                out.push_str(&self.process_segment(segment, session, stash));
            }
        }
        out
    }

    fn process_segment(&self, segment: &str, session: &mut ParseSession, stash: &mut Stash) -> String {
        let mut text = segment.to_string();
        for rule in &self.inline {
            text = rule
                .pattern()
                .replace_all(&text, |caps: &Captures<'_>| {
                    trace!(rule = rule.name(), matched = &caps[0], "dialect rule matched");
                    let html = rule.handle(caps, session, stash);
                    stash.push(&caps[0], html)
                })
                .into_owned();
        }
        text
    }
}

/// Replace every fenced code block, fences included, with one stash token
/// line. A fence left open runs to the end of the text.
fn stash_fences(text: &str, stash: &mut Stash) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    let mut fence: Option<char> = None;

    for line in text.split('\n') {
        match (fence, fence_marker(line)) {
            (None, Some(marker)) => {
                fence = Some(marker);
                block.push(line);
            }
            (None, None) => out.push(line.to_string()),
            (Some(open), Some(marker)) if open == marker => {
                block.push(line);
                let source = block.join("\n");
                out.push(stash.push(&source, source.clone()));
                block.clear();
                fence = None;
            }
            (Some(_), _) => block.push(line),
        }
    }
    if !block.is_empty() {
        let source = block.join("\n");
        out.push(stash.push(&source, source.clone()));
    }
    out.join("\n")
}

fn fence_marker(line: &str) -> Option<char> {
    let t = line.trim_start();
    if t.starts_with("```") {
        Some('`')
    } else if t.starts_with("~~~") {
        Some('~')
    } else {
        None
    }
}

/// Split a line into `(is_code, text)` runs; a code span opens with a run
/// of backticks and closes with a run of the same length.
fn split_code_spans(line: &str) -> Vec<(bool, &str)> {
    let bytes = line.as_bytes();
    let mut out = Vec::new();
    let mut last = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i] == b'`' {
            i += 1;
        }
        let run = i - start;

        let mut j = i;
        let mut close = None;
        while j < bytes.len() {
            if bytes[j] != b'`' {
                j += 1;
                continue;
            }
            let s = j;
            while j < bytes.len() && bytes[j] == b'`' {
                j += 1;
            }
            if j - s == run {
                close = Some(j);
                break;
            }
        }

        if let Some(end) = close {
            if start > last {
                out.push((false, &line[last..start]));
            }
            out.push((true, &line[start..end]));
            last = end;
            i = end;
        }
    }

    if last < line.len() {
        out.push((false, &line[last..]));
    }
    out
}

fn render_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let mut output = String::new();
    html::push_html(&mut output, Parser::new_ext(markdown, options));
    output
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
