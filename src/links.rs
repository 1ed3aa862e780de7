/// Size hint on an embed, e.g. `![[img.png|100x200]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmbedSize {
    pub width: u32,
    pub height: Option<u32>,
}

/// A wiki link parsed from its raw label (`target#anchor|alias`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    /// Label as written between the brackets, with `\|` unescaped.
    pub raw: String,
    /// Empty when the link points into the current document.
    pub target: String,
    pub anchor: Option<String>,
    pub alias: Option<String>,
    pub size: Option<EmbedSize>,
    pub embed: bool,
}

impl Link {
    pub fn parse(label: &str) -> Self {
        Self::from_label(label, false)
    }

    pub fn parse_embed(label: &str) -> Self {
        Self::from_label(label, true)
    }

    pub(crate) fn from_label(label: &str, embed: bool) -> Self {
        let raw = label.trim().replace("\\|", "|");

        let (target_part, alias) = match raw.split_once('|') {
            Some((t, a)) => (t, non_empty(a)),
            None => (raw.as_str(), None),
        };

        let (target, anchor) = match target_part.split_once('#') {
            Some((t, a)) => (t.trim().to_string(), non_empty(a)),
            None => (target_part.trim().to_string(), None),
        };

        let (alias, size) = match alias {
            Some(a) if embed => match parse_size(&a) {
                Some(size) => (None, Some(size)),
                None => (Some(a), None),
            },
            other => (other, None),
        };
        let alias = alias.or_else(|| anchor.clone());

        Self {
            raw,
            target,
            anchor,
            alias,
            size,
            embed,
        }
    }

    /// Heading anchor, if the anchor is not a block reference.
    pub fn section(&self) -> Option<&str> {
        self.anchor.as_deref().filter(|a| !a.starts_with('^'))
    }

    /// Block id without the leading `^`.
    pub fn block_id(&self) -> Option<&str> {
        self.anchor.as_deref().and_then(|a| a.strip_prefix('^'))
    }

    pub fn points_to_self(&self) -> bool {
        self.target.is_empty()
    }

    pub fn display_text(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.target)
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn parse_size(s: &str) -> Option<EmbedSize> {
    let (w, h) = match s.split_once('x') {
        Some((w, h)) => (w, Some(h)),
        None => (s, None),
    };
    let width = w.trim().parse().ok()?;
    let height = match h {
        Some(h) => Some(h.trim().parse().ok()?),
        None => None,
    };
    Some(EmbedSize { width, height })
}
