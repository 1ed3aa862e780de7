use std::collections::BTreeMap;
use std::path::Path;

use crate::{Error, Result};

pub type Frontmatter = BTreeMap<String, serde_yaml::Value>;

/// Split a leading `---` fenced YAML block from the body. An unclosed
/// fence means there is no front-matter at all.
fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return (None, content);
    };

    let mut idx = 0usize;
    while idx < rest.len() {
        let line_end = rest[idx..].find('\n').map_or(rest.len(), |off| idx + off + 1);
        let line = rest[idx..line_end].trim_end_matches(['\r', '\n']);
        if line == "---" || line == "..." {
            return (Some(&rest[..idx]), &rest[line_end..]);
        }
        idx = line_end;
    }

    (None, content)
}

pub(crate) fn parse_frontmatter<'a>(path: &Path, content: &'a str) -> Result<(Frontmatter, &'a str)> {
    let (yaml, body) = split_frontmatter(content);
    let Some(yaml) = yaml else {
        return Ok((Frontmatter::new(), body));
    };
    if yaml.trim().is_empty() {
        return Ok((Frontmatter::new(), body));
    }

    let map: Option<Frontmatter> =
        serde_yaml::from_str(yaml).map_err(|source| Error::Frontmatter {
            path: path.to_path_buf(),
            source,
        })?;
    Ok((map.unwrap_or_default(), body))
}

/// Tags from the `tags`/`tag` keys: either a list or one string joined by
/// commas (or whitespace).
pub(crate) fn frontmatter_tags(fm: &Frontmatter) -> Vec<String> {
    let mut out = Vec::new();
    for key in ["tags", "tag"] {
        let Some(v) = fm.get(key) else {
            continue;
        };
        match v {
            serde_yaml::Value::Sequence(seq) => {
                out.extend(seq.iter().filter_map(scalar_to_string).filter_map(clean_tag));
            }
            serde_yaml::Value::String(s) => {
                out.extend(
                    s.split(|c: char| c == ',' || c.is_whitespace())
                        .filter_map(|p| clean_tag(p.to_string())),
                );
            }
            other => out.extend(scalar_to_string(other).and_then(clean_tag)),
        }
    }
    out
}

fn scalar_to_string(v: &serde_yaml::Value) -> Option<String> {
    match v {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn clean_tag(raw: String) -> Option<String> {
    let s = raw.trim();
    let s = s.strip_prefix('#').unwrap_or(s).trim();
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<(Frontmatter, &str)> {
        parse_frontmatter(Path::new("n.md"), content)
    }

    #[test]
    fn splits_yaml_from_body() {
        let (fm, body) = parse("---\ntitle: Hi\ntags: [a, b/c]\n---\n# Body\n").unwrap();
        assert_eq!(fm.get("title").and_then(|v| v.as_str()), Some("Hi"));
        assert_eq!(body, "# Body\n");
        assert_eq!(frontmatter_tags(&fm), vec!["a", "b/c"]);
    }

    #[test]
    fn comma_joined_tags_are_split() {
        let (fm, _) = parse("---\ntags: \"x, #y/z,w\"\n---\n").unwrap();
        assert_eq!(frontmatter_tags(&fm), vec!["x", "y/z", "w"]);
    }

    #[test]
    fn missing_or_unclosed_fence_means_no_frontmatter() {
        let (fm, body) = parse("just text\n").unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, "just text\n");

        let (fm, body) = parse("---\ntitle: x\nno close\n").unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, "---\ntitle: x\nno close\n");
    }

    #[test]
    fn empty_block_is_an_empty_mapping() {
        let (fm, body) = parse("---\n---\nbody").unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, "body");
    }

    #[test]
    fn malformed_yaml_is_a_frontmatter_error() {
        let err = parse("---\ntitle: [unclosed\n---\nbody").unwrap_err();
        assert!(matches!(err, Error::Frontmatter { .. }));

        let err = parse("---\n- just\n- a list\n---\n").unwrap_err();
        assert!(matches!(err, Error::Frontmatter { .. }));
    }
}
