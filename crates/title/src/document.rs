use firstline_settings::{PropertyRule, RenameSettings};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

/// Flat view of a frontmatter block.
pub type Frontmatter = BTreeMap<String, Value>;

const FRONTMATTER_DELIMITER: &str = "---";
const CARD_LINK_FENCE: &str = "```cardlink";

static INLINE_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)#([\p{L}\p{N}_/\-]+)").expect("inline tag regex is valid")
});

/// Split `content` into its leading frontmatter block (without delimiters)
/// and the body that follows it.
///
/// A block exists only when the very first line is `---` and a later line is
/// `---` as well; an unterminated opener is body text.
#[must_use]
pub fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let mut offset = 0usize;
    let mut lines = content.split_inclusive('\n');

    let Some(first) = lines.next() else {
        return (None, content);
    };
    if first.trim_end() != FRONTMATTER_DELIMITER {
        return (None, content);
    }
    offset += first.len();
    let block_start = offset;

    for line in lines {
        if line.trim_end() == FRONTMATTER_DELIMITER {
            let block = &content[block_start..offset];
            let body = &content[offset + line.len()..];
            return (Some(block), body);
        }
        offset += line.len();
    }
    (None, content)
}

/// Parse the subset of YAML a frontmatter block needs: `key: value`,
/// inline `[a, b]` lists and `- item` block lists.
#[must_use]
pub fn parse_frontmatter(block: &str) -> Frontmatter {
    let mut out = Frontmatter::new();
    let mut list_key: Option<String> = None;

    for raw in block.lines() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(item) = trimmed.strip_prefix('-') {
            if let Some(key) = &list_key {
                let entry = out.entry(key.clone()).or_insert(Value::Null);
                if !entry.is_array() {
                    *entry = Value::Array(Vec::new());
                }
                if let Value::Array(items) = entry {
                    items.push(Value::String(unquote(item.trim()).to_string()));
                }
                continue;
            }
        }

        if raw.starts_with(char::is_whitespace) {
            continue;
        }
        let Some((key, rest)) = trimmed.split_once(':') else {
            list_key = None;
            continue;
        };
        let key = unquote(key.trim()).to_string();
        let rest = rest.trim();
        if rest.is_empty() {
            out.insert(key.clone(), Value::Null);
            list_key = Some(key);
            continue;
        }
        list_key = None;
        out.insert(key, parse_scalar_or_list(rest));
    }
    out
}

/// Frontmatter of `content`, empty when there is no block.
#[must_use]
pub fn frontmatter(content: &str) -> Frontmatter {
    match split_frontmatter(content) {
        (Some(block), _) => parse_frontmatter(block),
        (None, _) => Frontmatter::new(),
    }
}

/// Whether the first frontmatter block of `content` carries `rule`.
#[must_use]
pub fn has_property(content: &str, rule: &PropertyRule) -> bool {
    if rule.is_empty() {
        return false;
    }
    frontmatter(content)
        .iter()
        .any(|(key, value)| rule.matches(key, value))
}

/// First non-blank line after any frontmatter block.
///
/// With `grab_title_from_card_link`, a leading card-link block yields the
/// `title:` entry inside it instead.
#[must_use]
pub fn first_line(content: &str, settings: &RenameSettings) -> Option<String> {
    let (_, body) = split_frontmatter(content);
    let mut lines = body.lines();

    while let Some(line) = lines.next() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if settings.grab_title_from_card_link && trimmed.starts_with(CARD_LINK_FENCE) {
            let mut title = None;
            for inner in lines.by_ref() {
                let inner = inner.trim();
                if inner.starts_with("```") {
                    break;
                }
                if title.is_none() {
                    if let Some(value) = inner.strip_prefix("title:") {
                        let value = unquote(value.trim());
                        if !value.is_empty() {
                            title = Some(value.to_string());
                        }
                    }
                }
            }
            if title.is_some() {
                return title;
            }
            continue;
        }
        return Some(line.trim_end().to_string());
    }
    None
}

/// Whether the body (frontmatter excluded) has no visible text.
#[must_use]
pub fn is_blank_body(content: &str) -> bool {
    split_frontmatter(content).1.trim().is_empty()
}

/// `#tag` tokens found in the body, without the leading `#`.
#[must_use]
pub fn inline_tags(content: &str) -> Vec<String> {
    let (_, body) = split_frontmatter(content);
    INLINE_TAG_RE
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches('/').to_string())
        .filter(|tag| !tag.is_empty() && !tag.chars().all(|c| c.is_ascii_digit()))
        .collect()
}

/// Tags declared in the `tags`/`tag` frontmatter property.
#[must_use]
pub fn frontmatter_tags(frontmatter: &Frontmatter) -> Vec<String> {
    let mut tags = Vec::new();
    for (key, value) in frontmatter {
        if !key.eq_ignore_ascii_case("tags") && !key.eq_ignore_ascii_case("tag") {
            continue;
        }
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Value::String(s) = item {
                        push_tag(&mut tags, s);
                    }
                }
            }
            Value::String(s) => {
                for part in s.split(|c: char| c == ',' || c.is_whitespace()) {
                    push_tag(&mut tags, part);
                }
            }
            _ => {}
        }
    }
    tags
}

fn push_tag(tags: &mut Vec<String>, raw: &str) {
    let tag = raw.trim().trim_start_matches('#');
    if !tag.is_empty() {
        tags.push(tag.to_string());
    }
}

fn parse_scalar_or_list(raw: &str) -> Value {
    if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        let items = inner
            .split(',')
            .map(|item| unquote(item.trim()))
            .filter(|item| !item.is_empty())
            .map(|item| Value::String(item.to_string()))
            .collect();
        return Value::Array(items);
    }
    let text = unquote(raw);
    match text {
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ => Value::String(text.to_string()),
    }
}

fn unquote(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}
