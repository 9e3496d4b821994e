use firstline_settings::RenameSettings;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Title used whenever nothing usable is left of the first line.
pub const UNTITLED: &str = "Untitled";

const TEMPLATE_CURSOR: &str = "<% tp.file.cursor() %>";
const EMPTY_TEMPLATE_STARTS: [&str; 4] = ["<%", "<%*", "<%-", "<%_"];

/// Escaped characters are parked on supplementary private-use code points.
const ESCAPE_BASE: u32 = 0xF0000;
const ESCAPE_LIMIT: u32 = 0xFFFFD;

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#{1,6} ").expect("heading regex is valid"));
static PERCENT_COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%%(.*?)%%").expect("comment regex is valid"));
static HTML_COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!--(.*?)-->").expect("html comment regex is valid"));
static HTML_TAG_PAIR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<([A-Za-z][A-Za-z0-9-]*)(?:\s[^<>]*)?>([^<]*)</([A-Za-z][A-Za-z0-9-]*)\s*>")
        .expect("html tag regex is valid")
});
static EMBED_WIKILINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[\[(.*?)\]\]").expect("embed regex is valid"));
static EMBED_IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").expect("image regex is valid"));
static MARKDOWN_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\[\]]*)\]\([^()]*\)").expect("link regex is valid"));

/// Result of running the custom replacement rules over a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomReplaced {
    Line(String),
    /// A whole-line rule emptied the line.
    Untitled,
}

/// Convert a raw first line into a display title.
///
/// Pure and infallible; the worst case is [`UNTITLED`].
#[must_use]
pub fn extract_title(raw_first_line: &str, settings: &RenameSettings) -> String {
    let trimmed = raw_first_line.trim();
    let without_cursor = trimmed.replace(TEMPLATE_CURSOR, "");
    let without_cursor = without_cursor.trim();
    if without_cursor.is_empty() || EMPTY_TEMPLATE_STARTS.contains(&without_cursor) {
        return UNTITLED.to_string();
    }

    // Must be decided on the untouched line: an escaped `\#` is not a heading.
    let is_heading = HEADING_RE.is_match(trimmed);

    let (mut line, escaped) = if settings.backslash_is_replaceable() {
        (without_cursor.to_string(), Vec::new())
    } else {
        hide_escapes(without_cursor)
    };

    line = strip_comments(&line, settings.omit_comments);
    if settings.omit_html_tags {
        line = strip_html_tag_pairs(&line);
    }
    line = strip_embeds(&line);

    if is_heading {
        line = HEADING_RE.replace(&line, "").into_owned();
    }

    line = match apply_custom_replacements(&line, settings) {
        CustomReplaced::Line(line) => line,
        CustomReplaced::Untitled => return UNTITLED.to_string(),
    };

    line = resolve_wikilinks(&line);
    line = MARKDOWN_LINK_RE.replace_all(&line, "$1").into_owned();
    line = restore_escapes(&line, &escaped);

    let title = line.trim();
    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title.to_string()
    }
}

/// Apply the enabled custom replacement rules in their configured order.
#[must_use]
pub fn apply_custom_replacements(line: &str, settings: &RenameSettings) -> CustomReplaced {
    let mut line = line.to_string();
    if !settings.enable_custom_replacements {
        return CustomReplaced::Line(line);
    }
    for rule in &settings.custom_replacements {
        if !rule.enabled || rule.search.is_empty() {
            continue;
        }
        if rule.match_whole_line {
            if line.trim() == rule.search {
                if rule.replace.trim().is_empty() {
                    return CustomReplaced::Untitled;
                }
                line = rule.replace.clone();
            }
        } else if rule.match_at_start {
            if let Some(rest) = line.strip_prefix(rule.search.as_str()) {
                line = format!("{}{rest}", rule.replace);
            }
        } else {
            line = line.replace(&rule.search, &rule.replace);
        }
    }
    CustomReplaced::Line(line)
}

fn is_placeholder(c: char) -> bool {
    (ESCAPE_BASE..=ESCAPE_LIMIT).contains(&(c as u32))
}

/// Park escaped characters on placeholders. Private-use characters already in
/// the line are parked too, so that restoring cannot mistake them for escapes.
fn hide_escapes(line: &str) -> (String, Vec<char>) {
    let mut out = String::with_capacity(line.len());
    let mut escaped = Vec::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        let next = if c == '\\' {
            let Some(next) = chars.next() else {
                out.push(c);
                break;
            };
            next
        } else if is_placeholder(c) {
            c
        } else {
            out.push(c);
            continue;
        };
        let slot = u32::try_from(escaped.len())
            .ok()
            .and_then(|idx| ESCAPE_BASE.checked_add(idx))
            .filter(|code| *code <= ESCAPE_LIMIT)
            .and_then(char::from_u32);
        match slot {
            Some(placeholder) => {
                out.push(placeholder);
                escaped.push(next);
            }
            None => out.push(next),
        }
    }
    (out, escaped)
}

fn restore_escapes(line: &str, escaped: &[char]) -> String {
    if escaped.is_empty() {
        return line.to_string();
    }
    line.chars()
        .map(|c| {
            if is_placeholder(c) {
                let idx = (c as u32 - ESCAPE_BASE) as usize;
                if let Some(original) = escaped.get(idx) {
                    return *original;
                }
            }
            c
        })
        .collect()
}

fn strip_comments(line: &str, omit_content: bool) -> String {
    let replacement = if omit_content { "" } else { "$1" };
    let line = PERCENT_COMMENT_RE.replace_all(line, replacement);
    HTML_COMMENT_RE.replace_all(&line, replacement).into_owned()
}

/// Innermost pairs go first; repeating until nothing changes unwraps
/// nested markup.
fn strip_html_tag_pairs(line: &str) -> String {
    let mut current = line.to_string();
    loop {
        let next = HTML_TAG_PAIR_RE
            .replace_all(&current, |caps: &Captures<'_>| {
                if caps[1].eq_ignore_ascii_case(&caps[3]) {
                    caps[2].to_string()
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_embeds(line: &str) -> String {
    let line = EMBED_WIKILINK_RE.replace_all(line, "[[$1]]");
    EMBED_IMAGE_RE.replace_all(&line, "$1").into_owned()
}

/// Replace each `[[target|alias]]` with its display text, left to right.
fn resolve_wikilinks(line: &str) -> String {
    let mut out = line.to_string();
    loop {
        let Some(start) = out.find("[[") else {
            break;
        };
        let Some(rel_end) = out[start + 2..].find("]]") else {
            break;
        };
        let end = start + 2 + rel_end;
        let inner = &out[start + 2..end];
        let display = inner.rsplit('|').next().unwrap_or(inner).to_string();
        out.replace_range(start..end + 2, &display);
    }
    out
}
