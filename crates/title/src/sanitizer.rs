use crate::extractor::UNTITLED;
use firstline_settings::{CharGroup, CharReplacement, ForbiddenChar, RenameSettings};

const ELLIPSIS: char = '\u{2026}';

/// Map a title onto a file name that is legal under the configured OS
/// profile, truncated to `char_count` characters.
#[must_use]
pub fn sanitize(title: &str, settings: &RenameSettings) -> String {
    let limit = settings.char_count.saturating_sub(1);
    let windows_set = settings.os_profile.forbids_windows_set();

    let mut out = String::with_capacity(title.len());
    let mut out_len = 0usize;
    let mut chars = title.chars().peekable();

    while let Some(c) = chars.next() {
        if out_len >= limit {
            truncate_with_ellipsis(&mut out);
            break;
        }

        let Some(kind) = forbidden_kind(c, windows_set) else {
            out.push(c);
            out_len += 1;
            continue;
        };

        let Some(entry) = active_replacement(kind, settings) else {
            continue;
        };

        if entry.trim_left {
            let kept = out.trim_end().len();
            out.truncate(kept);
            out_len = out.chars().count();
        }
        let replacement_len = entry.replacement.chars().count();
        if out_len + replacement_len > limit {
            truncate_with_ellipsis(&mut out);
            break;
        }
        out.push_str(&entry.replacement);
        out_len += replacement_len;

        if entry.trim_right {
            while chars.peek().is_some_and(|next| next.is_whitespace()) {
                chars.next();
            }
        }
    }

    let collapsed = out.split_whitespace().collect::<Vec<_>>().join(" ");
    let name = strip_leading_dots(&collapsed, settings);

    if name.is_empty() || is_reserved_name(&name) {
        UNTITLED.to_string()
    } else {
        name
    }
}

/// Windows device names that cannot be used as a file stem.
#[must_use]
pub fn is_reserved_name(name: &str) -> bool {
    let upper = name.trim().to_ascii_uppercase();
    if matches!(upper.as_str(), "CON" | "PRN" | "AUX" | "NUL") {
        return true;
    }
    let bytes = upper.as_bytes();
    bytes.len() == 4
        && (upper.starts_with("COM") || upper.starts_with("LPT"))
        && bytes[3].is_ascii_digit()
}

fn forbidden_kind(c: char, windows_set: bool) -> Option<ForbiddenChar> {
    let kind = ForbiddenChar::from_char(c)?;
    match kind.group() {
        CharGroup::Universal => Some(kind),
        CharGroup::WindowsAndroid if windows_set => Some(kind),
        CharGroup::WindowsAndroid | CharGroup::LeadingDot => None,
    }
}

/// The replacement for `kind` if every toggle on its path is on and the
/// replacement is non-empty; `None` means the character is omitted.
fn active_replacement(kind: ForbiddenChar, settings: &RenameSettings) -> Option<&CharReplacement> {
    if !settings.enable_forbidden_char_replacements {
        return None;
    }
    if kind.group() == CharGroup::WindowsAndroid && !settings.enable_windows_android_replacements
    {
        return None;
    }
    let entry = settings.char_replacements.get(kind);
    (entry.enabled && !entry.replacement.is_empty()).then_some(entry)
}

fn truncate_with_ellipsis(out: &mut String) {
    let kept = out.trim_end().len();
    out.truncate(kept);
    out.push(ELLIPSIS);
}

fn strip_leading_dots(name: &str, settings: &RenameSettings) -> String {
    if !name.starts_with('.') {
        return name.to_string();
    }
    let rest = name.trim_start_matches('.');
    let stripped = match active_replacement(ForbiddenChar::Dot, settings) {
        Some(entry) => format!("{}{rest}", entry.replacement),
        None => rest.to_string(),
    };
    stripped.trim().to_string()
}
