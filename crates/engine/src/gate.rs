use crate::outcome::{ProcessOptions, SkipReason};
use crate::paths::{base_name, in_folder};
use firstline_settings::{RenameSettings, ScopeStrategy};
use firstline_title::{
    apply_custom_replacements, first_line, frontmatter, frontmatter_tags, has_property,
    inline_tags, is_blank_body, CustomReplaced, Frontmatter,
};

/// Frontmatter keys that mark a note as owned by another plugin.
const PLUGIN_MARKER_KEYS: [&str; 1] = ["excalidraw-plugin"];
const PLUGIN_MARKER_SUFFIX: &str = ".excalidraw.md";

/// What the gate sees for one file.
pub struct GateInput<'a> {
    pub path: &'a str,
    pub content: &'a str,
    /// Host metadata cache entry; parsed from `content` when absent.
    pub cached_frontmatter: Option<&'a Frontmatter>,
    /// Content seen the last time the path was processed.
    pub previous_content: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed { first_line: String },
    /// The note was emptied; rename it to `Untitled[ N]`.
    RenameToUntitled,
    Skip(SkipReason),
}

/// Decide whether a file should be renamed. The first matching check wins.
#[must_use]
pub fn evaluate(
    input: &GateInput<'_>,
    settings: &RenameSettings,
    options: &ProcessOptions,
) -> GateDecision {
    let parsed;
    let fm = match input.cached_frontmatter {
        Some(fm) => fm,
        None => {
            parsed = frontmatter(input.content);
            &parsed
        }
    };

    if !options.ignore_exclusions {
        if let Some(reason) = scope_exclusion(input, fm, settings) {
            return GateDecision::Skip(reason);
        }
    }

    if has_property(input.content, &settings.disable_property) {
        return GateDecision::Skip(SkipReason::DisabledByProperty);
    }

    if has_plugin_marker(input.path, fm) {
        return GateDecision::Skip(SkipReason::PluginMarker);
    }

    let line = if is_blank_body(input.content) {
        None
    } else {
        first_line(input.content, settings)
    };
    let Some(line) = line else {
        let had_text = input
            .previous_content
            .is_some_and(|previous| !is_blank_body(previous));
        return if had_text {
            GateDecision::RenameToUntitled
        } else {
            GateDecision::Skip(SkipReason::EmptyContent)
        };
    };

    let name = base_name(input.path);
    if !options.ignore_exclusions {
        if settings.enable_safewords && settings.safewords.iter().any(|w| w.matches(name)) {
            return GateDecision::Skip(SkipReason::Safeword);
        }
        if let CustomReplaced::Line(replaced) = apply_custom_replacements(&line, settings) {
            if references_self(&replaced, name) {
                return GateDecision::Skip(SkipReason::SelfReferential);
            }
        }
    }

    if options.skip_unchanged && input.previous_content == Some(input.content) {
        return GateDecision::Skip(SkipReason::Unchanged);
    }

    GateDecision::Proceed { first_line: line }
}

fn scope_exclusion(
    input: &GateInput<'_>,
    fm: &Frontmatter,
    settings: &RenameSettings,
) -> Option<SkipReason> {
    let folders: Vec<&str> = settings
        .excluded_folders
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect();
    if !folders.is_empty() {
        let listed = folders
            .iter()
            .any(|folder| in_folder(input.path, folder, settings.exclude_subfolders));
        if is_excluded(listed, settings.folder_scope) {
            return Some(SkipReason::ExcludedFolder);
        }
    }

    let wanted: Vec<String> = settings
        .excluded_tags
        .iter()
        .map(|t| t.trim().trim_start_matches('#').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if !wanted.is_empty() {
        let mut tags = frontmatter_tags(fm);
        tags.extend(inline_tags(input.content));
        let listed = tags.iter().any(|tag| {
            let tag = tag.to_lowercase();
            wanted.iter().any(|w| {
                tag == *w
                    || (settings.exclude_child_tags
                        && tag.strip_prefix(w.as_str()).is_some_and(|rest| rest.starts_with('/')))
            })
        });
        if is_excluded(listed, settings.tag_scope) {
            return Some(SkipReason::ExcludedTag);
        }
    }

    let property_hit = settings.excluded_properties.iter().any(|rule| {
        fm.iter().any(|(key, value)| rule.matches(key, value))
    });
    property_hit.then_some(SkipReason::ExcludedProperty)
}

const fn is_excluded(listed: bool, scope: ScopeStrategy) -> bool {
    match scope {
        ScopeStrategy::OnlyExcludeListed => listed,
        ScopeStrategy::ExcludeAllExceptListed => !listed,
    }
}

fn has_plugin_marker(path: &str, fm: &Frontmatter) -> bool {
    let lowered = path.to_lowercase();
    lowered.ends_with(PLUGIN_MARKER_SUFFIX)
        || fm
            .keys()
            .any(|key| PLUGIN_MARKER_KEYS.iter().any(|m| key.eq_ignore_ascii_case(m)))
}

/// Whether `line` links to a note called `name`, either as a wikilink
/// (`[[name]]`, `[[folder/name|alias]]`, `[[name#heading]]`) or as an
/// anchor link `(#name)`.
#[must_use]
pub fn references_self(line: &str, name: &str) -> bool {
    let name = name.to_lowercase();
    if name.is_empty() {
        return false;
    }

    let mut rest = line;
    while let Some(start) = rest.find("[[") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("]]") else {
            break;
        };
        let inner = &after[..end];
        let target = inner.split('|').next().unwrap_or(inner);
        let target = target.split('#').next().unwrap_or(target).trim();
        let target = target.rsplit('/').next().unwrap_or(target);
        let target = target
            .strip_suffix(".md")
            .unwrap_or(target)
            .to_lowercase();
        if target == name {
            return true;
        }
        rest = &after[end + 2..];
    }

    line.to_lowercase().contains(&format!("(#{name})"))
}
