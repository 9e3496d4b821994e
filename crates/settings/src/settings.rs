use crate::chars::{CharReplacements, ForbiddenChar, OsProfile};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MIN_CHAR_COUNT: usize = 10;
pub const MAX_CHAR_COUNT: usize = 255;

/// Process-wide rename configuration.
///
/// Every level is `#[serde(default)]`, so a stored blob from an older
/// version is merged over the defaults field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameSettings {
    /// Master toggle for `char_replacements`.
    pub enable_forbidden_char_replacements: bool,
    /// Group toggle for the Windows/Android-only characters.
    pub enable_windows_android_replacements: bool,
    pub char_replacements: CharReplacements,
    pub os_profile: OsProfile,
    /// Maximum file name length in characters (10-255).
    pub char_count: usize,
    /// Throttle window for edit-driven checks; 0 runs them immediately.
    pub check_interval_ms: u64,

    pub enable_custom_replacements: bool,
    pub custom_replacements: Vec<CustomReplacement>,
    pub enable_safewords: bool,
    pub safewords: Vec<Safeword>,

    pub excluded_folders: Vec<String>,
    pub folder_scope: ScopeStrategy,
    pub exclude_subfolders: bool,
    pub excluded_tags: Vec<String>,
    pub tag_scope: ScopeStrategy,
    pub exclude_child_tags: bool,
    pub excluded_properties: Vec<PropertyRule>,
    /// Frontmatter property that switches renaming off for one note.
    pub disable_property: PropertyRule,

    pub omit_html_tags: bool,
    pub omit_comments: bool,
    pub grab_title_from_card_link: bool,
    pub rename_on_focus: bool,
}

impl Default for RenameSettings {
    fn default() -> Self {
        Self {
            enable_forbidden_char_replacements: false,
            enable_windows_android_replacements: false,
            char_replacements: CharReplacements::default(),
            os_profile: OsProfile::default(),
            char_count: 100,
            check_interval_ms: 0,
            enable_custom_replacements: true,
            custom_replacements: Vec::new(),
            enable_safewords: true,
            safewords: Vec::new(),
            excluded_folders: Vec::new(),
            folder_scope: ScopeStrategy::OnlyExcludeListed,
            exclude_subfolders: true,
            excluded_tags: Vec::new(),
            tag_scope: ScopeStrategy::OnlyExcludeListed,
            exclude_child_tags: true,
            excluded_properties: Vec::new(),
            disable_property: PropertyRule::new("rename", "off"),
            omit_html_tags: false,
            omit_comments: false,
            grab_title_from_card_link: false,
            rename_on_focus: false,
        }
    }
}

impl RenameSettings {
    /// Parse the host's opaque settings blob, merged over defaults.
    pub fn from_json(blob: &str) -> Result<Self> {
        let mut settings: Self = serde_json::from_str(blob)?;
        settings.validate();
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a TOML settings file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let mut settings: Self = toml::from_str(&content)?;
        settings.validate();
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Clamp out-of-range values and restore rule invariants after a load.
    pub fn validate(&mut self) {
        let clamped = self.char_count.clamp(MIN_CHAR_COUNT, MAX_CHAR_COUNT);
        if clamped != self.char_count {
            log::warn!(
                "char_count {} out of range, clamped to {clamped}",
                self.char_count
            );
            self.char_count = clamped;
        }
        for rule in &mut self.custom_replacements {
            if rule.match_whole_line {
                rule.match_at_start = false;
            }
        }
        for word in &mut self.safewords {
            if word.match_whole_line {
                word.match_at_start = false;
            }
        }
    }

    /// Whether `\` is configured as a replaceable character, which turns
    /// off escape handling in titles.
    #[must_use]
    pub fn backslash_is_replaceable(&self) -> bool {
        self.enable_forbidden_char_replacements
            && self
                .char_replacements
                .get(ForbiddenChar::Backslash)
                .enabled
    }
}

/// Which side of a folder or tag list is excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeStrategy {
    /// Listed entries are excluded, everything else is processed.
    #[default]
    OnlyExcludeListed,
    /// Only listed entries are processed.
    ExcludeAllExceptListed,
}

/// Plain-text rewrite applied to the first line before link resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomReplacement {
    pub search: String,
    pub replace: String,
    pub match_at_start: bool,
    pub match_whole_line: bool,
    pub enabled: bool,
}

impl Default for CustomReplacement {
    fn default() -> Self {
        Self {
            search: String::new(),
            replace: String::new(),
            match_at_start: false,
            match_whole_line: false,
            enabled: true,
        }
    }
}

impl CustomReplacement {
    pub fn new(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            replace: replace.into(),
            ..Self::default()
        }
    }

    pub fn set_match_at_start(&mut self, value: bool) {
        self.match_at_start = value;
        if value {
            self.match_whole_line = false;
        }
    }

    pub fn set_match_whole_line(&mut self, value: bool) {
        self.match_whole_line = value;
        if value {
            self.match_at_start = false;
        }
    }
}

/// File name fragment that vetoes renaming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Safeword {
    pub text: String,
    pub match_at_start: bool,
    pub match_whole_line: bool,
    pub case_sensitive: bool,
    pub enabled: bool,
}

impl Default for Safeword {
    fn default() -> Self {
        Self {
            text: String::new(),
            match_at_start: false,
            match_whole_line: false,
            case_sensitive: false,
            enabled: true,
        }
    }
}

impl Safeword {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn set_match_at_start(&mut self, value: bool) {
        self.match_at_start = value;
        if value {
            self.match_whole_line = false;
        }
    }

    pub fn set_match_whole_line(&mut self, value: bool) {
        self.match_whole_line = value;
        if value {
            self.match_at_start = false;
        }
    }

    /// Whether this safeword protects a file with base name `name`.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        if !self.enabled || self.text.is_empty() {
            return false;
        }
        let (text, name) = if self.case_sensitive {
            (self.text.clone(), name.to_string())
        } else {
            (self.text.to_lowercase(), name.to_lowercase())
        };
        if self.match_whole_line {
            name == text
        } else if self.match_at_start {
            name.starts_with(&text)
        } else {
            name.contains(&text)
        }
    }
}

/// Frontmatter `key: value` matcher; an empty `value` matches any value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyRule {
    pub key: String,
    pub value: String,
}

impl PropertyRule {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key.trim().is_empty()
    }

    /// Case-insensitive match against one stored key and its value
    /// rendered as text. List values match when any element matches.
    #[must_use]
    pub fn matches(&self, key: &str, value: &serde_json::Value) -> bool {
        if self.is_empty() || !key.trim().eq_ignore_ascii_case(self.key.trim()) {
            return false;
        }
        let wanted = self.value.trim();
        if wanted.is_empty() {
            return true;
        }
        match value {
            serde_json::Value::Array(items) => items
                .iter()
                .any(|item| value_text(item).eq_ignore_ascii_case(wanted)),
            other => value_text(other).eq_ignore_ascii_case(wanted),
        }
    }
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
