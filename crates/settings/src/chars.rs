use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Characters a file name may not carry verbatim.
///
/// The table is static: every variant maps to one character, one group and
/// one default replacement, so the full set can be enumerated in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForbiddenChar {
    Slash,
    Colon,
    Pipe,
    Backslash,
    Hash,
    LeftBracket,
    RightBracket,
    Caret,
    Asterisk,
    Question,
    LessThan,
    GreaterThan,
    Quote,
    Dot,
}

/// When a forbidden character applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharGroup {
    /// Forbidden on every OS profile.
    Universal,
    /// Forbidden only under the Windows/Android profile.
    WindowsAndroid,
    /// Forbidden only as the first character of a name.
    LeadingDot,
}

struct CharEntry {
    kind: ForbiddenChar,
    ch: char,
    group: CharGroup,
    default_replacement: &'static str,
}

#[rustfmt::skip]
const TABLE: [CharEntry; 14] = [
    CharEntry { kind: ForbiddenChar::Slash, ch: '/', group: CharGroup::Universal, default_replacement: "\u{2215}" },
    CharEntry { kind: ForbiddenChar::Colon, ch: ':', group: CharGroup::Universal, default_replacement: "\u{0589}" },
    CharEntry { kind: ForbiddenChar::Pipe, ch: '|', group: CharGroup::Universal, default_replacement: "\u{2223}" },
    CharEntry { kind: ForbiddenChar::Backslash, ch: '\\', group: CharGroup::Universal, default_replacement: "\u{29F5}" },
    CharEntry { kind: ForbiddenChar::Hash, ch: '#', group: CharGroup::Universal, default_replacement: "\u{FF03}" },
    CharEntry { kind: ForbiddenChar::LeftBracket, ch: '[', group: CharGroup::Universal, default_replacement: "\u{FF3B}" },
    CharEntry { kind: ForbiddenChar::RightBracket, ch: ']', group: CharGroup::Universal, default_replacement: "\u{FF3D}" },
    CharEntry { kind: ForbiddenChar::Caret, ch: '^', group: CharGroup::Universal, default_replacement: "\u{02C6}" },
    CharEntry { kind: ForbiddenChar::Asterisk, ch: '*', group: CharGroup::WindowsAndroid, default_replacement: "\u{2217}" },
    CharEntry { kind: ForbiddenChar::Question, ch: '?', group: CharGroup::WindowsAndroid, default_replacement: "\u{FE56}" },
    CharEntry { kind: ForbiddenChar::LessThan, ch: '<', group: CharGroup::WindowsAndroid, default_replacement: "\u{2039}" },
    CharEntry { kind: ForbiddenChar::GreaterThan, ch: '>', group: CharGroup::WindowsAndroid, default_replacement: "\u{203A}" },
    CharEntry { kind: ForbiddenChar::Quote, ch: '"', group: CharGroup::WindowsAndroid, default_replacement: "\u{FF02}" },
    CharEntry { kind: ForbiddenChar::Dot, ch: '.', group: CharGroup::LeadingDot, default_replacement: "\u{2024}" },
];

impl ForbiddenChar {
    pub const ALL: [ForbiddenChar; 14] = [
        Self::Slash,
        Self::Colon,
        Self::Pipe,
        Self::Backslash,
        Self::Hash,
        Self::LeftBracket,
        Self::RightBracket,
        Self::Caret,
        Self::Asterisk,
        Self::Question,
        Self::LessThan,
        Self::GreaterThan,
        Self::Quote,
        Self::Dot,
    ];

    fn entry(self) -> &'static CharEntry {
        &TABLE[self as usize]
    }

    #[must_use]
    pub fn as_char(self) -> char {
        self.entry().ch
    }

    #[must_use]
    pub fn group(self) -> CharGroup {
        self.entry().group
    }

    #[must_use]
    pub fn default_replacement(self) -> &'static str {
        self.entry().default_replacement
    }

    #[must_use]
    pub fn from_char(ch: char) -> Option<Self> {
        TABLE.iter().find(|entry| entry.ch == ch).map(|entry| entry.kind)
    }
}

/// Host platform whose file name rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsProfile {
    #[serde(rename = "macos")]
    MacOs,
    Windows,
    Linux,
    Android,
}

impl Default for OsProfile {
    fn default() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "android") {
            Self::Android
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Linux
        }
    }
}

impl OsProfile {
    /// Whether `* ? < > "` are forbidden under this profile.
    #[must_use]
    pub const fn forbids_windows_set(self) -> bool {
        matches!(self, Self::Windows | Self::Android)
    }
}

/// Replacement rule for one forbidden character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharReplacement {
    pub replacement: String,
    pub enabled: bool,
    /// Strip whitespace already emitted before the replacement.
    pub trim_left: bool,
    /// Skip whitespace that follows the replaced character.
    pub trim_right: bool,
}

impl CharReplacement {
    fn defaults_for(ch: ForbiddenChar) -> Self {
        Self {
            replacement: ch.default_replacement().to_string(),
            enabled: false,
            trim_left: false,
            trim_right: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawCharReplacement {
    replacement: Option<String>,
    enabled: Option<bool>,
    trim_left: Option<bool>,
    trim_right: Option<bool>,
}

/// Full replacement table, one entry per [`ForbiddenChar`].
///
/// Loading merges each stored entry over its per-character default, so a
/// blob that only says `slash = { enabled = true }` keeps the default
/// replacement string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<ForbiddenChar, RawCharReplacement>",
    into = "BTreeMap<ForbiddenChar, CharReplacement>"
)]
pub struct CharReplacements {
    entries: [CharReplacement; 14],
}

impl Default for CharReplacements {
    fn default() -> Self {
        Self {
            entries: ForbiddenChar::ALL.map(CharReplacement::defaults_for),
        }
    }
}

impl CharReplacements {
    #[must_use]
    pub fn get(&self, ch: ForbiddenChar) -> &CharReplacement {
        &self.entries[ch as usize]
    }

    pub fn get_mut(&mut self, ch: ForbiddenChar) -> &mut CharReplacement {
        &mut self.entries[ch as usize]
    }

    /// Enable `ch` with the given replacement string.
    pub fn enable(&mut self, ch: ForbiddenChar, replacement: impl Into<String>) {
        let entry = self.get_mut(ch);
        entry.replacement = replacement.into();
        entry.enabled = true;
    }
}

impl From<BTreeMap<ForbiddenChar, RawCharReplacement>> for CharReplacements {
    fn from(raw: BTreeMap<ForbiddenChar, RawCharReplacement>) -> Self {
        let mut table = Self::default();
        for (ch, stored) in raw {
            let entry = table.get_mut(ch);
            if let Some(replacement) = stored.replacement {
                entry.replacement = replacement;
            }
            if let Some(enabled) = stored.enabled {
                entry.enabled = enabled;
            }
            if let Some(trim_left) = stored.trim_left {
                entry.trim_left = trim_left;
            }
            if let Some(trim_right) = stored.trim_right {
                entry.trim_right = trim_right;
            }
        }
        table
    }
}

impl From<CharReplacements> for BTreeMap<ForbiddenChar, CharReplacement> {
    fn from(table: CharReplacements) -> Self {
        ForbiddenChar::ALL
            .into_iter()
            .zip(table.entries)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_matches_enum_discriminants() {
        for ch in ForbiddenChar::ALL {
            assert_eq!(ForbiddenChar::from_char(ch.as_char()), Some(ch));
        }
    }

    #[test]
    fn groups_split_universal_and_windows_sets() {
        let universal: String = ForbiddenChar::ALL
            .iter()
            .filter(|ch| ch.group() == CharGroup::Universal)
            .map(|ch| ch.as_char())
            .collect();
        assert_eq!(universal, "/:|\\#[]^");

        let windows: String = ForbiddenChar::ALL
            .iter()
            .filter(|ch| ch.group() == CharGroup::WindowsAndroid)
            .map(|ch| ch.as_char())
            .collect();
        assert_eq!(windows, "*?<>\"");
    }

    #[test]
    fn partial_entry_keeps_default_replacement() {
        let table: CharReplacements =
            serde_json::from_str(r#"{"slash": {"enabled": true}}"#).expect("parse");
        let slash = table.get(ForbiddenChar::Slash);
        assert!(slash.enabled);
        assert_eq!(slash.replacement, "\u{2215}");
        assert!(!table.get(ForbiddenChar::Colon).enabled);
    }

    #[test]
    fn windows_and_android_forbid_extra_set() {
        assert!(OsProfile::Windows.forbids_windows_set());
        assert!(OsProfile::Android.forbids_windows_set());
        assert!(!OsProfile::Linux.forbids_windows_set());
        assert!(!OsProfile::MacOs.forbids_windows_set());
    }
}
