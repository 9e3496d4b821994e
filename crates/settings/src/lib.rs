//! # Firstline Settings
//!
//! Configuration shared by the title pipeline and the rename engine.
//!
//! Settings are the only durable state of Firstline. The host stores them as
//! an opaque blob; loading always merges the blob over the built-in defaults,
//! so fields added in a later version pick up sane values without migration.
//!
//! ## Example
//!
//! ```rust
//! use firstline_settings::{ForbiddenChar, RenameSettings};
//!
//! let mut settings = RenameSettings::from_json(r#"{"char_count": 60}"#).unwrap();
//! settings.enable_forbidden_char_replacements = true;
//! settings.char_replacements.enable(ForbiddenChar::Slash, "\u{2215}");
//! assert_eq!(settings.char_count, 60);
//! ```

mod chars;
mod error;
mod settings;

pub use chars::{CharGroup, CharReplacement, CharReplacements, ForbiddenChar, OsProfile};
pub use error::{Result, SettingsError};
pub use settings::{
    CustomReplacement, PropertyRule, RenameSettings, Safeword, ScopeStrategy, MAX_CHAR_COUNT,
    MIN_CHAR_COUNT,
};
