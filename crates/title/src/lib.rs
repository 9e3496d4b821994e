//! # Firstline Title
//!
//! Turns the first line of a note into a file name.
//!
//! ## Pipeline
//!
//! ```text
//! Note content
//!     │
//!     ├──> Frontmatter skip (+ optional card-link title)
//!     │      └─> First line
//!     │
//!     ├──> Title extraction
//!     │      ├─> escapes, comments, HTML pairs, embeds, heading prefix
//!     │      ├─> custom replacement rules
//!     │      └─> wikilinks and markdown links → display text
//!     │
//!     └──> Sanitization
//!            ├─> forbidden characters (OS profile aware)
//!            ├─> length limit with ellipsis
//!            └─> leading dots, reserved device names
//! ```
//!
//! Everything here is pure: no I/O and no errors. The worst case is
//! [`UNTITLED`].
//!
//! ## Example
//!
//! ```rust
//! use firstline_settings::RenameSettings;
//! use firstline_title::derive_file_name;
//!
//! let settings = RenameSettings::default();
//! assert_eq!(derive_file_name("# Meeting: [[Q3 Plan|plan]]", &settings), "Meeting plan");
//! ```

mod document;
mod extractor;
mod sanitizer;

pub use document::{
    first_line, frontmatter, frontmatter_tags, has_property, inline_tags, is_blank_body,
    parse_frontmatter, split_frontmatter, Frontmatter,
};
pub use extractor::{apply_custom_replacements, extract_title, CustomReplaced, UNTITLED};
pub use sanitizer::{is_reserved_name, sanitize};

use firstline_settings::RenameSettings;

/// Extract the title from `raw_first_line` and sanitize it into a file stem.
#[must_use]
pub fn derive_file_name(raw_first_line: &str, settings: &RenameSettings) -> String {
    let title = extract_title(raw_first_line, settings);
    let name = sanitize(&title, settings);
    log::trace!("derived {name:?} from {raw_first_line:?}");
    name
}
