use serde::Serialize;
use std::collections::BTreeMap;

/// Knobs for one `process_file` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ProcessOptions {
    /// Ignore the creation-delay window.
    pub no_delay: bool,
    /// Bypass folder, tag, property, safeword and self-reference checks.
    /// The disable property is always honoured.
    pub ignore_exclusions: bool,
    /// Skip when the content equals the last content seen for the path.
    pub skip_unchanged: bool,
}

impl ProcessOptions {
    /// Options for edit-driven checks.
    #[must_use]
    pub const fn on_edit() -> Self {
        Self {
            no_delay: false,
            ignore_exclusions: false,
            skip_unchanged: true,
        }
    }

    /// Options for explicit user commands.
    #[must_use]
    pub const fn manual() -> Self {
        Self {
            no_delay: true,
            ignore_exclusions: false,
            skip_unchanged: false,
        }
    }

    #[must_use]
    pub const fn ignoring_exclusions(mut self) -> Self {
        self.ignore_exclusions = true;
        self
    }
}

/// Why a file was left alone. These are normal results, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    NotMarkdown,
    /// Another rename of the same path is in flight.
    Locked,
    CreationDelay,
    ExcludedFolder,
    ExcludedTag,
    ExcludedProperty,
    DisabledByProperty,
    PluginMarker,
    Safeword,
    SelfReferential,
    Unchanged,
    EmptyContent,
}

impl SkipReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotMarkdown => "not-markdown",
            Self::Locked => "locked",
            Self::CreationDelay => "creation-delay",
            Self::ExcludedFolder => "excluded-folder",
            Self::ExcludedTag => "excluded-tag",
            Self::ExcludedProperty => "excluded-property",
            Self::DisabledByProperty => "disabled-by-property",
            Self::PluginMarker => "plugin-marker",
            Self::Safeword => "safeword",
            Self::SelfReferential => "self-referential",
            Self::Unchanged => "unchanged",
            Self::EmptyContent => "empty-content",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one `process_file` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessOutcome {
    Renamed { from: String, to: String },
    /// The derived name is already the file's name.
    AlreadyNamed,
    Skipped { reason: SkipReason },
    Failed { error: String },
}

impl ProcessOutcome {
    pub(crate) const fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self, Self::Renamed { .. } | Self::AlreadyNamed)
    }

    #[must_use]
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Renamed { .. } | Self::AlreadyNamed => None,
            Self::Skipped { reason } => Some(reason.as_str().to_string()),
            Self::Failed { error } => Some(error.clone()),
        }
    }

    #[must_use]
    pub fn new_path(&self) -> Option<&str> {
        match self {
            Self::Renamed { to, .. } => Some(to),
            _ => None,
        }
    }
}

/// Tally of a rename-all run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub renamed: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub skip_reasons: BTreeMap<SkipReason, usize>,
    pub errors: Vec<String>,
}

impl BatchSummary {
    pub(crate) fn record(&mut self, path: &str, outcome: &ProcessOutcome) {
        match outcome {
            ProcessOutcome::Renamed { .. } => self.renamed += 1,
            ProcessOutcome::AlreadyNamed => self.unchanged += 1,
            ProcessOutcome::Skipped { reason } => {
                self.skipped += 1;
                *self.skip_reasons.entry(*reason).or_default() += 1;
            }
            ProcessOutcome::Failed { error } => {
                self.failed += 1;
                self.errors.push(format!("{path}: {error}"));
            }
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.renamed + self.unchanged + self.skipped + self.failed
    }

    /// One-line summary for a notice.
    #[must_use]
    pub fn headline(&self) -> String {
        let mut line = format!(
            "Renamed {} of {} notes, skipped {}",
            self.renamed,
            self.total(),
            self.skipped
        );
        if self.failed > 0 {
            line.push_str(&format!(", {} failed", self.failed));
        }
        line
    }
}
