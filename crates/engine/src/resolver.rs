use crate::paths::markdown_path;
use crate::ports::VaultHost;
use crate::Result;
use std::collections::HashSet;

/// Lower-cased destination paths claimed by renames that have not
/// committed yet.
#[derive(Debug, Default, Clone)]
pub struct ReservedPaths {
    paths: HashSet<String>,
}

impl ReservedPaths {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the path was already reserved.
    pub fn reserve(&mut self, path: &str) -> bool {
        self.paths.insert(path.to_lowercase())
    }

    pub fn release(&mut self, path: &str) -> bool {
        self.paths.remove(&path.to_lowercase())
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(&path.to_lowercase())
    }

    /// Move a reservation from `old` to `new`; no-op when `old` is not held.
    pub fn rekey(&mut self, old: &str, new: &str) {
        if self.release(old) {
            self.reserve(new);
        }
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Where a file should end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The file already carries the derived name.
    SamePath,
    Target(String),
}

/// Find the first free `dir/stem[ N].md`, skipping existing and reserved
/// paths.
///
/// Reaching the file's own path means no rename is needed. A candidate that
/// differs from the current path only by case is treated as free, since on
/// case-insensitive stores it "exists" as the file itself.
pub async fn resolve_path(
    stem: &str,
    dir: &str,
    current_path: &str,
    vault: &dyn VaultHost,
    reserved: &ReservedPaths,
) -> Result<Resolution> {
    let current_lower = current_path.to_lowercase();
    let mut suffix = 0u64;
    loop {
        let candidate = if suffix == 0 {
            markdown_path(dir, stem)
        } else {
            markdown_path(dir, &format!("{stem} {suffix}"))
        };
        suffix += 1;

        if candidate == current_path {
            return Ok(Resolution::SamePath);
        }
        if candidate.to_lowercase() == current_lower {
            return Ok(Resolution::Target(candidate));
        }
        if reserved.contains(&candidate) {
            log::debug!("{candidate} is reserved, trying next suffix");
            continue;
        }
        if vault.path_exists(&candidate).await? {
            continue;
        }
        return Ok(Resolution::Target(candidate));
    }
}
