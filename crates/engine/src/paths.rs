const MARKDOWN_EXT: &str = ".md";

#[must_use]
pub fn is_markdown(path: &str) -> bool {
    path.len() > MARKDOWN_EXT.len()
        && path
            .get(path.len() - MARKDOWN_EXT.len()..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(MARKDOWN_EXT))
}

/// Directory part of a vault path; empty for the vault root.
#[must_use]
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// File name without directory and without the `.md` extension.
#[must_use]
pub fn base_name(path: &str) -> &str {
    let file = path.rsplit_once('/').map_or(path, |(_, file)| file);
    if is_markdown(file) {
        &file[..file.len() - MARKDOWN_EXT.len()]
    } else {
        file
    }
}

#[must_use]
pub fn markdown_path(dir: &str, stem: &str) -> String {
    if dir.is_empty() {
        format!("{stem}{MARKDOWN_EXT}")
    } else {
        format!("{dir}/{stem}{MARKDOWN_EXT}")
    }
}

/// Whether `path` lies in `folder` (or below it when `recursive`).
#[must_use]
pub fn in_folder(path: &str, folder: &str, recursive: bool) -> bool {
    let folder = folder.trim().trim_matches('/');
    let dir = parent_dir(path);
    if folder.is_empty() {
        return dir.is_empty() || recursive;
    }
    if dir == folder {
        return true;
    }
    recursive
        && dir
            .strip_prefix(folder)
            .is_some_and(|rest| rest.starts_with('/'))
}
