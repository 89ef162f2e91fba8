//! Input checks: the built site page must exist and look like a real page.
//!
//! Both checks run before any browser is launched, so a missing or broken
//! site build fails in milliseconds and leaves nothing to clean up.

use crate::error::ExportError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Number of characters shown when an input is rejected as too small.
const PREVIEW_CHARS: usize = 200;

/// The validated entry page.
#[derive(Debug, Clone)]
pub struct SitePage {
    /// Absolute path of the page.
    pub path: PathBuf,
    /// Length of the page in characters.
    pub chars: usize,
}

impl SitePage {
    /// `file://` URL the browser navigates to.
    pub fn url(&self) -> String {
        file_url(&self.path)
    }
}

/// Verify the entry page exists, returning its absolute path.
///
/// On failure the containing directory is listed so the log shows whether
/// the site build produced anything at all.
pub fn preflight(path: &Path) -> Result<PathBuf, ExportError> {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    info!("Checking for main page at: {}", absolute.display());

    if absolute.is_file() {
        return Ok(absolute);
    }

    let dir = absolute.parent().unwrap_or(Path::new("."));
    let entries = list_directory(dir);
    if entries.is_empty() {
        warn!("Main page does not exist and {} is empty or missing", dir.display());
    } else {
        warn!("Main page does not exist. Contents of {}:", dir.display());
        for entry in &entries {
            warn!("  - {entry}");
        }
    }

    Err(ExportError::MissingInput {
        path: absolute,
        entries,
    })
}

/// Read the page and reject it when shorter than `min_chars`.
pub fn check_content(path: &Path, min_chars: usize) -> Result<SitePage, ExportError> {
    let content = std::fs::read_to_string(path).map_err(|source| ExportError::InputRead {
        path: path.to_path_buf(),
        source,
    })?;
    let chars = content.chars().count();
    info!("Main page file size: {chars} characters");

    if chars < min_chars {
        let preview = preview(&content, PREVIEW_CHARS);
        warn!("Main page seems too small or empty. Content preview: {preview}");
        return Err(ExportError::CorruptInput {
            path: path.to_path_buf(),
            chars,
            preview,
        });
    }

    debug!("Validated main page: {}", path.display());
    Ok(SitePage {
        path: path.to_path_buf(),
        chars,
    })
}

/// Sorted entry names of `dir`; empty when it cannot be read.
pub fn list_directory(dir: &Path) -> Vec<String> {
    let Ok(read) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = read
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Build a `file://` URL for an absolute path.
pub fn file_url(path: &Path) -> String {
    let s = path.to_string_lossy().replace('\\', "/");
    if s.starts_with('/') {
        format!("file://{s}")
    } else {
        format!("file:///{s}")
    }
}

/// First `max_chars` characters of `s`, with an ellipsis when cut.
pub fn preview(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}\u{2026}", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn preflight_accepts_existing_file() {
        let dir = TempDir::new().unwrap();
        let page = dir.path().join("index.html");
        fs::write(&page, "<html></html>").unwrap();

        let resolved = preflight(&page).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("index.html"));
    }

    #[test]
    fn preflight_lists_siblings_when_missing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("feed.xml"), "").unwrap();
        fs::create_dir(dir.path().join("assets")).unwrap();

        let err = preflight(&dir.path().join("index.html")).unwrap_err();
        match err {
            ExportError::MissingInput { entries, .. } => {
                assert_eq!(entries, vec!["assets".to_string(), "feed.xml".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn preflight_rejects_directory() {
        let dir = TempDir::new().unwrap();
        let err = preflight(dir.path()).unwrap_err();
        assert!(matches!(err, ExportError::MissingInput { .. }));
    }

    #[test]
    fn missing_parent_gives_empty_listing() {
        let dir = TempDir::new().unwrap();
        let err = preflight(&dir.path().join("_site/index.html")).unwrap_err();
        match err {
            ExportError::MissingInput { entries, .. } => assert!(entries.is_empty()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn check_content_rejects_small_page() {
        let dir = TempDir::new().unwrap();
        let page = dir.path().join("index.html");
        fs::write(&page, "<html></html>").unwrap();

        let err = check_content(&page, 100).unwrap_err();
        match err {
            ExportError::CorruptInput { chars, preview, .. } => {
                assert_eq!(chars, 13);
                assert_eq!(preview, "<html></html>");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn check_content_counts_characters_not_bytes() {
        let dir = TempDir::new().unwrap();
        let page = dir.path().join("index.html");
        // 60 two-byte characters: 120 bytes but only 60 characters.
        fs::write(&page, "é".repeat(60)).unwrap();
        assert!(check_content(&page, 100).is_err());

        fs::write(&page, "é".repeat(100)).unwrap();
        assert_eq!(check_content(&page, 100).unwrap().chars, 100);
    }

    #[test]
    fn file_url_for_unix_and_windows_paths() {
        assert_eq!(
            file_url(Path::new("/home/ci/_site/index.html")),
            "file:///home/ci/_site/index.html"
        );
        assert_eq!(
            file_url(Path::new(r"C:\site\index.html")),
            "file:///C:/site/index.html"
        );
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(preview("abcdef", 3), "abc\u{2026}");
        assert_eq!(preview("ééé", 2), "éé\u{2026}");
        assert_eq!(preview("ab", 5), "ab");
    }
}
