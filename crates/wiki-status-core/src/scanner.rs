use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{ScanIssue, WikiError};

/// Whether `file_name` looks like a locale article: `[a-z-]{2,5}.md`.
pub fn is_article_file(file_name: &str) -> bool {
    let Some(stem) = file_name.strip_suffix(".md") else {
        return false;
    };
    (2..=5).contains(&stem.len()) && stem.bytes().all(|b| b.is_ascii_lowercase() || b == b'-')
}

/// Recursively collect every locale article file under `wiki_dir`.
///
/// Any entry that cannot be read (the root included) fails the whole scan:
/// a silently skipped directory would show up as missing articles.
pub fn scan_article_files(wiki_dir: &Path) -> Result<Vec<PathBuf>, WikiError> {
    let mut files = Vec::new();
    let mut issues = Vec::new();

    for entry in WalkDir::new(wiki_dir).sort_by_file_name() {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file()
                    && entry.file_name().to_str().is_some_and(is_article_file)
                {
                    files.push(entry.into_path());
                }
            }
            Err(e) => issues.push(ScanIssue {
                path: e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| wiki_dir.to_path_buf()),
                message: e
                    .io_error()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| e.to_string()),
            }),
        }
    }

    if !issues.is_empty() {
        return Err(WikiError::Scan {
            root: wiki_dir.to_path_buf(),
            issues,
        });
    }

    tracing::debug!(root = %wiki_dir.display(), files = files.len(), "scanned article tree");
    Ok(files)
}
