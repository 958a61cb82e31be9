use std::path::{Component, Path};

use rayon::prelude::*;
use serde::de::DeserializeOwned;

use crate::config::LocalesConfig;
use crate::error::WikiError;
use crate::scanner::scan_article_files;
use crate::types::{ArticleFlags, ArticleRecord, GroupFlags, GroupInfoRecord};

const MARKER: &str = "---";

/// Return the YAML between the opening `---` line and the next `---` line.
///
/// The block must start on the very first line; an unterminated block is not
/// front-matter.
pub fn front_matter(content: &str) -> Option<&str> {
    let mut lines = content.split_inclusive('\n');
    let first = lines.next()?;
    if trim_eol(first) != MARKER || !first.ends_with('\n') {
        return None;
    }

    let body_start = first.len();
    let mut offset = body_start;
    for line in lines {
        if trim_eol(line) == MARKER {
            return Some(&content[body_start..offset]);
        }
        offset += line.len();
    }
    None
}

fn trim_eol(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Count line terminators.
pub fn line_count(content: &str) -> usize {
    content.bytes().filter(|&b| b == b'\n').count()
}

fn decode_yaml<T>(yaml: &str, path: &Path) -> Result<T, WikiError>
where
    T: DeserializeOwned + Default,
{
    let malformed = |e: serde_yaml::Error| WikiError::Metadata {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let value: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(malformed)?;
    if value.is_null() {
        return Ok(T::default());
    }
    serde_yaml::from_value(value).map_err(malformed)
}

/// The plain scalar written for a top-level `key`, exactly as it appears.
///
/// Quoted, block and flow values are left to the YAML decoder.
fn plain_scalar<'a>(yaml: &'a str, key: &str) -> Option<&'a str> {
    yaml.lines().find_map(|line| {
        let rest = line.strip_prefix(key)?.trim_start().strip_prefix(':')?;
        let value = match rest.find(" #") {
            Some(i) => &rest[..i],
            None => rest,
        }
        .trim();
        let plain = value
            .chars()
            .next()
            .is_some_and(|c| !"'\"|>[{&*!#".contains(c));
        plain.then_some(value)
    })
}

/// Replace a decoded revision with its source token, so hashes YAML reads as
/// numbers (`1234e56`, `0123`) keep their spelling.
fn restore_revision(revision: &mut Option<String>, yaml: &str, key: &str) {
    if revision.is_none() {
        return;
    }
    if let Some(raw) = plain_scalar(yaml, key) {
        *revision = Some(raw.to_string());
    }
}

/// Split `<wiki_dir>/<logical path>/<locale>.md` into `(logical path, locale)`.
fn article_location(wiki_dir: &Path, file: &Path) -> Option<(String, String)> {
    let rel = file.strip_prefix(wiki_dir).ok()?;
    let locale = rel.file_stem()?.to_str()?.to_string();

    let parts: Vec<&str> = rel
        .parent()?
        .components()
        .map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect::<Option<_>>()?;
    if parts.is_empty() {
        return None;
    }

    Some((parts.join("/"), locale))
}

fn git_path(repo_root: &Path, file: &Path) -> String {
    file.strip_prefix(repo_root)
        .unwrap_or(file)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Build the record for one article file from its content.
///
/// Returns `Ok(None)` for files that are not articles of a supported locale.
pub fn parse_article(
    repo_root: &Path,
    file: &Path,
    content: &str,
    locales: &LocalesConfig,
) -> Result<Option<ArticleRecord>, WikiError> {
    let wiki_dir = repo_root.join("wiki");
    let Some((article_path, locale)) = article_location(&wiki_dir, file) else {
        tracing::debug!(path = %file.display(), "not inside an article directory, skipping");
        return Ok(None);
    };
    if !locales.is_supported(&locale) {
        tracing::debug!(path = %file.display(), %locale, "unsupported locale, skipping");
        return Ok(None);
    }

    let flags = match front_matter(content) {
        Some(yaml) => {
            let mut flags: ArticleFlags = decode_yaml(yaml, file)?;
            restore_revision(&mut flags.outdated_since, yaml, "outdated_since");
            restore_revision(
                &mut flags.no_native_review_since,
                yaml,
                "no_native_review_since",
            );
            flags
        }
        None => ArticleFlags::default(),
    };

    Ok(Some(ArticleRecord {
        article_path,
        git_path: git_path(repo_root, file),
        locale,
        line_count: line_count(content),
        flags,
    }))
}

/// Build the group record from a whole `meta/<group>/<locale>.yaml` document.
pub fn parse_group_info(
    repo_root: &Path,
    file: &Path,
    content: &str,
) -> Result<GroupInfoRecord, WikiError> {
    let mut flags: GroupFlags = decode_yaml(content, file)?;
    restore_revision(&mut flags.outdated_since, content, "outdated_since");
    let locale = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let group_path = file
        .parent()
        .and_then(Path::file_name)
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(GroupInfoRecord {
        group_path,
        git_path: git_path(repo_root, file),
        locale,
        line_count: line_count(content),
        flags,
    })
}

/// Scan `<repo_root>/wiki` and parse every article of a supported locale.
///
/// Files are read and parsed in parallel; the result keeps discovery order.
pub fn load_articles(
    repo_root: &Path,
    locales: &LocalesConfig,
) -> Result<Vec<ArticleRecord>, WikiError> {
    let files = scan_article_files(&repo_root.join("wiki"))?;

    let parsed: Vec<Option<ArticleRecord>> = files
        .par_iter()
        .map(|file| {
            let content = std::fs::read_to_string(file).map_err(|source| WikiError::Read {
                path: file.clone(),
                source,
            })?;
            parse_article(repo_root, file, &content, locales)
        })
        .collect::<Result<_, _>>()?;

    let articles: Vec<ArticleRecord> = parsed.into_iter().flatten().collect();
    tracing::info!(articles = articles.len(), "loaded article metadata");
    Ok(articles)
}

/// Path of the group metadata file for `locale`.
pub fn group_info_path(repo_root: &Path, locale: &str) -> std::path::PathBuf {
    repo_root
        .join("meta")
        .join("group-info")
        .join(format!("{locale}.yaml"))
}

/// Load `meta/group-info/<locale>.yaml`; an unreadable file counts as absent.
pub fn load_group_info(
    repo_root: &Path,
    locale: &str,
) -> Result<Option<GroupInfoRecord>, WikiError> {
    let path = group_info_path(repo_root, locale);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!(path = %path.display(), "no group info: {e}");
            return Ok(None);
        }
    };
    parse_group_info(repo_root, &path, &content).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn locales() -> LocalesConfig {
        LocalesConfig::default()
    }

    #[test]
    fn test_front_matter_extracts_block() {
        let content = "---\nstub: true\ntags:\n  - a\n---\n\n# Title\n";
        assert_eq!(front_matter(content), Some("stub: true\ntags:\n  - a\n"));
    }

    #[test]
    fn test_front_matter_absent_or_unterminated() {
        assert_eq!(front_matter("# Title\n---\nstub: true\n---\n"), None);
        assert_eq!(front_matter("---\nstub: true\n"), None);
        assert_eq!(front_matter(""), None);
    }

    #[test]
    fn test_front_matter_empty_block() {
        assert_eq!(front_matter("---\n---\n# Title\n"), Some(""));
    }

    #[test]
    fn test_line_count_counts_terminators() {
        assert_eq!(line_count(""), 0);
        assert_eq!(line_count("one"), 0);
        assert_eq!(line_count("one\ntwo\n"), 2);
    }

    #[test]
    fn test_parse_article_with_front_matter() {
        let root = Path::new("/repo");
        let file = root.join("wiki/People/osu!_team/pt-br.md");
        let content = "---\noutdated_translation: true\noutdated_since: 29253d9\n---\n\n# Team\n";

        let record = parse_article(root, &file, content, &locales())
            .unwrap()
            .unwrap();
        assert_eq!(record.article_path, "People/osu!_team");
        assert_eq!(record.locale, "pt-br");
        assert_eq!(record.git_path, "wiki/People/osu!_team/pt-br.md");
        assert_eq!(record.line_count, 6);
        assert!(record.flags.outdated_translation);
        assert_eq!(record.flags.outdated_since.as_deref(), Some("29253d9"));
        assert!(!record.flags.stub);
    }

    #[test]
    fn test_parse_article_keeps_number_shaped_revisions() {
        let root = Path::new("/repo");
        let file = root.join("wiki/Help/fr.md");
        let content = "---\noutdated_translation: true\noutdated_since: 1234e56\n\
                       no_native_review: true\nno_native_review_since: 0012345 # imported\n---\n";

        let record = parse_article(root, &file, content, &locales())
            .unwrap()
            .unwrap();
        assert_eq!(record.flags.outdated_since.as_deref(), Some("1234e56"));
        assert_eq!(record.flags.no_native_review_since.as_deref(), Some("0012345"));
    }

    #[test]
    fn test_plain_scalar_leaves_quoted_values_to_decoder() {
        let yaml = "outdated_since: '1234e56'\nstub: true\n";
        assert_eq!(plain_scalar(yaml, "outdated_since"), None);
        assert_eq!(plain_scalar(yaml, "stub"), Some("true"));
        assert_eq!(plain_scalar("  outdated_since: abc\n", "outdated_since"), None);
        assert_eq!(plain_scalar("outdated_since_old: abc\n", "outdated_since"), None);
    }

    #[test]
    fn test_parse_article_without_front_matter_defaults() {
        let root = Path::new("/repo");
        let record = parse_article(root, &root.join("wiki/Help/en.md"), "# Help\n", &locales())
            .unwrap()
            .unwrap();
        assert_eq!(record.flags, ArticleFlags::default());
    }

    #[test]
    fn test_parse_article_malformed_front_matter_fails() {
        let root = Path::new("/repo");
        let err = parse_article(
            root,
            &root.join("wiki/Help/en.md"),
            "---\nstub: [unclosed\n---\n",
            &locales(),
        )
        .unwrap_err();
        assert!(
            err.to_string().starts_with("malformed metadata at /repo/wiki/Help/en.md"),
            "{err}"
        );
    }

    #[test]
    fn test_parse_article_wrong_flag_type_fails() {
        let root = Path::new("/repo");
        let result = parse_article(
            root,
            &root.join("wiki/Help/en.md"),
            "---\nstub: maybe\n---\n",
            &locales(),
        );
        assert!(matches!(result, Err(WikiError::Metadata { .. })));
    }

    #[test]
    fn test_parse_article_skips_unsupported_locale() {
        let root = Path::new("/repo");
        let result = parse_article(root, &root.join("wiki/Help/xx.md"), "", &locales()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_parse_article_skips_file_at_wiki_root() {
        let root = Path::new("/repo");
        let result = parse_article(root, &root.join("wiki/en.md"), "", &locales()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_parse_group_info() {
        let root = Path::new("/repo");
        let file = root.join("meta/group-info/ja.yaml");
        let record = parse_group_info(
            root,
            &file,
            "outdated_translation: true\noutdated_since: abcdef0\n",
        )
        .unwrap();
        assert_eq!(record.group_path, "group-info");
        assert_eq!(record.locale, "ja");
        assert_eq!(record.git_path, "meta/group-info/ja.yaml");
        assert!(record.flags.outdated_translation);
        assert_eq!(record.flags.outdated_since.as_deref(), Some("abcdef0"));

        let float_shaped = parse_group_info(
            root,
            &file,
            "outdated_translation: true\noutdated_since: 5e12345\n",
        )
        .unwrap();
        assert_eq!(float_shaped.flags.outdated_since.as_deref(), Some("5e12345"));
    }

    #[test]
    fn test_load_articles_and_group_info() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("wiki/Help")).unwrap();
        fs::create_dir_all(root.join("meta/group-info")).unwrap();
        fs::write(root.join("wiki/Help/en.md"), "# Help\n").unwrap();
        fs::write(root.join("wiki/Help/fr.md"), "---\nneeds_cleanup: true\n---\n").unwrap();
        fs::write(root.join("meta/group-info/fr.yaml"), "outdated_translation: false\n").unwrap();

        let articles = load_articles(root, &locales()).unwrap();
        assert_eq!(articles.len(), 2);
        assert!(articles
            .iter()
            .any(|a| a.locale == "fr" && a.flags.needs_cleanup));

        let group = load_group_info(root, "fr").unwrap().unwrap();
        assert!(!group.flags.outdated_translation);
        assert!(load_group_info(root, "de").unwrap().is_none());
    }
}
