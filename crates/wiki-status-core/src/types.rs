use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Status flags decoded from an article's front-matter.
///
/// Every field defaults to `false`/`None`; keys the wiki uses for other
/// purposes (`tags`, `legacy_filename`, ...) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleFlags {
    #[serde(deserialize_with = "null_as_false")]
    pub needs_cleanup: bool,
    #[serde(deserialize_with = "null_as_false")]
    pub outdated: bool,
    #[serde(deserialize_with = "revision")]
    pub outdated_since: Option<String>,
    #[serde(deserialize_with = "null_as_false")]
    pub outdated_translation: bool,
    #[serde(deserialize_with = "null_as_false")]
    pub stub: bool,
    #[serde(deserialize_with = "null_as_false")]
    pub no_native_review: bool,
    #[serde(deserialize_with = "revision")]
    pub no_native_review_since: Option<String>,
}

/// Status flags of a translation group's meta file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupFlags {
    #[serde(deserialize_with = "null_as_false")]
    pub needs_cleanup: bool,
    #[serde(deserialize_with = "null_as_false")]
    pub outdated_translation: bool,
    #[serde(deserialize_with = "revision")]
    pub outdated_since: Option<String>,
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Commit ids made only of digits, or shaped like `1234e56`, are read by YAML
/// as numbers. The number is only a placeholder here; the metadata loader puts
/// back the token as written.
fn revision<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
        Float(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) if s.trim().is_empty() => None,
        Some(Raw::Text(s)) => Some(s.trim().to_string()),
        Some(Raw::Number(n)) => Some(n.to_string()),
        Some(Raw::Float(n)) => Some(n.to_string()),
        None => None,
    })
}

/// One article file: a (logical path, locale) pair found in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleRecord {
    /// Locale-independent path below `wiki/`, e.g. `People/osu!_team`.
    pub article_path: String,
    /// Path relative to the repository root, e.g. `wiki/People/osu!_team/fr.md`.
    pub git_path: String,
    pub locale: String,
    pub line_count: usize,
    pub flags: ArticleFlags,
}

impl ArticleRecord {
    pub fn needs_native_review(&self) -> bool {
        self.flags.no_native_review || self.flags.no_native_review_since.is_some()
    }
}

/// Translation-group metadata for one locale (`meta/group-info/<locale>.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupInfoRecord {
    /// Name of the meta directory, e.g. `group-info`.
    pub group_path: String,
    pub git_path: String,
    pub locale: String,
    pub line_count: usize,
    pub flags: GroupFlags,
}

/// Anything whose outdated state can be traced back through history.
pub trait Tracked {
    /// Human-readable logical path used in reports.
    fn display_path(&self) -> &str;
    fn git_path(&self) -> &str;
    fn locale(&self) -> &str;
    fn outdated_since(&self) -> Option<&str>;
}

impl Tracked for ArticleRecord {
    fn display_path(&self) -> &str {
        &self.article_path
    }

    fn git_path(&self) -> &str {
        &self.git_path
    }

    fn locale(&self) -> &str {
        &self.locale
    }

    fn outdated_since(&self) -> Option<&str> {
        self.flags.outdated_since.as_deref()
    }
}

impl Tracked for GroupInfoRecord {
    fn display_path(&self) -> &str {
        &self.group_path
    }

    fn git_path(&self) -> &str {
        &self.git_path
    }

    fn locale(&self) -> &str {
        &self.locale
    }

    fn outdated_since(&self) -> Option<&str> {
        self.flags.outdated_since.as_deref()
    }
}

/// Swap the locale file name of `git_path` for the baseline one, keeping the extension.
///
/// `wiki/Help/fr.md` becomes `wiki/Help/en.md`.
pub fn baseline_path(git_path: &str, baseline: &str) -> String {
    let (dir, file) = match git_path.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, git_path),
    };
    let file = match file.rsplit_once('.') {
        Some((_, ext)) => format!("{baseline}.{ext}"),
        None => baseline.to_string(),
    };
    match dir {
        Some(dir) => format!("{dir}/{file}"),
        None => file,
    }
}

/// A commit in the history store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub revision: String,
    pub date: NaiveDate,
}

/// Where an outdated state came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Origin {
    /// Revision recorded in metadata or found by searching history.
    pub revision: Option<String>,
    pub date: Option<NaiveDate>,
}

/// An outdated record paired with its resolved enrichment.
///
/// The record itself is the cached, shared value and is never modified.
#[derive(Debug, Clone, Serialize)]
pub struct OutdatedEntry<T> {
    pub record: Arc<T>,
    pub origin: Origin,
    /// Link identifier for the baseline diff; only set when the origin revision
    /// was recorded explicitly.
    pub diff_link: Option<String>,
}

/// Historical baseline diff for one outdated record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    /// `None` when the origin revision no longer resolves.
    pub diff_text: Option<String>,
    pub renamed: bool,
}

impl DiffResult {
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        self.diff_text.is_some()
    }
}

/// A diff ready to be written next to the reports.
#[derive(Debug, Clone, Serialize)]
pub struct DiffArtifact {
    pub link: String,
    pub article_path: String,
    pub baseline_git_path: String,
    pub revision: String,
    pub origin_date: Option<NaiveDate>,
    pub diff: String,
    pub renamed: bool,
}

impl DiffArtifact {
    pub fn short_revision(&self) -> &str {
        let end = self
            .revision
            .char_indices()
            .nth(7)
            .map_or(self.revision.len(), |(i, _)| i);
        &self.revision[..end]
    }

    /// Relative output location of this diff.
    pub fn output_path(&self, extension: &str) -> PathBuf {
        PathBuf::from(format!("{}.{extension}", self.link))
    }
}

/// A supported locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    pub code: String,
    pub name: String,
    /// ISO country code of the flag shown next to the locale.
    pub flag: String,
}

impl Locale {
    pub fn new(code: &str, name: &str, flag: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            flag: flag.to_string(),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}
