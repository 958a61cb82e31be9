//! Set logic behind the per-locale problem categories.
//!
//! Everything here is pure; [`crate::wiki::Wiki`] feeds it cached article
//! records and memoizes the results.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::exclusions::ExclusionRules;
use crate::types::{ArticleRecord, GroupInfoRecord, OutdatedEntry};

/// Baseline articles with no translation in `locale`, minus exclusions.
///
/// Keeps the baseline's discovery order.
pub fn missing_articles(
    articles: &[Arc<ArticleRecord>],
    baseline: &str,
    locale: &str,
    exclusions: &ExclusionRules,
) -> Vec<Arc<ArticleRecord>> {
    if locale == baseline {
        return Vec::new();
    }

    let translated: HashSet<&str> = articles
        .iter()
        .filter(|a| a.locale == locale)
        .map(|a| a.article_path.as_str())
        .collect();

    articles
        .iter()
        .filter(|a| a.locale == baseline)
        .filter(|a| !translated.contains(a.article_path.as_str()))
        .filter(|a| !exclusions.is_excluded(&a.article_path))
        .cloned()
        .collect()
}

/// Records of `locale` matching `predicate`, in discovery order.
pub fn articles_where<F>(
    articles: &[Arc<ArticleRecord>],
    locale: &str,
    predicate: F,
) -> Vec<Arc<ArticleRecord>>
where
    F: Fn(&ArticleRecord) -> bool,
{
    articles
        .iter()
        .filter(|a| a.locale == locale && predicate(a))
        .cloned()
        .collect()
}

/// Sort newest origin first; undated entries go last. Stable, so equal dates
/// keep discovery order.
pub fn sort_by_origin_desc<T>(entries: &mut [OutdatedEntry<T>]) {
    entries.sort_by(|a, b| b.origin.date.cmp(&a.origin.date));
}

/// Whether a locale's translation group still counts as needing translation.
///
/// An absent group record counts as needing translation.
pub fn group_needs_translation(group: Option<&GroupInfoRecord>) -> bool {
    group.map_or(true, |g| g.flags.outdated_translation)
}

/// Category sizes behind a locale's total problem count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProblemCounts {
    pub missing: usize,
    pub needs_cleanup: usize,
    pub no_native_review: usize,
    pub outdated_translations: usize,
    pub outdated: usize,
    pub stubs: usize,
    /// One unit standing for the whole translation group when its meta file
    /// is missing or outdated (non-baseline locales only).
    pub group: usize,
}

impl ProblemCounts {
    pub fn total(&self) -> usize {
        self.missing
            + self.needs_cleanup
            + self.no_native_review
            + self.outdated_translations
            + self.outdated
            + self.stubs
            + self.group
    }
}
