//! Renderer-facing view of one locale: ordered sections of rows, plus the
//! locale menu shown on the index page.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use futures::future::join_all;
use serde::Serialize;

use crate::classify::ProblemCounts;
use crate::error::WikiError;
use crate::types::{ArticleRecord, GroupInfoRecord, OutdatedEntry, Tracked};
use crate::wiki::Wiki;

/// Report sections, in the order they are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    OutdatedGroupInfo,
    MissingGroupInfo,
    Outdated,
    MissingArticles,
    MissingStubs,
    NeedsCleanup,
    NoNativeReview,
    OutdatedInBaseline,
    MissingOutdatedInBaseline,
    MissingStubsOutdatedInBaseline,
    Stubs,
}

impl SectionKind {
    /// Heading of the section as shown for a `locale` report.
    pub fn title(&self, locale: &str, baseline: &str) -> String {
        let base = baseline.to_uppercase();
        match self {
            SectionKind::OutdatedGroupInfo => "Outdated translations of meta files".to_string(),
            SectionKind::MissingGroupInfo => "Missing meta files".to_string(),
            SectionKind::Outdated if locale == baseline => "Outdated".to_string(),
            SectionKind::Outdated => "Outdated translations".to_string(),
            SectionKind::MissingArticles => "Missing articles".to_string(),
            SectionKind::MissingStubs => "Missing stubs".to_string(),
            SectionKind::NeedsCleanup => "Needs cleanup".to_string(),
            SectionKind::NoNativeReview => "No native review".to_string(),
            SectionKind::OutdatedInBaseline => format!("Outdated translations (outdated in {base})"),
            SectionKind::MissingOutdatedInBaseline => format!("Missing articles (outdated in {base})"),
            SectionKind::MissingStubsOutdatedInBaseline => {
                format!("Missing stubs (outdated in {base})")
            }
            SectionKind::Stubs => "Stubs".to_string(),
        }
    }

    /// Whether rows of this section carry origin information worth a column.
    pub fn shows_origin(&self) -> bool {
        matches!(
            self,
            SectionKind::OutdatedGroupInfo
                | SectionKind::Outdated
                | SectionKind::OutdatedInBaseline
        )
    }
}

/// One listed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub path: String,
    pub git_path: String,
    pub locale: String,
    pub lines: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outdated_since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_link: Option<String>,
}

impl ReportRow {
    fn plain(record: &ArticleRecord) -> Self {
        Self {
            path: record.article_path.clone(),
            git_path: record.git_path.clone(),
            locale: record.locale.clone(),
            lines: record.line_count,
            outdated_since: record.flags.outdated_since.clone(),
            origin_date: None,
            diff_link: None,
        }
    }

    fn group(record: &GroupInfoRecord) -> Self {
        Self {
            path: record.group_path.clone(),
            git_path: record.git_path.clone(),
            locale: record.locale.clone(),
            lines: record.line_count,
            outdated_since: record.flags.outdated_since.clone(),
            origin_date: None,
            diff_link: None,
        }
    }

    fn outdated<T: Tracked>(entry: &OutdatedEntry<T>, lines: usize) -> Self {
        let record = entry.record.as_ref();
        Self {
            path: record.display_path().to_string(),
            git_path: record.git_path().to_string(),
            locale: record.locale().to_string(),
            lines,
            outdated_since: entry.origin.revision.clone(),
            origin_date: entry.origin.date,
            diff_link: entry.diff_link.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub title: String,
    pub rows: Vec<ReportRow>,
}

/// Everything a renderer needs for one locale page.
#[derive(Debug, Clone, Serialize)]
pub struct LocaleReport {
    pub locale: String,
    pub baseline: String,
    pub is_baseline: bool,
    pub problems: ProblemCounts,
    pub problem_count: usize,
    pub article_count: usize,
    pub sections: Vec<Section>,
}

pub const NO_ISSUES: &str = "No issues remaining. Nice work :)";

impl LocaleReport {
    pub async fn build(wiki: &Wiki, locale: &str) -> Result<Self, WikiError> {
        let baseline = wiki.baseline().to_string();
        let is_baseline = wiki.is_baseline(locale);

        let mut sections: Vec<(SectionKind, Vec<ReportRow>)> = Vec::new();
        let mut push = |kind: SectionKind, rows: Vec<ReportRow>| {
            if !rows.is_empty() {
                sections.push((kind, rows));
            }
        };

        if !is_baseline {
            if let Some(group) = wiki.outdated_group_info(locale).await? {
                let rows = vec![ReportRow::outdated(&*group, group.record.line_count)];
                push(SectionKind::OutdatedGroupInfo, rows);
            }
            if wiki.group_info(locale).await?.is_none() {
                let rows = wiki
                    .group_info(&baseline)
                    .await?
                    .map(|g| vec![ReportRow::group(&g)])
                    .unwrap_or_default();
                push(SectionKind::MissingGroupInfo, rows);
            }
        }

        // Translations carry the baseline's `outdated` marker in their own front-matter.
        let outdated = wiki.outdated_translations(locale).await?;
        let (stale, current): (Vec<_>, Vec<_>) =
            outdated.iter().partition(|e| e.record.flags.outdated);
        let rows = |entries: Vec<&OutdatedEntry<ArticleRecord>>| -> Vec<ReportRow> {
            entries
                .into_iter()
                .map(|e| ReportRow::outdated(e, e.record.line_count))
                .collect()
        };
        let (stale, current) = (rows(stale), rows(current));
        if is_baseline {
            let rows = wiki
                .outdated_baseline()
                .await?
                .iter()
                .map(|a| ReportRow::plain(a))
                .collect();
            push(SectionKind::Outdated, rows);
        } else {
            push(SectionKind::Outdated, current);
        }

        let mut missing: HashMap<SectionKind, Vec<ReportRow>> = HashMap::new();
        for article in wiki.missing(locale).await?.iter() {
            let kind = match (article.flags.outdated, article.flags.stub) {
                (false, false) => SectionKind::MissingArticles,
                (false, true) => SectionKind::MissingStubs,
                (true, false) => SectionKind::MissingOutdatedInBaseline,
                (true, true) => SectionKind::MissingStubsOutdatedInBaseline,
            };
            missing.entry(kind).or_default().push(ReportRow::plain(article));
        }
        let mut take = |kind| missing.remove(&kind).unwrap_or_default();

        push(SectionKind::MissingArticles, take(SectionKind::MissingArticles));
        push(SectionKind::MissingStubs, take(SectionKind::MissingStubs));

        let rows = wiki
            .needs_cleanup(locale)
            .await?
            .iter()
            .map(|a| ReportRow::plain(a))
            .collect();
        push(SectionKind::NeedsCleanup, rows);

        let rows = wiki
            .no_native_review(locale)
            .await?
            .iter()
            .map(|a| ReportRow::plain(a))
            .collect();
        push(SectionKind::NoNativeReview, rows);

        push(SectionKind::OutdatedInBaseline, stale);
        push(
            SectionKind::MissingOutdatedInBaseline,
            take(SectionKind::MissingOutdatedInBaseline),
        );
        push(
            SectionKind::MissingStubsOutdatedInBaseline,
            take(SectionKind::MissingStubsOutdatedInBaseline),
        );

        if is_baseline {
            let rows = wiki
                .stubs_baseline()
                .await?
                .iter()
                .map(|a| ReportRow::plain(a))
                .collect();
            push(SectionKind::Stubs, rows);
        }

        let problems = wiki.problem_counts(locale).await?;
        let sections = sections
            .into_iter()
            .map(|(kind, rows)| Section {
                kind,
                title: kind.title(locale, &baseline),
                rows,
            })
            .collect();

        Ok(Self {
            locale: locale.to_string(),
            is_baseline,
            problem_count: problems.total(),
            problems,
            article_count: wiki.article_count(locale).await?,
            baseline,
            sections,
        })
    }

    pub fn is_clean(&self) -> bool {
        self.sections.is_empty()
    }
}

/// One entry of the locale switcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleMenuItem {
    pub code: String,
    pub name: String,
    pub flag: String,
    pub problem_count: usize,
    pub article_count: usize,
    /// Locales with too few articles are folded away by renderers.
    pub hidden: bool,
}

impl fmt::Display for LocaleMenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name, self.code, self.problem_count)
    }
}

/// Menu entries for every supported locale: baseline first, then visible
/// before hidden, otherwise in configuration order.
pub async fn locale_menu(wiki: &Wiki) -> Result<Vec<LocaleMenuItem>, WikiError> {
    let threshold = wiki.config().report.hidden_locale_threshold;
    let locales = &wiki.config().locales.supported;

    let items = join_all(locales.iter().map(|locale| async move {
        let article_count = wiki.article_count(&locale.code).await?;
        Ok::<_, WikiError>(LocaleMenuItem {
            code: locale.code.clone(),
            name: locale.name.clone(),
            flag: locale.flag.clone(),
            problem_count: wiki.total_problem_count(&locale.code).await?,
            article_count,
            hidden: article_count < threshold,
        })
    }))
    .await;

    let mut items = items.into_iter().collect::<Result<Vec<_>, _>>()?;
    items.sort_by_key(|item| (!wiki.is_baseline(&item.code), item.hidden));
    Ok(items)
}
