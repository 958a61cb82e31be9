use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;

use crate::classify::{self, ProblemCounts};
use crate::config::Config;
use crate::error::WikiError;
use crate::exclusions::ExclusionRules;
use crate::git::GitHistory;
use crate::history::{HistoryResolver, HistoryStore};
use crate::memo::Memo;
use crate::metadata;
use crate::types::{
    baseline_path, ArticleRecord, DiffArtifact, DiffResult, GroupInfoRecord, OutdatedEntry,
    Tracked,
};

pub type ArticleList = Arc<Vec<Arc<ArticleRecord>>>;
pub type OutdatedList = Arc<Vec<OutdatedEntry<ArticleRecord>>>;
pub type OutdatedGroup = Option<Arc<OutdatedEntry<GroupInfoRecord>>>;

/// Memoized queries over one wiki checkout.
///
/// Each query is computed at most once per argument for the lifetime of the
/// value; concurrent callers share the in-flight computation.
pub struct Wiki {
    root: PathBuf,
    config: Config,
    exclusions: ExclusionRules,
    history: HistoryResolver,

    articles: Memo<(), ArticleList>,
    article_counts: Memo<String, usize>,
    group_info: Memo<String, Option<Arc<GroupInfoRecord>>>,
    outdated_group_info: Memo<String, OutdatedGroup>,
    missing: Memo<String, ArticleList>,
    needs_cleanup: Memo<String, ArticleList>,
    no_native_review: Memo<String, ArticleList>,
    outdated_translations: Memo<String, OutdatedList>,
    outdated_baseline: Memo<(), ArticleList>,
    stubs_baseline: Memo<(), ArticleList>,
    problem_counts: Memo<String, ProblemCounts>,
    diffs: Memo<(String, String), DiffResult>,
}

impl Wiki {
    /// Open the checkout at `root`, reading history through `git`.
    pub fn open(root: &Path, config: Config) -> Result<Self, WikiError> {
        let store = Arc::new(GitHistory::new(root, &config.history));
        Self::with_history(root, config, store)
    }

    pub fn with_history(
        root: &Path,
        config: Config,
        store: Arc<dyn HistoryStore>,
    ) -> Result<Self, WikiError> {
        if !config.locales.is_supported(&config.locales.baseline) {
            return Err(WikiError::Config(format!(
                "baseline locale '{}' is not a supported locale",
                config.locales.baseline
            )));
        }

        let exclusions = ExclusionRules::compile(&config.exclusions)?;
        let history =
            HistoryResolver::new(store, &config.history.mainline, &config.locales.baseline);

        Ok(Self {
            root: root.to_path_buf(),
            config,
            exclusions,
            history,
            articles: Memo::new(),
            article_counts: Memo::new(),
            group_info: Memo::new(),
            outdated_group_info: Memo::new(),
            missing: Memo::new(),
            needs_cleanup: Memo::new(),
            no_native_review: Memo::new(),
            outdated_translations: Memo::new(),
            outdated_baseline: Memo::new(),
            stubs_baseline: Memo::new(),
            problem_counts: Memo::new(),
            diffs: Memo::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn baseline(&self) -> &str {
        &self.config.locales.baseline
    }

    pub fn is_baseline(&self, locale: &str) -> bool {
        locale == self.baseline()
    }

    /// Every article of every supported locale, in discovery order.
    pub async fn articles(&self) -> Result<ArticleList, WikiError> {
        self.articles
            .get_or_try_init((), || async {
                let root = self.root.clone();
                let locales = self.config.locales.clone();
                let articles =
                    tokio::task::spawn_blocking(move || metadata::load_articles(&root, &locales))
                        .await??;
                Ok(Arc::new(articles.into_iter().map(Arc::new).collect()))
            })
            .await
    }

    pub async fn article_count(&self, locale: &str) -> Result<usize, WikiError> {
        self.article_counts
            .get_or_try_init(locale.to_string(), || async {
                let articles = self.articles().await?;
                Ok(articles.iter().filter(|a| a.locale == locale).count())
            })
            .await
    }

    /// Group metadata of `locale`, `None` when the locale has no meta file.
    pub async fn group_info(
        &self,
        locale: &str,
    ) -> Result<Option<Arc<GroupInfoRecord>>, WikiError> {
        self.group_info
            .get_or_try_init(locale.to_string(), || async {
                let root = self.root.clone();
                let code = locale.to_string();
                let group =
                    tokio::task::spawn_blocking(move || metadata::load_group_info(&root, &code))
                        .await??;
                Ok(group.map(Arc::new))
            })
            .await
    }

    /// The group metadata of a non-baseline locale when it is flagged outdated.
    pub async fn outdated_group_info(&self, locale: &str) -> Result<OutdatedGroup, WikiError> {
        self.outdated_group_info
            .get_or_try_init(locale.to_string(), || async {
                if self.is_baseline(locale) {
                    return Ok(None);
                }
                let Some(group) = self.group_info(locale).await? else {
                    return Ok(None);
                };
                if !group.flags.outdated_translation {
                    return Ok(None);
                }
                let entry = self.outdated_entry(group).await?;
                Ok(Some(Arc::new(entry)))
            })
            .await
    }

    async fn outdated_entry<T: Tracked>(
        &self,
        record: Arc<T>,
    ) -> Result<OutdatedEntry<T>, WikiError> {
        let origin = self.history.origin(record.as_ref()).await?;
        let diff_link = self.history.diff_link_for(record.as_ref());
        Ok(OutdatedEntry {
            record,
            origin,
            diff_link,
        })
    }

    /// Baseline articles that have no translation in `locale`.
    pub async fn missing(&self, locale: &str) -> Result<ArticleList, WikiError> {
        self.missing
            .get_or_try_init(locale.to_string(), || async {
                let articles = self.articles().await?;
                Ok(Arc::new(classify::missing_articles(
                    &articles,
                    self.baseline(),
                    locale,
                    &self.exclusions,
                )))
            })
            .await
    }

    pub async fn needs_cleanup(&self, locale: &str) -> Result<ArticleList, WikiError> {
        self.needs_cleanup
            .get_or_try_init(locale.to_string(), || async {
                let articles = self.articles().await?;
                Ok(Arc::new(classify::articles_where(&articles, locale, |a| {
                    a.flags.needs_cleanup
                })))
            })
            .await
    }

    pub async fn no_native_review(&self, locale: &str) -> Result<ArticleList, WikiError> {
        self.no_native_review
            .get_or_try_init(locale.to_string(), || async {
                if self.is_baseline(locale) {
                    return Ok(Arc::new(Vec::new()));
                }
                let articles = self.articles().await?;
                Ok(Arc::new(classify::articles_where(
                    &articles,
                    locale,
                    ArticleRecord::needs_native_review,
                )))
            })
            .await
    }

    /// Translations flagged outdated, newest origin first.
    pub async fn outdated_translations(&self, locale: &str) -> Result<OutdatedList, WikiError> {
        self.outdated_translations
            .get_or_try_init(locale.to_string(), || async {
                if self.is_baseline(locale) {
                    return Ok(Arc::new(Vec::new()));
                }
                let articles = self.articles().await?;
                let flagged =
                    classify::articles_where(&articles, locale, |a| a.flags.outdated_translation);

                let mut entries = join_all(
                    flagged
                        .into_iter()
                        .map(|record| self.outdated_entry(record)),
                )
                .await
                .into_iter()
                .collect::<Result<Vec<_>, _>>()?;

                classify::sort_by_origin_desc(&mut entries);
                Ok(Arc::new(entries))
            })
            .await
    }

    /// Baseline articles flagged outdated.
    pub async fn outdated_baseline(&self) -> Result<ArticleList, WikiError> {
        self.outdated_baseline
            .get_or_try_init((), || async {
                let articles = self.articles().await?;
                Ok(Arc::new(classify::articles_where(
                    &articles,
                    self.baseline(),
                    |a| a.flags.outdated,
                )))
            })
            .await
    }

    pub async fn stubs_baseline(&self) -> Result<ArticleList, WikiError> {
        self.stubs_baseline
            .get_or_try_init((), || async {
                let articles = self.articles().await?;
                Ok(Arc::new(classify::articles_where(
                    &articles,
                    self.baseline(),
                    |a| a.flags.stub,
                )))
            })
            .await
    }

    pub async fn problem_counts(&self, locale: &str) -> Result<ProblemCounts, WikiError> {
        self.problem_counts
            .get_or_try_init(locale.to_string(), || async {
                let mut counts = ProblemCounts {
                    missing: self.missing(locale).await?.len(),
                    needs_cleanup: self.needs_cleanup(locale).await?.len(),
                    no_native_review: self.no_native_review(locale).await?.len(),
                    outdated_translations: self.outdated_translations(locale).await?.len(),
                    ..ProblemCounts::default()
                };

                if self.is_baseline(locale) {
                    counts.outdated = self.outdated_baseline().await?.len();
                    counts.stubs = self.stubs_baseline().await?.len();
                } else {
                    let group = self.group_info(locale).await?;
                    if classify::group_needs_translation(group.as_deref()) {
                        counts.group = 1;
                    }
                }

                Ok(counts)
            })
            .await
    }

    pub async fn total_problem_count(&self, locale: &str) -> Result<usize, WikiError> {
        Ok(self.problem_counts(locale).await?.total())
    }

    /// Baseline diff since the recorded origin of `record`.
    pub async fn diff<T: Tracked>(&self, record: &T) -> Result<DiffResult, WikiError> {
        let key = (
            record.git_path().to_string(),
            record.outdated_since().unwrap_or_default().to_string(),
        );
        self.diffs
            .get_or_try_init(key, || self.history.diff(record))
            .await
    }

    /// Every available baseline diff referenced from the report of `locale`.
    pub async fn diff_artifacts(&self, locale: &str) -> Result<Vec<DiffArtifact>, WikiError> {
        if self.is_baseline(locale) {
            return Ok(Vec::new());
        }

        let mut artifacts = Vec::new();
        if let Some(group) = self.outdated_group_info(locale).await? {
            artifacts.extend(self.diff_artifact(&group).await?);
        }
        for entry in self.outdated_translations(locale).await?.iter() {
            artifacts.extend(self.diff_artifact(entry).await?);
        }
        Ok(artifacts)
    }

    async fn diff_artifact<T: Tracked>(
        &self,
        entry: &OutdatedEntry<T>,
    ) -> Result<Option<DiffArtifact>, WikiError> {
        let record = entry.record.as_ref();
        let (Some(link), Some(revision)) = (&entry.diff_link, record.outdated_since()) else {
            return Ok(None);
        };

        let diff = self.diff(record).await?;
        let Some(text) = diff.diff_text else {
            tracing::debug!(path = record.git_path(), revision, "no diff available");
            return Ok(None);
        };

        Ok(Some(DiffArtifact {
            link: link.clone(),
            article_path: record.display_path().to_string(),
            baseline_git_path: baseline_path(record.git_path(), self.baseline()),
            revision: revision.to_string(),
            origin_date: entry.origin.date,
            diff: text,
            renamed: diff.renamed,
        }))
    }
}
