use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::{HistoryError, WikiError};
use crate::types::{baseline_path, Commit, DiffResult, Origin, Tracked};

/// Object-safe boxed future used by [`HistoryStore`] methods.
pub type HistoryFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, HistoryError>> + Send + 'a>>;

/// Line added when an article is flagged as outdated.
pub const OUTDATED_FLAG_PATTERN: &str = "^outdated(_translation)?: true";

/// Read-only queries against the version history of the wiki checkout.
pub trait HistoryStore: Send + Sync {
    /// Commit date of `revision`.
    fn commit_date<'a>(&'a self, revision: &'a str) -> HistoryFuture<'a, Option<NaiveDate>>;

    /// Most recent commit whose change to `path` adds or removes a line matching `pattern`.
    fn last_change_matching<'a>(
        &'a self,
        path: &'a str,
        pattern: &'a str,
    ) -> HistoryFuture<'a, Option<Commit>>;

    /// Every path the file at `path` occupied in commits `from..to`, following renames.
    fn path_history<'a>(
        &'a self,
        from: &'a str,
        to: &'a str,
        path: &'a str,
    ) -> HistoryFuture<'a, Vec<String>>;

    /// Unified diff of `paths` between `from` and `to`.
    fn diff<'a>(
        &'a self,
        from: &'a str,
        to: &'a str,
        paths: &'a [String],
    ) -> HistoryFuture<'a, String>;
}

/// Resolves where an outdated state came from and what changed since.
///
/// Lookups that fail degrade to "unknown" with a warning; only failures the
/// store marks as fatal abort the run.
#[derive(Clone)]
pub struct HistoryResolver {
    store: Arc<dyn HistoryStore>,
    mainline: String,
    baseline: String,
}

/// Whether `revision` looks like a commit reference rather than an option or path.
///
/// Accepts hashes, branch names and `~`/`^` suffixes; anything starting with `-`
/// or containing whitespace is rejected.
pub fn is_valid_revision(revision: &str) -> bool {
    let mut chars = revision.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphanumeric())
        && chars.all(|c| c.is_ascii_alphanumeric() || "._/~^-".contains(c))
}

/// Identifier a renderer uses to link an outdated record to its baseline diff.
pub fn diff_link(revision: &str, path: &str) -> String {
    format!("diff/{revision}/{path}")
}

impl HistoryResolver {
    pub fn new(store: Arc<dyn HistoryStore>, mainline: &str, baseline: &str) -> Self {
        Self {
            store,
            mainline: mainline.to_string(),
            baseline: baseline.to_string(),
        }
    }

    pub fn mainline(&self) -> &str {
        &self.mainline
    }

    /// Keep the value on success, degrade to `None` on recoverable failures.
    fn soften<T>(
        &self,
        subject: &str,
        result: Result<Option<T>, HistoryError>,
    ) -> Result<Option<T>, WikiError> {
        match result {
            Ok(value) => Ok(value),
            Err(e) if e.is_fatal() => Err(WikiError::History {
                subject: subject.to_string(),
                source: e,
            }),
            Err(e) => {
                tracing::warn!(subject, "history lookup failed: {e}");
                Ok(None)
            }
        }
    }

    /// Find the revision and date that introduced the outdated flag.
    ///
    /// A recorded `outdated_since` revision wins; otherwise the most recent
    /// commit toggling the flag in the record's own file is used, which is
    /// only an approximation when the flag was toggled more than once.
    pub async fn origin<T: Tracked + ?Sized>(&self, record: &T) -> Result<Origin, WikiError> {
        let subject = record.git_path();

        if let Some(revision) = record.outdated_since() {
            if !is_valid_revision(revision) {
                tracing::warn!(subject, revision, "ignoring malformed origin revision");
                return Ok(Origin::default());
            }
            let date = self.soften(subject, self.store.commit_date(revision).await)?;
            return Ok(Origin {
                revision: Some(revision.to_string()),
                date,
            });
        }

        let commit = self.soften(
            subject,
            self.store
                .last_change_matching(subject, OUTDATED_FLAG_PATTERN)
                .await,
        )?;
        Ok(match commit {
            Some(commit) => Origin {
                revision: Some(commit.revision),
                date: Some(commit.date),
            },
            None => Origin::default(),
        })
    }

    /// Link to the baseline diff, available only for recorded origin revisions.
    pub fn diff_link_for<T: Tracked + ?Sized>(&self, record: &T) -> Option<String> {
        if record.locale() == self.baseline {
            return None;
        }
        let revision = record.outdated_since().filter(|r| is_valid_revision(r))?;
        Some(diff_link(
            revision,
            &baseline_path(record.git_path(), &self.baseline),
        ))
    }

    /// Diff of the baseline file from the recorded origin revision to the mainline tip.
    ///
    /// Every path the baseline file had in that range is included so renames
    /// show up as one diff.
    pub async fn diff<T: Tracked + ?Sized>(&self, record: &T) -> Result<DiffResult, WikiError> {
        let Some(revision) = record.outdated_since() else {
            return Ok(DiffResult::unavailable());
        };
        if record.locale() == self.baseline {
            return Ok(DiffResult::unavailable());
        }
        if !is_valid_revision(revision) {
            tracing::warn!(path = record.git_path(), revision, "ignoring malformed origin revision");
            return Ok(DiffResult::unavailable());
        }

        let current = baseline_path(record.git_path(), &self.baseline);
        let from = format!("{revision}^");

        let history = self.soften(
            &current,
            self.store
                .path_history(&from, &self.mainline, &current)
                .await
                .map(Some),
        )?;
        let Some(history) = history else {
            return Ok(DiffResult::unavailable());
        };

        let mut paths = vec![current];
        for path in history {
            if !path.is_empty() && !paths.contains(&path) {
                paths.push(path);
            }
        }

        let text = self.soften(
            &paths[0],
            self.store.diff(&from, &self.mainline, &paths).await.map(Some),
        )?;

        Ok(match text {
            Some(text) => DiffResult {
                diff_text: Some(text),
                renamed: paths.len() > 1,
            },
            None => DiffResult::unavailable(),
        })
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// In-memory history used by tests.
    #[derive(Default)]
    pub struct FakeHistory {
        pub dates: HashMap<String, NaiveDate>,
        pub flag_changes: HashMap<String, Commit>,
        pub renames: HashMap<String, Vec<String>>,
        pub fatal: bool,
        pub calls: AtomicUsize,
        pub diffed: Mutex<Vec<Vec<String>>>,
    }

    impl FakeHistory {
        pub fn with_date(mut self, revision: &str, date: &str) -> Self {
            self.dates.insert(revision.to_string(), date.parse().unwrap());
            self
        }

        pub fn with_flag_change(mut self, path: &str, revision: &str, date: &str) -> Self {
            self.flag_changes.insert(
                path.to_string(),
                Commit {
                    revision: revision.to_string(),
                    date: date.parse().unwrap(),
                },
            );
            self
        }

        pub fn with_renames(mut self, path: &str, previous: &[&str]) -> Self {
            self.renames.insert(
                path.to_string(),
                previous.iter().map(|p| p.to_string()).collect(),
            );
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn check(&self, revision: &str) -> Result<(), HistoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fatal {
                return Err(HistoryError::RetriesExhausted {
                    program: "git".to_string(),
                    attempts: 5,
                    source: std::io::Error::from(std::io::ErrorKind::OutOfMemory),
                });
            }
            let bare = revision.trim_end_matches('^');
            if !bare.is_empty() && !self.dates.contains_key(bare) {
                return Err(HistoryError::Exit {
                    command: format!("git log {revision}"),
                    status: "exit status: 128".to_string(),
                    stderr: format!("fatal: bad revision '{revision}'"),
                });
            }
            Ok(())
        }
    }

    impl HistoryStore for FakeHistory {
        fn commit_date<'a>(&'a self, revision: &'a str) -> HistoryFuture<'a, Option<NaiveDate>> {
            Box::pin(async move {
                self.check(revision)?;
                Ok(self.dates.get(revision).copied())
            })
        }

        fn last_change_matching<'a>(
            &'a self,
            path: &'a str,
            _pattern: &'a str,
        ) -> HistoryFuture<'a, Option<Commit>> {
            Box::pin(async move {
                self.check("")?;
                Ok(self.flag_changes.get(path).cloned())
            })
        }

        fn path_history<'a>(
            &'a self,
            from: &'a str,
            _to: &'a str,
            path: &'a str,
        ) -> HistoryFuture<'a, Vec<String>> {
            Box::pin(async move {
                self.check(from)?;
                let mut paths = vec![path.to_string()];
                paths.extend(self.renames.get(path).cloned().unwrap_or_default());
                Ok(paths)
            })
        }

        fn diff<'a>(
            &'a self,
            from: &'a str,
            to: &'a str,
            paths: &'a [String],
        ) -> HistoryFuture<'a, String> {
            Box::pin(async move {
                self.check(from)?;
                self.diffed.lock().unwrap().push(paths.to_vec());
                Ok(format!("diff {from}...{to} -- {}", paths.join(" ")))
            })
        }
    }
}
