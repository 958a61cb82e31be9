use std::path::{Path, PathBuf};
use std::process::Output;

use chrono::NaiveDate;
use tokio::process::Command;

use crate::config::HistoryConfig;
use crate::error::HistoryError;
use crate::history::{HistoryFuture, HistoryStore};
use crate::retry::{is_transient_io_error, RetryError, RetryPolicy};
use crate::types::Commit;

/// [`HistoryStore`] backed by the `git` command line.
///
/// Any output on stderr is treated as a failure, even with a zero exit status.
pub struct GitHistory {
    repo_root: PathBuf,
    program: String,
    retry: RetryPolicy,
}

impl GitHistory {
    pub fn new(repo_root: &Path, config: &HistoryConfig) -> Self {
        Self {
            repo_root: repo_root.to_path_buf(),
            program: config.git.clone(),
            retry: RetryPolicy::fixed(config.retry_attempts, config.retry_delay()),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run git with `args` and return its trimmed stdout.
    async fn git(&self, args: &[&str]) -> Result<String, HistoryError> {
        let command = format!("{} {}", self.program, args.join(" "));
        tracing::debug!(%command, "running history query");

        let output = self
            .retry
            .run(|| self.launch(args), is_transient_io_error)
            .await
            .map_err(|e| match e {
                RetryError::Permanent(source) => HistoryError::Spawn {
                    program: self.program.clone(),
                    source,
                },
                RetryError::Exhausted { attempts, last } => HistoryError::RetriesExhausted {
                    program: self.program.clone(),
                    attempts,
                    source: last,
                },
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(HistoryError::Exit {
                command,
                status: output.status.to_string(),
                stderr,
            });
        }
        if !stderr.is_empty() {
            return Err(HistoryError::Stderr { command, stderr });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| HistoryError::Utf8 {
            command: command.clone(),
        })?;
        Ok(stdout.trim().to_string())
    }

    async fn launch(&self, args: &[&str]) -> std::io::Result<Output> {
        Command::new(&self.program)
            .args(args)
            .current_dir(&self.repo_root)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true)
            .output()
            .await
    }
}

fn parse_date(command: &str, text: &str) -> Result<NaiveDate, HistoryError> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| HistoryError::Parse {
        command: command.to_string(),
        output: text.to_string(),
    })
}

/// Parse a `%H %cs` log line.
fn parse_commit(command: &str, line: &str) -> Result<Commit, HistoryError> {
    let (revision, date) = line.split_once(' ').ok_or_else(|| HistoryError::Parse {
        command: command.to_string(),
        output: line.to_string(),
    })?;
    Ok(Commit {
        revision: revision.to_string(),
        date: parse_date(command, date)?,
    })
}

/// Distinct non-empty lines, in order of first appearance.
fn unique_lines(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if !seen.iter().any(|s: &String| s == line) {
            seen.push(line.to_string());
        }
    }
    seen
}

impl HistoryStore for GitHistory {
    fn commit_date<'a>(&'a self, revision: &'a str) -> HistoryFuture<'a, Option<NaiveDate>> {
        Box::pin(async move {
            let out = self
                .git(&["log", "-1", "--pretty=%cs", "--end-of-options", revision, "--"])
                .await?;
            if out.is_empty() {
                return Ok(None);
            }
            parse_date("git log --pretty=%cs", &out).map(Some)
        })
    }

    fn last_change_matching<'a>(
        &'a self,
        path: &'a str,
        pattern: &'a str,
    ) -> HistoryFuture<'a, Option<Commit>> {
        Box::pin(async move {
            let pickaxe = format!("-S{pattern}");
            let out = self
                .git(&[
                    "log",
                    "-1",
                    "--pickaxe-regex",
                    "--pretty=%H %cs",
                    &pickaxe,
                    "--",
                    path,
                ])
                .await?;
            match out.lines().next() {
                Some(line) if !line.trim().is_empty() => {
                    parse_commit("git log --pickaxe-regex", line.trim()).map(Some)
                }
                _ => Ok(None),
            }
        })
    }

    fn path_history<'a>(
        &'a self,
        from: &'a str,
        to: &'a str,
        path: &'a str,
    ) -> HistoryFuture<'a, Vec<String>> {
        Box::pin(async move {
            let range = format!("{from}..{to}");
            let out = self
                .git(&[
                    "log",
                    "--follow",
                    "--name-only",
                    "--pretty=",
                    "--end-of-options",
                    &range,
                    "--",
                    path,
                ])
                .await?;
            Ok(unique_lines(&out))
        })
    }

    fn diff<'a>(
        &'a self,
        from: &'a str,
        to: &'a str,
        paths: &'a [String],
    ) -> HistoryFuture<'a, String> {
        Box::pin(async move {
            let range = format!("{from}...{to}");
            let mut args = vec![
                "diff",
                "--find-renames=1%",
                "--minimal",
                "--no-color",
                "--end-of-options",
                range.as_str(),
                "--",
            ];
            args.extend(paths.iter().map(String::as_str));
            self.git(&args).await
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::Path;
    use std::process::Command;

    /// Run git synchronously in `dir` with a fixed identity, panicking on failure.
    pub fn git(dir: &Path, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .env("GIT_AUTHOR_NAME", "Wiki Bot")
            .env("GIT_AUTHOR_EMAIL", "bot@example.com")
            .env("GIT_COMMITTER_NAME", "Wiki Bot")
            .env("GIT_COMMITTER_EMAIL", "bot@example.com")
            .env("GIT_AUTHOR_DATE", "2024-03-01T12:00:00Z")
            .env("GIT_COMMITTER_DATE", "2024-03-01T12:00:00Z")
            .output()
            .expect("failed to run git");
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Create an empty repository whose default branch is `master`.
    pub fn init_repo(dir: &Path) {
        git(dir, &["init", "-q"]);
        git(dir, &["symbolic-ref", "HEAD", "refs/heads/master"]);
        git(dir, &["config", "commit.gpgsign", "false"]);
    }

    pub fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    /// Stage everything and commit; returns the new commit id.
    pub fn commit_all(dir: &Path, message: &str) -> String {
        git(dir, &["add", "-A"]);
        git(dir, &["commit", "-q", "-m", message]);
        git(dir, &["rev-parse", "HEAD"])
    }
}
