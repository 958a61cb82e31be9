use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// One path that could not be visited while scanning the article tree.
#[derive(Debug, Clone)]
pub struct ScanIssue {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for ScanIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Errors that abort a classification run.
#[derive(Error, Debug)]
pub enum WikiError {
    #[error("failed to scan {}: {} unreadable path(s), first: {}", .root.display(), .issues.len(), first_issue(.issues))]
    Scan {
        root: PathBuf,
        issues: Vec<ScanIssue>,
    },

    #[error("malformed metadata at {}: {message}", .path.display())]
    Metadata { path: PathBuf, message: String },

    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("history lookup failed for {subject}")]
    History {
        subject: String,
        #[source]
        source: HistoryError,
    },

    #[error("background scan task failed")]
    Task(#[from] tokio::task::JoinError),
}

fn first_issue(issues: &[ScanIssue]) -> String {
    issues
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| "none".to_string())
}

/// Errors raised by a history store query.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("failed to launch `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch `{program}` after {attempts} attempts")]
    RetriesExhausted {
        program: String,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Exit {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`{command}` wrote to stderr: {stderr}")]
    Stderr { command: String, stderr: String },

    #[error("`{command}` produced non-UTF-8 output")]
    Utf8 { command: String },

    #[error("unexpected output from `{command}`: {output}")]
    Parse { command: String, output: String },
}

impl HistoryError {
    /// Whether this failure must abort the run instead of degrading to "no diff".
    ///
    /// Failing to launch the history program at all means no lookup can
    /// succeed, so it is fatal along with exhausted retries.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HistoryError::Spawn { .. } | HistoryError::RetriesExhausted { .. }
        )
    }
}
