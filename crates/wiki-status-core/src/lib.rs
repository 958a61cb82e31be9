pub mod classify;
pub mod config;
pub mod error;
pub mod exclusions;
pub mod git;
pub mod history;
pub mod memo;
pub mod metadata;
pub mod report;
pub mod retry;
pub mod scanner;
pub mod types;
pub mod wiki;

pub use classify::ProblemCounts;
pub use config::Config;
pub use error::{HistoryError, WikiError};
pub use git::GitHistory;
pub use history::{HistoryResolver, HistoryStore};
pub use report::{locale_menu, LocaleMenuItem, LocaleReport, ReportRow, Section, SectionKind};
pub use types::*;
pub use wiki::Wiki;
