//! Renderers for [`wiki_status_core::LocaleReport`] and the locale menu.

pub mod diff;
pub mod json;
pub mod markdown;
pub mod text;

/// Link target used for outdated rows whose baseline diff could not be produced.
pub const DIFF_NOT_FOUND: &str = "diff-not-found";
