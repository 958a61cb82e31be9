use serde::Serialize;

use wiki_status_core::{LocaleMenuItem, LocaleReport};

fn to_json<T: Serialize + ?Sized>(value: &T, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
}

/// Format one locale report as JSON.
pub fn format_report(report: &LocaleReport, compact: bool) -> serde_json::Result<String> {
    to_json(report, compact)
}

/// Index document: the baseline locale plus the menu entries.
#[derive(Debug, Serialize)]
pub struct IndexOutput<'a> {
    pub baseline: &'a str,
    pub locales: &'a [LocaleMenuItem],
}

pub fn format_menu(
    baseline: &str,
    items: &[LocaleMenuItem],
    compact: bool,
) -> serde_json::Result<String> {
    to_json(
        &IndexOutput {
            baseline,
            locales: items,
        },
        compact,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiki_status_core::{ProblemCounts, ReportRow, Section, SectionKind};

    fn sample_report() -> LocaleReport {
        LocaleReport {
            locale: "fr".to_string(),
            baseline: "en".to_string(),
            is_baseline: false,
            problems: ProblemCounts {
                missing: 1,
                group: 1,
                ..ProblemCounts::default()
            },
            problem_count: 2,
            article_count: 10,
            sections: vec![Section {
                kind: SectionKind::MissingArticles,
                title: "Missing articles".to_string(),
                rows: vec![ReportRow {
                    path: "FAQ".to_string(),
                    git_path: "wiki/FAQ/en.md".to_string(),
                    locale: "en".to_string(),
                    lines: 12,
                    outdated_since: None,
                    origin_date: None,
                    diff_link: None,
                }],
            }],
        }
    }

    #[test]
    fn test_format_report_valid_json() {
        let json = format_report(&sample_report(), false).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("should be valid JSON");
        assert_eq!(parsed["locale"], "fr");
        assert_eq!(parsed["problem_count"], 2);
        assert_eq!(parsed["problems"]["group"], 1);
        assert_eq!(parsed["sections"][0]["kind"], "missing_articles");
        assert_eq!(parsed["sections"][0]["rows"][0]["lines"], 12);
        assert!(parsed["sections"][0]["rows"][0].get("diff_link").is_none());
    }

    #[test]
    fn test_format_report_compact_is_single_line() {
        let json = format_report(&sample_report(), true).unwrap();
        assert!(!json.contains('\n'), "compact JSON should be single line");
    }

    #[test]
    fn test_format_menu() {
        let items = vec![LocaleMenuItem {
            code: "en".to_string(),
            name: "English".to_string(),
            flag: "GB".to_string(),
            problem_count: 3,
            article_count: 100,
            hidden: false,
        }];
        let json = format_menu("en", &items, false).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["baseline"], "en");
        assert_eq!(parsed["locales"][0]["code"], "en");
        assert_eq!(parsed["locales"][0]["hidden"], false);
    }
}
