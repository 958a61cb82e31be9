use colored::Colorize;

use wiki_status_core::report::NO_ISSUES;
use wiki_status_core::{LocaleMenuItem, LocaleReport, ReportRow};

/// Format one locale report for terminal output.
pub fn format_report(report: &LocaleReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\n{}\n",
        format!("Wiki status: {}", report.locale).bold()
    ));
    out.push_str(&format!("{}\n\n", "=".repeat(40)));

    out.push_str(&format!(
        "{}: {} articles, {} problems\n",
        "Summary".bold(),
        report.article_count,
        count_colored(report.problem_count),
    ));

    if report.is_clean() {
        out.push_str(&format!("\n{}\n\n", NO_ISSUES.green().bold()));
        return out;
    }

    for section in &report.sections {
        out.push_str(&format!(
            "\n{} ({})\n{}\n",
            section.title.yellow().bold(),
            section.rows.len(),
            "-".repeat(40),
        ));
        for row in &section.rows {
            out.push_str(&format_row(row, section.kind.shows_origin()));
        }
    }

    out.push('\n');
    out
}

fn format_row(row: &ReportRow, with_origin: bool) -> String {
    let mut line = format!("  {} ({} lines)", row.path, row.lines);
    if with_origin {
        match (row.origin_date, &row.outdated_since) {
            (Some(date), _) => line.push_str(&format!(" since {}", date.to_string().cyan())),
            (None, Some(rev)) => line.push_str(&format!(" since {}", rev.dimmed())),
            (None, None) => line.push_str(&format!(" {}", "origin unknown".dimmed())),
        }
    }
    line.push('\n');
    line
}

fn count_colored(count: usize) -> String {
    if count == 0 {
        count.to_string().green().to_string()
    } else {
        count.to_string().red().to_string()
    }
}

/// Format the locale menu with problem counts, one locale per line.
pub fn format_menu(items: &[LocaleMenuItem]) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}\n", "Wiki status".bold()));
    out.push_str(&format!("{}\n", "=".repeat(40)));

    let width = items.iter().map(|i| i.code.len()).max().unwrap_or(0);
    for item in items {
        let line = format!(
            "  {:<width$}  {:>5} problems  {:>5} articles  {}",
            item.code,
            item.problem_count,
            item.article_count,
            item.name,
        );
        if item.hidden {
            out.push_str(&format!("{}\n", line.dimmed()));
        } else {
            out.push_str(&format!("{line}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiki_status_core::{ProblemCounts, Section, SectionKind};

    fn report(sections: Vec<Section>) -> LocaleReport {
        LocaleReport {
            locale: "de".to_string(),
            baseline: "en".to_string(),
            is_baseline: false,
            problems: ProblemCounts::default(),
            problem_count: sections.iter().map(|s| s.rows.len()).sum(),
            article_count: 3,
            sections,
        }
    }

    #[test]
    fn test_clean_report_message() {
        colored::control::set_override(false);
        let out = format_report(&report(vec![]));
        assert!(out.contains("No issues remaining. Nice work :)"));
        assert!(out.contains("3 articles, 0 problems"));
    }

    #[test]
    fn test_rows_listed_under_section() {
        colored::control::set_override(false);
        let section = Section {
            kind: SectionKind::Outdated,
            title: "Outdated translations".to_string(),
            rows: vec![ReportRow {
                path: "Help".to_string(),
                git_path: "wiki/Help/de.md".to_string(),
                locale: "de".to_string(),
                lines: 20,
                outdated_since: Some("abc1234".to_string()),
                origin_date: None,
                diff_link: None,
            }],
        };
        let out = format_report(&report(vec![section]));
        assert!(out.contains("Outdated translations (1)"));
        assert!(out.contains("  Help (20 lines) since abc1234"));
    }

    #[test]
    fn test_menu_lists_every_locale() {
        colored::control::set_override(false);
        let items = vec![
            LocaleMenuItem {
                code: "en".to_string(),
                name: "English".to_string(),
                flag: "GB".to_string(),
                problem_count: 2,
                article_count: 40,
                hidden: false,
            },
            LocaleMenuItem {
                code: "pt-br".to_string(),
                name: "Português (Brasil)".to_string(),
                flag: "BR".to_string(),
                problem_count: 38,
                article_count: 2,
                hidden: true,
            },
        ];
        let out = format_menu(&items);
        assert!(out.contains("English"));
        assert!(out.contains("pt-br"));
        assert!(out.contains("38 problems"));
    }
}
