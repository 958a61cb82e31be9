use std::collections::HashSet;

use wiki_status_core::report::NO_ISSUES;
use wiki_status_core::{LocaleMenuItem, LocaleReport, ReportRow, Section};

use crate::DIFF_NOT_FOUND;

/// Format one locale report as Markdown.
///
/// `written` holds the diff links whose artifacts exist; other diff links
/// point at the placeholder page.
pub fn format_report(report: &LocaleReport, written: &HashSet<String>) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Wiki status: {}\n\n", report.locale));
    out.push_str(&format!(
        "- **Articles:** {}\n- **Problems:** {}\n",
        report.article_count, report.problem_count
    ));

    if report.is_clean() {
        out.push_str(&format!("\n{NO_ISSUES}\n"));
        return out;
    }

    for section in &report.sections {
        out.push_str(&format_section(section, written));
    }
    out
}

fn format_section(section: &Section, written: &HashSet<String>) -> String {
    let mut out = format!("\n## {} ({})\n\n", section.title, section.rows.len());

    if section.kind.shows_origin() {
        out.push_str("| Article | Lines | Outdated since | Diff |\n");
        out.push_str("|---------|-------|----------------|------|\n");
        for row in &section.rows {
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                article_link(row),
                row.lines,
                origin_cell(row),
                diff_cell(row, written),
            ));
        }
    } else {
        out.push_str("| Article | Lines |\n");
        out.push_str("|---------|-------|\n");
        for row in &section.rows {
            out.push_str(&format!("| {} | {} |\n", article_link(row), row.lines));
        }
    }
    out
}

fn article_link(row: &ReportRow) -> String {
    // Markdown tables break on raw pipes.
    let label = row.path.replace('|', "\\|");
    format!("[{label}](/{})", row.git_path)
}

fn origin_cell(row: &ReportRow) -> String {
    let revision = row
        .outdated_since
        .as_deref()
        .map(|r| format!("`{}`", r.chars().take(7).collect::<String>()));
    match (row.origin_date, revision) {
        (Some(date), Some(rev)) => format!("{date} {rev}"),
        (Some(date), None) => date.to_string(),
        (None, Some(rev)) => rev,
        (None, None) => "unknown".to_string(),
    }
}

fn diff_cell(row: &ReportRow, written: &HashSet<String>) -> String {
    match &row.diff_link {
        Some(link) if written.contains(link) => format!("[diff]({link}.diff)"),
        Some(_) => format!("[diff not found]({DIFF_NOT_FOUND}.md)"),
        None => String::new(),
    }
}

/// Format the locale index as Markdown. Hidden locales are listed after the
/// visible ones in a collapsed block.
pub fn format_menu(items: &[LocaleMenuItem]) -> String {
    let mut out = String::from("# Wiki status\n\n");

    let (visible, hidden): (Vec<_>, Vec<_>) = items.iter().partition(|i| !i.hidden);
    out.push_str(&menu_table(&visible));

    if !hidden.is_empty() {
        out.push_str(&format!(
            "\n<details>\n<summary>Other locales ({})</summary>\n\n",
            hidden.len()
        ));
        out.push_str(&menu_table(&hidden));
        out.push_str("\n</details>\n");
    }
    out
}

fn menu_table(items: &[&LocaleMenuItem]) -> String {
    let mut out = String::new();
    out.push_str("| Locale | Articles | Problems |\n");
    out.push_str("|--------|----------|----------|\n");
    for item in items {
        out.push_str(&format!(
            "| [{}]({}.md) | {} | {} |\n",
            item.name, item.code, item.article_count, item.problem_count
        ));
    }
    out
}

/// Page linked from outdated rows whose diff could not be produced.
pub fn format_diff_not_found() -> String {
    "# Diff not found\n\nThe revision this translation was marked outdated against \
     no longer exists in the history of the wiki.\n"
        .to_string()
}
