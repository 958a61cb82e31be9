use wiki_status_core::DiffArtifact;

/// Render a diff artifact as a patch file with a commented header.
pub fn format_diff(artifact: &DiffArtifact) -> String {
    let mut out = String::new();

    out.push_str(&format!("# {}\n", artifact.article_path));
    out.push_str(&format!(
        "# Changes to {} since {}",
        artifact.baseline_git_path,
        artifact.short_revision()
    ));
    if let Some(date) = artifact.origin_date {
        out.push_str(&format!(" ({date})"));
    }
    out.push('\n');
    if artifact.renamed {
        out.push_str("# The file was renamed in this range; earlier paths are included.\n");
    }
    out.push('\n');

    out.push_str(&artifact.diff);
    if !artifact.diff.ends_with('\n') {
        out.push('\n');
    }
    out
}
