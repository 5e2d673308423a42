//! Formatter capability and the adapter that writes its output.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use html_escape::encode_text;
use tracing::info;

use crate::error::{ReleaseNotesError, Result};
use crate::paths::release_notes_file_name;
use crate::types::{NormalizedIssue, NormalizedReport};
use crate::writer::write_file;

/// Turns a normalized report into an HTML document. Implementations may
/// write supporting assets into `output_dir`.
#[async_trait]
pub trait Formatter: Send + Sync {
    async fn render(&self, report: &NormalizedReport, output_dir: &Path) -> Result<String>;
}

/// Formatters available to `make`, keyed by name.
pub struct FormatterRegistry {
    formatters: HashMap<String, Box<dyn Formatter>>,
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(ReleaseNotesFormatter::NAME, ReleaseNotesFormatter);
        registry
    }
}

impl FormatterRegistry {
    pub fn empty() -> Self {
        Self {
            formatters: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: &str, formatter: impl Formatter + 'static) {
        self.formatters.insert(name.to_string(), Box::new(formatter));
    }

    /// Look up a formatter. A trailing `.js` is ignored so older option
    /// files naming `release-notes.js` keep working.
    pub fn get(&self, name: &str) -> Result<&dyn Formatter> {
        let key = name.strip_suffix(".js").unwrap_or(name);
        self.formatters
            .get(key)
            .map(|f| f.as_ref())
            .ok_or_else(|| ReleaseNotesError::UnknownFormatter(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.formatters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Render `report` with `formatter` and write it to
/// `<html_dir>/latest-release-<sprint-slug>.htm`.
pub async fn write_release_notes(
    report: &NormalizedReport,
    formatter: &dyn Formatter,
    html_dir: &Path,
) -> Result<PathBuf> {
    let sprint = report.sprint_value().ok_or(ReleaseNotesError::NoSprint)?;
    let output_path = html_dir.join(release_notes_file_name(sprint));

    let html = formatter.render(report, html_dir).await?;
    write_file(&output_path, &html)
}

const STYLESHEET_NAME: &str = "release-notes.css";

const STYLESHEET: &str = "body { font-family: sans-serif; margin: 2em auto; max-width: 60em; }
h1 { border-bottom: 1px solid #ccc; padding-bottom: .3em; }
h2 { margin-top: 1.5em; }
.issue-key { font-family: monospace; font-weight: bold; margin-right: .5em; }
.issue-status { color: #666; font-size: .9em; margin-left: .5em; }
.issue-description { margin: .5em 0 1em 1.5em; }
";

/// Built-in formatter: issues grouped by type, one list per group.
pub struct ReleaseNotesFormatter;

impl ReleaseNotesFormatter {
    pub const NAME: &'static str = "release-notes";
}

#[async_trait]
impl Formatter for ReleaseNotesFormatter {
    async fn render(&self, report: &NormalizedReport, output_dir: &Path) -> Result<String> {
        write_file(&output_dir.join(STYLESHEET_NAME), STYLESHEET)?;

        let title = match report.sprint_value() {
            Some(sprint) => format!("Release notes: {sprint}"),
            None => "Release notes".to_string(),
        };
        info!("rendering {} issues", report.issues().len());

        let mut html = String::new();
        render_document(&mut html, &title, report).map_err(rendering_failed)?;
        Ok(html)
    }
}

fn rendering_failed(err: fmt::Error) -> ReleaseNotesError {
    ReleaseNotesError::Formatter {
        name: ReleaseNotesFormatter::NAME.to_string(),
        message: err.to_string(),
    }
}

fn render_document<W: fmt::Write>(
    html: &mut W,
    title: &str,
    report: &NormalizedReport,
) -> fmt::Result {
    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html>\n<head>")?;
    writeln!(html, "<meta charset=\"utf-8\">")?;
    writeln!(html, "<title>{}</title>", encode_text(title))?;
    writeln!(html, "<link rel=\"stylesheet\" href=\"{STYLESHEET_NAME}\">")?;
    writeln!(html, "</head>\n<body>")?;
    writeln!(html, "<h1>{}</h1>", encode_text(title))?;

    if report.issues().is_empty() {
        writeln!(html, "<p>No issues in this release.</p>")?;
    }

    for (group, issues) in group_by_type(report.issues()) {
        writeln!(html, "<h2>{}</h2>", encode_text(group))?;
        writeln!(html, "<ul>")?;
        for issue in issues {
            render_issue(html, issue)?;
        }
        writeln!(html, "</ul>")?;
    }

    writeln!(html, "</body>\n</html>")
}

fn render_issue<W: fmt::Write>(html: &mut W, issue: &NormalizedIssue) -> fmt::Result {
    write!(
        html,
        "<li><span class=\"issue-key\">{}</span>{}",
        encode_text(&issue.key),
        encode_text(&issue.summary)
    )?;
    if let Some(status) = issue.status() {
        write!(html, "<span class=\"issue-status\">({})</span>", encode_text(status))?;
    }
    // Rendered fields are already HTML produced by Jira.
    if let Some(description) = issue.rendered_description() {
        write!(html, "<div class=\"issue-description\">{description}</div>")?;
    }
    writeln!(html, "</li>")
}

/// Group issues by type name, keeping groups in first-seen order.
fn group_by_type(issues: &[NormalizedIssue]) -> Vec<(&str, Vec<&NormalizedIssue>)> {
    let mut groups: Vec<(&str, Vec<&NormalizedIssue>)> = Vec::new();
    for issue in issues {
        let name = issue.issue_type().unwrap_or("Other");
        match groups.iter_mut().find(|(group, _)| *group == name) {
            Some((_, members)) => members.push(issue),
            None => groups.push((name, vec![issue])),
        }
    }
    groups
}
