use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::Options;
use crate::error::{ReleaseNotesError, Result};
use crate::formatter::{write_release_notes, FormatterRegistry};
use crate::output;
use crate::paths::Layout;
use crate::types::NormalizedReport;

pub fn read_report(path: &Path) -> Result<NormalizedReport> {
    let contents = std::fs::read_to_string(path).map_err(|e| ReleaseNotesError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(serde_json::from_str(&contents)?)
}

/// Render a working file to `<output>/<project>/Content/latest-release-<sprint>.htm`.
pub async fn run(
    options: &Options,
    layout: &Layout,
    registry: &FormatterRegistry,
) -> Result<PathBuf> {
    let file = options
        .file
        .as_deref()
        .ok_or(ReleaseNotesError::MissingOptions {
            missing: vec!["file"],
        })?;
    let working_file = layout
        .resolve_working_file(file, options.jira.project.as_deref())
        .ok_or(ReleaseNotesError::NoProject)?;
    info!("reading {}", working_file.display());

    let report = read_report(&working_file)?;
    let project = options
        .jira
        .project
        .as_deref()
        .or(report.project())
        .ok_or(ReleaseNotesError::NoProject)?;

    debug!(available = ?registry.names(), "formatter {}", options.output_formatter);
    let formatter = registry.get(&options.output_formatter)?;
    let output_path = write_release_notes(&report, formatter, &layout.html_dir(project)).await?;

    output::print_message(&format!("Release notes written to {}", output_path.display()));
    Ok(output_path)
}
