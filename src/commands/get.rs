use std::path::PathBuf;

use chrono::Utc;
use serde_json::Value;
use tracing::info;

use crate::auth;
use crate::client::{Endpoints, JiraClient};
use crate::commands::{fetch, resources};
use crate::config::{Config, Options};
use crate::error::{ReleaseNotesError, Result};
use crate::normalize::normalize;
use crate::output;
use crate::paths::Layout;
use crate::writer::write_file;

pub struct GetRun {
    /// Normalize the existing raw snapshot instead of fetching.
    pub local: bool,
    pub port: u16,
    pub endpoints: Endpoints,
}

/// Authorize, resolve the Jira site, fetch the sprint's issues and write the
/// working file. Returns the working file path.
pub async fn run(config: &Config, layout: &Layout, get: GetRun) -> Result<PathBuf> {
    let options = &config.options;
    let (project, sprint) = project_and_sprint(options)?;

    let raw = if get.local {
        read_snapshot(layout, project, sprint)?
    } else {
        let resource_name = options.jira.resource_name.as_deref().ok_or(
            ReleaseNotesError::MissingOptions {
                missing: vec!["jira.resourceName"],
            },
        )?;

        let token = auth::authorize(&config.credentials, get.port, get.endpoints.clone()).await?;
        let client = JiraClient::new(token, get.endpoints);
        let cloud_id = resources::resolve_cloud_id(&client, resource_name).await?;
        Value::Array(fetch::fetch_issues(&client, &cloud_id, &options.jira, layout).await?)
    };

    let path = make_working_file(&raw, options, layout)?;
    output::print_message(&format!("Working file written to {}", path.display()));
    Ok(path)
}

/// Normalize `raw` and write it as a new timestamped working file.
pub fn make_working_file(raw: &Value, options: &Options, layout: &Layout) -> Result<PathBuf> {
    let (project, sprint) = project_and_sprint(options)?;
    let report = normalize(raw, options)?;
    let path = layout.working_file(project, sprint, Utc::now().timestamp_millis());
    write_file(&path, &report)
}

fn read_snapshot(layout: &Layout, project: &str, sprint: &str) -> Result<Value> {
    let path = layout.raw_snapshot(project, sprint);
    info!("using local snapshot {}", path.display());
    let contents = std::fs::read_to_string(&path)
        .map_err(|e| ReleaseNotesError::FileRead { path, source: e })?;
    Ok(serde_json::from_str(&contents)?)
}

fn project_and_sprint(options: &Options) -> Result<(&str, &str)> {
    match (options.jira.project.as_deref(), options.sprint_value()) {
        (Some(project), Some(sprint)) => Ok((project, sprint)),
        _ => Err(ReleaseNotesError::MissingOptions {
            missing: vec!["jira.project", "jira.sprint"],
        }),
    }
}
