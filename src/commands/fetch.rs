use reqwest::StatusCode;
use serde_json::Value;
use tracing::{error, info};

use crate::client::{body_text, JiraClient};
use crate::config::JiraOptions;
use crate::error::{ReleaseNotesError, Result};
use crate::paths::Layout;
use crate::responses::{SearchRequest, SearchResponse};
use crate::writer::write_file;

/// The explicit filter when one is configured, otherwise issues of the
/// project in the configured sprint, newest first.
pub fn build_jql(jira: &JiraOptions) -> Result<String> {
    if let Some(filter) = &jira.filter {
        return Ok(filter.clone());
    }

    match (&jira.project, &jira.sprint) {
        (Some(project), Some(sprint)) => {
            let field = sprint.field.as_deref().ok_or(ReleaseNotesError::NoQuery)?;
            Ok(format!(
                "project = {project} AND '{field}' = '{}' ORDER BY created DESC",
                sprint.value
            ))
        }
        _ => Err(ReleaseNotesError::NoQuery),
    }
}

pub fn search_request(jira: &JiraOptions) -> Result<SearchRequest> {
    Ok(SearchRequest {
        jql: build_jql(jira)?,
        start_at: 0,
        fields: jira.fields.clone(),
        fields_by_keys: false,
        expand: vec!["renderedFields".to_string()],
    })
}

/// Run the search for `cloud_id` and persist the raw `issues` array as the
/// project's sprint snapshot. Only the first page is fetched.
pub async fn fetch_issues(
    client: &JiraClient,
    cloud_id: &str,
    jira: &JiraOptions,
    layout: &Layout,
) -> Result<Vec<Value>> {
    info!("Get issues from JIRA");

    let (project, sprint) = match (&jira.project, &jira.sprint) {
        (Some(project), Some(sprint)) => (project.as_str(), sprint.value.as_str()),
        _ => {
            return Err(ReleaseNotesError::MissingOptions {
                missing: vec!["jira.project", "jira.sprint"],
            })
        }
    };

    let request = search_request(jira)?;
    info!(jql = %request.jql, "searching");

    let url = client.endpoints().search_url(cloud_id);
    let response = client.post(&url, &request).await.inspect_err(|e| error!("{e}"))?;

    let status = response.status();
    if status != StatusCode::OK {
        let message = body_text(response).await;
        error!("JIRA query failed with response code {}", status.as_u16());
        return Err(ReleaseNotesError::Fetch {
            status: status.as_u16(),
            message,
        });
    }

    let details: SearchResponse = response.json().await?;
    info!("fetched {} issues", details.issues.len());

    write_file(&layout.raw_snapshot(project, sprint), &details.issues)?;
    Ok(details.issues)
}
