use tracing::info;

use crate::client::{body_text, json_body, JiraClient};
use crate::error::{ReleaseNotesError, Result};
use crate::types::AccessibleResource;

/// Find the cloud id of the Jira site named `resource_name` among the
/// sites the token can reach.
pub async fn resolve_cloud_id(client: &JiraClient, resource_name: &str) -> Result<String> {
    let not_found = |reason: String| ReleaseNotesError::ResourceNotFound {
        name: resource_name.to_string(),
        reason,
    };

    let url = client.endpoints().accessible_resources_url();
    let response = client
        .get(&url)
        .await
        .map_err(|e| not_found(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = body_text(response).await;
        return Err(not_found(format!("status {}: {body}", status.as_u16())));
    }

    let resources: Vec<AccessibleResource> = json_body(response)
        .await
        .map_err(|e| not_found(e.to_string()))?;

    let id = find_resource_id(&resources, resource_name)?;
    info!("resource id: {id}");
    Ok(id)
}

pub fn find_resource_id(resources: &[AccessibleResource], resource_name: &str) -> Result<String> {
    resources
        .iter()
        .find(|r| r.name == resource_name)
        .map(|r| r.id.clone())
        .ok_or_else(|| ReleaseNotesError::ResourceNotFound {
            name: resource_name.to_string(),
            reason: format!("none of {} accessible resources match", resources.len()),
        })
}
