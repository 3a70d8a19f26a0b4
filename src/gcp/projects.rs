//! GCP Projects
//!
//! Functions for listing accessible GCP projects.

use super::client::GcpClient;
use anyhow::Result;
use serde_json::Value;

/// Project information
#[derive(Debug, Clone)]
pub struct Project {
    pub project_id: String,
    pub name: String,
    pub project_number: String,
    pub lifecycle_state: String,
}

impl From<&Value> for Project {
    fn from(value: &Value) -> Self {
        let field = |key: &str, default: &str| {
            value
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or(default)
                .to_string()
        };

        Self {
            project_id: field("projectId", "-"),
            name: field("name", "-"),
            project_number: field("projectNumber", "-"),
            lifecycle_state: field("lifecycleState", "UNKNOWN"),
        }
    }
}

/// List all accessible, active GCP projects
pub async fn list_projects(client: &GcpClient) -> Result<Vec<Project>> {
    let mut projects = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let mut url = client.resourcemanager_url("projects");
        if let Some(token) = &page_token {
            url = format!("{}?pageToken={}", url, urlencoding::encode(token));
        }

        let response = client.get(&url).await?;

        if let Some(arr) = response.get("projects").and_then(|v| v.as_array()) {
            projects.extend(
                arr.iter()
                    .map(Project::from)
                    .filter(|p| p.lifecycle_state == "ACTIVE"),
            );
        }

        page_token = response
            .get("nextPageToken")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        if page_token.is_none() {
            break;
        }
    }

    Ok(projects)
}

/// Get project IDs as a simple list
pub async fn list_project_ids(client: &GcpClient) -> Result<Vec<String>> {
    let projects = list_projects(client).await?;
    Ok(projects.into_iter().map(|p| p.project_id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_project_from_value_defaults() {
        let p = Project::from(&json!({"projectId": "proj-a"}));
        assert_eq!(p.project_id, "proj-a");
        assert_eq!(p.name, "-");
        assert_eq!(p.lifecycle_state, "UNKNOWN");
    }
}
