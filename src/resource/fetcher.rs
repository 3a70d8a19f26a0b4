//! Resource Fetcher
//!
//! Handles fetching resources from GCP APIs based on resource definitions,
//! one project at a time or across many projects concurrently.

use super::reference::ResourceRef;
use super::registry::{get_resource, ResourceDef, Scope};
use super::sdk_dispatch;
use crate::gcp::client::GcpClient;
use crate::gcp::http::format_gcp_error;
use anyhow::{Context, Result};
use futures::future::join_all;
use serde_json::Value;

/// Result of paginated fetch
pub struct PaginatedResult {
    pub items: Vec<Value>,
    pub next_token: Option<String>,
}

/// One listed resource: its handle plus the raw (post-processed) item
#[derive(Debug, Clone)]
pub struct ListedResource {
    pub resource: ResourceRef,
    pub item: Value,
}

/// A project whose listing failed
#[derive(Debug, Clone)]
pub struct ProjectFailure {
    pub project: String,
    pub error: String,
}

/// Listing of one kind across several projects
#[derive(Debug, Clone, Default)]
pub struct ListedResources {
    pub items: Vec<ListedResource>,
    pub failures: Vec<ProjectFailure>,
}

/// Client-side selection filter (`--name`, `--state`)
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    /// Name patterns; `*` matches any run of characters. Empty matches all.
    pub names: Vec<String>,
    /// State label, compared case-insensitively
    pub state: Option<String>,
}

impl ResourceFilter {
    pub fn new(names: Vec<String>, state: Option<String>) -> Self {
        Self { names, state }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.state.is_none()
    }

    pub fn matches(&self, resource: &ResourceRef) -> bool {
        let name_ok =
            self.names.is_empty() || self.names.iter().any(|p| wildcard_match(p, &resource.name));
        let state_ok = self
            .state
            .as_deref()
            .is_none_or(|s| s.eq_ignore_ascii_case(&resource.state));
        name_ok && state_ok
    }

    pub fn apply(&self, items: Vec<ListedResource>) -> Vec<ListedResource> {
        items
            .into_iter()
            .filter(|l| self.matches(&l.resource))
            .collect()
    }
}

/// Glob-style match supporting only `*`
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let (first, rest) = (parts[0], &parts[1..]);
    let Some(mut remaining) = text.strip_prefix(first) else {
        return false;
    };

    let (last, middle) = match rest.split_last() {
        Some(split) => split,
        None => return true,
    };

    for part in middle {
        match remaining.find(part) {
            Some(idx) => remaining = &remaining[idx + part.len()..],
            None => return false,
        }
    }

    remaining.len() >= last.len() && remaining.ends_with(last)
}

/// Fetch all resources of one kind in one project (auto-paginate)
pub async fn fetch_resources(
    resource_key: &str,
    client: &GcpClient,
    project: &str,
) -> Result<Vec<Value>> {
    let Some(resource_def) = get_resource(resource_key) else {
        return Err(anyhow::anyhow!("Unknown resource: {}", resource_key));
    };

    let mut all_items = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let result =
            fetch_resources_paginated(resource_def, client, project, page_token.as_deref())
                .await?;
        all_items.extend(result.items);

        if result.next_token.is_none() {
            break;
        }
        page_token = result.next_token;
    }

    tracing::debug!(
        "Fetched {} {} in {}",
        all_items.len(),
        resource_key,
        project
    );

    Ok(all_items)
}

/// Fetch one page of resources
pub async fn fetch_resources_paginated(
    resource_def: &ResourceDef,
    client: &GcpClient,
    project: &str,
    page_token: Option<&str>,
) -> Result<PaginatedResult> {
    let mut params = resource_def.sdk_method_params.clone();
    if params.is_null() {
        params = Value::Object(serde_json::Map::new());
    }

    if let (Value::Object(ref mut map), Some(token)) = (&mut params, page_token) {
        map.insert("pageToken".to_string(), Value::String(token.to_string()));
    }

    let response = sdk_dispatch::invoke_sdk(
        &resource_def.service,
        &resource_def.sdk_method,
        client,
        project,
        &params,
    )
    .await?;

    let response = if resource_def.scope == Scope::Aggregated {
        sdk_dispatch::flatten_aggregated_response(response)
    } else {
        response
    };

    let items = extract_items(&response, &resource_def.response_path, project);

    let next_token = response
        .get("nextPageToken")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    Ok(PaginatedResult { items, next_token })
}

/// List one kind in every project concurrently.
///
/// Projects that fail are reported in `failures`; the call only errors
/// when every project failed.
pub async fn fetch_across_projects(
    resource_key: &str,
    client: &GcpClient,
    projects: &[String],
) -> Result<ListedResources> {
    let Some(resource_def) = get_resource(resource_key) else {
        return Err(anyhow::anyhow!("Unknown resource: {}", resource_key));
    };
    if projects.is_empty() {
        anyhow::bail!("No project selected. Use --project, --all-projects or `gcpops config set --project`");
    }

    let results = join_all(projects.iter().map(|project| async move {
        let fetched = fetch_resources(resource_key, client, project).await;
        (project.as_str(), fetched)
    }))
    .await;

    let mut listed = ListedResources::default();
    let mut last_error = None;

    for (project, fetched) in results {
        match fetched {
            Ok(items) => listed.items.extend(items.into_iter().map(|item| ListedResource {
                resource: ResourceRef::from_item(resource_key, resource_def, project, &item),
                item,
            })),
            Err(e) => {
                tracing::warn!("Listing {} failed in {}: {:#}", resource_key, project, e);
                listed.failures.push(ProjectFailure {
                    project: project.to_string(),
                    error: format_gcp_error(&e),
                });
                last_error = Some(e);
            },
        }
    }

    if listed.failures.len() == projects.len() {
        if let Some(e) = last_error {
            return Err(e).with_context(|| {
                format!(
                    "Failed to list {} in all {} project(s)",
                    resource_def.display_name,
                    projects.len()
                )
            });
        }
    }

    Ok(listed)
}

/// Extract items from response using the response_path
fn extract_items(response: &Value, path: &str, project: &str) -> Vec<Value> {
    let raw_items = if path.is_empty() {
        response.as_array().cloned().unwrap_or_default()
    } else {
        let mut current = response;
        for part in path.split('.') {
            current = match current.get(part) {
                Some(v) => v,
                None => return vec![],
            };
        }
        current.as_array().cloned().unwrap_or_default()
    };

    raw_items
        .into_iter()
        .map(|item| post_process_item(item, project))
        .collect()
}

/// Post-process an item to add computed/derived fields
fn post_process_item(mut item: Value, project: &str) -> Value {
    if let Value::Object(ref mut map) = item {
        map.insert("_project".to_string(), Value::String(project.to_string()));

        // Extract short names from full URLs
        for field in ["zone", "region", "machineType", "type", "instanceTemplate"] {
            if let Some(url) = map.get(field).and_then(|v| v.as_str()) {
                let short = extract_short_name(url);
                map.insert(format!("{}_short", field), Value::String(short));
            }
        }

        let location = map
            .get("zone_short")
            .or_else(|| map.get("region_short"))
            .cloned()
            .unwrap_or_else(|| Value::String("global".to_string()));
        map.insert("location_short".to_string(), location);

        if let Some(users) = map.get("users").and_then(|v| v.as_array()) {
            map.insert(
                "users_count".to_string(),
                Value::String(users.len().to_string()),
            );
        }

        if let Some(created) = map.get("timeCreated").and_then(|v| v.as_str()) {
            let short = format_timestamp_short(created);
            map.insert("timeCreated_short".to_string(), Value::String(short));
        }

        // GKE specific
        if map.contains_key("currentMasterVersion") {
            let autopilot = map
                .get("autopilot")
                .and_then(|v| v.get("enabled"))
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            let display = if autopilot { "Autopilot" } else { "Standard" };
            map.insert(
                "autopilot_display".to_string(),
                Value::String(display.to_string()),
            );
        }
    }

    item
}

/// Extract short name from GCP resource URL
/// e.g., "https://www.googleapis.com/compute/v1/projects/my-project/zones/us-central1-a" -> "us-central1-a"
pub fn extract_short_name(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_string()
}

/// Format timestamp to short form
fn format_timestamp_short(timestamp: &str) -> String {
    // RFC3339 format: 2023-01-15T10:30:00.000Z
    timestamp.get(..10).unwrap_or(timestamp).to_string()
}

/// Extract a value from JSON using a dot-notation path
pub fn extract_json_value(item: &Value, path: &str) -> String {
    let mut current = item;

    for part in path.split('.') {
        let next = match part.parse::<usize>() {
            Ok(idx) => current.get(idx),
            Err(_) => current.get(part),
        };
        current = match next {
            Some(v) => v,
            None => return "-".to_string(),
        };
    }

    match current {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(_) => "[object]".to_string(),
    }
}
