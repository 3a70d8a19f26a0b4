//! SDK Dispatch
//!
//! Maps SDK method names from the registry to GCP REST API calls, for both
//! listing and lifecycle actions. [`GcpExecutor`] plugs this into the
//! operation core.

use super::reference::{Location, ResourceRef};
use super::registry::get_resource;
use crate::gcp::client::GcpClient;
use crate::operation::{ActionExecutor, ResourceAction};
use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::future::Future;

/// Maximum length of GCP resource and label names
const MAX_NAME_LEN: usize = 63;

/// Invoke a listing method for one project
pub async fn invoke_sdk(
    service: &str,
    method: &str,
    client: &GcpClient,
    project: &str,
    params: &Value,
) -> Result<Value> {
    tracing::debug!(
        "invoke_sdk: service={}, method={}, project={}",
        service,
        method,
        project
    );

    match service {
        "compute" => invoke_compute(method, client, project, params).await,
        "storage" => invoke_storage(method, client, project, params).await,
        "container" => invoke_container(method, client, project, params).await,
        "sqladmin" => invoke_sqladmin(method, client, project, params).await,
        _ => Err(anyhow::anyhow!("Unknown service: {}", service)),
    }
}

/// Execute an action on a resource
pub async fn execute_action(
    service: &str,
    method: &str,
    client: &GcpClient,
    resource: &ResourceRef,
    params: &Value,
) -> Result<Value> {
    tracing::info!(
        "execute_action: service={}, method={}, project={}, resource={}",
        service,
        method,
        resource.project,
        resource.name
    );

    match service {
        "compute" => execute_compute_action(method, client, resource, params).await,
        "storage" => execute_storage_action(method, client, resource, params).await,
        "container" => execute_container_action(method, client, resource, params).await,
        "sqladmin" => execute_sqladmin_action(method, client, resource, params).await,
        _ => Err(anyhow::anyhow!("Unknown service: {}", service)),
    }
}

/// [`ActionExecutor`] backed by the GCP REST APIs
#[derive(Clone)]
pub struct GcpExecutor {
    client: GcpClient,
}

impl GcpExecutor {
    pub fn new(client: GcpClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GcpClient {
        &self.client
    }
}

impl ActionExecutor for GcpExecutor {
    fn execute(
        &self,
        action: &ResourceAction,
        resource: &ResourceRef,
    ) -> impl Future<Output = Result<Value>> + Send {
        async move {
            let def = get_resource(&resource.kind)
                .with_context(|| format!("Unknown resource kind: {}", resource.kind))?;
            let action_def = def.action(action.key()).with_context(|| {
                format!("{} does not support {}", def.display_name, action.key())
            })?;

            let params = action_def.merged_params(&action.params());
            execute_action(
                &def.service,
                &action_def.sdk_method,
                &self.client,
                resource,
                &params,
            )
            .await
        }
    }
}

// =============================================================================
// Compute Engine
// =============================================================================

async fn invoke_compute(
    method: &str,
    client: &GcpClient,
    project: &str,
    params: &Value,
) -> Result<Value> {
    let collection = match method {
        "list_instances" => "instances",
        "list_disks" => "disks",
        "list_instance_group_managers" => "instanceGroupManagers",
        _ => return Err(anyhow::anyhow!("Unknown compute method: {}", method)),
    };

    let url = client.compute_aggregated_url(project, collection);
    let url = add_query_params(&url, params);
    client.get(&url).await
}

async fn execute_compute_action(
    method: &str,
    client: &GcpClient,
    resource: &ResourceRef,
    params: &Value,
) -> Result<Value> {
    let name = &resource.name;

    match method {
        "start_instance" => {
            let url = instance_url(client, resource, "/start")?;
            client.post(&url, None).await
        },
        "stop_instance" => {
            let url = instance_url(client, resource, "/stop")?;
            client.post(&url, None).await
        },
        "reset_instance" => {
            let url = instance_url(client, resource, "/reset")?;
            client.post(&url, None).await
        },
        "delete_instance" => {
            let url = instance_url(client, resource, "")?;
            client.delete(&url).await
        },
        "set_instance_labels" => {
            let url = instance_url(client, resource, "/setLabels")?;
            let body = json!({
                "labels": merged_labels(resource, params)?,
                "labelFingerprint": resource.label_fingerprint,
            });
            client.post(&url, Some(&body)).await
        },
        "set_deletion_protection" => {
            let enabled = get_param_bool(params, "deletionProtection")?;
            let url = instance_url(client, resource, "/setDeletionProtection")?;
            let url = format!("{}?deletionProtection={}", url, enabled);
            client.post(&url, None).await
        },
        "delete_disk" => {
            let url = located_url(client, resource, "disks", "disks", "")?;
            client.delete(&url).await
        },
        "set_disk_labels" => {
            let url = located_url(client, resource, "disks", "disks", "/setLabels")?;
            let body = json!({
                "labels": merged_labels(resource, params)?,
                "labelFingerprint": resource.label_fingerprint,
            });
            client.post(&url, Some(&body)).await
        },
        "create_snapshot" => {
            let url = located_url(client, resource, "disks", "disks", "/createSnapshot")?;
            let prefix = get_param_str_opt(params, "namePrefix");
            let body = json!({
                "name": snapshot_name(prefix.as_deref().unwrap_or(name), chrono::Utc::now()),
                "labels": resource.labels,
            });
            client.post(&url, Some(&body)).await
        },
        "apply_updates_to_instances" => {
            let url = located_url(
                client,
                resource,
                "instanceGroupManagers",
                "regionInstanceGroupManagers",
                "/applyUpdatesToInstances",
            )?;
            let body = json!({
                "allInstances": true,
                "minimalAction": get_param_str(params, "minimalAction")?,
                "mostDisruptiveAllowedAction": get_param_str(params, "mostDisruptiveAllowedAction")?,
            });
            client.post(&url, Some(&body)).await
        },
        "delete_instance_group_manager" => {
            let url = located_url(
                client,
                resource,
                "instanceGroupManagers",
                "regionInstanceGroupManagers",
                "",
            )?;
            client.delete(&url).await
        },
        _ => Err(anyhow::anyhow!("Unknown compute action: {}", method)),
    }
}

fn instance_url(client: &GcpClient, resource: &ResourceRef, suffix: &str) -> Result<String> {
    match &resource.location {
        Location::Zone(zone) => Ok(client.compute_zonal_url(
            &resource.project,
            zone,
            &format!("instances/{}{}", resource.name, suffix),
        )),
        other => Err(anyhow::anyhow!(
            "VM instance {} has no zone (location: {})",
            resource.name,
            other
        )),
    }
}

/// URL of a compute resource that exists in zonal and regional flavours
fn located_url(
    client: &GcpClient,
    resource: &ResourceRef,
    zonal_collection: &str,
    regional_collection: &str,
    suffix: &str,
) -> Result<String> {
    match &resource.location {
        Location::Zone(zone) => Ok(client.compute_zonal_url(
            &resource.project,
            zone,
            &format!("{}/{}{}", zonal_collection, resource.name, suffix),
        )),
        Location::Region(region) => Ok(client.compute_regional_url(
            &resource.project,
            region,
            &format!("{}/{}{}", regional_collection, resource.name, suffix),
        )),
        other => Err(anyhow::anyhow!(
            "{} has no zone or region (location: {})",
            resource.name,
            other
        )),
    }
}

// =============================================================================
// Cloud Storage
// =============================================================================

async fn invoke_storage(
    method: &str,
    client: &GcpClient,
    project: &str,
    params: &Value,
) -> Result<Value> {
    match method {
        "list_buckets" => {
            let url = format!(
                "{}?project={}",
                client.storage_url("b"),
                urlencoding::encode(project)
            );
            let url = add_query_params(&url, params);
            client.get(&url).await
        },
        _ => Err(anyhow::anyhow!("Unknown storage method: {}", method)),
    }
}

async fn execute_storage_action(
    method: &str,
    client: &GcpClient,
    resource: &ResourceRef,
    params: &Value,
) -> Result<Value> {
    match method {
        "delete_bucket" => {
            let url = client.storage_bucket_url(&resource.name);
            client.delete(&url).await
        },
        "set_bucket_labels" => {
            // PATCH merges labels; a null value removes the key
            let url = client.storage_bucket_url(&resource.name);
            let body = json!({ "labels": label_patch(params)? });
            client.patch(&url, &body).await
        },
        _ => Err(anyhow::anyhow!("Unknown storage action: {}", method)),
    }
}

// =============================================================================
// GKE (Container)
// =============================================================================

async fn invoke_container(
    method: &str,
    client: &GcpClient,
    project: &str,
    params: &Value,
) -> Result<Value> {
    match method {
        "list_clusters" => {
            // All locations at once; this API does not paginate
            let url = client.container_location_url(project, "-", "clusters");
            let url = add_query_params(&url, params);
            client.get(&url).await
        },
        _ => Err(anyhow::anyhow!("Unknown container method: {}", method)),
    }
}

async fn execute_container_action(
    method: &str,
    client: &GcpClient,
    resource: &ResourceRef,
    params: &Value,
) -> Result<Value> {
    let cluster_url = |suffix: &str| {
        client.container_location_url(
            &resource.project,
            resource.location.as_str(),
            &format!("clusters/{}{}", resource.name, suffix),
        )
    };

    match method {
        "update_master" => {
            let version = get_param_str_opt(params, "version").unwrap_or_else(|| "latest".into());
            let body = json!({ "masterVersion": version });
            client.post(&cluster_url(":updateMaster"), Some(&body)).await
        },
        "delete_cluster" => client.delete(&cluster_url("")).await,
        "set_cluster_labels" => {
            let body = json!({
                "resourceLabels": merged_labels(resource, params)?,
                "labelFingerprint": resource.label_fingerprint,
            });
            client
                .post(&cluster_url(":setResourceLabels"), Some(&body))
                .await
        },
        _ => Err(anyhow::anyhow!("Unknown container action: {}", method)),
    }
}

// =============================================================================
// Cloud SQL Admin
// =============================================================================

async fn invoke_sqladmin(
    method: &str,
    client: &GcpClient,
    project: &str,
    params: &Value,
) -> Result<Value> {
    match method {
        "list_sql_instances" => {
            let url = client.sql_instances_url(project, "");
            let url = add_query_params(&url, params);
            client.get(&url).await
        },
        _ => Err(anyhow::anyhow!("Unknown sqladmin method: {}", method)),
    }
}

async fn execute_sqladmin_action(
    method: &str,
    client: &GcpClient,
    resource: &ResourceRef,
    params: &Value,
) -> Result<Value> {
    let project = &resource.project;
    let name = &resource.name;

    match method {
        "set_activation_policy" => {
            let policy = get_param_str(params, "activationPolicy")?;
            let body = json!({ "settings": { "activationPolicy": policy } });
            client
                .patch(&client.sql_instances_url(project, name), &body)
                .await
        },
        "restart_sql_instance" => {
            let url = client.sql_instances_url(project, &format!("{}/restart", name));
            client.post(&url, None).await
        },
        "delete_sql_instance" => client.delete(&client.sql_instances_url(project, name)).await,
        "create_backup_run" => {
            let url = client.sql_instances_url(project, &format!("{}/backupRuns", name));
            let body = match get_param_str_opt(params, "description") {
                Some(description) => json!({ "description": description }),
                None => json!({}),
            };
            client.post(&url, Some(&body)).await
        },
        "set_sql_labels" => {
            let body = json!({ "settings": { "userLabels": label_patch(params)? } });
            client
                .patch(&client.sql_instances_url(project, name), &body)
                .await
        },
        "set_sql_deletion_protection" => {
            let enabled = get_param_bool(params, "deletionProtectionEnabled")?;
            let body = json!({ "settings": { "deletionProtectionEnabled": enabled } });
            client
                .patch(&client.sql_instances_url(project, name), &body)
                .await
        },
        _ => Err(anyhow::anyhow!("Unknown sqladmin action: {}", method)),
    }
}

// =============================================================================
// Labels & snapshots
// =============================================================================

/// Validate a label key and optional value against GCP label rules
pub fn validate_label(key: &str, value: Option<&str>) -> Result<()> {
    let valid_char = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_';

    if key.is_empty() || key.len() > MAX_NAME_LEN {
        anyhow::bail!("Label key must be 1-{} characters: {:?}", MAX_NAME_LEN, key);
    }
    if !key.starts_with(|c: char| c.is_ascii_lowercase()) || !key.chars().all(valid_char) {
        anyhow::bail!(
            "Label key must start with a lowercase letter and contain only lowercase letters, digits, '-' or '_': {:?}",
            key
        );
    }
    if let Some(value) = value {
        if value.len() > MAX_NAME_LEN || !value.chars().all(valid_char) {
            anyhow::bail!(
                "Label value must be at most {} lowercase letters, digits, '-' or '_': {:?}",
                MAX_NAME_LEN,
                value
            );
        }
    }
    Ok(())
}

/// Full label set after applying the requested change to the listed labels
fn merged_labels(resource: &ResourceRef, params: &Value) -> Result<Map<String, Value>> {
    let key = get_param_str(params, "key")?;
    let mut labels: Map<String, Value> = resource
        .labels
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();

    match get_param_str_opt(params, "value") {
        Some(value) => {
            labels.insert(key, Value::String(value));
        },
        None => {
            labels.remove(&key);
        },
    }
    Ok(labels)
}

/// Single-key patch; a missing value becomes null
fn label_patch(params: &Value) -> Result<Value> {
    let key = get_param_str(params, "key")?;
    let value = get_param_str_opt(params, "value").map_or(Value::Null, Value::String);
    let mut patch = Map::new();
    patch.insert(key, value);
    Ok(Value::Object(patch))
}

/// `<prefix>-<yyyymmdd-hhmmss>`, trimmed to the 63 character limit.
/// Names must start with a lowercase letter.
pub fn snapshot_name(prefix: &str, at: chrono::DateTime<chrono::Utc>) -> String {
    let stamp = at.format("%Y%m%d-%H%M%S").to_string();
    let budget = MAX_NAME_LEN - stamp.len() - 1;
    let cleaned: String = prefix
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let cleaned = cleaned.trim_matches('-');
    if cleaned.is_empty() {
        return format!("snap-{}", stamp);
    }

    let cleaned = if cleaned.starts_with(|c: char| c.is_ascii_lowercase()) {
        cleaned.to_string()
    } else {
        format!("snap-{}", cleaned)
    };
    let prefix: String = cleaned.chars().take(budget).collect();
    format!("{}-{}", prefix.trim_end_matches('-'), stamp)
}

// =============================================================================
// Helpers
// =============================================================================

fn get_param_str(params: &Value, key: &str) -> Result<String> {
    get_param_str_opt(params, key).context(format!("Missing required parameter: {}", key))
}

fn get_param_str_opt(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn get_param_bool(params: &Value, key: &str) -> Result<bool> {
    params
        .get(key)
        .and_then(|v| v.as_bool())
        .context(format!("Missing required parameter: {}", key))
}

fn add_query_params(url: &str, params: &Value) -> String {
    let Value::Object(map) = params else {
        return url.to_string();
    };

    let query_parts: Vec<String> = map
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_str()
                .map(|s| format!("{}={}", key, urlencoding::encode(s)))
        })
        .collect();

    if query_parts.is_empty() {
        url.to_string()
    } else if url.contains('?') {
        format!("{}&{}", url, query_parts.join("&"))
    } else {
        format!("{}?{}", url, query_parts.join("&"))
    }
}

/// Flatten an aggregated API response into a standard list response.
/// Aggregated responses have format: { "items": { "zones/us-central1-a": { "instances": [...] }, ... } }
/// We flatten to: { "items": [...all instances...], "nextPageToken": ... }
pub fn flatten_aggregated_response(response: Value) -> Value {
    let next_token = response.get("nextPageToken").cloned();

    let Some(items) = response.get("items").and_then(|v| v.as_object()) else {
        return json!({ "items": [], "nextPageToken": next_token });
    };

    let mut all_items: Vec<Value> = Vec::new();

    for scope_data in items.values() {
        if let Some(obj) = scope_data.as_object() {
            for (key, value) in obj {
                // Skip warning field and other metadata
                if key == "warning" {
                    continue;
                }
                if let Some(arr) = value.as_array() {
                    all_items.extend(arr.iter().cloned());
                }
            }
        }
    }

    json!({ "items": all_items, "nextPageToken": next_token })
}
