//! Resource Registry - Load resource definitions from JSON
//!
//! This module loads all GCP resource definitions from embedded JSON files
//! and provides lookup functions for the rest of the application.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[
    include_str!("../resources/common.json"),
    include_str!("../resources/compute.json"),
    include_str!("../resources/storage.json"),
    include_str!("../resources/gke.json"),
    include_str!("../resources/sql.json"),
];

/// Color definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ColorDef {
    pub value: String,
    pub color: [u8; 3],
}

/// Column definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub header: String,
    pub json_path: String,
    pub width: u16,
    #[serde(default)]
    pub color_map: Option<String>,
}

/// How a kind is listed within one project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Compute `aggregated/` endpoint, one entry per zone or region
    Aggregated,
    /// Plain project-level collection
    #[default]
    Project,
}

/// Confirmation config for actions
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfirmConfig {
    /// Message to show in the confirmation prompt
    #[serde(default)]
    pub message: Option<String>,
    /// If true, default answer is Yes; if false, default is No
    #[serde(default)]
    pub default_yes: bool,
    /// If true, action is destructive (shown in red)
    #[serde(default)]
    pub destructive: bool,
}

/// Action definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ActionDef {
    /// Action key, matches `ResourceAction::key`
    pub key: String,
    pub sdk_method: String,
    /// Fixed parameters merged under the action's own parameters
    #[serde(default)]
    pub params: Value,
    /// Confirmation configuration
    #[serde(default)]
    pub confirm: Option<ConfirmConfig>,
}

impl ActionDef {
    /// Get the confirmation config
    pub fn get_confirm_config(&self) -> Option<ConfirmConfig> {
        self.confirm.clone()
    }

    /// Registry parameters overlaid with the per-invocation ones
    pub fn merged_params(&self, runtime: &Value) -> Value {
        let mut merged = match &self.params {
            Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        if let Value::Object(map) = runtime {
            for (k, v) in map {
                merged.insert(k.clone(), v.clone());
            }
        }
        Value::Object(merged)
    }
}

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    pub service: String,
    pub sdk_method: String,
    #[serde(default)]
    pub sdk_method_params: Value,
    pub response_path: String,
    pub name_field: String,
    #[serde(default)]
    pub state_field: Option<String>,
    #[serde(default)]
    pub labels_field: Option<String>,
    #[serde(default)]
    pub fingerprint_field: Option<String>,
    #[serde(default)]
    pub scope: Scope,
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
}

impl ResourceDef {
    /// Look up an action by key
    pub fn action(&self, key: &str) -> Option<&ActionDef> {
        self.actions.iter().find(|a| a.key == key)
    }

    pub fn action_keys(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.key.as_str()).collect()
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub color_maps: HashMap<String, Vec<ColorDef>>,
    #[serde(default)]
    pub resources: HashMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig {
            color_maps: HashMap::new(),
            resources: HashMap::new(),
        };

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.color_maps.extend(partial.color_maps);
            final_config.resources.extend(partial.resources);
        }

        final_config
    })
}

/// Get a resource definition by key
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    get_registry().resources.get(key)
}

/// Get all resource keys, sorted
pub fn get_all_resource_keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = get_registry()
        .resources
        .keys()
        .map(|s| s.as_str())
        .collect();
    keys.sort_unstable();
    keys
}

/// Get a color map by name
pub fn get_color_map(name: &str) -> Option<&'static Vec<ColorDef>> {
    get_registry().color_maps.get(name)
}

/// Get color for a value based on color map name
pub fn get_color_for_value(color_map_name: &str, value: &str) -> Option<[u8; 3]> {
    get_color_map(color_map_name)?
        .iter()
        .find(|c| c.value == value)
        .map(|c| c.color)
}
