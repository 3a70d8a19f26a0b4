//! Resource References
//!
//! A point-in-time handle to one listed resource, used once per batch.

use super::fetcher::{extract_json_value, extract_short_name};
use super::registry::ResourceDef;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Where a resource lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Global,
    Zone(String),
    Region(String),
    /// Free-form location (GKE locations, bucket locations)
    Other(String),
}

impl Location {
    /// Derive the location from a listed item
    pub fn from_item(item: &Value) -> Self {
        if let Some(zone) = item.get("zone").and_then(|v| v.as_str()) {
            return Self::Zone(extract_short_name(zone));
        }
        if let Some(region) = item.get("region").and_then(|v| v.as_str()) {
            return Self::Region(extract_short_name(region));
        }
        if let Some(location) = item.get("location").and_then(|v| v.as_str()) {
            return Self::Other(location.to_string());
        }
        Self::Global
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Global => "global",
            Self::Zone(z) => z,
            Self::Region(r) => r,
            Self::Other(o) => o,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selected resource handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    /// Registry key, e.g. `compute-instances`
    pub kind: String,
    pub project: String,
    pub name: String,
    pub location: Location,
    /// State label at listing time (`RUNNING`, `RUNNABLE`, ...)
    pub state: String,
    /// Labels at listing time, needed for read-modify-write label updates
    pub labels: BTreeMap<String, String>,
    pub label_fingerprint: Option<String>,
}

impl ResourceRef {
    pub fn new(kind: &str, project: &str, name: &str, location: Location) -> Self {
        Self {
            kind: kind.to_string(),
            project: project.to_string(),
            name: name.to_string(),
            location,
            state: "-".to_string(),
            labels: BTreeMap::new(),
            label_fingerprint: None,
        }
    }

    pub fn with_state(mut self, state: &str) -> Self {
        self.state = state.to_string();
        self
    }

    /// Build a reference from a listed item using the registry field mapping
    pub fn from_item(kind: &str, def: &ResourceDef, project: &str, item: &Value) -> Self {
        let name = extract_json_value(item, &def.name_field);
        let state = def
            .state_field
            .as_deref()
            .map(|path| extract_json_value(item, path))
            .unwrap_or_else(|| "-".to_string());

        let labels = def
            .labels_field
            .as_deref()
            .and_then(|path| lookup(item, path))
            .and_then(|v| v.as_object())
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        let label_fingerprint = def
            .fingerprint_field
            .as_deref()
            .and_then(|path| lookup(item, path))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        Self {
            kind: kind.to_string(),
            project: project.to_string(),
            name,
            location: Location::from_item(item),
            state,
            labels,
            label_fingerprint,
        }
    }

    /// Short label for progress output
    pub fn label(&self) -> String {
        match self.location {
            Location::Global => format!("{} ({})", self.name, self.project),
            _ => format!("{} ({}/{})", self.name, self.project, self.location),
        }
    }

    /// True when the handle cannot address anything
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty() || self.name == "-"
    }
}

fn lookup<'a>(item: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(item, |current, part| current.get(part))
}
