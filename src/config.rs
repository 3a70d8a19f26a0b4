//! Configuration Management
//!
//! Handles persistent configuration storage for gcpops.

use crate::gcp::auth::{get_default_project, validate_project_id};
use crate::operation::{ExitPolicy, DEFAULT_CONCURRENCY};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the API base URL
pub const API_ENDPOINT_ENV: &str = "GCPOPS_API_ENDPOINT";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Projects used when no `--project` is given
    #[serde(default)]
    pub projects: Vec<String>,
    /// Maximum in-flight actions per batch
    #[serde(default)]
    pub concurrency: Option<usize>,
    /// Exit non-zero when any item of a batch fails
    #[serde(default)]
    pub strict_exit: bool,
    /// Progress detail: minimal, detailed or verbose
    #[serde(default)]
    pub detail_level: Option<String>,
    /// API base URL override
    #[serde(default)]
    pub api_endpoint: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gcpops").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from a specific file; a missing or invalid file yields the defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path().context("Could not determine the configuration directory")?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Projects to act on (CLI > config > gcloud default)
    pub fn effective_projects(&self, cli: &[String]) -> Vec<String> {
        if !cli.is_empty() {
            return dedup(cli);
        }
        if !self.projects.is_empty() {
            return dedup(&self.projects);
        }
        get_default_project().into_iter().collect()
    }

    /// Batch concurrency (CLI > config > default)
    pub fn effective_concurrency(&self, cli: Option<usize>) -> usize {
        cli.or(self.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY)
            .max(1)
    }

    pub fn exit_policy(&self, strict_flag: bool) -> ExitPolicy {
        if strict_flag || self.strict_exit {
            ExitPolicy::AnyFailure
        } else {
            ExitPolicy::BatchRan
        }
    }

    /// API endpoint (CLI or environment > config); `None` means the public Google APIs
    pub fn effective_api_endpoint(&self, cli: Option<&str>) -> Option<String> {
        cli.filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| self.api_endpoint.clone())
            .filter(|s| !s.is_empty())
    }

    /// Replace the default projects after validating them
    pub fn set_projects(&mut self, projects: &[String]) -> Result<()> {
        if let Some(bad) = projects.iter().find(|p| !validate_project_id(p)) {
            anyhow::bail!("Invalid project ID: {}", bad);
        }
        self.projects = dedup(projects);
        Ok(())
    }
}

fn dedup(projects: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    projects
        .iter()
        .filter(|p| seen.insert(p.as_str()))
        .cloned()
        .collect()
}
