//! GCP Client
//!
//! Main client for interacting with GCP APIs, combining authentication
//! and HTTP functionality. Every URL helper takes the project explicitly
//! so one client can serve a batch spanning several projects.

use super::auth::GcpCredentials;
use super::http::GcpHttpClient;
use anyhow::{Context, Result};
use serde_json::Value;
use url::Url;

/// Base URLs of the GCP APIs used by gcpops
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub compute: String,
    pub storage: String,
    pub container: String,
    pub sqladmin: String,
    pub resourcemanager: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            compute: "https://compute.googleapis.com/compute/v1".to_string(),
            storage: "https://storage.googleapis.com/storage/v1".to_string(),
            container: "https://container.googleapis.com/v1".to_string(),
            sqladmin: "https://sqladmin.googleapis.com/v1".to_string(),
            resourcemanager: "https://cloudresourcemanager.googleapis.com/v1".to_string(),
        }
    }
}

impl Endpoints {
    /// Route every API through a single base URL (emulators, mock servers).
    /// Paths keep the public API layout, e.g. `{base}/compute/v1/projects/...`.
    pub fn with_base(base: &str) -> Result<Self> {
        let url = Url::parse(base).with_context(|| format!("Invalid API endpoint: {}", base))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("API endpoint must be http or https: {}", base);
        }
        let base = url.as_str().trim_end_matches('/');

        Ok(Self {
            compute: format!("{}/compute/v1", base),
            storage: format!("{}/storage/v1", base),
            container: format!("{}/container/v1", base),
            sqladmin: format!("{}/sql/v1", base),
            resourcemanager: format!("{}/resourcemanager/v1", base),
        })
    }
}

/// Main GCP client
#[derive(Clone)]
pub struct GcpClient {
    pub credentials: GcpCredentials,
    pub http: GcpHttpClient,
    pub endpoints: Endpoints,
}

impl GcpClient {
    /// Create a new GCP client using ambient credentials
    pub async fn new(endpoints: Endpoints) -> Result<Self> {
        let credentials = GcpCredentials::new()
            .await
            .context("Failed to initialize GCP credentials")?;

        Self::with_credentials(credentials, endpoints)
    }

    /// Create a client from already-resolved credentials
    pub fn with_credentials(credentials: GcpCredentials, endpoints: Endpoints) -> Result<Self> {
        Ok(Self {
            credentials,
            http: GcpHttpClient::new()?,
            endpoints,
        })
    }

    /// Get the current access token
    pub async fn get_token(&self) -> Result<String> {
        self.credentials.get_token().await
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.get(url, &token).await
    }

    /// Make a POST request to a GCP API
    pub async fn post(&self, url: &str, body: Option<&Value>) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.post(url, &token, body).await
    }

    /// Make a PATCH request to a GCP API
    pub async fn patch(&self, url: &str, body: &Value) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.patch(url, &token, body).await
    }

    /// Make a DELETE request to a GCP API
    pub async fn delete(&self, url: &str) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.delete(url, &token).await
    }

    // =========================================================================
    // Compute Engine API helpers
    // =========================================================================

    /// Build Compute Engine API URL
    pub fn compute_url(&self, project: &str, path: &str) -> String {
        format!("{}/projects/{}/{}", self.endpoints.compute, project, path)
    }

    /// Build zonal Compute Engine API URL
    pub fn compute_zonal_url(&self, project: &str, zone: &str, resource: &str) -> String {
        self.compute_url(project, &format!("zones/{}/{}", zone, resource))
    }

    /// Build regional Compute Engine API URL
    pub fn compute_regional_url(&self, project: &str, region: &str, resource: &str) -> String {
        self.compute_url(project, &format!("regions/{}/{}", region, resource))
    }

    /// Build aggregated Compute Engine API URL (all zones)
    pub fn compute_aggregated_url(&self, project: &str, resource: &str) -> String {
        self.compute_url(project, &format!("aggregated/{}", resource))
    }

    // =========================================================================
    // Cloud Storage API helpers
    // =========================================================================

    /// Build Cloud Storage API URL
    pub fn storage_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoints.storage, path)
    }

    /// Build Cloud Storage bucket URL
    pub fn storage_bucket_url(&self, bucket: &str) -> String {
        self.storage_url(&format!("b/{}", urlencoding::encode(bucket)))
    }

    // =========================================================================
    // GKE API helpers
    // =========================================================================

    /// Build GKE API URL
    pub fn container_url(&self, project: &str, path: &str) -> String {
        format!("{}/projects/{}/{}", self.endpoints.container, project, path)
    }

    /// Build GKE location URL (region or zone)
    pub fn container_location_url(&self, project: &str, location: &str, resource: &str) -> String {
        self.container_url(project, &format!("locations/{}/{}", location, resource))
    }

    // =========================================================================
    // Cloud SQL Admin API helpers
    // =========================================================================

    /// Build Cloud SQL Admin instances URL
    pub fn sql_instances_url(&self, project: &str, path: &str) -> String {
        if path.is_empty() {
            format!("{}/projects/{}/instances", self.endpoints.sqladmin, project)
        } else {
            format!(
                "{}/projects/{}/instances/{}",
                self.endpoints.sqladmin, project, path
            )
        }
    }

    // =========================================================================
    // Resource Manager API helpers
    // =========================================================================

    /// Build Resource Manager API URL
    pub fn resourcemanager_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoints.resourcemanager, path)
    }
}

/// Format a GCP API error for display
pub fn format_gcp_error(error: &anyhow::Error) -> String {
    super::http::format_gcp_error(error)
}
