//! Resource abstraction layer
//!
//! This module provides a data-driven approach to managing GCP resources.
//! Resource definitions are loaded from JSON files at compile time, so a new
//! resource kind or action is mostly a registry entry plus one dispatch arm.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches resource definitions from embedded JSON
//! - [`fetcher`] - Lists resources across projects with pagination support
//! - [`reference`] - The [`ResourceRef`] handle handed to the operation core
//! - [`sdk_dispatch`] - Maps abstract SDK method names to concrete REST API calls
//!
//! # Resource Definitions
//!
//! Resources are defined in JSON files under `src/resources/`:
//! - `compute.json` - VM instances, persistent disks, managed instance groups
//! - `storage.json` - Cloud Storage buckets
//! - `gke.json` - GKE clusters
//! - `sql.json` - Cloud SQL instances
//!
//! # Example
//!
//! ```ignore
//! use gcpops::resource::fetch_across_projects;
//! use gcpops::gcp::client::GcpClient;
//!
//! async fn list_vms(client: &GcpClient, projects: &[String]) -> anyhow::Result<()> {
//!     let listed = fetch_across_projects("compute-instances", client, projects).await?;
//!     for l in &listed.items {
//!         println!("{}", l.resource.label());
//!     }
//!     Ok(())
//! }
//! ```

pub mod fetcher;
pub mod reference;
pub mod registry;
pub mod sdk_dispatch;

pub use fetcher::{
    extract_json_value, fetch_across_projects, fetch_resources, ListedResource, ListedResources,
    ProjectFailure, ResourceFilter,
};
pub use reference::{Location, ResourceRef};
pub use registry::*;
pub use sdk_dispatch::{execute_action, GcpExecutor};
