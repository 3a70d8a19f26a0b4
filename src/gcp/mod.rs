//! GCP API interaction module
//!
//! This module provides the core functionality for interacting with Google Cloud Platform
//! APIs, including authentication, HTTP client, and project discovery.
//!
//! # Module Structure
//!
//! - [`auth`] - GCP authentication using Application Default Credentials or a static token
//! - [`client`] - Main GCP client with per-project URL builders
//! - [`http`] - HTTP utilities for REST API calls and the typed [`http::ApiError`]
//! - [`projects`] - Project listing
//!
//! # Example
//!
//! ```ignore
//! use gcpops::gcp::client::{Endpoints, GcpClient};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = GcpClient::new(Endpoints::default()).await?;
//!     let url = client.compute_aggregated_url("my-project", "instances");
//!     let instances = client.get(&url).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod projects;
