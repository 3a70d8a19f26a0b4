//! Command handlers
//!
//! Each handler returns the process exit code; top-level failures come back
//! as `Err` and are printed once by `main`.

mod bulk;
mod config;
mod list;

use crate::cli::{Args, Command};
use crate::config::Config;
use crate::gcp::client::{Endpoints, GcpClient};
use crate::gcp::projects::list_project_ids;
use crate::resource::{get_all_resource_keys, get_resource, ListedResources, ResourceDef};
use crate::ui;
use anyhow::{Context as _, Result};

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    /// `--project` values
    pub projects: Vec<String>,
    pub all_projects: bool,
    pub readonly: bool,
    pub api_endpoint: Option<String>,
    pub color: bool,
    pub interactive: bool,
}

impl Context {
    pub fn from_args(args: &Args, config: Config) -> Self {
        Self {
            config,
            projects: args.projects.clone(),
            all_projects: args.all_projects,
            readonly: args.readonly,
            api_endpoint: args.api_endpoint.clone(),
            color: ui::use_color(),
            interactive: ui::is_interactive(),
        }
    }

    pub fn endpoints(&self) -> Result<Endpoints> {
        match self
            .config
            .effective_api_endpoint(self.api_endpoint.as_deref())
        {
            Some(base) => {
                tracing::info!("Using API endpoint override: {}", base);
                Endpoints::with_base(&base)
            },
            None => Ok(Endpoints::default()),
        }
    }

    pub async fn client(&self) -> Result<GcpClient> {
        GcpClient::new(self.endpoints()?).await
    }

    /// Projects to act on; errors when none can be determined
    pub async fn resolve_projects(&self, client: &GcpClient) -> Result<Vec<String>> {
        let projects = if self.all_projects {
            list_project_ids(client)
                .await
                .context("Failed to list accessible projects")?
        } else {
            self.config.effective_projects(&self.projects)
        };

        if projects.is_empty() {
            anyhow::bail!(
                "No GCP project configured. Use --project, --all-projects, `gcpops config set --project`, or set GOOGLE_CLOUD_PROJECT"
            );
        }

        tracing::info!("Projects: {}", projects.join(", "));
        Ok(projects)
    }
}

/// Run the parsed command
pub async fn run(args: Args) -> Result<u8> {
    let ctx = Context::from_args(&args, Config::load());

    match &args.command {
        Command::Kinds => list::kinds(&ctx),
        Command::Projects => list::projects(&ctx).await,
        Command::List { kind, names, state } => {
            list::list(&ctx, kind, names.clone(), state.clone()).await
        },
        Command::Config(cmd) => config::run(&ctx, cmd),
        other => {
            let Some((action, target)) = other.bulk_action() else {
                anyhow::bail!("Unsupported command");
            };
            bulk::run(&ctx, action, target).await
        },
    }
}

/// Registry lookup with a helpful error
pub(crate) fn resource_def(kind: &str) -> Result<&'static ResourceDef> {
    get_resource(kind).with_context(|| {
        format!(
            "Unknown resource kind '{}'. Available: {}",
            kind,
            get_all_resource_keys().join(", ")
        )
    })
}

/// Print per-project listing failures as warnings
pub(crate) fn warn_listing_failures(listed: &ListedResources) {
    for failure in &listed.failures {
        eprintln!(
            "Warning: skipped project {}: {}",
            failure.project, failure.error
        );
    }
}
