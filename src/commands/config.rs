//! `gcpops config show|set`

use super::Context;
use crate::cli::ConfigCommand;
use crate::config::Config;
use crate::gcp::client::Endpoints;
use anyhow::Result;

pub fn run(ctx: &Context, cmd: &ConfigCommand) -> Result<u8> {
    match cmd {
        ConfigCommand::Show => {
            match Config::config_path() {
                Some(path) => println!("# {}", path.display()),
                None => println!("# no configuration directory"),
            }
            println!("{}", serde_json::to_string_pretty(&ctx.config)?);
            Ok(0)
        },
        ConfigCommand::Set {
            concurrency,
            strict,
            detail_level,
            api_endpoint,
        } => {
            let mut config = ctx.config.clone();
            apply_set(
                &mut config,
                &ctx.projects,
                *concurrency,
                *strict,
                detail_level.map(|d| d.as_str().to_string()),
                api_endpoint.as_deref(),
            )?;

            if config == ctx.config {
                println!("Nothing to change");
                return Ok(0);
            }

            let path = config.save()?;
            println!("Saved {}", path.display());
            Ok(0)
        },
    }
}

fn apply_set(
    config: &mut Config,
    projects: &[String],
    concurrency: Option<usize>,
    strict: Option<bool>,
    detail_level: Option<String>,
    api_endpoint: Option<&str>,
) -> Result<()> {
    if !projects.is_empty() {
        config.set_projects(projects)?;
    }
    if let Some(n) = concurrency {
        if n == 0 {
            anyhow::bail!("Concurrency must be at least 1");
        }
        config.concurrency = Some(n);
    }
    if let Some(strict) = strict {
        config.strict_exit = strict;
    }
    if detail_level.is_some() {
        config.detail_level = detail_level;
    }
    match api_endpoint {
        Some("") => config.api_endpoint = None,
        Some(url) => {
            Endpoints::with_base(url)?;
            config.api_endpoint = Some(url.to_string());
        },
        None => {},
    }
    Ok(())
}
