//! Command-line interface

use crate::config::API_ENDPOINT_ENV;
use crate::operation::ResourceAction;
use crate::ui::progress::DetailLevel;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use tracing::Level;

/// Browse and bulk-manage Google Cloud resources across projects
#[derive(Parser, Debug)]
#[command(name = "gcpops", version = crate::VERSION, about, long_about = None)]
pub struct Args {
    /// GCP project to use (repeatable)
    #[arg(short = 'p', long = "project", global = true, value_name = "PROJECT")]
    pub projects: Vec<String>,

    /// Use every project the credentials can see
    #[arg(long, global = true, conflicts_with = "projects")]
    pub all_projects: bool,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    pub log_level: LogLevel,

    /// Run in read-only mode (block all write operations)
    #[arg(long, global = true)]
    pub readonly: bool,

    /// Base URL for every GCP API (emulators, proxies)
    #[arg(long, global = true, env = API_ENDPOINT_ENV, value_name = "URL")]
    pub api_endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List resource kinds and the actions they support
    Kinds,

    /// List accessible projects
    Projects,

    /// Show a table of resources
    List {
        /// Resource kind (see `gcpops kinds`)
        kind: String,

        /// Only names matching this pattern (`*` wildcard, repeatable)
        #[arg(long = "name", value_name = "PATTERN")]
        names: Vec<String>,

        /// Only resources in this state
        #[arg(long)]
        state: Option<String>,
    },

    /// Start resources
    Start(Target),

    /// Stop resources
    Stop(Target),

    /// Restart resources
    Restart(Target),

    /// Delete resources
    Delete(Target),

    /// Recreate group instances from their template
    Reimage(Target),

    /// Upgrade resources (control plane version or instance template)
    Upgrade {
        /// Target version; the provider default when omitted
        #[arg(long)]
        version: Option<String>,

        #[command(flatten)]
        target: Target,
    },

    /// Set a label
    Tag {
        #[arg(long)]
        key: String,

        #[arg(long)]
        value: String,

        #[command(flatten)]
        target: Target,
    },

    /// Remove a label
    Untag {
        #[arg(long)]
        key: String,

        #[command(flatten)]
        target: Target,
    },

    /// Snapshot persistent disks
    Snapshot {
        /// Snapshot name prefix; defaults to the disk name
        #[arg(long, value_name = "PREFIX")]
        snapshot_name: Option<String>,

        #[command(flatten)]
        target: Target,
    },

    /// Enable deletion protection
    Lock(Target),

    /// Disable deletion protection
    Unlock(Target),

    /// Run an on-demand backup
    Backup {
        #[arg(long)]
        description: Option<String>,

        #[command(flatten)]
        target: Target,
    },

    /// Show or change the saved configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Command {
    /// The lifecycle action and its target selection, for action commands
    pub fn bulk_action(&self) -> Option<(ResourceAction, &Target)> {
        let pair = match self {
            Command::Start(t) => (ResourceAction::Start, t),
            Command::Stop(t) => (ResourceAction::Stop, t),
            Command::Restart(t) => (ResourceAction::Restart, t),
            Command::Delete(t) => (ResourceAction::Delete, t),
            Command::Reimage(t) => (ResourceAction::Reimage, t),
            Command::Upgrade { version, target } => (
                ResourceAction::Upgrade {
                    version: version.clone(),
                },
                target,
            ),
            Command::Tag { key, value, target } => (
                ResourceAction::ApplyTag {
                    key: key.clone(),
                    value: value.clone(),
                },
                target,
            ),
            Command::Untag { key, target } => (ResourceAction::RemoveTag { key: key.clone() }, target),
            Command::Snapshot {
                snapshot_name,
                target,
            } => (
                ResourceAction::CreateSnapshot {
                    name_prefix: snapshot_name.clone(),
                },
                target,
            ),
            Command::Lock(t) => (ResourceAction::ApplyLock, t),
            Command::Unlock(t) => (ResourceAction::RemoveLock, t),
            Command::Backup {
                description,
                target,
            } => (
                ResourceAction::Backup {
                    description: description.clone(),
                },
                target,
            ),
            Command::Kinds | Command::Projects | Command::List { .. } | Command::Config(_) => {
                return None
            },
        };
        Some(pair)
    }
}

/// Which resources an action command applies to
#[derive(ClapArgs, Debug, Clone)]
pub struct Target {
    /// Resource kind (see `gcpops kinds`)
    pub kind: String,

    /// Select every listed resource without prompting
    #[arg(long)]
    pub all: bool,

    /// Select names matching this pattern (`*` wildcard, repeatable)
    #[arg(long = "name", value_name = "PATTERN")]
    pub names: Vec<String>,

    /// Only resources in this state
    #[arg(long)]
    pub state: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Maximum actions in flight
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: Option<u16>,

    /// Exit with status 2 when any item fails
    #[arg(long)]
    pub strict: bool,

    /// Progress output detail
    #[arg(long, value_enum)]
    pub detail: Option<DetailLevel>,
}

impl Target {
    /// True when the filters alone decide the selection
    pub fn is_non_interactive(&self) -> bool {
        self.all || !self.names.is_empty()
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the configuration and its file location
    Show,

    /// Update and save the configuration.
    ///
    /// `--project` values given here replace the saved default projects.
    Set {
        /// Default concurrency
        #[arg(long)]
        concurrency: Option<usize>,

        /// Exit non-zero when any item of a batch fails
        #[arg(long)]
        strict: Option<bool>,

        /// Default progress detail
        #[arg(long, value_enum)]
        detail_level: Option<DetailLevel>,

        /// Default API base URL (empty string clears it)
        #[arg(long, value_name = "URL")]
        api_endpoint: Option<String>,
    },
}
