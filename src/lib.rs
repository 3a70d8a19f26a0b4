pub mod cli;
pub mod commands;
pub mod config;
pub mod gcp;
pub mod operation;
pub mod resource;
pub mod ui;

/// Version injected at compile time via GCPOPS_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("GCPOPS_VERSION") {
    Some(v) => v,
    None => "dev",
};
