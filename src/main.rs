use clap::Parser;
use gcpops::cli::{Args, LogLevel};
use gcpops::gcp::client::format_gcp_error;
use gcpops::gcp::http::ApiError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Filter for the log file: `RUST_LOG` directives win over `--log-level`
fn log_filter(level: LogLevel, directives: Option<&str>) -> Option<EnvFilter> {
    if let Some(filter) = directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
    {
        return Some(filter);
    }
    let tracing_level = level.to_tracing_level()?;
    Some(EnvFilter::new(tracing_level.to_string().to_lowercase()))
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(level, directives.as_deref())?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!(
                "Warning: logging disabled, cannot open {}: {}",
                log_path.display(),
                e
            );
            return None;
        },
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(
        "gcpops {} started with log level: {:?}",
        gcpops::VERSION,
        level
    );
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("gcpops").join("gcpops.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".gcpops").join("gcpops.log");
    }
    PathBuf::from("gcpops.log")
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    match gcpops::commands::run(args).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {:#}", err);
            if ApiError::find(&err).is_some() {
                eprintln!("{}", format_gcp_error(&err));
            }
            ExitCode::FAILURE
        },
    }
}
