use crate::config;
use crate::model::AppMode;
use anyhow::{Context, Result};
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "kurenai.log";

pub fn default_filter(mode: AppMode) -> &'static str {
    if mode.is_development() {
        "info,kurenai=debug"
    } else {
        "info,kurenai=info"
    }
}

/// Routes tracing output to a daily rolling file so the terminal UI stays
/// clean. The returned guard must outlive the program's last log line.
pub fn init_logging(mode: AppMode) -> Result<WorkerGuard> {
    let log_dir = config::log_dir()?;
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(mode)));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install log subscriber")?;
    Ok(guard)
}
