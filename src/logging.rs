#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

/// Overrides the configured `log.level` when set.
pub const LOG_ENV: &str = "TASKPAD_LOG";

/// File name of the terminal UI log.
pub const LOG_FILE: &str = "taskpad.log";

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level))
}

/// Human-readable logs on stderr. Subsequent calls are no-ops.
pub fn init_stderr(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

/// Appends logs to `path`; used while the terminal UI owns the screen.
pub fn init_file(level: &str, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(true)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .try_init();
    Ok(())
}

/// Tries `preferred`, then the system temp dir. Returns the path in use, or
/// `None` when neither is writable and logging stays off.
pub fn init_file_with_fallback(level: &str, preferred: &Path) -> Option<PathBuf> {
    let first_err = match init_file(level, preferred) {
        Ok(()) => return Some(preferred.to_path_buf()),
        Err(e) => e,
    };
    let fallback = std::env::temp_dir().join(LOG_FILE);
    match init_file(level, &fallback) {
        Ok(()) => {
            tracing::warn!(
                preferred = %preferred.display(),
                error = %format!("{first_err:#}"),
                "log file unavailable, using temp dir"
            );
            Some(fallback)
        }
        Err(_) => None,
    }
}
