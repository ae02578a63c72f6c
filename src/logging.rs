// 📜 Logging setup
//
// The server logs to stdout. The TUI owns the terminal, so it only logs
// when PORTAL_LOG_FILE points somewhere.

use crate::config::ENV_LOG_FILE;
use crate::error::PortalResult;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "eb_portal=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Log to stdout, filtered by RUST_LOG
pub fn init_stdout() {
    let _ = tracing_subscriber::fmt().with_env_filter(env_filter()).try_init();
}

/// Append log lines to `path`
pub fn init_file(path: &Path) -> PortalResult<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

/// File logging if PORTAL_LOG_FILE is set, otherwise nothing
pub fn init_from_env() -> PortalResult<bool> {
    match std::env::var_os(ENV_LOG_FILE) {
        Some(path) => {
            init_file(Path::new(&path))?;
            Ok(true)
        }
        None => Ok(false),
    }
}
