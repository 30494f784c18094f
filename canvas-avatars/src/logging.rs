use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber: human-readable output on stderr plus an
/// append-only audit log at `log_path`.
///
/// If the audit log cannot be opened the run continues with stderr only.
/// Calling this twice is harmless; the first subscriber stays installed.
pub fn init(log_path: &Path) {
    let (audit_layer, open_error) = match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(file) => {
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(env_filter());
            (Some(layer), None)
        }
        Err(e) => (None, Some(e)),
    };

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_filter(env_filter()))
        .with(audit_layer)
        .try_init();

    match open_error {
        Some(e) => tracing::warn!(
            error = ?e,
            path = %log_path.display(),
            "Could not open audit log, logging to stderr only"
        ),
        None => tracing::info!(path = %log_path.display(), "Audit log opened"),
    }
}
