use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `--log-level` value to a `tracing` filter directive.
///
/// Unrecognised values are passed through so that full `EnvFilter` directives
/// such as `market_data=debug` keep working.
pub fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Logs go to stderr; stdout is reserved for the report itself. Falls back to
/// `"warn"` if the directive does not parse.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()?;

    Ok(())
}

// ── Data-dir check ─────────────────────────────────────────────────────────────

/// Return `data_dir` if it is an existing directory.
pub fn check_data_dir(data_dir: &Path) -> anyhow::Result<PathBuf> {
    if !data_dir.is_dir() {
        anyhow::bail!(
            "data directory {} does not exist (set --data-dir or MARKET_DATA_DIR)",
            data_dir.display()
        );
    }
    Ok(data_dir.to_path_buf())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
