//! Logging initialization, following `horcrux-api::logging::LoggingConfig`.

use tracing_subscriber::EnvFilter;

/// Map the config's `log_verbosity` (CRITICAL..DEBUG) onto a tracing
/// `EnvFilter` directive. `tracing` has no CRITICAL level, so CRITICAL maps
/// onto `error` — call sites that need to distinguish a CRITICAL record
/// from an ordinary error attach a `critical = true` field instead.
fn verbosity_to_filter(verbosity: &str) -> &'static str {
    match verbosity.to_ascii_uppercase().as_str() {
        "CRITICAL" | "ERROR" => "error",
        "WARNING" | "WARN" => "warn",
        "INFO" => "info",
        "DEBUG" => "debug",
        _ => "info",
    }
}

/// Install a global `tracing` subscriber for the process. Safe to call at
/// most once; subsequent calls are no-ops.
pub fn init(log_verbosity: &str) {
    let directive = verbosity_to_filter(log_verbosity);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let _ = tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(filter)
        .try_init();
}
