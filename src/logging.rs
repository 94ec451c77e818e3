use tracing_subscriber::{fmt, EnvFilter};

/// Initialize diagnostics on stderr, filtered by `RUST_LOG` (default "info").
/// Stdout stays reserved for the report itself.
pub(crate) fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
