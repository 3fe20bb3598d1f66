use tracing_subscriber::EnvFilter;

/// Initialize structured logging on stderr.
///
/// Honors `RUST_LOG`; the default only lets warnings through so the
/// colored status lines on stdout stay readable.
pub fn init_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()?;

    tracing::debug!("logging initialized");
    Ok(())
}
