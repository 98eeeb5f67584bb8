//! Telemetry
//!
//! Tracing initialization and shutdown wiring for the Concord service.

use eyre::Result;
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// The filter honors `RUST_LOG` when set; otherwise `verbose` widens the
/// default from `info` to `debug` for concord targets. Records emitted
/// through the `log` facade (sled, among others) are bridged into tracing.
pub fn init(verbose: bool) -> Result<()> {
    let default_filter = if verbose { "concord=debug,info" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_log::LogTracer::init()?;
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Registers a ctrl-c handler that logs and exits the process.
pub fn register_shutdown() {
    let result = ctrlc::set_handler(move || {
        tracing::info!(target: "concord", "shutdown signal received, exiting");
        std::process::exit(0);
    });
    if let Err(e) = result {
        tracing::warn!(target: "concord", error = %e, "failed to register shutdown handler");
    }
}
