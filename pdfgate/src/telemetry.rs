//! Tracing initialization (fmt subscriber with env-filter).
//!
//! Log verbosity is controlled through `RUST_LOG` (e.g. `RUST_LOG=pdfgate=debug,tower_http=debug`),
//! falling back to `info` when unset.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the tracing subscriber.
///
/// Uses `try_init` so a second initialization (e.g. in tests) is harmless.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}
