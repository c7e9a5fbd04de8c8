//! Tracing setup for the gateway binary. The teacher wires OpenTelemetry
//! exporters here; blockchain RPC spans have no counterpart in an EBICS
//! gateway, so this is trimmed to `tracing-subscriber`'s env-filter plus
//! an `RUST_LOG`-driven fmt layer, matching the teacher's local-dev
//! fallback path (`Telemetry::new`'s `None` branch).

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a process-global `tracing` subscriber.
///
/// Respects `RUST_LOG`; defaults to `info` for this crate's targets and
/// `warn` for dependencies when unset.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
