//! Hook diagnostics
//!
//! Package manager hooks run unattended, so everything they report goes to
//! stderr through `tracing`. Stdout stays reserved for command output such
//! as the previous app ID printed by `pre-upgrade`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when RUST_LOG is unset or unparsable
pub const DEFAULT_FILTER: &str = "warn";

/// Build the level filter from RUST_LOG, falling back to [`DEFAULT_FILTER`]
///
/// `RUST_LOG=acctprov::manifest=debug` shows each manifest node as it is
/// visited; `RUST_LOG=account_db=debug` shows the SQL side.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber
///
/// Fails if a subscriber is already installed.
pub fn init() -> crate::Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter())
        .with(stderr_layer)
        .try_init()
        .map_err(|e| crate::IngestError::Other(format!("Logging already initialized: {}", e)))
}

/// Best-effort init for tests
pub fn init_test() {
    let _ = init();
}
