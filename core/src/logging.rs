//! Stdout logging for applications embedding the client.
//!
//! The client itself only emits `tracing` events; installing a subscriber is
//! left to the application. [`init`] is the one-liner for the common case.

use tracing::Subscriber;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV: &str = "HAPPI_LOG";

/// Filter from `HAPPI_LOG`, then `RUST_LOG`, then `info`.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// The subscriber [`init`] installs: a stdout fmt layer under [`env_filter`].
pub fn subscriber() -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stdout))
}

/// Install [`subscriber`] globally.
///
/// Fails if a global subscriber is already set.
pub fn init() -> Result<(), TryInitError> {
    subscriber().try_init()
}
