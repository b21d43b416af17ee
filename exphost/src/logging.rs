//! Host-side diagnostics.
//!
//! The host's own events go through `tracing` to stderr, filtered by
//! `$EXPHOST_LOG` (`tracing-subscriber` directive syntax, default
//! `exphost=warn`).  Application messages take the other road, through
//! [`LogRelay`](crate::relay::LogRelay).

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "EXPHOST_LOG";

const DEFAULT_FILTER: &str = "exphost=warn";

/// Install the global subscriber.  A second call, or a subscriber installed
/// by an embedding program, is left alone.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
