//! Tracing subscriber setup.

use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static INIT: OnceLock<()> = OnceLock::new();

const DEFAULT_DIRECTIVE: &str = "graphsearch_algorithms=info";

/// Installs a formatting subscriber filtered by `RUST_LOG`.
///
/// Without `RUST_LOG`, algorithm lifecycle events are shown at `info`.
/// Safe to call multiple times; only the first call has effect, and a
/// subscriber installed elsewhere is left in place.
pub fn init_logging() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init();
    });
}
