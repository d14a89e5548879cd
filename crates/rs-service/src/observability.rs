//! Tracing initialization for hosts embedding this library.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing with an env-filter.
///
/// Honors `RUST_LOG` when set; otherwise defaults to debug-level output for
/// this crate and tower-http. Call once at process startup; calling again is
/// a no-op rather than an error.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rs_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
