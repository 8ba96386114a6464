//! Tracing setup for embedders and tests

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a global fmt subscriber filtered by `RUST_LOG`.
///
/// Falls back to `default_directive` (e.g. `"todo_core=debug"`) when
/// `RUST_LOG` is unset or unparsable. Returns `false` if a global subscriber
/// was already installed, in which case nothing changes.
pub fn init_tracing(default_directive: &str) -> bool {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
