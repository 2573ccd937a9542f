//! Logging initialisation for embeddings
//!
//! Thin helpers over `tracing-subscriber` so hosting applications get
//! consistent output without wiring a subscriber themselves. Secrets
//! never reach the log layer: key material is `Debug`-redacted at the
//! type level and no code path logs decoded bytes or derived codes.

use std::sync::Once;

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global initialization flag so logging is only set up once.
static INIT: Once = Once::new();

/// Initialize logging with sensible defaults.
///
/// Respects `RUST_LOG` when set; defaults to `info` otherwise. Safe to
/// call more than once; later calls are ignored.
pub fn init_logging() {
    init_with_level(Level::INFO);
}

/// Initialize verbose logging for development and debugging.
pub fn init_debug_logging() {
    init_with_level(Level::DEBUG);
}

fn init_with_level(level: Level) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    });
}
