//! Logging utilities

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global logging system
///
/// `RUST_LOG` wins when set; otherwise `FOUNDERMATCH_LOG_LEVEL` (default `info`).
/// Output goes to stderr so stdout stays free for results. Safe to call twice.
pub fn init_logging() {
    let level = std::env::var("FOUNDERMATCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
