//! Logging setup.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Initialize the global subscriber. `RUST_LOG` takes precedence over
/// `default_level`; everything goes to stderr.
pub fn init(default_level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    // A second init (e.g. from tests) keeps the first subscriber
    if tracing_subscriber::registry().with(console).try_init().is_err() {
        tracing::debug!("Logging already initialized");
    }
}
