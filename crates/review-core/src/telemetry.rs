//! Tracing setup for the review binary.
//!
//! Log lines always go to stderr; stdout carries the summaries.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Filter from `RUST_LOG`, falling back to `level`.
fn log_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

fn stderr_layer(json: bool) -> BoxedLayer {
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    if json {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

/// Install the global subscriber: JSON lines when `json` is set, plain text
/// otherwise. A subscriber that is already installed is left in place.
pub fn init_tracing(json: bool, level: Level) {
    let _ = tracing_subscriber::registry()
        .with(stderr_layer(json).with_filter(log_filter(level)))
        .try_init();
}
