//! Structured logging for the binary.
//!
//! Configure via the `RUST_LOG` environment variable:
//! - `RUST_LOG=debug` - parse and reconcile summaries
//! - `RUST_LOG=mdoutline::reconcile=trace` - every tree operation
//!
//! Output goes to stderr so it never mixes with printed outlines.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the tracing subscriber, defaulting to `warn` when `RUST_LOG` is unset.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_filter(filter);

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(console_layer).try_init();
}
