//! Operator log setup.

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set. Matches the `rendermail` binary
/// and every `rendermail_*` library crate by prefix.
pub const DEFAULT_FILTER: &str = "rendermail=info";

/// Name of the span wrapping a whole run. The fmt layer prints it in front
/// of every line, which gives the operator log its fixed tag.
pub const RUN_SPAN: &str = "render_mail";

/// `RUST_LOG` when set, [`DEFAULT_FILTER`] otherwise.
pub fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}

/// Line-oriented, uncoloured subscriber writing to `writer`.
pub fn subscriber<W>(filter: EnvFilter, writer: W) -> impl tracing::Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(writer),
    )
}

/// Install the operator log on stdout.
pub fn init() {
    subscriber(filter(), std::io::stdout).init();
}
