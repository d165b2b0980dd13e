//! Tracing (logging)

use crate::cli::CommandLineArgs;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directives used when neither `--log-filter` nor `RUST_LOG` is set.
const DEFAULT_FILTER: &str = "pandora_series=debug,tower_http=debug";

/// Build the log filter.
///
/// The `--log-filter` argument takes precedence over the `RUST_LOG` environment variable, which
/// takes precedence over [DEFAULT_FILTER]. Invalid directives fall through to the next source.
fn env_filter(args: &CommandLineArgs) -> EnvFilter {
    args.log_filter
        .as_deref()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| DEFAULT_FILTER.into())
}

/// Initialise tracing (logging)
pub fn init_tracing(args: &CommandLineArgs) {
    tracing_subscriber::registry()
        .with(env_filter(args))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
