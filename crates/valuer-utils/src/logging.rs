//! Logging and tracing utilities

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset and no verbosity was requested
pub const DEFAULT_FILTER: &str = "warn,valuer_stock=info,valuer_cli=info";

/// Pick the filter directive for a `-v` count.
///
/// `RUST_LOG` still wins over this when it is set, see [`init_tracing`].
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => DEFAULT_FILTER,
        1 => "info,valuer_stock=debug,valuer_cli=debug",
        _ => "debug,valuer_stock=trace,valuer_cli=trace",
    }
}

/// Initialize tracing subscriber writing to stderr.
///
/// Stdout is reserved for the valuation report.
pub fn init_tracing(verbosity: u8) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
