//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, prelude::*};

/// Modules whose debug output is connection-level noise.
const NOISY_MODULES: &[&str] = &[
    "hyper",
    "hyper_util",
    "reqwest",
    "h2",
    "rustls",
    "aws_config",
    "aws_smithy_runtime",
];

/// `RUST_LOG` wins; otherwise `log_level` with noisy modules at `warn`.
fn build_filter(log_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let directives = NOISY_MODULES
        .iter()
        .fold(log_level.to_string(), |acc, module| format!("{acc},{module}=warn"));
    EnvFilter::new(directives)
}

/// Install the global subscriber. `log_format` is `json` or `pretty`.
pub(crate) fn init_logging(log_level: &str, log_format: &str) {
    let subscriber = tracing_subscriber::registry().with(build_filter(log_level));

    if log_format == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_target(true);
        let _ = subscriber.with(fmt_layer).try_init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);
        let _ = subscriber.with(fmt_layer).try_init();
    }

    tracing::debug!(log_level, log_format, "logging initialized");
}
