use tracing_subscriber::{registry::LookupSpan, Layer};

use crate::logging::{config::LoggingConfig, formatter};

/// Console layer writing to stderr, so stdout stays free for command output.
pub fn layer_with_config<S>(config: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    formatter::build_formatter_from_config(
        config,
        std::io::stderr as fn() -> std::io::Stderr,
        config.with_ansi,
    )
}
