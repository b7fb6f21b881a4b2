use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling::daily};
use tracing_subscriber::{registry::LookupSpan, Layer};

use crate::logging::{config::LoggingConfig, formatter};

/// Daily-rolling, non-blocking file layer. The guard must outlive logging.
pub fn layer_with_config<S>(config: &LoggingConfig) -> (Box<dyn Layer<S> + Send + Sync>, WorkerGuard)
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let file_appender = daily(&config.file.dir, &config.file.file_name);
    let (non_blocking_writer, guard) = non_blocking(file_appender);

    let layer = formatter::build_formatter_from_config(config, non_blocking_writer, false);
    (layer, guard)
}
