use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
  EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

pub const DEFAULT_LEVEL: &str = "info";
pub const LOG_FILE: &str = "tower.log";

/// Logs go to stderr so stdout stays free for radio traffic. With a
/// `directory`, a daily file is written too; keep the returned guard alive
/// until exit or the tail of the file is lost.
pub fn init_logging(
  level: &str,
  directory: Option<&Path>,
) -> Option<WorkerGuard> {
  let filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(level))
    .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

  let (file_layer, guard) = match directory {
    Some(directory) => {
      let appender = tracing_appender::rolling::daily(directory, LOG_FILE);
      let (writer, guard) = tracing_appender::non_blocking(appender);
      let layer = fmt::layer().with_writer(writer).with_ansi(false);
      (Some(layer), Some(guard))
    }
    None => (None, None),
  };

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(file_layer)
    .init();

  guard
}
