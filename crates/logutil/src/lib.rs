//! Utilities for logging.

use std::io;

use tracing::Level;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    HumanReadable,
    Compact,
}

/// Configure the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level` when set.
pub fn configure_global_logger(
    default_level: Level,
    format: LogFormat,
) -> Result<(), SetGlobalDefaultError> {
    let filter = env_filter(default_level);
    let builder = SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_thread_ids(true)
        .with_thread_names(true);

    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
        LogFormat::HumanReadable => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Compact => tracing::subscriber::set_global_default(builder.compact().finish()),
    }
}

/// Install a subscriber that writes through the test harness.
///
/// Safe to call from every test, only the first call installs anything.
pub fn init_test() {
    let _ = SubscriberBuilder::default()
        .with_env_filter(env_filter(Level::TRACE))
        .with_test_writer()
        .try_init();
}

fn env_filter(default_level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(default_level).into())
        .from_env_lossy()
}
