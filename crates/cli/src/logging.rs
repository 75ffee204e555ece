use eshop_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing::Level;

/// Installs a stderr subscriber so stdout carries only command output.
///
/// Falls back to defaults when the configuration does not load; the command
/// itself reports that failure.
pub fn init() {
    let logging = AppConfig::load(LoadOptions::default())
        .map(|config| config.logging)
        .unwrap_or_else(|_| AppConfig::default().logging);
    let level = logging.level.parse::<Level>().unwrap_or(Level::INFO);

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level);
    // a subscriber may already be installed when embedded in tests
    let _ = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
