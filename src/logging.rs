// src/logging.rs

use color_eyre::eyre::Result;
use lazy_static::lazy_static;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_error::ErrorLayer;
use tracing_subscriber::{self, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

lazy_static! {
    /// `VANGUARD_CONSOLE_LOGLEVEL`, consulted when `RUST_LOG` is unset.
    pub static ref LOG_LEVEL_ENV: String = format!("{}_LOGLEVEL", env!("CARGO_CRATE_NAME").to_uppercase());
    static ref DEFAULT_DIRECTIVE: String = format!("{}=info", env!("CARGO_CRATE_NAME"));
}

pub const LOG_FILE_NAME: &str = concat!(env!("CARGO_PKG_NAME"), ".log");

/// Filter directive from `RUST_LOG`, then [`LOG_LEVEL_ENV`], then `info` for this crate.
pub fn filter_directive(lookup: impl Fn(&str) -> Option<String>) -> String {
    lookup("RUST_LOG")
        .or_else(|| lookup(LOG_LEVEL_ENV.as_str()))
        .filter(|directive| !directive.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.clone())
}

/// Installs the global subscriber and returns the path of the log file.
///
/// Everything goes to `<data_dir>/vanguard-console.log`, appended across runs, so log
/// lines never interleave with command output. The [`ErrorLayer`] lets `color-eyre`
/// attach span traces to reports.
pub fn initialize_logging(data_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(data_dir)?;
    let log_path = data_dir.join(LOG_FILE_NAME);
    let log_file = OpenOptions::new().create(true).append(true).open(&log_path)?;

    let directive = filter_directive(|key| std::env::var(key).ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE.as_str()));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Arc::new(log_file))
        .with_target(false)
        .with_ansi(false)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(ErrorLayer::default())
        .try_init()?;

    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_wins_over_console_variable() {
        let directive = filter_directive(|key| match key {
            "RUST_LOG" => Some("debug".into()),
            _ => Some("warn".into()),
        });
        assert_eq!(directive, "debug");
    }

    #[test]
    fn console_variable_then_default() {
        assert_eq!(
            filter_directive(|key| (key == LOG_LEVEL_ENV.as_str()).then(|| "trace".to_string())),
            "trace"
        );
        assert_eq!(filter_directive(|_| None), "vanguard_console=info");
        assert_eq!(filter_directive(|_| Some("  ".into())), "vanguard_console=info");
    }
}
