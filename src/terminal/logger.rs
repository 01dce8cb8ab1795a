//! Logging setup for the chart terminal.

use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::setting::Settings;
use super::utility::get_folder_path;

/// Log level constants (compatible with Python logging module)
pub const DEBUG: i32 = 10;
pub const INFO: i32 = 20;
pub const WARNING: i32 = 30;
pub const ERROR: i32 = 40;

/// Convert integer log level to tracing Level
pub fn level_from_int(level: i32) -> Level {
    match level {
        i32::MIN..=10 => Level::DEBUG,
        11..=20 => Level::INFO,
        21..=30 => Level::WARN,
        _ => Level::ERROR,
    }
}

/// Initialize the global subscriber from the `log.*` settings.
///
/// `RUST_LOG` overrides the configured level. Returns false when a
/// subscriber was already installed, in which case nothing changes.
pub fn init_logger(settings: &Settings) -> bool {
    let log_level = settings.get_int("log.level").unwrap_or(INFO as i64) as i32;
    let log_console = settings.get_bool("log.console").unwrap_or(true);
    let log_file = settings.get_bool("log.file").unwrap_or(false);

    let level = level_from_int(log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let console_layer = log_console.then(|| {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_ansi(true)
    });

    let file_layer = if log_file {
        let log_path = get_log_file_path(&get_folder_path("log"));
        match open_log_file(&log_path) {
            Ok(file) => Some(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false)),
            Err(e) => {
                eprintln!("failed to open log file {}: {}", log_path.display(), e);
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok()
}

/// Get the log file path for today inside `log_folder`
pub fn get_log_file_path(log_folder: &Path) -> PathBuf {
    let today = Local::now().format("%Y%m%d").to_string();
    log_folder.join(format!("chart_{}.log", today))
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::setting::SettingValue;

    #[test]
    fn test_level_from_int() {
        assert_eq!(level_from_int(DEBUG), Level::DEBUG);
        assert_eq!(level_from_int(INFO), Level::INFO);
        assert_eq!(level_from_int(WARNING), Level::WARN);
        assert_eq!(level_from_int(ERROR), Level::ERROR);
        assert_eq!(level_from_int(0), Level::DEBUG);
    }

    #[test]
    fn test_log_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = get_log_file_path(dir.path());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("chart_"));
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), "chart_YYYYMMDD.log".len());
    }

    #[test]
    fn test_open_log_file_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log").join("chart_test.log");
        assert!(open_log_file(&path).is_ok());
        assert!(path.exists());
    }

    #[test]
    fn test_init_logger_twice() {
        let settings = Settings::with_defaults();
        settings.set("log.console", SettingValue::Bool(false));
        init_logger(&settings);
        // A second install is refused without panicking
        assert!(!init_logger(&settings));
    }
}
