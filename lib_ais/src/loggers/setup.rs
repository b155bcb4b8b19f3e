use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("I/O error preparing log directory: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Where and how to log.
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Prefix of log file names.
    pub app_name: String,
    /// trace, debug, info, warn or error. `RUST_LOG` wins when set.
    pub level: String,
    /// File logging is off when `None`.
    pub log_dir: Option<PathBuf>,
    /// How many log files of this app survive, counting the new one.
    pub keep_files: usize,
    /// JSON lines on stderr instead of the human format.
    pub json: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            app_name: "lib_ais".to_string(),
            level: "info".to_string(),
            log_dir: None,
            keep_files: 1,
            json: false,
        }
    }
}

/// Keeps the non-blocking file writer alive. Hold it until shutdown or the
/// tail of the log is lost.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
    /// The file being written, when file logging is on.
    pub log_file: Option<PathBuf>,
}

/// Maps a level name to an `EnvFilter` directive; unknown names mean info.
pub fn level_directive(level: &str) -> &'static str {
    match level.trim().to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" | "fatal" => "error",
        _ => "info",
    }
}

/// `<app>_<YYYY-MM-DD_HH-MM-SS>.log`
pub fn log_file_name(app_name: &str) -> String {
    format!("{}_{}.log", app_name, chrono::Local::now().format("%Y-%m-%d_%H-%M-%S"))
}

/// Installs the global subscriber: stderr always, plus a log file when
/// `log_dir` is set. Fails if a global subscriber already exists.
pub fn setup_logging(options: &LoggingOptions) -> Result<LoggingGuard, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(&options.level)));

    let (file_layer, file_guard, log_file) = match &options.log_dir {
        Some(log_dir) => {
            fs::create_dir_all(log_dir)?;
            // Make room for the file about to be created
            cleanup_old_logs(log_dir, &options.app_name, options.keep_files.saturating_sub(1))?;

            let file_name = log_file_name(&options.app_name);
            let appender = tracing_appender::rolling::never(log_dir, &file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard), Some(log_dir.join(file_name)))
        }
        None => (None, None, None),
    };

    // Console output goes to stderr so stdout stays free for results
    let plain = (!options.json).then(|| fmt::layer().with_target(true).with_writer(io::stderr));
    let json = options.json.then(|| fmt::layer().json().with_writer(io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        log_file,
    })
}

/// Deletes all but the newest `keep` log files of `app_name` in `log_dir`.
/// Returns how many were removed.
pub fn cleanup_old_logs(log_dir: &Path, app_name: &str, keep: usize) -> io::Result<usize> {
    let prefix = format!("{}_", app_name);
    let mut entries: Vec<PathBuf> = fs::read_dir(log_dir)?
        .filter_map(|res| res.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "log"))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix))
        })
        .collect();

    // Timestamped names sort chronologically; newest first
    entries.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

    let mut removed = 0;
    for path in entries.iter().skip(keep) {
        match fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!("Failed to delete old log file {:?}: {}", path, e),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn level_names() {
        assert_eq!(level_directive("DEBUG"), "debug");
        assert_eq!(level_directive("fatal"), "error");
        assert_eq!(level_directive("nonsense"), "info");
    }

    #[test]
    fn keeps_newest_files_of_the_app_only() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "ais_lookup_2024-01-01_00-00-00.log");
        touch(dir.path(), "ais_lookup_2024-03-01_00-00-00.log");
        touch(dir.path(), "ais_lookup_2024-02-01_00-00-00.log");
        touch(dir.path(), "other_2020-01-01_00-00-00.log");
        touch(dir.path(), "ais_lookup_notes.txt");

        let removed = cleanup_old_logs(dir.path(), "ais_lookup", 1).unwrap();
        assert_eq!(removed, 2);

        let mut left: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(
            left,
            vec![
                "ais_lookup_2024-03-01_00-00-00.log",
                "ais_lookup_notes.txt",
                "other_2020-01-01_00-00-00.log",
            ]
        );
    }

    #[test]
    fn setup_writes_to_log_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "unit_2000-01-01_00-00-00.log");
        let options = LoggingOptions {
            app_name: "unit".into(),
            level: "debug".into(),
            log_dir: Some(dir.path().to_path_buf()),
            keep_files: 1,
            json: false,
        };
        let guard = setup_logging(&options).unwrap();
        let log_file = guard.log_file.clone().unwrap();
        tracing::info!("hello from the logging test");
        drop(guard);

        assert!(!dir.path().join("unit_2000-01-01_00-00-00.log").exists());
        let contents = fs::read_to_string(log_file).unwrap();
        assert!(contents.contains("hello from the logging test"));
    }
}
