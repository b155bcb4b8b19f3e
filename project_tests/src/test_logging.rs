use std::fs;

use lib_ais::loggers::{LoggingError, LoggingOptions, setup_logging};
use tempfile::tempdir;

/// One process-wide subscriber, so everything lives in a single test.
#[test]
fn json_logging_to_file_and_single_install() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let options = LoggingOptions {
        app_name: "it_logging".to_string(),
        level: "debug".to_string(),
        log_dir: Some(temp_dir.path().to_path_buf()),
        keep_files: 2,
        json: true,
    };

    let guard = setup_logging(&options).expect("First install should succeed");
    let log_file = guard.log_file.clone().expect("A log file path is reported");
    assert!(log_file.starts_with(temp_dir.path()));
    let file_name = log_file.file_name().unwrap().to_string_lossy().into_owned();
    assert!(file_name.starts_with("it_logging_"));
    assert!(file_name.ends_with(".log"));

    tracing::debug!(imo = "9412634", "Resolving vessel identity");

    let second = setup_logging(&LoggingOptions {
        log_dir: None,
        ..options.clone()
    });
    assert!(matches!(second, Err(LoggingError::Init(_))));

    // Dropping the guard flushes the non-blocking writer
    drop(guard);
    let contents = fs::read_to_string(&log_file).expect("Failed to read log file");
    assert!(contents.contains("Resolving vessel identity"));
    assert!(contents.contains("9412634"));
}
