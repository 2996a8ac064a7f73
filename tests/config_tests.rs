// tests/config_tests.rs

use std::{fs, time::Duration};

use ecreader::config::{CONFIG_FILE, ConfigError, load, load_or_default};
use ecreader::scanner::MonitorInterval;
use log::LevelFilter;
use tempfile::tempdir;

#[test]
fn missing_file_means_defaults() {
    let dir = tempdir().unwrap();
    let cfg = load_or_default(&dir.path().join(CONFIG_FILE)).unwrap();

    assert!(!cfg.logging.enable);
    assert_eq!(cfg.logging.level_filter(), LevelFilter::Warn);
    assert_eq!(cfg.reader.module, "LpcACPIEC.bin");
    assert_eq!(cfg.reader.interval, Duration::from_secs(5));
    assert!(!cfg.reader.decimal);
}

#[test]
fn file_next_to_exe_is_honoured() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE);
    fs::write(
        &path,
        r#"
[logging]
enable = true
file = "ec.log"
level = "debug"

[reader]
module = "modules/LpcACPIEC.bin"
interval = "3s"
decimal = true
"#,
    )
    .unwrap();

    let cfg = load(&path).unwrap();

    assert!(cfg.logging.enable);
    assert_eq!(cfg.logging.file_name(), "ec.log");
    assert_eq!(cfg.logging.level_filter(), LevelFilter::Debug);
    assert_eq!(cfg.reader.module, "modules/LpcACPIEC.bin");
    assert_eq!(cfg.reader.interval, Duration::from_secs(3));
    assert!(cfg.reader.decimal);
}

#[test]
fn configured_interval_still_has_a_floor() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE);
    fs::write(&path, "[reader]\ninterval = \"500ms\"\n").unwrap();

    let cfg = load(&path).unwrap();

    assert_eq!(cfg.reader.interval, Duration::from_millis(500));
    assert!(MonitorInterval::new(cfg.reader.interval).is_err());
}

#[test]
fn broken_files_are_errors_not_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE);

    fs::write(&path, "[reader]\ninterval = \"soon\"\n").unwrap();
    assert!(matches!(load_or_default(&path), Err(ConfigError::InvalidDuration(..))));

    fs::write(&path, "[network]\nport = 1\n").unwrap();
    assert!(matches!(load_or_default(&path), Err(ConfigError::Toml(_))));
}
