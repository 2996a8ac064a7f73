// src/config/loader.rs

//! # Configuration Loader
//!
//! Reads the optional `ecreader.toml` next to the executable and converts the
//! raw tables into a typed `Config`.

use super::model::{Config, ConfigError, ConfigFile, ReaderConfig, ReaderStub};
use std::{fs, io::ErrorKind, path::Path};

/// Load and parse the configuration at `path`.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let txt = fs::read_to_string(path)?;
    let cfg = parse(&txt)?;
    log::debug!("Loaded config from {:?}", path);
    Ok(cfg)
}

/// Like [`load`], but a missing file yields the defaults.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    match load(path) {
        Err(ConfigError::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(Config::default()),
        other => other,
    }
}

pub fn parse(txt: &str) -> Result<Config, ConfigError> {
    let raw: ConfigFile = toml::from_str(txt)?;
    Ok(Config { logging: raw.logging, reader: convert_reader(raw.reader)? })
}

/// `"5s"`, `"2500ms"`, or a bare number of seconds.
fn convert_reader(stub: ReaderStub) -> Result<ReaderConfig, ConfigError> {
    let defaults = ReaderConfig::default();
    let interval = match stub.interval {
        None => defaults.interval,
        Some(s) => match s.trim().parse::<u64>() {
            Ok(secs) => std::time::Duration::from_secs(secs),
            Err(_) => humantime::parse_duration(s.trim())
                .map_err(|e| ConfigError::InvalidDuration(s.clone(), e))?,
        },
    };
    Ok(ReaderConfig {
        module: stub.module.unwrap_or(defaults.module),
        interval,
        decimal: stub.decimal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;
    use std::time::Duration;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.reader.module, "LpcACPIEC.bin");
        assert_eq!(cfg.reader.interval, Duration::from_secs(5));
        assert!(!cfg.reader.decimal);
        assert_eq!(cfg.logging.level_filter(), LevelFilter::Warn);
        assert!(!cfg.logging.enable);
    }

    #[test]
    fn full_file_parses() {
        let cfg = parse(
            r#"
            [logging]
            enable = true
            file = "ec.log"
            level = "debug"

            [reader]
            module = "custom.bin"
            interval = "2500ms"
            decimal = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.logging.level_filter(), LevelFilter::Debug);
        assert_eq!(cfg.logging.file_name(), "ec.log");
        assert_eq!(cfg.reader.module, "custom.bin");
        assert_eq!(cfg.reader.interval, Duration::from_millis(2500));
        assert!(cfg.reader.decimal);
    }

    #[test]
    fn bare_seconds_interval() {
        let cfg = parse("[reader]\ninterval = \"3\"\n").unwrap();
        assert_eq!(cfg.reader.interval, Duration::from_secs(3));
    }

    #[test]
    fn bad_interval_is_reported() {
        let err = parse("[reader]\ninterval = \"soon\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDuration(s, _) if s == "soon"));
    }

    #[test]
    fn unknown_table_is_rejected() {
        assert!(matches!(parse("[database]\npath = \"x\"\n"), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_or_default(&dir.path().join("ecreader.toml")).unwrap();
        assert_eq!(cfg.reader.interval, Duration::from_secs(5));
    }
}
