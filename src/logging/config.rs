use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{GeoError, GeoResult};

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Daily-rolling log file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileLogConfig {
    pub enabled: bool,
    pub dir: PathBuf,
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for every target.
    pub level: String,
    /// Extra `EnvFilter` directives, e.g. `geoscan::query=debug`.
    pub directives: Vec<String>,
    pub format: LogFormat,
    pub console_enabled: bool,
    pub with_ansi: bool,
    pub with_target: bool,
    pub file: FileLogConfig,
}

impl Default for FileLogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: PathBuf::from("logs"),
            file_name: "geoscan.log".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directives: Vec::new(),
            format: LogFormat::default(),
            console_enabled: true,
            with_ansi: true,
            with_target: true,
            file: FileLogConfig::default(),
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directive string: the level followed by the extra
    /// directives.
    pub fn build_filter_directive(&self) -> String {
        std::iter::once(self.level.as_str())
            .chain(self.directives.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn validate(&self) -> GeoResult<()> {
        if !LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            return Err(GeoError::Config(format!(
                "unknown log level '{}'",
                self.level
            )));
        }
        if self.file.enabled && self.file.file_name.is_empty() {
            return Err(GeoError::Config(
                "file logging needs a file_name".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ensure_log_dir(&self) -> std::io::Result<()> {
        if self.file.enabled {
            std::fs::create_dir_all(&self.file.dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_joins_level_and_directives() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            directives: vec!["geoscan::query=debug".to_string()],
            ..Default::default()
        };
        assert_eq!(config.build_filter_directive(), "warn,geoscan::query=debug");
        assert_eq!(LoggingConfig::default().build_filter_directive(), "info");
    }

    #[test]
    fn test_validate_level() {
        assert!(LoggingConfig::default().validate().is_ok());
        let config = LoggingConfig {
            level: "loud".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(GeoError::Config(_))));
    }

    #[test]
    fn test_format_deserializes_lowercase() {
        let format: LogFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, LogFormat::Json);
    }
}
