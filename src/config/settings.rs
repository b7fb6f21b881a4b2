use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{config::GeoConfig, error::GeoResult, logging::LoggingConfig};

/// Names an optional configuration file.
pub const CONFIG_PATH_ENV: &str = "GEOSCAN_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub geo: GeoConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Loads defaults, then the config file (explicit `path`, else
    /// `GEOSCAN_CONFIG`), then `GEOSCAN_*` environment variables, e.g.
    /// `GEOSCAN_GEO__HASH_KEY_LENGTH=6`.
    pub fn load(path: Option<&Path>) -> GeoResult<Self> {
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut builder = Config::builder()
            .set_default("geo.hash_key_length", 2)?
            .set_default("logging.level", "info")?;
        if let Some(file) = file {
            builder = builder.add_source(File::from(file).required(true));
        }
        let cfg = builder
            .add_source(
                Environment::with_prefix("GEOSCAN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = cfg.try_deserialize()?;
        settings.geo.validate()?;
        Ok(settings)
    }
}
